// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

use super::{BuildError, Builder};
use crate::common::kong::{ControlPlaneRef, KongCertificate, KongCertificateSpec};

const TLS_CERT_KEY: &str = "tls.crt";
const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

impl Builder<KongCertificate> {
    pub fn new() -> Self {
        Self::from_object(KongCertificate::new("", KongCertificateSpec::default()))
    }

    #[must_use]
    pub fn with_control_plane(mut self, control_plane: &ControlPlaneRef) -> Self {
        self.object.spec.control_plane_ref = Some(control_plane.clone());
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: &Secret) -> Self {
        match secret_value(secret, TLS_CERT_KEY) {
            Some(cert) => self.object.spec.cert = cert,
            None => self.record(BuildError::MissingSecretData { kind: Self::kind(), secret: secret.name_any(), key: TLS_CERT_KEY }),
        }
        match secret_value(secret, TLS_PRIVATE_KEY_KEY) {
            Some(key) => self.object.spec.key = key,
            None => self.record(BuildError::MissingSecretData { kind: Self::kind(), secret: secret.name_any(), key: TLS_PRIVATE_KEY_KEY }),
        }
        self
    }
}

impl Default for Builder<KongCertificate> {
    fn default() -> Self {
        Self::new()
    }
}

fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .and_then(|value| String::from_utf8(value.0.clone()).ok())
        .or_else(|| secret.string_data.as_ref().and_then(|data| data.get(key).cloned()))
        .filter(|value| !value.is_empty())
}
