// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use super::Builder;
use crate::common::kong::{KongSNI, KongSNISpec, NameRef};

impl Builder<KongSNI> {
    pub fn new() -> Self {
        Self::from_object(KongSNI::new("", KongSNISpec::default()))
    }

    #[must_use]
    pub fn with_server_name(mut self, hostname: &str) -> Self {
        self.object.spec.name = hostname.to_owned();
        self
    }

    #[must_use]
    pub fn with_certificate(mut self, certificate_name: &str) -> Self {
        self.object.spec.certificate_ref = NameRef::new(certificate_name);
        self
    }
}

impl Default for Builder<KongSNI> {
    fn default() -> Self {
        Self::new()
    }
}
