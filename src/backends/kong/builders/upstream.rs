// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use super::Builder;
use crate::common::kong::{ControlPlaneRef, KongUpstream, KongUpstreamSpec};

impl Builder<KongUpstream> {
    pub fn new() -> Self {
        Self::from_object(KongUpstream::new("", KongUpstreamSpec::default()))
    }

    #[must_use]
    pub fn with_upstream_name(mut self, name: &str) -> Self {
        self.object.spec.name = name.to_owned();
        self
    }

    #[must_use]
    pub fn with_control_plane(mut self, control_plane: &ControlPlaneRef) -> Self {
        self.object.spec.control_plane_ref = Some(control_plane.clone());
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Option<&str>) -> Self {
        self.object.spec.algorithm = algorithm.map(ToOwned::to_owned);
        self
    }
}

impl Default for Builder<KongUpstream> {
    fn default() -> Self {
        Self::new()
    }
}
