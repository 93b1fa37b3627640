// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use super::Builder;
use crate::common::kong::{ControlPlaneRef, KongService, KongServiceSpec};

const DEFAULT_SERVICE_PORT: i32 = 80;
const DEFAULT_SERVICE_PROTOCOL: &str = "http";

impl Builder<KongService> {
    pub fn new() -> Self {
        Self::from_object(KongService::new(
            "",
            KongServiceSpec { port: DEFAULT_SERVICE_PORT, protocol: DEFAULT_SERVICE_PROTOCOL.to_owned(), ..Default::default() },
        ))
    }

    #[must_use]
    pub fn with_control_plane(mut self, control_plane: &ControlPlaneRef) -> Self {
        self.object.spec.control_plane_ref = Some(control_plane.clone());
        self
    }

    #[must_use]
    pub fn with_upstream(mut self, upstream_name: &str) -> Self {
        self.object.spec.host = upstream_name.to_owned();
        self
    }
}

impl Default for Builder<KongService> {
    fn default() -> Self {
        Self::new()
    }
}
