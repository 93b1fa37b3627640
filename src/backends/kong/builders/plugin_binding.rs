// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use super::{BuildError, Builder};
use crate::common::kong::{
    ControlPlaneRef, KongPluginBinding, KongPluginBindingSpec, PluginBindingTargets, PluginRef, TargetRef, KONG_GROUP_NAME, KONG_PLUGIN_KIND_NAME, KONG_ROUTE_KIND_NAME,
};

impl Builder<KongPluginBinding> {
    pub fn new() -> Self {
        Self::from_object(KongPluginBinding::new("", KongPluginBindingSpec::default()))
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin_name: &str) -> Self {
        if plugin_name.is_empty() {
            self.record(BuildError::MissingField { kind: Self::kind(), field: "pluginRef.name" });
        }
        self.object.spec.plugin_ref = PluginRef { name: plugin_name.to_owned(), kind: Some(KONG_PLUGIN_KIND_NAME.to_owned()) };
        self
    }

    #[must_use]
    pub fn with_route(mut self, route_name: &str) -> Self {
        if route_name.is_empty() {
            self.record(BuildError::MissingField { kind: Self::kind(), field: "targets.routeRef.name" });
        }
        let targets = self.object.spec.targets.get_or_insert_with(PluginBindingTargets::default);
        targets.route_reference = Some(TargetRef { group: KONG_GROUP_NAME.to_owned(), kind: KONG_ROUTE_KIND_NAME.to_owned(), name: route_name.to_owned() });
        self
    }

    #[must_use]
    pub fn with_control_plane(mut self, control_plane: &ControlPlaneRef) -> Self {
        self.object.spec.control_plane_ref = Some(control_plane.clone());
        self
    }
}

impl Default for Builder<KongPluginBinding> {
    fn default() -> Self {
        Self::new()
    }
}
