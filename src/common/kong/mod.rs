// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
mod certificates;
mod plugins;
mod routing;
mod upstreams;

pub use certificates::{KongCertificate, KongCertificateSpec, KongSNI, KongSNISpec};
pub use plugins::{KongPlugin, KongPluginBinding, KongPluginBindingSpec, KongPluginSpec, PluginBindingTargets, PluginRef, TargetRef};
pub use routing::{KongRoute, KongRouteSpec, KongService, KongServiceSpec, ServiceRef};
pub use upstreams::{KongTarget, KongTargetSpec, KongUpstream, KongUpstreamSpec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const KONG_GROUP_NAME: &str = "configuration.konghq.com";
pub const KONG_PLUGIN_KIND_NAME: &str = "KongPlugin";
pub const KONG_ROUTE_KIND_NAME: &str = "KongRoute";
pub const KONG_SERVICE_KIND_NAME: &str = "KongService";

const NAMESPACED_REF_TYPE: &str = "namespacedRef";
const KONNECT_NAMESPACED_REF_TYPE: &str = "konnectNamespacedRef";

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneRef {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub konnect_namespaced_ref: Option<KonnectNamespacedRef>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KonnectNamespacedRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ControlPlaneRef {
    pub fn konnect(name: &str, namespace: Option<&str>) -> Self {
        Self {
            r#type: KONNECT_NAMESPACED_REF_TYPE.to_owned(),
            konnect_namespaced_ref: Some(KonnectNamespacedRef { name: name.to_owned(), namespace: namespace.map(ToOwned::to_owned) }),
        }
    }

    /// `type:namespace/name`, fed unsanitized into the names of shared objects.
    pub fn identity(&self) -> String {
        match &self.konnect_namespaced_ref {
            Some(KonnectNamespacedRef { name, namespace: Some(namespace) }) => format!("{}:{namespace}/{name}", self.r#type),
            Some(KonnectNamespacedRef { name, namespace: None }) => format!("{}:{name}", self.r#type),
            None => self.r#type.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct NameRef {
    pub name: String,
}

impl NameRef {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned() }
    }
}
