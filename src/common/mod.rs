// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
pub mod kong;
mod metadata;
mod resource_key;

use gateway_api::apis::standard::httproutes::HTTPRouteRulesBackendRefs;
pub use metadata::{BackrefAnnotation, ManagedBy, MetadataKeys, METADATA_KEYS};
pub use resource_key::{ResourceKey, DEFAULT_GROUP_NAME, DEFAULT_KIND_NAME, DEFAULT_NAMESPACE_NAME, HTTP_ROUTE_KIND_NAME, SERVICE_KIND_NAME};

pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
const DEFAULT_BACKEND_PORT: i32 = 80;
const DEFAULT_BACKEND_WEIGHT: i32 = 1;

#[derive(Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub struct BackendTarget {
    pub resource_key: ResourceKey,
    pub host: String,
    pub port: i32,
    pub weight: i32,
}

impl BackendTarget {
    pub fn new(backend: &HTTPRouteRulesBackendRefs, route_namespace: &str, cluster_domain: &str) -> Self {
        let resource_key = ResourceKey::from((backend, route_namespace));
        let host = format!("{}.{}.svc.{cluster_domain}", resource_key.name, resource_key.namespace);
        Self { resource_key, host, port: backend.port.unwrap_or(DEFAULT_BACKEND_PORT), weight: backend.weight.unwrap_or(DEFAULT_BACKEND_WEIGHT) }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `namespace/name:port/weight`
    pub fn descriptor(&self) -> String {
        format!("{}/{}:{}/{}", self.resource_key.namespace, self.resource_key.name, self.port, self.weight)
    }

    pub fn is_service(&self) -> bool {
        self.resource_key.kind == SERVICE_KIND_NAME && (self.resource_key.group.is_empty() || self.resource_key.group == "core")
    }
}

#[cfg(test)]
mod tests {
    use gateway_api::apis::standard::httproutes::HTTPRouteRulesBackendRefs;
    use serde_json::json;

    use super::{BackendTarget, DEFAULT_CLUSTER_DOMAIN};

    fn backend(value: serde_json::Value) -> HTTPRouteRulesBackendRefs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    pub fn test_backend_target_defaults() {
        let target = BackendTarget::new(&backend(json!({"name": "echo"})), "team-a", DEFAULT_CLUSTER_DOMAIN);
        assert_eq!(target.endpoint(), "echo.team-a.svc.cluster.local:80");
        assert_eq!(target.weight, 1);
        assert!(target.is_service());
    }

    #[test]
    pub fn test_backend_target_explicit_namespace() {
        let target = BackendTarget::new(&backend(json!({"name": "echo", "namespace": "shared", "port": 8080, "weight": 30})), "team-a", "example.internal");
        assert_eq!(target.endpoint(), "echo.shared.svc.example.internal:8080");
        assert_eq!(target.descriptor(), "shared/echo:8080/30");
    }

    #[test]
    pub fn test_descriptor_keeps_namespace_boundary() {
        let first = BackendTarget::new(&backend(json!({"name": "y", "namespace": "ns-x", "port": 80})), "team-a", DEFAULT_CLUSTER_DOMAIN);
        let second = BackendTarget::new(&backend(json!({"name": "x-y", "namespace": "ns", "port": 80})), "team-a", DEFAULT_CLUSTER_DOMAIN);
        assert_ne!(first.descriptor(), second.descriptor());
    }
}
