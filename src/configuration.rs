// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    backends::kong::ControlPlaneResolver,
    common::{kong::ControlPlaneRef, ResourceKey, DEFAULT_CLUSTER_DOMAIN},
    Result,
};

fn default_cluster_domain() -> String {
    DEFAULT_CLUSTER_DOMAIN.to_owned()
}

#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct GatewayControlPlane {
    #[builder(setter(into))]
    pub namespace: String,
    #[builder(setter(into))]
    pub name: String,
    pub control_plane: ControlPlaneRef,
}

#[derive(Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    #[builder(setter(into))]
    pub controller_name: String,
    #[serde(default = "default_cluster_domain")]
    #[builder(default = default_cluster_domain(), setter(into))]
    pub cluster_domain: String,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub default_control_plane: Option<ControlPlaneRef>,
    #[serde(default)]
    #[builder(default)]
    pub gateway_control_planes: Vec<GatewayControlPlane>,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub upstream_algorithm: Option<String>,
}

#[derive(Error, Debug)]
enum ConfigurationError {
    #[error("controller name must be not empty")]
    ControllerName,
    #[error("cluster domain must be not empty")]
    ClusterDomain,
    #[error("one control plane must be configured")]
    ControlPlane,
    #[error("gateway {0} is configured more than once")]
    DuplicateGateway(String),
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_name.is_empty() {
            return Err(ConfigurationError::ControllerName.into());
        }
        if self.cluster_domain.is_empty() {
            return Err(ConfigurationError::ClusterDomain.into());
        }
        if self.default_control_plane.is_none() && self.gateway_control_planes.is_empty() {
            return Err(ConfigurationError::ControlPlane.into());
        }

        let mut seen = std::collections::BTreeSet::new();
        for gateway in &self.gateway_control_planes {
            let key = ResourceKey::namespaced(&gateway.name, &gateway.namespace);
            if !seen.insert(key.identity()) {
                return Err(ConfigurationError::DuplicateGateway(key.identity()).into());
            }
        }
        Ok(())
    }

    pub fn control_planes(&self) -> ControlPlaneRegistry {
        ControlPlaneRegistry {
            default: self.default_control_plane.clone(),
            gateways: self
                .gateway_control_planes
                .iter()
                .map(|gateway| (ResourceKey::namespaced(&gateway.name, &gateway.namespace).identity(), gateway.control_plane.clone()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ControlPlaneRegistry {
    default: Option<ControlPlaneRef>,
    gateways: BTreeMap<String, ControlPlaneRef>,
}

impl ControlPlaneResolver for ControlPlaneRegistry {
    fn resolve(&self, gateway: &ResourceKey) -> Option<ControlPlaneRef> {
        self.gateways.get(&gateway.identity()).or(self.default.as_ref()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Configuration;
    use crate::{
        backends::kong::ControlPlaneResolver,
        common::{kong::ControlPlaneRef, ResourceKey},
    };

    #[test]
    pub fn test_configuration_from_yaml() {
        let configuration: Configuration = serde_yaml::from_str(
            r"
controller_name: konghq.com/kubvernor
default_control_plane:
  type: konnectNamespacedRef
  konnectNamespacedRef:
    name: default-cp
gateway_control_planes:
- namespace: infra
  name: edge
  control_plane:
    type: konnectNamespacedRef
    konnectNamespacedRef:
      name: edge-cp
      namespace: kong
",
        )
        .unwrap();
        configuration.validate().unwrap();
        assert_eq!(configuration.cluster_domain, "cluster.local");
        assert_eq!(configuration.upstream_algorithm, None);

        let registry = configuration.control_planes();
        assert_eq!(registry.resolve(&ResourceKey::namespaced("edge", "infra")), Some(ControlPlaneRef::konnect("edge-cp", Some("kong"))));
        assert_eq!(registry.resolve(&ResourceKey::namespaced("other", "infra")), Some(ControlPlaneRef::konnect("default-cp", None)));
    }

    #[test]
    pub fn test_configuration_validation() {
        let configuration = Configuration::builder().controller_name("").default_control_plane(ControlPlaneRef::konnect("cp", None)).build();
        assert!(configuration.validate().is_err());

        let configuration = Configuration::builder().controller_name("kubvernor").build();
        assert!(configuration.validate().is_err());
        assert_eq!(configuration.control_planes().resolve(&ResourceKey::namespaced("edge", "infra")), None);

        let configuration = Configuration::builder().controller_name("kubvernor").cluster_domain("").default_control_plane(ControlPlaneRef::konnect("cp", None)).build();
        assert!(configuration.validate().is_err());

        let configuration = Configuration::builder().controller_name("kubvernor").default_control_plane(ControlPlaneRef::konnect("cp", None)).upstream_algorithm("round-robin").build();
        assert!(configuration.validate().is_ok());
    }
}
