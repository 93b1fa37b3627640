// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::fmt::Display;

use gateway_api::apis::standard::{
    gateways::Gateway,
    httproutes::{HTTPRoute, HTTPRouteParentRefs, HTTPRouteRulesBackendRefs},
};
use kube::{Resource, ResourceExt};

pub const DEFAULT_GROUP_NAME: &str = "gateway.networking.k8s.io";
pub const DEFAULT_NAMESPACE_NAME: &str = "default";
pub const DEFAULT_KIND_NAME: &str = "Gateway";
pub const HTTP_ROUTE_KIND_NAME: &str = "HTTPRoute";
pub const SERVICE_KIND_NAME: &str = "Service";

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceKey {
    pub group: String,
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

impl ResourceKey {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Default::default() }
    }

    pub fn namespaced(name: &str, namespace: &str) -> Self {
        Self { name: name.to_owned(), namespace: namespace.to_owned(), ..Default::default() }
    }

    pub fn http_route(name: &str, namespace: &str) -> Self {
        Self { name: name.to_owned(), namespace: namespace.to_owned(), kind: HTTP_ROUTE_KIND_NAME.to_owned(), ..Default::default() }
    }

    pub fn identity(&self) -> String {
        create_id(&self.name, &self.namespace)
    }

    // entries without a namespace are rejected
    pub fn from_identity(identity: &str, kind: &str) -> Option<Self> {
        let (namespace, name) = identity.trim().split_once('/')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self { group: DEFAULT_GROUP_NAME.to_owned(), namespace: namespace.to_owned(), name: name.to_owned(), kind: kind.to_owned() })
    }
}

impl Default for ResourceKey {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP_NAME.to_owned(),
            namespace: DEFAULT_NAMESPACE_NAME.to_owned(),
            name: String::default(),
            kind: DEFAULT_KIND_NAME.to_owned(),
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", create_id(&self.name, &self.namespace))
    }
}

fn create_id(name: &str, namespace: &str) -> String {
    namespace.to_owned() + "/" + name
}

impl From<&HTTPRoute> for ResourceKey {
    fn from(value: &HTTPRoute) -> Self {
        let namespace = value.meta().namespace.clone().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned());

        Self { group: DEFAULT_GROUP_NAME.to_owned(), namespace, name: value.name_any(), kind: HTTP_ROUTE_KIND_NAME.to_owned() }
    }
}

impl From<&Gateway> for ResourceKey {
    fn from(value: &Gateway) -> Self {
        let namespace = value.meta().namespace.clone().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned());

        Self { group: DEFAULT_GROUP_NAME.to_owned(), namespace, name: value.name_any(), kind: DEFAULT_KIND_NAME.to_owned() }
    }
}

impl From<(&HTTPRouteParentRefs, &str)> for ResourceKey {
    fn from((parent, route_namespace): (&HTTPRouteParentRefs, &str)) -> Self {
        Self {
            group: parent.group.clone().unwrap_or(DEFAULT_GROUP_NAME.to_owned()),
            namespace: parent.namespace.clone().unwrap_or(route_namespace.to_owned()),
            name: parent.name.clone(),
            kind: parent.kind.clone().unwrap_or(DEFAULT_KIND_NAME.to_owned()),
        }
    }
}

impl From<(&HTTPRouteRulesBackendRefs, &str)> for ResourceKey {
    fn from((backend, route_namespace): (&HTTPRouteRulesBackendRefs, &str)) -> Self {
        Self {
            group: backend.group.clone().unwrap_or_default(),
            namespace: backend.namespace.clone().unwrap_or(route_namespace.to_owned()),
            name: backend.name.clone(),
            kind: backend.kind.clone().unwrap_or(SERVICE_KIND_NAME.to_owned()),
        }
    }
}
