// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::collections::{BTreeMap, BTreeSet};

use kube::{Resource, ResourceExt};
use lazy_static::lazy_static;

use super::{ResourceKey, DEFAULT_KIND_NAME, HTTP_ROUTE_KIND_NAME};

lazy_static! {
    pub static ref METADATA_KEYS: MetadataKeys = MetadataKeys {
        managed_by: "kong.kubvernor.io/managed-by",
        source_namespace: "kong.kubvernor.io/source-namespace",
        source_name: "kong.kubvernor.io/source-name",
        routes: "kong.kubvernor.io/routes",
        gateways: "kong.kubvernor.io/gateways",
    };
}

#[derive(Debug)]
pub struct MetadataKeys {
    pub managed_by: &'static str,
    pub source_namespace: &'static str,
    pub source_name: &'static str,
    pub routes: &'static str,
    pub gateways: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagedBy {
    HTTPRoute,
    Gateway,
}

impl ManagedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            ManagedBy::HTTPRoute => "httproute",
            ManagedBy::Gateway => "gateway",
        }
    }

    pub fn labels(self, source: &ResourceKey) -> BTreeMap<String, String> {
        BTreeMap::from([
            (METADATA_KEYS.managed_by.to_owned(), self.as_str().to_owned()),
            (METADATA_KEYS.source_namespace.to_owned(), source.namespace.clone()),
            (METADATA_KEYS.source_name.to_owned(), source.name.clone()),
        ])
    }

    pub fn selector(self) -> String {
        format!("{}={}", METADATA_KEYS.managed_by, self.as_str())
    }

    pub fn backref(self) -> BackrefAnnotation {
        match self {
            ManagedBy::HTTPRoute => BackrefAnnotation::routes(),
            ManagedBy::Gateway => BackrefAnnotation::gateways(),
        }
    }
}

/// Multi-owner backreference kept in a single annotation as a sorted, comma separated set of `namespace/name`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackrefAnnotation {
    key: &'static str,
    kind: &'static str,
}

impl BackrefAnnotation {
    pub fn routes() -> Self {
        Self { key: METADATA_KEYS.routes, kind: HTTP_ROUTE_KIND_NAME }
    }

    pub fn gateways() -> Self {
        Self { key: METADATA_KEYS.gateways, kind: DEFAULT_KIND_NAME }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn append<K: Resource>(&self, object: &mut K, source: &ResourceKey) -> bool {
        let mut entries = self.entries(object);
        if !entries.insert(source.identity()) {
            return false;
        }
        self.store(object, &entries);
        true
    }

    pub fn remove<K: Resource>(&self, object: &mut K, source: &ResourceKey) -> bool {
        let mut entries = self.entries(object);
        if !entries.remove(&source.identity()) {
            return false;
        }
        self.store(object, &entries);
        true
    }

    pub fn contains<K: Resource>(&self, object: &K, source: &ResourceKey) -> bool {
        self.entries(object).contains(&source.identity())
    }

    pub fn get<K: Resource>(&self, object: &K) -> Vec<ResourceKey> {
        self.entries(object).iter().filter_map(|identity| ResourceKey::from_identity(identity, self.kind)).collect()
    }

    pub fn is_empty<K: Resource>(&self, object: &K) -> bool {
        self.entries(object).is_empty()
    }

    fn entries<K: Resource>(&self, object: &K) -> BTreeSet<String> {
        object
            .annotations()
            .get(self.key)
            .map(|value| value.split(',').map(str::trim).filter(|entry| !entry.is_empty()).map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    fn store<K: Resource>(&self, object: &mut K, entries: &BTreeSet<String>) {
        let annotations = object.annotations_mut();
        if entries.is_empty() {
            annotations.remove(self.key);
        } else {
            annotations.insert(self.key.to_owned(), entries.iter().cloned().collect::<Vec<_>>().join(","));
        }
    }
}

#[cfg(test)]
mod tests {
    use kube::ResourceExt;
    use pretty_assertions::assert_eq;

    use super::{BackrefAnnotation, ManagedBy, METADATA_KEYS};
    use crate::common::{
        kong::{KongUpstream, KongUpstreamSpec},
        ResourceKey,
    };

    fn upstream() -> KongUpstream {
        KongUpstream::new("upstream.team-a.abc", KongUpstreamSpec { name: "upstream.team-a.abc".to_owned(), ..Default::default() })
    }

    #[test]
    pub fn test_append_is_idempotent() {
        let annotation = BackrefAnnotation::routes();
        let route = ResourceKey::http_route("echo", "team-a");
        let mut object = upstream();

        assert!(annotation.append(&mut object, &route));
        assert!(!annotation.append(&mut object, &route));
        assert_eq!(object.annotations().get(METADATA_KEYS.routes).map(String::as_str), Some("team-a/echo"));
    }

    #[test]
    pub fn test_append_and_remove_converge() {
        let annotation = BackrefAnnotation::routes();
        let first = ResourceKey::http_route("b-route", "team-a");
        let second = ResourceKey::http_route("a-route", "team-a");
        let mut object = upstream();

        annotation.append(&mut object, &first);
        annotation.append(&mut object, &second);
        assert_eq!(object.annotations().get(METADATA_KEYS.routes).map(String::as_str), Some("team-a/a-route,team-a/b-route"));
        assert_eq!(annotation.get(&object), vec![second.clone(), first.clone()]);

        assert!(annotation.remove(&mut object, &second));
        assert!(!annotation.remove(&mut object, &second));
        assert_eq!(annotation.get(&object), vec![first.clone()]);
        assert!(annotation.contains(&object, &first));

        assert!(annotation.remove(&mut object, &first));
        assert!(!object.annotations().contains_key(METADATA_KEYS.routes));
        assert!(annotation.is_empty(&object));
    }

    #[test]
    pub fn test_annotations_are_independent() {
        let route = ResourceKey::http_route("echo", "team-a");
        let mut object = upstream();
        object.annotations_mut().insert("unrelated".to_owned(), "value".to_owned());

        BackrefAnnotation::routes().append(&mut object, &route);
        assert!(!BackrefAnnotation::gateways().contains(&object, &route));
        BackrefAnnotation::routes().remove(&mut object, &route);
        assert_eq!(object.annotations().get("unrelated").map(String::as_str), Some("value"));
    }

    #[test]
    pub fn test_malformed_entries_are_skipped() {
        let mut object = upstream();
        object.annotations_mut().insert(METADATA_KEYS.routes.to_owned(), " team-a/echo, ,broken,".to_owned());
        assert_eq!(BackrefAnnotation::routes().get(&object), vec![ResourceKey::http_route("echo", "team-a")]);
    }

    #[test]
    pub fn test_managed_by_labels() {
        let labels = ManagedBy::Gateway.labels(&ResourceKey::namespaced("edge", "infra"));
        assert_eq!(labels.get(METADATA_KEYS.managed_by).map(String::as_str), Some("gateway"));
        assert_eq!(labels.get(METADATA_KEYS.source_namespace).map(String::as_str), Some("infra"));
        assert_eq!(labels.get(METADATA_KEYS.source_name).map(String::as_str), Some("edge"));
        assert_eq!(ManagedBy::HTTPRoute.selector(), "kong.kubvernor.io/managed-by=httproute");
    }
}
