// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::collections::BTreeMap;

use gateway_api::apis::standard::httproutes::{
    HTTPRoute, HTTPRouteParentRefs, HTTPRouteRulesBackendRefs, HTTPRouteRulesFilters, HTTPRouteRulesMatches, HTTPRouteRulesMatchesPath,
    HTTPRouteRulesMatchesPathType,
};
use tracing::warn;

use super::names::{StructuredName, ROUTE_PREFIX};
use crate::common::{kong::ControlPlaneRef, ResourceKey, DEFAULT_GROUP_NAME, DEFAULT_KIND_NAME};

const DEFAULT_PATH: &str = "/";

pub trait ControlPlaneResolver {
    fn resolve(&self, gateway: &ResourceKey) -> Option<ControlPlaneRef>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub name: StructuredName,
    pub matches: BTreeMap<StructuredName, HTTPRouteRulesMatches>,
    pub filters: BTreeMap<StructuredName, HTTPRouteRulesFilters>,
    pub backend_refs: BTreeMap<StructuredName, HTTPRouteRulesBackendRefs>,
}

impl Rule {
    fn new(name: StructuredName) -> Self {
        Self { name, matches: BTreeMap::new(), filters: BTreeMap::new(), backend_refs: BTreeMap::new() }
    }
}

fn default_match() -> HTTPRouteRulesMatches {
    HTTPRouteRulesMatches {
        headers: None,
        method: None,
        path: Some(HTTPRouteRulesMatchesPath { r#type: Some(HTTPRouteRulesMatchesPathType::PathPrefix), value: Some(DEFAULT_PATH.to_owned()) }),
        query_params: None,
    }
}

/// Flat view of one HTTPRoute, expanded per attached Gateway. Parent level data is keyed by the name cut down to the
/// parent reference index, so any deeper name can be used to look it up.
#[derive(Clone, Debug, PartialEq)]
pub struct HTTPRouteRepresentation {
    route_key: ResourceKey,
    parent_refs: BTreeMap<StructuredName, HTTPRouteParentRefs>,
    hostnames: BTreeMap<StructuredName, Vec<String>>,
    control_plane_refs: BTreeMap<StructuredName, ControlPlaneRef>,
    rules: BTreeMap<StructuredName, Rule>,
}

impl HTTPRouteRepresentation {
    pub fn build(route: &HTTPRoute, resolver: &impl ControlPlaneResolver) -> Self {
        let route_key = ResourceKey::from(route);
        let base = StructuredName::for_resource(ROUTE_PREFIX, &route_key);
        let mut representation =
            Self { route_key: route_key.clone(), parent_refs: BTreeMap::new(), hostnames: BTreeMap::new(), control_plane_refs: BTreeMap::new(), rules: BTreeMap::new() };

        let hostnames = route.spec.hostnames.clone().unwrap_or_default();
        let rules = route.spec.rules.as_deref().unwrap_or_default();
        let default_matches = vec![default_match()];

        for (parent_index, parent) in route.spec.parent_refs.iter().flatten().enumerate() {
            let gateway = ResourceKey::from((parent, route_key.namespace.as_str()));
            if gateway.kind != DEFAULT_KIND_NAME || gateway.group != DEFAULT_GROUP_NAME {
                warn!("Route {route_key} parent {}/{} {} is not a Gateway, skipping", gateway.group, gateway.kind, gateway.name);
                continue;
            }
            let Some(control_plane) = resolver.resolve(&gateway) else {
                warn!("Route {route_key} parent gateway {gateway} has no control plane, skipping");
                continue;
            };

            let parent_key = base.child(parent_index);
            representation.parent_refs.insert(parent_key.clone(), parent.clone());
            representation.hostnames.insert(parent_key.clone(), hostnames.clone());
            representation.control_plane_refs.insert(parent_key.clone(), control_plane);

            for (rule_index, rule) in rules.iter().enumerate() {
                let rule_key = parent_key.child(rule_index);
                let matches = match rule.matches.as_deref() {
                    Some(matches) if !matches.is_empty() => matches,
                    _ => default_matches.as_slice(),
                };

                for (match_index, route_match) in matches.iter().enumerate() {
                    representation.rule_entry(&rule_key).matches.insert(rule_key.child(match_index), route_match.clone());
                }
                for (filter_index, filter) in rule.filters.iter().flatten().enumerate() {
                    representation.rule_entry(&rule_key).filters.insert(rule_key.child(filter_index), filter.clone());
                }
                for (backend_index, backend) in rule.backend_refs.iter().flatten().enumerate() {
                    representation.rule_entry(&rule_key).backend_refs.insert(rule_key.child(backend_index), backend.clone());
                }
            }
        }
        representation
    }

    fn rule_entry(&mut self, rule_key: &StructuredName) -> &mut Rule {
        self.rules.entry(rule_key.clone()).or_insert_with(|| Rule::new(rule_key.clone()))
    }

    fn parent_key(name: &StructuredName) -> StructuredName {
        name.with_prefix(ROUTE_PREFIX).parent_ref_level()
    }

    pub fn route_key(&self) -> &ResourceKey {
        &self.route_key
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn rule_by_name(&self, name: &StructuredName) -> Option<&Rule> {
        self.rules.get(&name.with_prefix(ROUTE_PREFIX).rule_level())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn parent_ref_by_name(&self, name: &StructuredName) -> Option<&HTTPRouteParentRefs> {
        self.parent_refs.get(&Self::parent_key(name))
    }

    pub fn hostnames_by_name(&self, name: &StructuredName) -> Option<&[String]> {
        self.hostnames.get(&Self::parent_key(name)).map(Vec::as_slice)
    }

    pub fn control_plane_ref_by_name(&self, name: &StructuredName) -> Option<&ControlPlaneRef> {
        self.control_plane_refs.get(&Self::parent_key(name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gateway_api::apis::standard::httproutes::HTTPRoute;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    use super::{ControlPlaneResolver, HTTPRouteRepresentation};
    use crate::{
        backends::kong::names::{plugin_name, route_name, StructuredName},
        common::{kong::ControlPlaneRef, ResourceKey},
    };

    struct StaticResolver(BTreeMap<ResourceKey, ControlPlaneRef>);

    impl ControlPlaneResolver for StaticResolver {
        fn resolve(&self, gateway: &ResourceKey) -> Option<ControlPlaneRef> {
            self.0.get(gateway).cloned()
        }
    }

    const ROUTE: &str = r"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata:
  name: echo
  namespace: team-a
spec:
  parentRefs:
  - name: unknown
  - name: edge
    namespace: infra
  - name: svc
    kind: Service
    group: ''
  hostnames:
  - echo.example.com
  rules:
  - backendRefs:
    - name: echo
      port: 8080
  - matches:
    - path:
        type: Exact
        value: /health
    - path:
        type: PathPrefix
        value: /api
    filters:
    - type: RequestHeaderModifier
      requestHeaderModifier:
        set:
        - name: X-Env
          value: prod
    backendRefs:
    - name: echo
      port: 8080
    - name: echo-v2
      port: 8080
      weight: 3
";

    fn resolver() -> StaticResolver {
        StaticResolver(btreemap! { ResourceKey::namespaced("edge", "infra") => ControlPlaneRef::konnect("cp", Some("kong")) })
    }

    #[test]
    pub fn test_build_skips_unresolvable_parents() {
        let route: HTTPRoute = serde_yaml::from_str(ROUTE).unwrap();
        let representation = HTTPRouteRepresentation::build(&route, &resolver());

        let rules: Vec<_> = representation.rules().map(|rule| rule.name.to_string()).collect();
        assert_eq!(rules, vec!["route.team-a.echo.1.0", "route.team-a.echo.1.1"]);

        let first = representation.rules().next().unwrap();
        assert_eq!(first.matches.len(), 1);
        assert_eq!(first.backend_refs.len(), 1);
        assert!(first.filters.is_empty());

        let second = representation.rules().nth(1).unwrap();
        assert_eq!(second.matches.keys().map(ToString::to_string).collect::<Vec<_>>(), vec!["route.team-a.echo.1.1.0", "route.team-a.echo.1.1.1"]);
        assert_eq!(second.backend_refs.len(), 2);
        assert_eq!(second.filters.len(), 1);
    }

    #[test]
    pub fn test_lookups_normalize_to_parent_level() {
        let route: HTTPRoute = serde_yaml::from_str(ROUTE).unwrap();
        let representation = HTTPRouteRepresentation::build(&route, &resolver());
        let route_key = ResourceKey::http_route("echo", "team-a");

        let deep = route_name(&route_key, 1, 1, 1);
        assert_eq!(representation.parent_ref_by_name(&deep).map(|parent| parent.name.as_str()), Some("edge"));
        assert_eq!(representation.hostnames_by_name(&deep), Some(&["echo.example.com".to_owned()][..]));
        assert_eq!(representation.control_plane_ref_by_name(&plugin_name(&route_key, 1, 1, 0, None)), Some(&ControlPlaneRef::konnect("cp", Some("kong"))));
        assert!(representation.rule_by_name(&deep).is_some());

        let missing = route_name(&route_key, 0, 0, 0);
        assert_eq!(representation.parent_ref_by_name(&missing), None);
        assert_eq!(representation.control_plane_ref_by_name(&StructuredName::new("route", "team-a", "other").with_index(1)), None);
    }

    #[test]
    pub fn test_build_without_parents_is_empty() {
        let route: HTTPRoute = serde_yaml::from_str(
            r"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata:
  name: orphan
  namespace: team-a
spec:
  rules:
  - backendRefs:
    - name: echo
",
        )
        .unwrap();
        assert!(HTTPRouteRepresentation::build(&route, &resolver()).is_empty());
    }
}
