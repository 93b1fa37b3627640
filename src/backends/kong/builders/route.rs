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
    HTTPRouteRulesMatches, HTTPRouteRulesMatchesHeaders, HTTPRouteRulesMatchesHeadersType, HTTPRouteRulesMatchesMethod, HTTPRouteRulesMatchesPath,
    HTTPRouteRulesMatchesPathType,
};
use tracing::warn;

use super::Builder;
use crate::common::kong::{KongRoute, KongRouteSpec, ServiceRef};

const DEFAULT_PATH: &str = "/";
const WILDCARD_HOST: &str = "*";

impl Builder<KongRoute> {
    pub fn new() -> Self {
        Self::from_object(KongRoute::new(
            "",
            KongRouteSpec {
                protocols: vec!["http".to_owned(), "https".to_owned()],
                strip_path: Some(false),
                preserve_host: Some(true),
                ..Default::default()
            },
        ))
    }

    #[must_use]
    pub fn with_service(mut self, service_name: &str) -> Self {
        self.object.spec.service_ref = Some(ServiceRef::namespaced(service_name));
        self
    }

    #[must_use]
    pub fn with_hostnames(mut self, hostnames: &[String]) -> Self {
        for hostname in hostnames.iter().filter(|hostname| *hostname != WILDCARD_HOST) {
            if !self.object.spec.hosts.contains(hostname) {
                self.object.spec.hosts.push(hostname.clone());
            }
        }
        self
    }

    // with `capture_prefix` a prefix match captures the rest of the path so a prefix rewrite can refer to it.
    #[must_use]
    pub fn with_match(mut self, route_match: &HTTPRouteRulesMatches, capture_prefix: bool) -> Self {
        self.object.spec.paths.extend(route_paths(route_match.path.as_ref(), capture_prefix));

        for header in route_match.headers.iter().flatten() {
            let (name, value) = header_match(header);
            self.object.spec.headers.entry(name).or_default().push(value);
        }

        if let Some(method) = route_match.method.as_ref().and_then(method_name) {
            if !self.object.spec.methods.contains(&method) {
                self.object.spec.methods.push(method);
            }
        }

        for query_param in route_match.query_params.iter().flatten() {
            warn!("Query parameter match {} can't be expressed on a Kong route, ignoring", query_param.name);
        }
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, Vec<String>>) -> Self {
        for (name, values) in headers {
            self.object.spec.headers.entry(name).or_default().extend(values);
        }
        self
    }
}

impl Default for Builder<KongRoute> {
    fn default() -> Self {
        Self::new()
    }
}

// paths starting with `~` are regular expressions
pub fn route_paths(path: Option<&HTTPRouteRulesMatchesPath>, capture_prefix: bool) -> Vec<String> {
    let match_type = path.and_then(|path| path.r#type.as_ref()).unwrap_or(&HTTPRouteRulesMatchesPathType::PathPrefix);
    let value = path.and_then(|path| path.value.as_deref()).unwrap_or(DEFAULT_PATH);

    match match_type {
        HTTPRouteRulesMatchesPathType::Exact => vec![format!("~{value}$")],
        HTTPRouteRulesMatchesPathType::RegularExpression => vec![format!("~{value}")],
        HTTPRouteRulesMatchesPathType::PathPrefix => {
            let base = value.trim_end_matches('/');
            match (base.is_empty(), capture_prefix) {
                (true, true) => vec!["~/$".to_owned(), "~/(.*)".to_owned()],
                (true, false) => vec!["~/$".to_owned(), "/".to_owned()],
                (false, true) => vec![format!("~{base}$"), format!("~{base}(/.*)")],
                (false, false) => vec![format!("~{base}$"), format!("{base}/")],
            }
        },
    }
}

fn header_match(header: &HTTPRouteRulesMatchesHeaders) -> (String, String) {
    let name = header.name.to_lowercase();
    match header.r#type.as_ref() {
        Some(HTTPRouteRulesMatchesHeadersType::RegularExpression) => (name, format!("~*{}", header.value)),
        Some(HTTPRouteRulesMatchesHeadersType::Exact) | None => (name, header.value.clone()),
    }
}

fn method_name(method: &HTTPRouteRulesMatchesMethod) -> Option<String> {
    serde_json::to_value(method).ok().and_then(|method| method.as_str().map(ToOwned::to_owned))
}
