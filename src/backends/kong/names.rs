// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::fmt::Display;

use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::common::{kong::ControlPlaneRef, BackendTarget, ResourceKey};

pub const MAX_NAME_LENGTH: usize = 253;
const SEPARATOR: char = '.';
const HASH_BYTES: usize = 8;

pub const ROUTE_PREFIX: &str = "route";
pub const PLUGIN_PREFIX: &str = "plugin";
pub const UPSTREAM_PREFIX: &str = "upstream";
pub const SERVICE_PREFIX: &str = "service";
pub const TARGET_PREFIX: &str = "target";
pub const BINDING_PREFIX: &str = "binding";
pub const CERTIFICATE_PREFIX: &str = "cert";
pub const SNI_PREFIX: &str = "sni";

const PARENT_REF_DEPTH: usize = 1;
const RULE_DEPTH: usize = 2;

pub fn sanitize(segment: &str) -> String {
    let sanitized: String = segment
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('-');
    if sanitized.is_empty() {
        "x".to_owned()
    } else {
        sanitized.to_owned()
    }
}

fn fit(segment: &str, budget: usize) -> &str {
    let budget = budget.max(1).min(segment.len());
    let fitted = segment[..budget].trim_end_matches('-');
    if fitted.is_empty() {
        &segment[..1]
    } else {
        fitted
    }
}

pub fn content_hash<S: AsRef<str>>(components: &[S]) -> String {
    let mut hasher = Sha256::new();
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(component.as_ref().as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..HASH_BYTES])
}

/// Readable `prefix.namespace.c1.c2...` when every component already is a clean segment and the result fits,
/// `prefix.namespace.<hash>` of the raw components otherwise.
pub fn derive_name<S: AsRef<str>>(prefix: &str, namespace: &str, components: &[S]) -> String {
    let lossless = components.iter().all(|component| sanitize(component.as_ref()) == component.as_ref());
    let readable = [prefix, namespace]
        .into_iter()
        .chain(components.iter().map(|component| component.as_ref()))
        .map(sanitize)
        .collect::<Vec<_>>()
        .join(".");

    if lossless && readable.len() <= MAX_NAME_LENGTH {
        readable
    } else {
        HashName::new(prefix, namespace, components).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructuredName {
    prefix: String,
    namespace: String,
    name: String,
    indexes: Vec<usize>,
}

impl StructuredName {
    pub fn new(prefix: &str, namespace: &str, name: &str) -> Self {
        Self { prefix: sanitize(prefix), namespace: sanitize(namespace), name: sanitize(name), indexes: vec![] }
    }

    pub fn for_resource(prefix: &str, resource: &ResourceKey) -> Self {
        Self::new(prefix, &resource.namespace, &resource.name)
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.indexes.push(index);
        self
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        self.clone().with_index(index)
    }

    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self { prefix: sanitize(prefix), ..self.clone() }
    }

    #[must_use]
    pub fn truncated(&self, depth: usize) -> Self {
        Self { indexes: self.indexes.iter().take(depth).copied().collect(), ..self.clone() }
    }

    #[must_use]
    pub fn parent_ref_level(&self) -> Self {
        self.truncated(PARENT_REF_DEPTH)
    }

    #[must_use]
    pub fn rule_level(&self) -> Self {
        self.truncated(RULE_DEPTH)
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn index(&self, depth: usize) -> Option<usize> {
        self.indexes.get(depth).copied()
    }
}

impl Display for StructuredName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix: String = self.indexes.iter().map(|index| format!("{SEPARATOR}{index}")).collect();
        let naive_length = self.prefix.len() + self.namespace.len() + self.name.len() + 2 + suffix.len();
        if naive_length <= MAX_NAME_LENGTH {
            return write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}{suffix}", self.prefix, self.namespace, self.name);
        }

        let available = MAX_NAME_LENGTH.saturating_sub(2 + suffix.len());
        let prefix_budget = self.prefix.len().min(available / 4);
        let remaining = available - prefix_budget;
        let namespace_budget = self.namespace.len().min(remaining / 2);
        let name_budget = remaining - namespace_budget;
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{suffix}",
            fit(&self.prefix, prefix_budget),
            fit(&self.namespace, namespace_budget),
            fit(&self.name, name_budget)
        )
    }
}

// the hash is never shortened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashName {
    prefix: String,
    namespace: String,
    hash: String,
}

impl HashName {
    pub fn new<S: AsRef<str>>(prefix: &str, namespace: &str, components: &[S]) -> Self {
        Self { prefix: sanitize(prefix), namespace: sanitize(namespace), hash: content_hash(components) }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl Display for HashName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let naive_length = self.prefix.len() + self.namespace.len() + self.hash.len() + 2;
        if naive_length <= MAX_NAME_LENGTH {
            return write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", self.prefix, self.namespace, self.hash);
        }
        let available = MAX_NAME_LENGTH.saturating_sub(2 + self.hash.len());
        let prefix_budget = self.prefix.len().min(available / 2);
        let namespace_budget = available - prefix_budget;
        write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", fit(&self.prefix, prefix_budget), fit(&self.namespace, namespace_budget), self.hash)
    }
}

pub fn route_name(route: &ResourceKey, parent: usize, rule: usize, matching: usize) -> StructuredName {
    StructuredName::for_resource(ROUTE_PREFIX, route).with_index(parent).with_index(rule).with_index(matching)
}

// a plugin whose configuration depends on the matched path is also per match
pub fn plugin_name(route: &ResourceKey, parent: usize, rule: usize, filter: usize, matching: Option<usize>) -> StructuredName {
    let name = StructuredName::for_resource(PLUGIN_PREFIX, route).with_index(parent).with_index(rule).with_index(filter);
    match matching {
        Some(matching) => name.with_index(matching),
        None => name,
    }
}

fn backend_components(control_plane: &ControlPlaneRef, backends: &[BackendTarget]) -> Vec<String> {
    std::iter::once(control_plane.identity()).chain(backends.iter().map(BackendTarget::descriptor).sorted().dedup()).collect()
}

// Shared kinds are content addressed: equal names must mean equal configuration.
pub fn upstream_name(namespace: &str, control_plane: &ControlPlaneRef, backends: &[BackendTarget]) -> String {
    HashName::new(UPSTREAM_PREFIX, namespace, &backend_components(control_plane, backends)).to_string()
}

pub fn service_name(namespace: &str, control_plane: &ControlPlaneRef, backends: &[BackendTarget]) -> String {
    HashName::new(SERVICE_PREFIX, namespace, &backend_components(control_plane, backends)).to_string()
}

pub fn target_name(namespace: &str, upstream: &str, backend: &BackendTarget) -> String {
    HashName::new(TARGET_PREFIX, namespace, &[upstream.to_owned(), backend.descriptor()]).to_string()
}

pub fn binding_name(namespace: &str, plugin: &str, route: &str) -> String {
    derive_name(BINDING_PREFIX, namespace, &[plugin, route])
}

pub fn certificate_name(gateway: &ResourceKey, listener: usize, certificate: usize) -> StructuredName {
    StructuredName::for_resource(CERTIFICATE_PREFIX, gateway).with_index(listener).with_index(certificate)
}

pub fn sni_name(gateway: &ResourceKey, listener: usize) -> StructuredName {
    StructuredName::for_resource(SNI_PREFIX, gateway).with_index(listener)
}
