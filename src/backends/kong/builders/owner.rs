// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("cluster-scoped resource must not have a namespace-scoped owner, owner's namespace {0}")]
    ClusterScopedWithNamespacedOwner(String),
    #[error("cross-namespace owner references are disallowed, owner's namespace {owner_namespace}, object's namespace {namespace}")]
    CrossNamespace { owner_namespace: String, namespace: String },
    #[error("object is already owned by another {kind} controller {name}")]
    AlreadyOwned { kind: String, name: String },
    #[error("{0} {1} has no uid")]
    IncompleteOwner(String, String),
}

fn check_scope<K: Resource>(object: &K, owner_namespace: Option<&str>) -> Result<(), OwnershipError> {
    // an object without a namespace is cluster scoped; a cluster scoped owner may own anything
    if let Some(owner_namespace) = owner_namespace {
        match object.meta().namespace.as_deref() {
            None => return Err(OwnershipError::ClusterScopedWithNamespacedOwner(owner_namespace.to_owned())),
            Some(namespace) if namespace != owner_namespace => {
                return Err(OwnershipError::CrossNamespace { owner_namespace: owner_namespace.to_owned(), namespace: namespace.to_owned() });
            },
            Some(_) => {},
        }
    }
    Ok(())
}

pub fn set_controller_reference<K: Resource>(object: &mut K, reference: OwnerReference, owner_namespace: Option<&str>) -> Result<(), OwnershipError> {
    check_scope(object, owner_namespace)?;

    let owners = object.meta_mut().owner_references.get_or_insert_with(Vec::new);
    if let Some(existing) = owners.iter().find(|owner| owner.controller == Some(true) && owner.uid != reference.uid) {
        return Err(OwnershipError::AlreadyOwned { kind: existing.kind.clone(), name: existing.name.clone() });
    }
    owners.retain(|owner| owner.uid != reference.uid);
    owners.push(reference);
    Ok(())
}

// shared objects carry one of these per source, garbage collection waits for the last one
pub fn add_owner_reference<K: Resource>(object: &mut K, reference: OwnerReference, owner_namespace: Option<&str>) -> Result<(), OwnershipError> {
    check_scope(object, owner_namespace)?;

    let owners = object.meta_mut().owner_references.get_or_insert_with(Vec::new);
    owners.retain(|owner| owner.uid != reference.uid);
    owners.push(reference);
    Ok(())
}
