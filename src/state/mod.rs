// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
mod inmemory;
mod kube_store;

use std::fmt::Debug;

use async_trait::async_trait;
pub use inmemory::InMemoryStore;
use kube::{core::NamespaceResourceScope, Resource};
pub use kube_store::KubeStore;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store lock is poisoned")]
    LockingError,
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists { kind: String, namespace: String, name: String },
    #[error("{kind} {namespace}/{name} not found")]
    NotFound { kind: String, namespace: String, name: String },
    #[error("{kind} {namespace}/{name} was modified concurrently, resource version {resource_version:?} is stale")]
    Conflict { kind: String, namespace: String, name: String, resource_version: Option<String> },
    #[error("{0} has no name or namespace")]
    MissingIdentity(String),
    #[error("serialization error {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("kubernetes api error {0}")]
    Kube(#[from] kube::Error),
}

pub trait StoredObject: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned + Serialize + Send + Sync + 'static {}

impl<K> StoredObject for K where K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned + Serialize + Send + Sync + 'static {}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get<K: StoredObject>(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;

    /// Lists objects in `namespace` matching an equality based label selector such as `a=b,c=d`.
    async fn list<K: StoredObject>(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, StoreError>;
}
