// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::trace;

use super::{ObjectStore, StoreError, StoredObject};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct StoreKey {
    kind: String,
    namespace: String,
    name: String,
}

impl StoreKey {
    fn new<K: StoredObject>(namespace: &str, name: &str) -> Self {
        Self { kind: K::kind(&()).to_string(), namespace: namespace.to_owned(), name: name.to_owned() }
    }

    fn of<K: StoredObject>(object: &K) -> Result<Self, StoreError> {
        match (object.namespace(), object.meta().name.as_deref()) {
            (Some(namespace), Some(name)) if !name.is_empty() => Ok(Self::new::<K>(&namespace, name)),
            _ => Err(StoreError::MissingIdentity(K::kind(&()).to_string())),
        }
    }

    fn not_found(self) -> StoreError {
        StoreError::NotFound { kind: self.kind, namespace: self.namespace, name: self.name }
    }
}

/// Object store kept in memory, with the optimistic concurrency of the API server: every write bumps the resource
/// version and an update carrying a stale version is rejected.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    objects: Arc<Mutex<BTreeMap<StoreKey, serde_json::Value>>>,
    version: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<StoreKey, serde_json::Value>>, StoreError> {
        self.objects.lock().map_err(|_| StoreError::LockingError)
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    pub fn create<K: StoredObject>(&self, object: &K) -> Result<K, StoreError> {
        let key = StoreKey::of(object)?;
        let mut objects = self.lock()?;
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists { kind: key.kind, namespace: key.namespace, name: key.name });
        }
        let mut object = object.clone();
        object.meta_mut().resource_version = Some(self.next_version());
        objects.insert(key, serde_json::to_value(&object)?);
        Ok(object)
    }

    pub fn update<K: StoredObject>(&self, object: &K) -> Result<K, StoreError> {
        let key = StoreKey::of(object)?;
        let mut objects = self.lock()?;
        let Some(stored) = objects.get(&key) else {
            return Err(key.not_found());
        };
        let stored: K = serde_json::from_value(stored.clone())?;
        if object.resource_version().is_some() && object.resource_version() != stored.resource_version() {
            return Err(StoreError::Conflict { kind: key.kind, namespace: key.namespace, name: key.name, resource_version: object.resource_version() });
        }
        let mut object = object.clone();
        object.meta_mut().resource_version = Some(self.next_version());
        objects.insert(key, serde_json::to_value(&object)?);
        Ok(object)
    }

    pub fn delete<K: StoredObject>(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        let mut objects = self.lock()?;
        objects.remove(&StoreKey::new::<K>(namespace, name)).map(serde_json::from_value).transpose().map_err(StoreError::from)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }
}

fn matches_selector<K: StoredObject>(object: &K, label_selector: &str) -> bool {
    let labels = object.labels();
    label_selector
        .split(',')
        .map(str::trim)
        .filter(|requirement| !requirement.is_empty())
        .all(|requirement| match requirement.split_once('=') {
            Some((key, value)) => labels.get(key.trim()).is_some_and(|label| label == value.trim()),
            None => labels.contains_key(requirement),
        })
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get<K: StoredObject>(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        let objects = self.lock()?;
        objects.get(&StoreKey::new::<K>(namespace, name)).cloned().map(serde_json::from_value).transpose().map_err(StoreError::from)
    }

    async fn list<K: StoredObject>(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, StoreError> {
        let kind = K::kind(&()).to_string();
        let objects = self.lock()?;
        let mut listed = vec![];
        for (key, value) in objects.iter().filter(|(key, _)| key.kind == kind && key.namespace == namespace) {
            let object: K = serde_json::from_value(value.clone())?;
            if matches_selector(&object, label_selector) {
                listed.push(object);
            } else {
                trace!("{} {}/{} doesn't match {label_selector}", key.kind, key.namespace, key.name);
            }
        }
        Ok(listed)
    }
}
