// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use async_trait::async_trait;
use kube::{api::ListParams, Api, Client};
use tracing::debug;

use super::{ObjectStore, StoreError, StoredObject};

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: StoredObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoredObject>(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        debug!("Getting {} {namespace}/{name}", K::kind(&()));
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn list<K: StoredObject>(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>, StoreError> {
        debug!("Listing {} in {namespace} with {label_selector}", K::kind(&()));
        let objects = self.api::<K>(namespace).list(&ListParams::default().labels(label_selector)).await?;
        Ok(objects.items)
    }
}
