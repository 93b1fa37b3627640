// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
mod certificate;
mod owner;
mod plugin;
mod plugin_binding;
mod route;
mod service;
mod sni;
mod target;
mod upstream;

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
pub use owner::{add_owner_reference, set_controller_reference, OwnershipError};
pub use route::route_paths;
use thiserror::Error;

use super::filters::FilterError;
use crate::common::{
    kong::{KongCertificate, KongPlugin, KongPluginBinding, KongRoute, KongSNI, KongService, KongTarget, KongUpstream},
    BackrefAnnotation, ResourceKey,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("owner cannot be nil")]
    MissingOwner,
    #[error("{kind}: {source}")]
    Ownership { kind: String, source: OwnershipError },
    #[error("{kind}: {source}")]
    Filter { kind: String, source: FilterError },
    #[error("{kind}: {field} is required")]
    MissingField { kind: String, field: &'static str },
    #[error("{kind}: secret {secret} has no {key}")]
    MissingSecretData { kind: String, secret: String, key: &'static str },
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<BuildError>),
}

impl BuildError {
    pub fn errors(&self) -> Vec<&BuildError> {
        match self {
            BuildError::Multiple(errors) => errors.iter().collect(),
            error => vec![error],
        }
    }
}

// setters never fail, problems are collected and reported together by `build`
#[derive(Debug)]
pub struct Builder<K> {
    object: K,
    owner: Option<(OwnerReference, Option<String>)>,
    errors: Vec<BuildError>,
}

pub type KongUpstreamBuilder = Builder<KongUpstream>;
pub type KongServiceBuilder = Builder<KongService>;
pub type KongRouteBuilder = Builder<KongRoute>;
pub type KongTargetBuilder = Builder<KongTarget>;
pub type KongPluginBuilder = Builder<KongPlugin>;
pub type KongPluginBindingBuilder = Builder<KongPluginBinding>;
pub type KongCertificateBuilder = Builder<KongCertificate>;
pub type KongSNIBuilder = Builder<KongSNI>;

impl<K> Builder<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn from_object(object: K) -> Self {
        Self { object, owner: None, errors: vec![] }
    }

    fn kind() -> String {
        K::kind(&()).to_string()
    }

    fn record(&mut self, error: BuildError) {
        self.errors.push(error);
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.object.meta_mut().name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.object.meta_mut().namespace = Some(namespace.to_owned());
        self
    }

    #[must_use]
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.object.labels_mut().extend(labels);
        self
    }

    #[must_use]
    pub fn with_backref(mut self, annotation: BackrefAnnotation, source: &ResourceKey) -> Self {
        annotation.append(&mut self.object, source);
        self
    }

    #[must_use]
    pub fn with_owner<O>(self, owner: Option<&O>) -> Self
    where
        O: Resource<DynamicType = ()>,
    {
        self.owned_by(owner, true)
    }

    #[must_use]
    pub fn with_shared_owner<O>(self, owner: Option<&O>) -> Self
    where
        O: Resource<DynamicType = ()>,
    {
        self.owned_by(owner, false)
    }

    fn owned_by<O>(mut self, owner: Option<&O>, controller: bool) -> Self
    where
        O: Resource<DynamicType = ()>,
    {
        let Some(owner) = owner else {
            self.record(BuildError::MissingOwner);
            return self;
        };

        let meta = owner.meta();
        match (&meta.name, &meta.uid) {
            (Some(name), Some(uid)) => {
                let reference = OwnerReference {
                    api_version: O::api_version(&()).to_string(),
                    kind: O::kind(&()).to_string(),
                    name: name.clone(),
                    uid: uid.clone(),
                    controller: controller.then_some(true),
                    block_owner_deletion: controller.then_some(true),
                };
                self.owner = Some((reference, meta.namespace.clone()));
            },
            _ => {
                let source = OwnershipError::IncompleteOwner(O::kind(&()).to_string(), owner.name_any());
                self.record(BuildError::Ownership { kind: Self::kind(), source });
            },
        }
        self
    }

    pub fn build(self) -> Result<K, BuildError> {
        let Self { mut object, owner, mut errors } = self;
        if let Some((reference, owner_namespace)) = owner {
            let owned = if reference.controller == Some(true) {
                set_controller_reference(&mut object, reference, owner_namespace.as_deref())
            } else {
                add_owner_reference(&mut object, reference, owner_namespace.as_deref())
            };
            if let Err(source) = owned {
                errors.push(BuildError::Ownership { kind: Self::kind(), source });
            }
        }

        match errors.len() {
            0 => Ok(object),
            1 => Err(errors.remove(0)),
            _ => Err(BuildError::Multiple(errors)),
        }
    }

    // fixtures only
    #[allow(clippy::panic)]
    pub fn must_build(self) -> K {
        match self.build() {
            Ok(object) => object,
            Err(e) => panic!("can't build {}: {e}", Self::kind()),
        }
    }
}
