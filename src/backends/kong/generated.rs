// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::fmt::Display;

use kube::ResourceExt;
use serde::Serialize;

use crate::{
    common::kong::{
        KongCertificate, KongCertificateSpec, KongPlugin, KongPluginBinding, KongPluginBindingSpec, KongPluginSpec, KongRoute, KongRouteSpec, KongSNI, KongSNISpec,
        KongService, KongServiceSpec, KongTarget, KongTargetSpec, KongUpstream, KongUpstreamSpec,
    },
    state::{InMemoryStore, StoreError, StoredObject},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Upstream,
    Target,
    Service,
    Route,
    Plugin,
    PluginBinding,
    Certificate,
    SNI,
}

impl ObjectKind {
    pub fn is_route_exclusive(self) -> bool {
        matches!(self, ObjectKind::Route | ObjectKind::Plugin | ObjectKind::PluginBinding)
    }

    // shared by every route deriving the same name
    pub fn is_shared(self) -> bool {
        matches!(self, ObjectKind::Upstream | ObjectKind::Target | ObjectKind::Service)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ObjectKind::Upstream => "KongUpstream",
            ObjectKind::Target => "KongTarget",
            ObjectKind::Service => "KongService",
            ObjectKind::Route => "KongRoute",
            ObjectKind::Plugin => "KongPlugin",
            ObjectKind::PluginBinding => "KongPluginBinding",
            ObjectKind::Certificate => "KongCertificate",
            ObjectKind::SNI => "KongSNI",
        };
        f.write_str(kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Unchanged,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum GeneratedObject {
    Upstream(KongUpstream),
    Target(KongTarget),
    Service(KongService),
    Route(KongRoute),
    Plugin(KongPlugin),
    PluginBinding(KongPluginBinding),
    Certificate(KongCertificate),
    SNI(KongSNI),
}

macro_rules! with_object {
    ($generated:expr, $object:ident => $body:expr) => {
        match $generated {
            GeneratedObject::Upstream($object) => $body,
            GeneratedObject::Target($object) => $body,
            GeneratedObject::Service($object) => $body,
            GeneratedObject::Route($object) => $body,
            GeneratedObject::Plugin($object) => $body,
            GeneratedObject::PluginBinding($object) => $body,
            GeneratedObject::Certificate($object) => $body,
            GeneratedObject::SNI($object) => $body,
        }
    };
}

impl GeneratedObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            GeneratedObject::Upstream(_) => ObjectKind::Upstream,
            GeneratedObject::Target(_) => ObjectKind::Target,
            GeneratedObject::Service(_) => ObjectKind::Service,
            GeneratedObject::Route(_) => ObjectKind::Route,
            GeneratedObject::Plugin(_) => ObjectKind::Plugin,
            GeneratedObject::PluginBinding(_) => ObjectKind::PluginBinding,
            GeneratedObject::Certificate(_) => ObjectKind::Certificate,
            GeneratedObject::SNI(_) => ObjectKind::SNI,
        }
    }

    pub fn name(&self) -> String {
        with_object!(self, object => object.name_any())
    }

    pub fn namespace(&self) -> String {
        with_object!(self, object => object.namespace().unwrap_or_default())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

pub trait KongObject: StoredObject {
    type Spec: Clone + PartialEq;
    const KIND: ObjectKind;

    fn spec(&self) -> &Self::Spec;
    fn spec_mut(&mut self) -> &mut Self::Spec;
    fn into_generated(self) -> GeneratedObject;
}

macro_rules! kong_object {
    ($object:ty, $spec:ty, $kind:ident) => {
        impl KongObject for $object {
            type Spec = $spec;
            const KIND: ObjectKind = ObjectKind::$kind;

            fn spec(&self) -> &Self::Spec {
                &self.spec
            }

            fn spec_mut(&mut self) -> &mut Self::Spec {
                &mut self.spec
            }

            fn into_generated(self) -> GeneratedObject {
                GeneratedObject::$kind(self)
            }
        }
    };
}

kong_object!(KongUpstream, KongUpstreamSpec, Upstream);
kong_object!(KongTarget, KongTargetSpec, Target);
kong_object!(KongService, KongServiceSpec, Service);
kong_object!(KongRoute, KongRouteSpec, Route);
kong_object!(KongPlugin, KongPluginSpec, Plugin);
kong_object!(KongPluginBinding, KongPluginBindingSpec, PluginBinding);
kong_object!(KongCertificate, KongCertificateSpec, Certificate);
kong_object!(KongSNI, KongSNISpec, SNI);

#[derive(Clone, Debug)]
pub struct DesiredObject {
    pub operation: Operation,
    pub object: GeneratedObject,
}

impl DesiredObject {
    pub fn new(operation: Operation, object: GeneratedObject) -> Self {
        Self { operation, object }
    }

    pub fn key(&self) -> (ObjectKind, String, String) {
        (self.object.kind(), self.object.namespace(), self.object.name())
    }

    // the way an API client would
    pub fn apply(&self, store: &InMemoryStore) -> Result<(), StoreError> {
        match self.operation {
            Operation::Create => with_object!(&self.object, object => store.create(object).map(|_| ())),
            Operation::Update => with_object!(&self.object, object => store.update(object).map(|_| ())),
            Operation::Unchanged => Ok(()),
        }
    }
}

impl Display for DesiredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}/{}", self.operation, self.object.kind(), self.object.namespace(), self.object.name())
    }
}
