// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use std::collections::{BTreeMap, BTreeSet};

use gateway_api::apis::standard::{
    gateways::{Gateway, GatewayListeners, GatewayListenersTlsCertificateRefs},
    httproutes::{HTTPRoute, HTTPRouteRulesFilters, HTTPRouteRulesFiltersType},
};
use k8s_openapi::api::core::v1::Secret;
use kube::{Resource, ResourceExt};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use typed_builder::TypedBuilder;

use super::{
    builders::{
        BuildError, Builder, KongCertificateBuilder, KongPluginBindingBuilder, KongPluginBuilder, KongRouteBuilder, KongSNIBuilder, KongServiceBuilder,
        KongTargetBuilder, KongUpstreamBuilder,
    },
    filters::{filter_type_name, is_match_dependent, FilterError},
    generated::{DesiredObject, KongObject, ObjectKind, Operation},
    ir::{ControlPlaneResolver, HTTPRouteRepresentation, Rule},
    names,
};
use crate::{
    common::{
        kong::{
            ControlPlaneRef, KongCertificate, KongPlugin, KongPluginBinding, KongRoute, KongSNI, KongService, KongTarget, KongUpstream, KONG_GROUP_NAME,
            KONG_PLUGIN_KIND_NAME,
        },
        BackendTarget, BackrefAnnotation, ManagedBy, ResourceKey, DEFAULT_CLUSTER_DOMAIN, HTTP_ROUTE_KIND_NAME,
    },
    state::{ObjectStore, StoreError},
};

const SECRET_KIND_NAME: &str = "Secret";

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("{kind} {name}: {source}")]
    Build { kind: ObjectKind, name: String, source: BuildError },
    #[error("{kind} {name} already exists and belongs to {owners:?}")]
    NamingCollision { kind: ObjectKind, name: String, owners: Vec<String> },
    #[error("{kind} {name}: {source}")]
    Store { kind: ObjectKind, name: String, source: StoreError },
    #[error("{kind} {name}: {reference} not found")]
    ReferenceNotFound { kind: ObjectKind, name: String, reference: String },
    #[error("{rule}: backend {backend} is not a Service")]
    UnsupportedBackend { rule: String, backend: String },
    #[error("{kind} {name}: unsupported reference {reference}")]
    UnsupportedReference { kind: ObjectKind, name: String, reference: String },
}

// failed rules and listeners contribute an error and no objects
#[derive(Debug, Default)]
pub struct TranslationResult {
    pub objects: Vec<DesiredObject>,
    pub errors: Vec<GeneratorError>,
}

impl TranslationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn changes(&self) -> impl Iterator<Item = &DesiredObject> {
        self.objects.iter().filter(|object| object.operation != Operation::Unchanged)
    }
}

#[derive(Debug, Default)]
pub struct ReleaseResult {
    pub objects: Vec<DesiredObject>,
    pub orphaned: Vec<(ObjectKind, String, String)>,
    pub errors: Vec<GeneratorError>,
}

type ObjectKey = (ObjectKind, String, String);

#[derive(Default)]
struct Pass {
    objects: BTreeMap<ObjectKey, DesiredObject>,
    errors: Vec<GeneratorError>,
}

impl Pass {
    fn extend(&mut self, objects: Vec<DesiredObject>) {
        for object in objects {
            self.objects.entry(object.key()).or_insert(object);
        }
    }

    fn into_result(self) -> TranslationResult {
        TranslationResult { objects: self.objects.into_values().collect(), errors: self.errors }
    }
}

struct Source<'a, O> {
    owner: &'a O,
    key: ResourceKey,
    managed_by: ManagedBy,
}

impl<'a, O> Source<'a, O>
where
    O: Resource<DynamicType = ()>,
{
    fn route(route: &'a O, key: ResourceKey) -> Self {
        Self { owner: route, key, managed_by: ManagedBy::HTTPRoute }
    }

    fn gateway(gateway: &'a O, key: ResourceKey) -> Self {
        Self { owner: gateway, key, managed_by: ManagedBy::Gateway }
    }

    fn annotation(&self) -> BackrefAnnotation {
        self.managed_by.backref()
    }

    fn stamp<K: KongObject>(&self, builder: Builder<K>, name: &str) -> Builder<K> {
        let builder = builder
            .with_name(name)
            .with_namespace(&self.key.namespace)
            .with_labels(self.managed_by.labels(&self.key))
            .with_backref(self.annotation(), &self.key);
        if K::KIND.is_shared() {
            builder.with_shared_owner(Some(self.owner))
        } else {
            builder.with_owner(Some(self.owner))
        }
    }
}

#[derive(TypedBuilder)]
pub struct KongResourceGenerator<S, R> {
    store: S,
    resolver: R,
    #[builder(default = DEFAULT_CLUSTER_DOMAIN.to_owned(), setter(into))]
    cluster_domain: String,
    #[builder(default, setter(strip_option, into))]
    upstream_algorithm: Option<String>,
}

impl<S, R> KongResourceGenerator<S, R>
where
    S: ObjectStore,
    R: ControlPlaneResolver,
{
    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn translate_http_route(&self, route: &HTTPRoute) -> TranslationResult {
        let route_key = ResourceKey::from(route);
        let span = info_span!("translate_http_route", route = %route_key);
        async {
            let representation = HTTPRouteRepresentation::build(route, &self.resolver);
            let source = Source::route(route, route_key.clone());
            let mut pass = Pass::default();

            for rule in representation.rules() {
                match self.translate_rule(&representation, rule, &source).await {
                    Ok(objects) => pass.extend(objects),
                    Err(e) => {
                        warn!("Rule {} skipped {e}", rule.name);
                        pass.errors.push(e);
                    },
                }
            }

            if pass.errors.is_empty() {
                let desired: BTreeSet<ObjectKey> = pass.objects.keys().cloned().collect();
                let release = self.release(&route_key, Some(&desired)).await;
                pass.extend(release.objects);
                pass.errors.extend(release.errors);
            } else {
                info!("Not releasing stale objects, {} rules failed", pass.errors.len());
            }

            let result = pass.into_result();
            info!("Translated {} objects {} changes {} errors", result.objects.len(), result.changes().count(), result.errors.len());
            result
        }
        .instrument(span)
        .await
    }

    pub async fn release_http_route(&self, route_key: &ResourceKey) -> ReleaseResult {
        let span = info_span!("release_http_route", route = %route_key);
        self.release(route_key, None).instrument(span).await
    }

    async fn translate_rule(&self, representation: &HTTPRouteRepresentation, rule: &Rule, source: &Source<'_, HTTPRoute>) -> Result<Vec<DesiredObject>, GeneratorError> {
        let route_key = representation.route_key();
        let namespace = route_key.namespace.as_str();
        let rule_name = rule.name.to_string();
        let control_plane = representation.control_plane_ref_by_name(&rule.name).ok_or_else(|| GeneratorError::ReferenceNotFound {
            kind: ObjectKind::Route,
            name: rule_name.clone(),
            reference: "control plane".to_owned(),
        })?;
        let hostnames = representation.hostnames_by_name(&rule.name).unwrap_or_default();
        let (parent_index, rule_index) = (rule.name.index(0).unwrap_or_default(), rule.name.index(1).unwrap_or_default());
        debug!("Translating rule {rule_name}");

        let mut objects = vec![];
        let backends: Vec<_> = rule.backend_refs.values().map(|backend| BackendTarget::new(backend, namespace, &self.cluster_domain)).collect();
        if let Some(backend) = backends.iter().find(|backend| !backend.is_service()) {
            return Err(GeneratorError::UnsupportedBackend { rule: rule_name, backend: format!("{}/{} {}", backend.resource_key.group, backend.resource_key.kind, backend.resource_key) });
        }
        for backend in rule.backend_refs.values().filter(|backend| backend.filters.as_ref().is_some_and(|filters| !filters.is_empty())) {
            warn!("Backend filters on {} are not supported, ignoring", backend.name);
        }

        let service_name = if backends.is_empty() {
            debug!("Rule {rule_name} has no backends, routes won't have a service");
            None
        } else {
            Some(self.translate_backends(namespace, control_plane, &backends, source, &mut objects).await?)
        };

        let capture_prefix = rule.filters.values().any(is_match_dependent);
        let mut routes = vec![];
        for (match_key, route_match) in &rule.matches {
            let match_index = match_key.index(2).unwrap_or_default();
            let name = names::route_name(route_key, parent_index, rule_index, match_index).to_string();
            let mut builder = source.stamp(KongRouteBuilder::new(), &name).with_hostnames(hostnames).with_match(route_match, capture_prefix);
            if let Some(service_name) = &service_name {
                builder = builder.with_service(service_name);
            }
            objects.push(self.reconcile::<KongRoute, _>(&name, builder, source).await?);
            let matched_path = route_match.path.as_ref().and_then(|path| path.value.clone());
            routes.push((match_index, name, matched_path));
        }

        for (filter_key, filter) in &rule.filters {
            let filter_index = filter_key.index(2).unwrap_or_default();
            if filter.r#type == HTTPRouteRulesFiltersType::ExtensionRef {
                self.bind_extension(namespace, filter, control_plane, &routes, source, &mut objects).await?;
                continue;
            }

            if is_match_dependent(filter) {
                for (match_index, route_name, matched_path) in &routes {
                    let plugin_name = names::plugin_name(route_key, parent_index, rule_index, filter_index, Some(*match_index)).to_string();
                    let builder = source.stamp(KongPluginBuilder::new(), &plugin_name).with_filter(filter, matched_path.as_deref());
                    objects.push(self.reconcile::<KongPlugin, _>(&plugin_name, builder, source).await?);
                    objects.push(self.bind(namespace, &plugin_name, route_name, control_plane, source).await?);
                }
            } else {
                let plugin_name = names::plugin_name(route_key, parent_index, rule_index, filter_index, None).to_string();
                let builder = source.stamp(KongPluginBuilder::new(), &plugin_name).with_filter(filter, None);
                objects.push(self.reconcile::<KongPlugin, _>(&plugin_name, builder, source).await?);
                for (_, route_name, _) in &routes {
                    objects.push(self.bind(namespace, &plugin_name, route_name, control_plane, source).await?);
                }
            }
        }
        Ok(objects)
    }

    async fn translate_backends(
        &self,
        namespace: &str,
        control_plane: &ControlPlaneRef,
        backends: &[BackendTarget],
        source: &Source<'_, HTTPRoute>,
        objects: &mut Vec<DesiredObject>,
    ) -> Result<String, GeneratorError> {
        let upstream_name = names::upstream_name(namespace, control_plane, backends);
        let builder = source
            .stamp(KongUpstreamBuilder::new(), &upstream_name)
            .with_upstream_name(&upstream_name)
            .with_control_plane(control_plane)
            .with_algorithm(self.upstream_algorithm.as_deref());
        objects.push(self.reconcile::<KongUpstream, _>(&upstream_name, builder, source).await?);

        let mut seen = BTreeSet::new();
        for backend in backends.iter().filter(|backend| seen.insert(backend.descriptor())) {
            let target_name = names::target_name(namespace, &upstream_name, backend);
            let builder = source.stamp(KongTargetBuilder::new(), &target_name).with_upstream(&upstream_name).with_backend(backend);
            objects.push(self.reconcile::<KongTarget, _>(&target_name, builder, source).await?);
        }

        let service_name = names::service_name(namespace, control_plane, backends);
        let builder = source.stamp(KongServiceBuilder::new(), &service_name).with_control_plane(control_plane).with_upstream(&upstream_name);
        objects.push(self.reconcile::<KongService, _>(&service_name, builder, source).await?);
        Ok(service_name)
    }

    async fn bind(&self, namespace: &str, plugin_name: &str, route_name: &str, control_plane: &ControlPlaneRef, source: &Source<'_, HTTPRoute>) -> Result<DesiredObject, GeneratorError> {
        let binding_name = names::binding_name(namespace, plugin_name, route_name);
        let builder = source.stamp(KongPluginBindingBuilder::new(), &binding_name).with_plugin(plugin_name).with_route(route_name).with_control_plane(control_plane);
        self.reconcile::<KongPluginBinding, _>(&binding_name, builder, source).await
    }

    // an extension reference to an existing KongPlugin is bound to the routes as is
    async fn bind_extension(
        &self,
        namespace: &str,
        filter: &HTTPRouteRulesFilters,
        control_plane: &ControlPlaneRef,
        routes: &[(usize, String, Option<String>)],
        source: &Source<'_, HTTPRoute>,
        objects: &mut Vec<DesiredObject>,
    ) -> Result<(), GeneratorError> {
        let unsupported = || GeneratorError::Build {
            kind: ObjectKind::PluginBinding,
            name: source.key.to_string(),
            source: BuildError::Filter { kind: ObjectKind::PluginBinding.to_string(), source: FilterError::UnsupportedFilter(filter_type_name(&filter.r#type)) },
        };
        let extension = filter.extension_ref.as_ref().ok_or_else(unsupported)?;
        if extension.group != KONG_GROUP_NAME || extension.kind != KONG_PLUGIN_KIND_NAME {
            return Err(GeneratorError::UnsupportedReference {
                kind: ObjectKind::PluginBinding,
                name: source.key.to_string(),
                reference: format!("{}/{} {}", extension.group, extension.kind, extension.name),
            });
        }

        let plugin: Option<KongPlugin> = self.store.get(namespace, &extension.name).await.map_err(|source| GeneratorError::Store {
            kind: ObjectKind::Plugin,
            name: extension.name.clone(),
            source,
        })?;
        if plugin.is_none() {
            return Err(GeneratorError::ReferenceNotFound { kind: ObjectKind::Plugin, name: extension.name.clone(), reference: format!("{namespace}/{}", extension.name) });
        }

        for (_, route_name, _) in routes {
            objects.push(self.bind(namespace, &extension.name, route_name, control_plane, source).await?);
        }
        Ok(())
    }

    pub async fn translate_gateway(&self, gateway: &Gateway) -> TranslationResult {
        let gateway_key = ResourceKey::from(gateway);
        let span = info_span!("translate_gateway", gateway = %gateway_key);
        async {
            let mut pass = Pass::default();
            let Some(control_plane) = self.resolver.resolve(&gateway_key) else {
                warn!("Gateway {gateway_key} has no control plane");
                pass.errors.push(GeneratorError::ReferenceNotFound { kind: ObjectKind::Certificate, name: gateway_key.to_string(), reference: "control plane".to_owned() });
                return pass.into_result();
            };

            let source = Source::gateway(gateway, gateway_key.clone());
            for (listener_index, listener) in gateway.spec.listeners.iter().enumerate() {
                match self.translate_listener(listener_index, listener, &control_plane, &source).await {
                    Ok(objects) => pass.extend(objects),
                    Err(e) => {
                        warn!("Listener {} skipped {e}", listener.name);
                        pass.errors.push(e);
                    },
                }
            }
            let result = pass.into_result();
            info!("Translated {} objects {} errors", result.objects.len(), result.errors.len());
            result
        }
        .instrument(span)
        .await
    }

    async fn translate_listener(&self, listener_index: usize, listener: &GatewayListeners, control_plane: &ControlPlaneRef, source: &Source<'_, Gateway>) -> Result<Vec<DesiredObject>, GeneratorError> {
        let mut objects = vec![];
        let certificate_refs = listener.tls.as_ref().and_then(|tls| tls.certificate_refs.as_deref()).unwrap_or_default();
        let mut first_certificate = None;

        for (certificate_index, certificate_ref) in certificate_refs.iter().enumerate() {
            let name = names::certificate_name(&source.key, listener_index, certificate_index).to_string();
            let secret = self.fetch_secret(&name, certificate_ref, &source.key.namespace).await?;
            let builder = source.stamp(KongCertificateBuilder::new(), &name).with_control_plane(control_plane).with_secret(&secret);
            objects.push(self.reconcile::<KongCertificate, _>(&name, builder, source).await?);
            if first_certificate.is_none() {
                first_certificate = Some(name);
            }
        }

        match (&listener.hostname, first_certificate) {
            (Some(hostname), Some(certificate)) => {
                let name = names::sni_name(&source.key, listener_index).to_string();
                let builder = source.stamp(KongSNIBuilder::new(), &name).with_server_name(hostname).with_certificate(&certificate);
                objects.push(self.reconcile::<KongSNI, _>(&name, builder, source).await?);
            },
            (None, Some(_)) => debug!("Listener {} has certificates but no hostname, no SNI", listener.name),
            _ => {},
        }
        Ok(objects)
    }

    async fn fetch_secret(&self, name: &str, reference: &GatewayListenersTlsCertificateRefs, gateway_namespace: &str) -> Result<Secret, GeneratorError> {
        let group = reference.group.as_deref().unwrap_or_default();
        let kind = reference.kind.as_deref().unwrap_or(SECRET_KIND_NAME);
        if !(group.is_empty() || group == "core") || kind != SECRET_KIND_NAME {
            return Err(GeneratorError::UnsupportedReference { kind: ObjectKind::Certificate, name: name.to_owned(), reference: format!("{group}/{kind} {}", reference.name) });
        }

        let namespace = reference.namespace.as_deref().unwrap_or(gateway_namespace);
        let secret: Option<Secret> =
            self.store.get(namespace, &reference.name).await.map_err(|source| GeneratorError::Store { kind: ObjectKind::Certificate, name: name.to_owned(), source })?;
        secret.ok_or_else(|| GeneratorError::ReferenceNotFound { kind: ObjectKind::Certificate, name: name.to_owned(), reference: format!("secret {namespace}/{}", reference.name) })
    }

    // a missing object is created, an existing one gets the source added to its backreference annotation and owners
    async fn reconcile<K, O>(&self, name: &str, builder: Builder<K>, source: &Source<'_, O>) -> Result<DesiredObject, GeneratorError>
    where
        K: KongObject,
        O: Resource<DynamicType = ()>,
    {
        let desired = builder.build().map_err(|e| GeneratorError::Build { kind: K::KIND, name: name.to_owned(), source: e })?;
        let namespace = desired.namespace().unwrap_or_default();
        let existing: Option<K> = self.store.get(&namespace, name).await.map_err(|e| GeneratorError::Store { kind: K::KIND, name: name.to_owned(), source: e })?;

        let Some(mut existing) = existing else {
            debug!("{} {namespace}/{name} will be created", K::KIND);
            return Ok(DesiredObject::new(Operation::Create, desired.into_generated()));
        };

        let annotation = source.annotation();
        let owners = annotation.get(&existing);
        if K::KIND.is_route_exclusive() && !owners.is_empty() && !annotation.contains(&existing, &source.key) {
            return Err(GeneratorError::NamingCollision { kind: K::KIND, name: name.to_owned(), owners: owners.iter().map(ResourceKey::identity).collect() });
        }

        let mut changed = annotation.append(&mut existing, &source.key);
        if existing.spec() != desired.spec() {
            *existing.spec_mut() = desired.spec().clone();
            changed = true;
        }
        for (key, value) in desired.labels() {
            if !existing.labels().contains_key(key) {
                existing.labels_mut().insert(key.clone(), value.clone());
                changed = true;
            }
        }
        if K::KIND.is_shared() {
            for reference in desired.owner_references() {
                if !existing.owner_references().iter().any(|owner| owner.uid == reference.uid) {
                    existing.meta_mut().owner_references.get_or_insert_with(Vec::new).push(reference.clone());
                    changed = true;
                }
            }
        }

        let operation = if changed { Operation::Update } else { Operation::Unchanged };
        debug!("{} {namespace}/{name} exists, {operation}", K::KIND);
        Ok(DesiredObject::new(operation, existing.into_generated()))
    }

    // drops `route_key` from the objects of its namespace, except those in `keep`
    async fn release(&self, route_key: &ResourceKey, keep: Option<&BTreeSet<ObjectKey>>) -> ReleaseResult {
        let mut result = ReleaseResult::default();
        self.release_kind::<KongUpstream>(route_key, keep, &mut result).await;
        self.release_kind::<KongTarget>(route_key, keep, &mut result).await;
        self.release_kind::<KongService>(route_key, keep, &mut result).await;
        self.release_kind::<KongRoute>(route_key, keep, &mut result).await;
        self.release_kind::<KongPlugin>(route_key, keep, &mut result).await;
        self.release_kind::<KongPluginBinding>(route_key, keep, &mut result).await;
        if !result.objects.is_empty() {
            info!("Released {} objects, {} orphaned", result.objects.len(), result.orphaned.len());
        }
        result
    }

    async fn release_kind<K: KongObject>(&self, route_key: &ResourceKey, keep: Option<&BTreeSet<ObjectKey>>, result: &mut ReleaseResult) {
        let annotation = BackrefAnnotation::routes();
        let objects: Vec<K> = match self.store.list(&route_key.namespace, &ManagedBy::HTTPRoute.selector()).await {
            Ok(objects) => objects,
            Err(e) => {
                result.errors.push(GeneratorError::Store { kind: K::KIND, name: route_key.to_string(), source: e });
                return;
            },
        };

        for mut object in objects {
            let key = (K::KIND, object.namespace().unwrap_or_default(), object.name_any());
            if keep.is_some_and(|keep| keep.contains(&key)) || !annotation.remove(&mut object, route_key) {
                continue;
            }
            debug!("Releasing {} {}/{} from {route_key}", key.0, key.1, key.2);
            if let Some(owners) = object.meta_mut().owner_references.as_mut() {
                owners.retain(|owner| !(owner.kind == HTTP_ROUTE_KIND_NAME && owner.name == route_key.name));
            }
            if annotation.is_empty(&object) {
                result.orphaned.push(key);
            }
            result.objects.push(DesiredObject::new(Operation::Update, object.into_generated()));
        }
    }
}
