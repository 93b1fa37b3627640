// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use gateway_api::apis::standard::{gateways::Gateway, httproutes::HTTPRoute};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{
    builders::{KongPluginBuilder, KongRouteBuilder},
    filters::PluginConfiguration,
    names, DesiredObject, GeneratedObject, GeneratorError, KongResourceGenerator, ObjectKind, Operation, TranslationResult,
};
use crate::{
    common::{
        kong::{ControlPlaneRef, KongRoute, KongUpstream},
        BackendTarget, BackrefAnnotation, ResourceKey, DEFAULT_CLUSTER_DOMAIN, METADATA_KEYS,
    },
    configuration::{Configuration, ControlPlaneRegistry},
    state::{InMemoryStore, ObjectStore},
};

fn control_plane() -> ControlPlaneRef {
    ControlPlaneRef::konnect("cp", Some("kong"))
}

fn backends(backend_ref: serde_json::Value) -> Vec<BackendTarget> {
    vec![BackendTarget::new(&serde_json::from_value(backend_ref).unwrap(), "team-a", DEFAULT_CLUSTER_DOMAIN)]
}

fn upstream_name(backend_ref: serde_json::Value) -> String {
    names::upstream_name("team-a", &control_plane(), &backends(backend_ref))
}

fn echo_upstream() -> String {
    upstream_name(json!({"name": "echo", "port": 8080}))
}

fn echo_service() -> String {
    names::service_name("team-a", &control_plane(), &backends(json!({"name": "echo", "port": 8080})))
}

fn binding_name(route: &str) -> String {
    names::binding_name("team-a", &format!("plugin.team-a.{route}.0.0.0"), &format!("route.team-a.{route}.0.0.0"))
}

fn kong_generator(store: InMemoryStore) -> KongResourceGenerator<InMemoryStore, ControlPlaneRegistry> {
    let configuration = Configuration::builder().controller_name("kubvernor").default_control_plane(control_plane()).build();
    KongResourceGenerator::builder().store(store).resolver(configuration.control_planes()).build()
}

fn route(name: &str, rules: &str) -> HTTPRoute {
    let manifest = format!(
        r"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata:
  name: {name}
  namespace: team-a
  uid: {name}-uid
spec:
  parentRefs:
  - name: edge
    namespace: infra
  hostnames:
  - echo.example.com
  rules:
{rules}"
    );
    serde_yaml::from_str(&manifest).unwrap()
}

const ECHO_RULES: &str = "
  - matches:
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
";

fn apply(store: &InMemoryStore, result: &TranslationResult) {
    for object in &result.objects {
        object.apply(store).unwrap();
    }
}

fn find<'a>(result: &'a TranslationResult, kind: ObjectKind, name: &str) -> Option<&'a DesiredObject> {
    result.objects.iter().find(|object| object.object.kind() == kind && object.object.name() == name)
}

fn routes_annotation<K: ResourceExt>(object: &K) -> Option<String> {
    object.annotations().get(METADATA_KEYS.routes).cloned()
}

#[tokio::test]
pub async fn test_translate_route_creates_objects() {
    let generator = kong_generator(InMemoryStore::new());
    let result = generator.translate_http_route(&route("echo", ECHO_RULES)).await;

    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(
        result.objects.iter().map(|object| object.object.kind()).collect::<Vec<_>>(),
        vec![ObjectKind::Upstream, ObjectKind::Target, ObjectKind::Service, ObjectKind::Route, ObjectKind::Plugin, ObjectKind::PluginBinding]
    );
    assert!(result.objects.iter().all(|object| object.operation == Operation::Create));

    let Some(GeneratedObject::Route(kong_route)) = find(&result, ObjectKind::Route, "route.team-a.echo.0.0.0").map(|object| &object.object) else {
        panic!("route not generated");
    };
    assert_eq!(kong_route.spec.paths, vec!["~/api$", "/api/"]);
    assert_eq!(kong_route.spec.hosts, vec!["echo.example.com"]);
    assert_eq!(kong_route.spec.service_ref.as_ref().and_then(|service| service.namespaced_ref.as_ref()).map(|service| service.name.clone()), Some(echo_service()));
    assert_eq!(kong_route.owner_references().iter().map(|owner| owner.uid.as_str()).collect::<Vec<_>>(), vec!["echo-uid"]);
    assert_eq!(routes_annotation(kong_route), Some("team-a/echo".to_owned()));
    assert_eq!(kong_route.labels().get(METADATA_KEYS.managed_by), Some(&"httproute".to_owned()));

    let Some(GeneratedObject::Target(target)) = result.objects.get(1).map(|object| &object.object) else {
        panic!("target not generated");
    };
    assert_eq!(target.spec.target, "echo.team-a.svc.cluster.local:8080");
    assert_eq!(target.spec.upstream_ref.name, echo_upstream());

    let Some(GeneratedObject::PluginBinding(binding)) = find(&result, ObjectKind::PluginBinding, &binding_name("echo")).map(|object| &object.object)
    else {
        panic!("binding not generated");
    };
    assert_eq!(binding.spec.plugin_ref.name, "plugin.team-a.echo.0.0.0");
    assert_eq!(
        binding.spec.targets.as_ref().and_then(|targets| targets.route_reference.as_ref()).map(|route| route.name.as_str()),
        Some("route.team-a.echo.0.0.0")
    );
}

#[tokio::test]
pub async fn test_second_pass_is_unchanged() {
    let store = InMemoryStore::new();
    let generator = kong_generator(store.clone());
    let echo = route("echo", ECHO_RULES);

    apply(&store, &generator.translate_http_route(&echo).await);
    let result = generator.translate_http_route(&echo).await;

    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(result.objects.len(), 6);
    assert_eq!(result.changes().count(), 0);
}

#[tokio::test]
pub async fn test_shared_upstream_converges_in_either_order() {
    for order in [["first", "second"], ["second", "first"]] {
        let store = InMemoryStore::new();
        let generator = kong_generator(store.clone());
        for name in order {
            let result = generator.translate_http_route(&route(name, ECHO_RULES)).await;
            assert!(result.is_ok(), "{:?}", result.errors);
            apply(&store, &result);
        }

        let upstreams: Vec<KongUpstream> = store.list("team-a", "").await.unwrap();
        assert_eq!(upstreams.len(), 1);
        assert_eq!(upstreams[0].name_any(), echo_upstream());
        assert_eq!(routes_annotation(&upstreams[0]), Some("team-a/first,team-a/second".to_owned()));

        let mut owners = upstreams[0].owner_references().iter().map(|owner| (owner.uid.as_str(), owner.controller)).collect::<Vec<_>>();
        owners.sort();
        assert_eq!(owners, vec![("first-uid", None), ("second-uid", None)]);

        let routes: Vec<KongRoute> = store.list("team-a", "").await.unwrap();
        assert_eq!(routes.len(), 2);
    }
}

#[tokio::test]
pub async fn test_lookalike_backends_get_separate_objects() {
    let store = InMemoryStore::new();
    let generator = kong_generator(store.clone());
    let alpha = route(
        "alpha",
        "
  - backendRefs:
    - name: y
      namespace: ns-x
      port: 80
",
    );
    let beta = route(
        "beta",
        "
  - backendRefs:
    - name: x-y
      namespace: ns
      port: 80
",
    );

    let alpha_upstream = upstream_name(json!({"name": "y", "namespace": "ns-x", "port": 80}));
    let beta_upstream = upstream_name(json!({"name": "x-y", "namespace": "ns", "port": 80}));
    assert_ne!(alpha_upstream, beta_upstream);

    apply(&store, &generator.translate_http_route(&alpha).await);
    let result = generator.translate_http_route(&beta).await;
    assert!(result.is_ok(), "{:?}", result.errors);
    for kind in [ObjectKind::Upstream, ObjectKind::Target, ObjectKind::Service] {
        let object = result.objects.iter().find(|object| object.object.kind() == kind).unwrap();
        assert_eq!(object.operation, Operation::Create, "{kind}");
    }
    assert_eq!(find(&result, ObjectKind::Upstream, &beta_upstream).map(|object| object.operation), Some(Operation::Create));
    apply(&store, &result);

    let untouched: Option<KongUpstream> = store.get("team-a", &alpha_upstream).await.unwrap();
    assert_eq!(untouched.as_ref().and_then(routes_annotation), Some("team-a/alpha".to_owned()));
}

#[tokio::test]
pub async fn test_naming_collision_skips_rule() {
    let store = InMemoryStore::new();
    let foreign = KongRouteBuilder::new()
        .with_name("route.team-a.echo.0.0.0")
        .with_namespace("team-a")
        .with_backref(BackrefAnnotation::routes(), &ResourceKey::http_route("other", "team-a"))
        .must_build();
    store.create(&foreign).unwrap();

    let result = kong_generator(store.clone()).translate_http_route(&route("echo", ECHO_RULES)).await;

    assert!(result.objects.is_empty());
    assert_eq!(result.errors.len(), 1);
    let Some(GeneratorError::NamingCollision { kind, name, owners }) = result.errors.first() else {
        panic!("expected a naming collision {:?}", result.errors);
    };
    assert_eq!((*kind, name.as_str(), owners.clone()), (ObjectKind::Route, "route.team-a.echo.0.0.0", vec!["team-a/other".to_owned()]));

    let untouched: Option<KongRoute> = store.get("team-a", "route.team-a.echo.0.0.0").await.unwrap();
    assert_eq!(untouched.as_ref().and_then(routes_annotation), Some("team-a/other".to_owned()));
}

#[tokio::test]
pub async fn test_stale_objects_are_released() {
    let store = InMemoryStore::new();
    let generator = kong_generator(store.clone());
    apply(&store, &generator.translate_http_route(&route("echo", ECHO_RULES)).await);

    let moved = route(
        "echo",
        "
  - matches:
    - path:
        type: PathPrefix
        value: /api
    backendRefs:
    - name: echo-v2
      port: 8080
",
    );
    let result = generator.translate_http_route(&moved).await;
    assert!(result.is_ok(), "{:?}", result.errors);

    let released = find(&result, ObjectKind::Upstream, &echo_upstream()).unwrap();
    assert_eq!(released.operation, Operation::Update);
    let GeneratedObject::Upstream(upstream) = &released.object else {
        panic!("not an upstream");
    };
    assert_eq!(routes_annotation(upstream), None);

    for (kind, name) in [(ObjectKind::Plugin, "plugin.team-a.echo.0.0.0".to_owned()), (ObjectKind::Service, echo_service())] {
        assert_eq!(find(&result, kind, &name).map(|object| object.operation), Some(Operation::Update), "{kind} {name}");
    }
    let moved_upstream = upstream_name(json!({"name": "echo-v2", "port": 8080}));
    assert_eq!(find(&result, ObjectKind::Upstream, &moved_upstream).map(|object| object.operation), Some(Operation::Create));
    assert_eq!(find(&result, ObjectKind::Route, "route.team-a.echo.0.0.0").map(|object| object.operation), Some(Operation::Update));
}

#[tokio::test]
pub async fn test_failed_pass_keeps_stale_objects() {
    let store = InMemoryStore::new();
    let generator = kong_generator(store.clone());
    apply(&store, &generator.translate_http_route(&route("echo", ECHO_RULES)).await);

    let broken = route(
        "echo",
        "
  - filters:
    - type: RequestHeaderModifier
    backendRefs:
    - name: echo-v2
      port: 8080
",
    );
    let result = generator.translate_http_route(&broken).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.objects.is_empty());
}

#[tokio::test]
pub async fn test_release_http_route() {
    let store = InMemoryStore::new();
    let generator = kong_generator(store.clone());
    for name in ["first", "second"] {
        apply(&store, &generator.translate_http_route(&route(name, ECHO_RULES)).await);
    }

    let result = generator.release_http_route(&ResourceKey::http_route("first", "team-a")).await;
    assert!(result.errors.is_empty());

    let Some(GeneratedObject::Upstream(upstream)) = result.objects.iter().map(|object| &object.object).find(|object| object.kind() == ObjectKind::Upstream) else {
        panic!("upstream not released");
    };
    assert_eq!(routes_annotation(upstream), Some("team-a/second".to_owned()));
    assert_eq!(upstream.owner_references().iter().map(|owner| owner.uid.as_str()).collect::<Vec<_>>(), vec!["second-uid"]);

    let mut orphaned: Vec<_> = result.orphaned.iter().map(|(kind, _, name)| (*kind, name.clone())).collect();
    orphaned.sort();
    assert_eq!(
        orphaned,
        vec![
            (ObjectKind::Route, "route.team-a.first.0.0.0".to_owned()),
            (ObjectKind::Plugin, "plugin.team-a.first.0.0.0".to_owned()),
            (ObjectKind::PluginBinding, binding_name("first")),
        ]
    );

    for object in &result.objects {
        object.apply(&store).unwrap();
    }
    let second = generator.release_http_route(&ResourceKey::http_route("first", "team-a")).await;
    assert!(second.objects.is_empty());
}

#[tokio::test]
pub async fn test_prefix_rewrite_plugin_per_match() {
    let generator = kong_generator(InMemoryStore::new());
    let rewrite = route(
        "echo",
        "
  - matches:
    - path:
        type: PathPrefix
        value: /api/v1
    - path:
        type: PathPrefix
        value: /
    filters:
    - type: URLRewrite
      urlRewrite:
        path:
          type: ReplacePrefixMatch
          replacePrefixMatch: /api/v2
    backendRefs:
    - name: echo
      port: 8080
",
    );
    let result = generator.translate_http_route(&rewrite).await;
    assert!(result.is_ok(), "{:?}", result.errors);

    let uris: Vec<_> = result
        .objects
        .iter()
        .filter_map(|object| match &object.object {
            GeneratedObject::Plugin(plugin) => Some((plugin.name_any(), plugin.spec.config.as_ref().and_then(|config| config["replace"]["uri"].as_str()).map(ToOwned::to_owned))),
            _ => None,
        })
        .collect();
    assert_eq!(
        uris,
        vec![
            ("plugin.team-a.echo.0.0.0.0".to_owned(), Some("/api/v2$(uri_captures[1])".to_owned())),
            ("plugin.team-a.echo.0.0.0.1".to_owned(), Some(r#"/api/v2$(uri_captures[1] == nil and "" or "/" .. uri_captures[1])"#.to_owned())),
        ]
    );

    let Some(GeneratedObject::Route(first)) = find(&result, ObjectKind::Route, "route.team-a.echo.0.0.0").map(|object| &object.object) else {
        panic!("route not generated");
    };
    assert_eq!(first.spec.paths, vec!["~/api/v1$", "~/api/v1(/.*)"]);
    assert_eq!(result.objects.iter().filter(|object| object.object.kind() == ObjectKind::PluginBinding).count(), 2);
}

#[tokio::test]
pub async fn test_extension_ref_binds_existing_plugin() {
    let store = InMemoryStore::new();
    let rules = "
  - filters:
    - type: ExtensionRef
      extensionRef:
        group: configuration.konghq.com
        kind: KongPlugin
        name: rate-limit
    backendRefs:
    - name: echo
      port: 8080
";

    let missing = kong_generator(store.clone()).translate_http_route(&route("echo", rules)).await;
    assert!(matches!(missing.errors.as_slice(), [GeneratorError::ReferenceNotFound { kind: ObjectKind::Plugin, .. }]), "{:?}", missing.errors);

    let plugin = KongPluginBuilder::new()
        .with_name("rate-limit")
        .with_namespace("team-a")
        .with_configuration(PluginConfiguration { plugin_name: "rate-limiting".to_owned(), config: serde_json::json!({"minute": 5}) })
        .must_build();
    store.create(&plugin).unwrap();

    let result = kong_generator(store.clone()).translate_http_route(&route("echo", rules)).await;
    assert!(result.is_ok(), "{:?}", result.errors);
    assert!(result.objects.iter().all(|object| object.object.kind() != ObjectKind::Plugin));

    let Some(GeneratedObject::PluginBinding(binding)) = result.objects.iter().map(|object| &object.object).find(|object| object.kind() == ObjectKind::PluginBinding) else {
        panic!("binding not generated");
    };
    assert_eq!(binding.spec.plugin_ref.name, "rate-limit");
    assert_eq!(binding.name_any(), names::binding_name("team-a", "rate-limit", "route.team-a.echo.0.0.0"));

    let foreign = route(
        "foreign",
        "
  - filters:
    - type: ExtensionRef
      extensionRef:
        group: example.com
        kind: Custom
        name: thing
",
    );
    let result = kong_generator(store).translate_http_route(&foreign).await;
    assert!(matches!(result.errors.as_slice(), [GeneratorError::UnsupportedReference { .. }]), "{:?}", result.errors);
}

#[tokio::test]
pub async fn test_non_service_backend_is_rejected() {
    let result = kong_generator(InMemoryStore::new())
        .translate_http_route(&route(
            "echo",
            "
  - backendRefs:
    - name: bucket
      group: storage.example.com
      kind: Bucket
",
        ))
        .await;
    assert!(matches!(result.errors.as_slice(), [GeneratorError::UnsupportedBackend { .. }]), "{:?}", result.errors);
    assert!(result.objects.is_empty());
}

const GATEWAY: &str = r"
apiVersion: gateway.networking.k8s.io/v1
kind: Gateway
metadata:
  name: edge
  namespace: infra
  uid: edge-uid
spec:
  gatewayClassName: kong
  listeners:
  - name: https
    hostname: echo.example.com
    port: 443
    protocol: HTTPS
    tls:
      certificateRefs:
      - name: echo-tls
  - name: http
    port: 80
    protocol: HTTP
";

#[tokio::test]
pub async fn test_gateway_certificates() {
    let store = InMemoryStore::new();
    let gateway: Gateway = serde_yaml::from_str(GATEWAY).unwrap();

    let missing = kong_generator(store.clone()).translate_gateway(&gateway).await;
    assert!(matches!(missing.errors.as_slice(), [GeneratorError::ReferenceNotFound { kind: ObjectKind::Certificate, .. }]), "{:?}", missing.errors);

    let secret: Secret = serde_yaml::from_str(
        r"
apiVersion: v1
kind: Secret
metadata:
  name: echo-tls
  namespace: infra
type: kubernetes.io/tls
stringData:
  tls.crt: CERT
  tls.key: KEY
",
    )
    .unwrap();
    store.create(&secret).unwrap();

    let result = kong_generator(store).translate_gateway(&gateway).await;
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(result.objects.len(), 2);

    let Some(GeneratedObject::Certificate(certificate)) = find(&result, ObjectKind::Certificate, "cert.infra.edge.0.0").map(|object| &object.object) else {
        panic!("certificate not generated");
    };
    assert_eq!((certificate.spec.cert.as_str(), certificate.spec.key.as_str()), ("CERT", "KEY"));
    assert_eq!(certificate.annotations().get(METADATA_KEYS.gateways), Some(&"infra/edge".to_owned()));
    assert_eq!(certificate.owner_references().iter().map(|owner| owner.kind.as_str()).collect::<Vec<_>>(), vec!["Gateway"]);

    let Some(GeneratedObject::SNI(sni)) = find(&result, ObjectKind::SNI, "sni.infra.edge.0").map(|object| &object.object) else {
        panic!("sni not generated");
    };
    assert_eq!(sni.spec.name, "echo.example.com");
    assert_eq!(sni.spec.certificate_ref.name, "cert.infra.edge.0.0");
}
