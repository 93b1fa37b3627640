// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use clap::Parser;
use futures::future;
use gateway_api::apis::standard::{gateways::Gateway, httproutes::HTTPRoute};
use kube::Client;
use kubvernor_kong::{
    backends::kong::{ControlPlaneResolver, KongResourceGenerator, TranslationResult},
    configuration::{Configuration, ControlPlaneRegistry},
    state::{InMemoryStore, KubeStore, ObjectStore},
};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

pub enum Guard {
    Appender(WorkerGuard),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CommandArgs {
    #[arg(long)]
    with_config_file: String,
    #[arg(long)]
    route: Vec<String>,
    #[arg(long)]
    gateway: Vec<String>,
    #[arg(long, default_value_t = false)]
    offline: bool,
}

fn init_tracing_logging() -> Guard {
    let registry = Registry::default();
    let file_appender = tracing_appender::rolling::never(".", "kubvernor-kong.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);
    let file_filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_FILE_LOG").unwrap_or_else(|_| "debug".to_owned()));
    let console_filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()));

    let console_layer = fmt::layer()
        .event_format(fmt::format().compact())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(false)
        .with_filter(filter::filter_fn(|meta| !meta.is_span()))
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_appender)
        .with_span_events(FmtSpan::NONE)
        .with_target(true)
        .with_ansi(false)
        .with_filter(filter::filter_fn(|meta| !meta.is_span()))
        .with_filter(file_filter);

    registry.with(console_layer).with(file_layer).init();
    Guard::Appender(guard)
}

fn load<T: DeserializeOwned>(path: &str) -> kubvernor_kong::Result<T> {
    Ok(serde_yaml::from_str(&std::fs::read_to_string(path)?)?)
}

fn print(result: &TranslationResult) -> kubvernor_kong::Result<()> {
    for object in &result.objects {
        info!("{object}");
        println!("---\n{}", object.object.to_yaml()?);
    }
    for e in &result.errors {
        error!("{e}");
    }
    Ok(())
}

// routes are independent of each other so they run concurrently
async fn translate_online<R: ControlPlaneResolver>(
    generator: &KongResourceGenerator<KubeStore, R>,
    routes: &[HTTPRoute],
    gateways: &[Gateway],
) -> kubvernor_kong::Result<usize> {
    let mut results = future::join_all(gateways.iter().map(|gateway| generator.translate_gateway(gateway))).await;
    results.extend(future::join_all(routes.iter().map(|route| generator.translate_http_route(route))).await);
    for result in &results {
        print(result)?;
    }
    Ok(results.iter().map(|result| result.errors.len()).sum())
}

// later routes have to see the objects shared with earlier ones
async fn translate_offline<R: ControlPlaneResolver>(
    generator: &KongResourceGenerator<InMemoryStore, R>,
    routes: &[HTTPRoute],
    gateways: &[Gateway],
) -> kubvernor_kong::Result<usize> {
    let mut failures = 0;
    for gateway in gateways {
        let result = generator.translate_gateway(gateway).await;
        failures += apply(generator.store(), &result)?;
    }
    for route in routes {
        let result = generator.translate_http_route(route).await;
        failures += apply(generator.store(), &result)?;
    }
    Ok(failures)
}

fn apply(store: &InMemoryStore, result: &TranslationResult) -> kubvernor_kong::Result<usize> {
    print(result)?;
    for object in &result.objects {
        object.apply(store)?;
    }
    Ok(result.errors.len())
}

fn build_generator<S: ObjectStore>(store: S, configuration: &Configuration) -> KongResourceGenerator<S, ControlPlaneRegistry> {
    let generator = KongResourceGenerator::builder()
        .store(store)
        .resolver(configuration.control_planes())
        .cluster_domain(configuration.cluster_domain.clone());
    match &configuration.upstream_algorithm {
        Some(algorithm) => generator.upstream_algorithm(algorithm.clone()).build(),
        None => generator.build(),
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> kubvernor_kong::Result<()> {
    let args = CommandArgs::parse();
    let configuration: Configuration = load(&args.with_config_file)?;
    let _guard = init_tracing_logging();
    configuration.validate()?;
    info!("Starting {}", configuration.controller_name);

    let routes = args.route.iter().map(|path| load::<HTTPRoute>(path)).collect::<kubvernor_kong::Result<Vec<_>>>()?;
    let gateways = args.gateway.iter().map(|path| load::<Gateway>(path)).collect::<kubvernor_kong::Result<Vec<_>>>()?;

    let failures = if args.offline {
        let generator = build_generator(InMemoryStore::new(), &configuration);
        translate_offline(&generator, &routes, &gateways).await?
    } else {
        let generator = build_generator(KubeStore::new(Client::try_default().await?), &configuration);
        translate_online(&generator, &routes, &gateways).await?
    };

    if failures > 0 {
        return Err(format!("{failures} translation errors").into());
    }
    Ok(())
}
