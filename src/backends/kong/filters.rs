// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use gateway_api::apis::standard::httproutes::{
    HTTPRouteRulesFilters, HTTPRouteRulesFiltersRequestRedirect, HTTPRouteRulesFiltersRequestRedirectPathType, HTTPRouteRulesFiltersRequestRedirectScheme,
    HTTPRouteRulesFiltersType, HTTPRouteRulesFiltersUrlRewrite, HTTPRouteRulesFiltersUrlRewritePathType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REQUEST_TRANSFORMER: &str = "request-transformer";
pub const RESPONSE_TRANSFORMER: &str = "response-transformer";
pub const REDIRECT: &str = "redirect";

const DEFAULT_REDIRECT_STATUS_CODE: i64 = 302;
const HTTP_SCHEME: &str = "http";
const HTTPS_SCHEME: &str = "https";
const ROOT_PATH: &str = "/";
const HOST_HEADER: &str = "host";
const REPLACE_FULL_PATH: &str = "ReplaceFullPath";
const REPLACE_PREFIX_MATCH: &str = "ReplacePrefixMatch";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("{0} filter has no configuration")]
    EmptyFilterConfig(&'static str),
    #[error("{0} filter can't be translated to a plugin")]
    UnsupportedFilter(&'static str),
    #[error("unsupported path modifier {0}")]
    UnsupportedPathModifier(&'static str),
    #[error("redirect to {0} needs a hostname")]
    MissingRedirectHostname(String),
    #[error("can't serialize plugin configuration {0}")]
    Serialization(String),
}

pub fn filter_type_name(filter_type: &HTTPRouteRulesFiltersType) -> &'static str {
    match filter_type {
        HTTPRouteRulesFiltersType::RequestHeaderModifier => "RequestHeaderModifier",
        HTTPRouteRulesFiltersType::ResponseHeaderModifier => "ResponseHeaderModifier",
        HTTPRouteRulesFiltersType::RequestMirror => "RequestMirror",
        HTTPRouteRulesFiltersType::RequestRedirect => "RequestRedirect",
        HTTPRouteRulesFiltersType::UrlRewrite => "URLRewrite",
        HTTPRouteRulesFiltersType::ExtensionRef => "ExtensionRef",
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransformerBucket {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl TransformerBucket {
    fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.uri.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransformerConfig {
    pub add: TransformerBucket,
    pub append: TransformerBucket,
    pub remove: TransformerBucket,
    pub replace: TransformerBucket,
}

impl TransformerConfig {
    fn is_empty(&self) -> bool {
        self.add.is_empty() && self.append.is_empty() && self.remove.is_empty() && self.replace.is_empty()
    }

    // set overwrites an existing header and adds a missing one
    fn set_header(&mut self, name: &str, value: &str) {
        self.replace.headers.push(header_entry(name, value));
        self.add.headers.push(header_entry(name, value));
    }

    fn append_header(&mut self, name: &str, value: &str) {
        self.append.headers.push(header_entry(name, value));
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RedirectConfig {
    pub status_code: i64,
    pub location: String,
    pub keep_incoming_path: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PluginConfiguration {
    pub plugin_name: String,
    pub config: serde_json::Value,
}

impl PluginConfiguration {
    fn new<T: Serialize>(plugin_name: &str, config: &T) -> Result<Self, FilterError> {
        let config = serde_json::to_value(config).map_err(|e| FilterError::Serialization(e.to_string()))?;
        Ok(Self { plugin_name: plugin_name.to_owned(), config })
    }
}

fn header_entry(name: &str, value: &str) -> String {
    format!("{name}:{value}")
}

// `matched_path` only matters for prefix rewrites
pub fn translate_filter(filter: &HTTPRouteRulesFilters, matched_path: Option<&str>) -> Result<PluginConfiguration, FilterError> {
    let filter_type = filter_type_name(&filter.r#type);
    match filter.r#type {
        HTTPRouteRulesFiltersType::RequestHeaderModifier => {
            let modifier = filter.request_header_modifier.as_ref().ok_or(FilterError::EmptyFilterConfig(filter_type))?;
            let mut config = TransformerConfig::default();
            for header in modifier.set.iter().flatten() {
                config.set_header(&header.name, &header.value);
            }
            for header in modifier.add.iter().flatten() {
                config.append_header(&header.name, &header.value);
            }
            config.remove.headers.extend(modifier.remove.iter().flatten().cloned());
            PluginConfiguration::new(REQUEST_TRANSFORMER, &non_empty(filter_type, config)?)
        },
        HTTPRouteRulesFiltersType::ResponseHeaderModifier => {
            let modifier = filter.response_header_modifier.as_ref().ok_or(FilterError::EmptyFilterConfig(filter_type))?;
            let mut config = TransformerConfig::default();
            for header in modifier.set.iter().flatten() {
                config.set_header(&header.name, &header.value);
            }
            for header in modifier.add.iter().flatten() {
                config.append_header(&header.name, &header.value);
            }
            config.remove.headers.extend(modifier.remove.iter().flatten().cloned());
            PluginConfiguration::new(RESPONSE_TRANSFORMER, &non_empty(filter_type, config)?)
        },
        HTTPRouteRulesFiltersType::RequestRedirect => {
            let redirect = filter.request_redirect.as_ref().ok_or(FilterError::EmptyFilterConfig(filter_type))?;
            PluginConfiguration::new(REDIRECT, &redirect_config(redirect)?)
        },
        HTTPRouteRulesFiltersType::UrlRewrite => {
            let rewrite = filter.url_rewrite.as_ref().ok_or(FilterError::EmptyFilterConfig(filter_type))?;
            PluginConfiguration::new(REQUEST_TRANSFORMER, &non_empty(filter_type, url_rewrite(rewrite, matched_path)?)?)
        },
        HTTPRouteRulesFiltersType::RequestMirror | HTTPRouteRulesFiltersType::ExtensionRef => Err(FilterError::UnsupportedFilter(filter_type)),
    }
}

pub fn is_match_dependent(filter: &HTTPRouteRulesFilters) -> bool {
    filter.r#type == HTTPRouteRulesFiltersType::UrlRewrite
        && filter
            .url_rewrite
            .as_ref()
            .and_then(|rewrite| rewrite.path.as_ref())
            .is_some_and(|path| path.r#type == HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch)
}

fn non_empty(filter_type: &'static str, config: TransformerConfig) -> Result<TransformerConfig, FilterError> {
    if config.is_empty() {
        Err(FilterError::EmptyFilterConfig(filter_type))
    } else {
        Ok(config)
    }
}

enum PathModifier {
    FullPath(String),
    PrefixMatch(String),
}

impl PathModifier {
    // the value has to be the one selected by the modifier type
    fn new(prefix_match: bool, full_path: Option<&str>, prefix: Option<&str>) -> Result<Self, FilterError> {
        match (prefix_match, full_path, prefix) {
            (false, None, Some(_)) => Err(FilterError::UnsupportedPathModifier(REPLACE_FULL_PATH)),
            (true, Some(_), None) => Err(FilterError::UnsupportedPathModifier(REPLACE_PREFIX_MATCH)),
            (false, path, _) => Ok(Self::FullPath(path.unwrap_or(ROOT_PATH).to_owned())),
            (true, _, prefix) => Ok(Self::PrefixMatch(prefix.unwrap_or(ROOT_PATH).to_owned())),
        }
    }
}

fn redirect_config(redirect: &HTTPRouteRulesFiltersRequestRedirect) -> Result<RedirectConfig, FilterError> {
    let path = match &redirect.path {
        Some(modifier) => Some(
            match PathModifier::new(
                modifier.r#type == HTTPRouteRulesFiltersRequestRedirectPathType::ReplacePrefixMatch,
                modifier.replace_full_path.as_deref(),
                modifier.replace_prefix_match.as_deref(),
            )? {
                PathModifier::FullPath(path) => path,
                // Kong's redirect plugin can't rewrite a prefix; the location points at the root.
                PathModifier::PrefixMatch(_) => ROOT_PATH.to_owned(),
            },
        ),
        None => None,
    };
    let keep_incoming_path = path.is_none();
    let path = path.unwrap_or_else(|| ROOT_PATH.to_owned());
    let scheme = redirect.scheme.as_ref().map(|scheme| match scheme {
        HTTPRouteRulesFiltersRequestRedirectScheme::Http => HTTP_SCHEME,
        HTTPRouteRulesFiltersRequestRedirectScheme::Https => HTTPS_SCHEME,
    });
    let port = redirect.port.map(i64::from);

    let location = match (&redirect.hostname, scheme, port) {
        (Some(hostname), scheme, port) => {
            let scheme = scheme.unwrap_or(HTTP_SCHEME);
            match port {
                Some(port) if !is_default_port(scheme, port) => format!("{scheme}://{hostname}:{port}{path}"),
                _ => format!("{scheme}://{hostname}{path}"),
            }
        },
        (None, None, None) => path,
        (None, scheme, port) => {
            let target = [scheme.map(ToOwned::to_owned), port.map(|port| format!("port {port}"))].into_iter().flatten().collect::<Vec<_>>().join(" ");
            return Err(FilterError::MissingRedirectHostname(target));
        },
    };

    Ok(RedirectConfig { status_code: redirect.status_code.map_or(DEFAULT_REDIRECT_STATUS_CODE, i64::from), location, keep_incoming_path })
}

fn is_default_port(scheme: &str, port: i64) -> bool {
    matches!((scheme, port), (HTTP_SCHEME, 80) | (HTTPS_SCHEME, 443))
}

fn url_rewrite(rewrite: &HTTPRouteRulesFiltersUrlRewrite, matched_path: Option<&str>) -> Result<TransformerConfig, FilterError> {
    let mut config = TransformerConfig::default();

    if let Some(modifier) = &rewrite.path {
        let modifier = PathModifier::new(
            modifier.r#type == HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch,
            modifier.replace_full_path.as_deref(),
            modifier.replace_prefix_match.as_deref(),
        )?;
        config.replace.uri = Some(match modifier {
            PathModifier::FullPath(path) => path,
            PathModifier::PrefixMatch(prefix) => prefix_rewrite_template(&prefix, matched_path.unwrap_or(ROOT_PATH)),
        });
    }

    if let Some(hostname) = &rewrite.hostname {
        config.set_header(HOST_HEADER, hostname);
    }

    Ok(config)
}

/// Builds the `replace.uri` template for a prefix rewrite. The route paths for such a match capture everything after the
/// matched prefix into `uri_captures[1]`, which is empty when the request path equals the prefix.
fn prefix_rewrite_template(replacement: &str, matched_path: &str) -> String {
    let replacement = replacement.trim_end_matches('/');
    let matched_path = matched_path.trim_end_matches('/');

    if replacement.is_empty() {
        r#"$(uri_captures[1] == nil and "/" or uri_captures[1])"#.to_owned()
    } else if matched_path.is_empty() {
        format!(r#"{replacement}$(uri_captures[1] == nil and "" or "/" .. uri_captures[1])"#)
    } else {
        format!("{replacement}$(uri_captures[1])")
    }
}
