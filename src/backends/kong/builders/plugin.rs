// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//
use gateway_api::apis::standard::httproutes::HTTPRouteRulesFilters;

use super::{BuildError, Builder};
use crate::{
    backends::kong::filters::{translate_filter, PluginConfiguration},
    common::kong::{KongPlugin, KongPluginSpec},
};

impl Builder<KongPlugin> {
    pub fn new() -> Self {
        Self::from_object(KongPlugin::new("", KongPluginSpec::default()))
    }

    // translation failures are reported by `build`
    #[must_use]
    pub fn with_filter(mut self, filter: &HTTPRouteRulesFilters, matched_path: Option<&str>) -> Self {
        match translate_filter(filter, matched_path) {
            Ok(configuration) => self.with_configuration(configuration),
            Err(source) => {
                self.record(BuildError::Filter { kind: Self::kind(), source });
                self
            },
        }
    }

    #[must_use]
    pub fn with_configuration(mut self, configuration: PluginConfiguration) -> Self {
        self.object.spec.plugin = configuration.plugin_name;
        self.object.spec.config = Some(configuration.config);
        self
    }
}

impl Default for Builder<KongPlugin> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use gateway_api::apis::standard::httproutes::HTTPRouteRulesFilters;
    use pretty_assertions::assert_eq;

    use crate::backends::kong::{
        builders::{BuildError, KongPluginBuilder},
        filters::FilterError,
    };

    #[test]
    pub fn test_plugin_filter_error_is_recorded() {
        let filter: HTTPRouteRulesFilters = serde_yaml::from_str("{type: RequestMirror, requestMirror: {backendRef: {name: shadow, port: 80}}}").unwrap();
        let error = KongPluginBuilder::new().with_name("p").with_namespace("team-a").with_filter(&filter, None).build().unwrap_err();
        assert_eq!(error, BuildError::Filter { kind: "KongPlugin".to_owned(), source: FilterError::UnsupportedFilter("RequestMirror") });
    }
}
