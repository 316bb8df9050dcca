// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::{
    DatetimeHelper, Preset, QueryParams, QueryType, REPORTS_DATEPICKER_HELPERS, RenderedQuery,
    default_query_params,
};

#[derive(Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    status: &'static str,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct PresetSummary {
    preset: Preset,
    title: &'static str,
    queries: Vec<&'static str>,
}

pub(crate) fn preset_summaries() -> Vec<PresetSummary> {
    Preset::ALL
        .iter()
        .map(|preset| {
            let config = preset.config();
            PresetSummary {
                preset: *preset,
                title: config.title,
                queries: config.query_names(),
            }
        })
        .collect()
}

#[derive(Serialize)]
pub(crate) struct ReportData {
    preset: Preset,
    params: QueryParams,
    queries: Vec<QuerySql>,
}

impl ReportData {
    pub(crate) fn new(preset: Preset, params: QueryParams, queries: Vec<RenderedQuery>) -> Self {
        Self {
            preset,
            params,
            queries: queries.into_iter().map(QuerySql::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct QuerySql {
    name: &'static str,
    #[serde(rename = "queryType")]
    query_type: QueryType,
    sql: String,
}

impl From<RenderedQuery> for QuerySql {
    fn from(query: RenderedQuery) -> Self {
        Self {
            name: query.name,
            query_type: query.query_type,
            sql: query.sql,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct DatepickerData {
    helpers: Vec<HelperRange>,
    defaults: QueryParams,
}

#[derive(Serialize)]
struct HelperRange {
    text: &'static str,
    from: String,
    to: String,
    default: bool,
}

impl DatepickerData {
    pub(crate) fn evaluate(now: DateTime<Utc>) -> Self {
        let helpers = REPORTS_DATEPICKER_HELPERS
            .iter()
            .map(|helper: &DatetimeHelper| HelperRange {
                text: helper.text,
                from: helper.calc_from(now),
                to: helper.calc_to(now),
                default: helper.default,
            })
            .collect();
        Self {
            helpers,
            defaults: default_query_params(now),
        }
    }
}
