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

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::{FilterCondition, and_conditions, generate_regexp_where};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Preset {
    Api,
    Auth,
    Storage,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Api, Preset::Auth, Preset::Storage];

    pub fn config(self) -> &'static PresetConfig {
        match self {
            Preset::Api => &API_PRESET,
            Preset::Auth => &AUTH_PRESET,
            Preset::Storage => &STORAGE_PRESET,
        }
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Api => write!(f, "API"),
            Preset::Auth => write!(f, "AUTH"),
            Preset::Storage => write!(f, "STORAGE"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown report preset `{0}`")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Preset::Api),
            "auth" => Ok(Preset::Auth),
            "storage" => Ok(Preset::Storage),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Logs,
}

pub type SqlTemplate = fn(&[FilterCondition]) -> String;

pub struct ReportQuery {
    pub name: &'static str,
    pub query_type: QueryType,
    pub sql: SqlTemplate,
}

impl ReportQuery {
    pub fn render(&self, filters: &[FilterCondition]) -> String {
        (self.sql)(filters)
    }
}

pub struct PresetConfig {
    pub title: &'static str,
    pub queries: &'static [ReportQuery],
}

impl PresetConfig {
    pub fn query(&self, name: &str) -> Option<&ReportQuery> {
        self.queries.iter().find(|query| query.name == name)
    }

    pub fn query_names(&self) -> Vec<&'static str> {
        self.queries.iter().map(|query| query.name).collect()
    }
}

pub struct RenderedQuery {
    pub name: &'static str,
    pub query_type: QueryType,
    pub sql: String,
}

/// Renders every query of a preset in registry order.
pub fn render_preset(preset: Preset, filters: &[FilterCondition]) -> Vec<RenderedQuery> {
    preset
        .config()
        .queries
        .iter()
        .map(|query| RenderedQuery {
            name: query.name,
            query_type: query.query_type,
            sql: query.render(filters),
        })
        .collect()
}

pub fn render_query(
    preset: Preset,
    name: &str,
    filters: &[FilterCondition],
) -> Option<RenderedQuery> {
    preset.config().query(name).map(|query| RenderedQuery {
        name: query.name,
        query_type: query.query_type,
        sql: query.render(filters),
    })
}

static API_PRESET: PresetConfig = PresetConfig {
    title: "API",
    queries: &[
        ReportQuery {
            name: "totalRequests",
            query_type: QueryType::Logs,
            sql: total_requests_sql,
        },
        ReportQuery {
            name: "errorCounts",
            query_type: QueryType::Logs,
            sql: error_counts_sql,
        },
        ReportQuery {
            name: "responseSpeed",
            query_type: QueryType::Logs,
            sql: response_speed_sql,
        },
    ],
};

static AUTH_PRESET: PresetConfig = PresetConfig {
    title: "",
    queries: &[],
};

static STORAGE_PRESET: PresetConfig = PresetConfig {
    title: "",
    queries: &[],
};

const HOURLY_TIMESTAMP: &str = "cast(timestamp_trunc(t.timestamp, hour) as datetime) as timestamp";

// Aliases two levels deep so normalized filter keys resolve (e.g. `headers.x`).
const EDGE_LOGS_SOURCE: &str = "FROM edge_logs t
  cross join unnest(metadata) as m
  cross join unnest(m.response) as response
  cross join unnest(m.request) as request
  cross join unnest(request.headers) as headers";

const HOURLY_GROUPING: &str = "GROUP BY
  timestamp
ORDER BY
  timestamp ASC";

fn total_requests_sql(filters: &[FilterCondition]) -> String {
    format!(
        "select
  {ts},
  count(t.id) as count
{source}
  {filters_clause}
{grouping}",
        ts = HOURLY_TIMESTAMP,
        source = EDGE_LOGS_SOURCE,
        filters_clause = generate_regexp_where(filters, true),
        grouping = HOURLY_GROUPING,
    )
}

fn error_counts_sql(filters: &[FilterCondition]) -> String {
    format!(
        "select
  {ts},
  count(t.id) as count
{source}
WHERE
  response.status_code >= 400
  {and}
{grouping}",
        ts = HOURLY_TIMESTAMP,
        source = EDGE_LOGS_SOURCE,
        and = and_conditions(filters),
        grouping = HOURLY_GROUPING,
    )
}

fn response_speed_sql(filters: &[FilterCondition]) -> String {
    format!(
        "select
  {ts},
  avg(response.origin_time) as avg,
  APPROX_QUANTILES(response.origin_time, 100) as quantiles
{source}
  {filters_clause}
{grouping}",
        ts = HOURLY_TIMESTAMP,
        source = EDGE_LOGS_SOURCE,
        filters_clause = generate_regexp_where(filters, true),
        grouping = HOURLY_GROUPING,
    )
}
