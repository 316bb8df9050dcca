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

//! Requests handed to the dashboard's SQL executor and parsing of its results.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    error::AppError,
    report::{FilterCompare, FilterCondition},
    table::{TableFilter, TableSchema, table_rows_count_sql},
};

/// Envelope consumed by the executor and its query cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSqlRequest {
    pub project_ref: Option<String>,
    pub connection_string: Option<String>,
    pub sql: String,
    pub query_key: Vec<Value>,
    /// False when the executor must not run the statement.
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowsCountVariables {
    pub project_ref: Option<String>,
    pub connection_string: Option<String>,
    #[serde(default)]
    pub query_key: Vec<Value>,
    pub table: Option<TableSchema>,
    pub filters: Option<Vec<TableFilter>>,
}

pub fn table_rows_count_request(vars: TableRowsCountVariables) -> ExecuteSqlRequest {
    let filters = vars.filters.as_deref().unwrap_or_default();
    let sql = table_rows_count_sql(vars.table.as_ref(), filters);

    let mut key_part = json!({
        "table": {
            "name": vars.table.as_ref().map(|table| table.name.clone()),
            "schema": vars.table.as_ref().and_then(|table| table.schema.clone()),
        }
    });
    if let (Some(filters), Some(map)) = (&vars.filters, key_part.as_object_mut()) {
        map.insert("filters".into(), json!(filters));
    }
    let mut query_key = vars.query_key;
    query_key.push(key_part);

    let enabled = vars.project_ref.is_some() && vars.table.is_some();
    ExecuteSqlRequest {
        project_ref: vars.project_ref,
        connection_string: vars.connection_string,
        sql,
        query_key,
        enabled,
    }
}

/// Raw executor output.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteSqlData {
    pub result: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableRowsCount {
    pub count: u64,
}

impl TableRowsCount {
    pub fn select(data: &ExecuteSqlData) -> Result<Self, AppError> {
        let row = data
            .result
            .first()
            .ok_or_else(|| AppError::BadRequest("row count query returned no rows".into()))?;
        let count = row
            .get("count")
            .ok_or_else(|| AppError::BadRequest("row count result has no `count` field".into()))?;
        Ok(Self {
            count: value_to_u64(count)?,
        })
    }
}

fn value_to_u64(value: &Value) -> Result<u64, AppError> {
    match value {
        Value::Null => Ok(0),
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.trunc() as u64))
            .ok_or_else(|| AppError::BadRequest(format!("unexpected count value: {number}"))),
        Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|err| AppError::BadRequest(format!("failed to parse count as u64: {err}"))),
        other => Err(AppError::BadRequest(format!(
            "unexpected count value type: {other}"
        ))),
    }
}

/// Rejects report filters whose key or value would not survive verbatim
/// interpolation into the report templates.
pub fn validate_filters(filters: &[FilterCondition]) -> Result<(), AppError> {
    filters.iter().try_for_each(validate_filter)
}

fn validate_filter(filter: &FilterCondition) -> Result<(), AppError> {
    if filter.key.is_empty() || !filter.key.chars().all(is_key_char) {
        return Err(AppError::BadRequest(format!(
            "filter key `{}` must be a dotted path of letters, digits, `_` or `-`",
            filter.key
        )));
    }
    match filter.compare {
        FilterCompare::Matches => {
            if filter.value.contains(['\'', '\n', '\r']) {
                return Err(AppError::BadRequest(format!(
                    "pattern for `{}` cannot contain quotes or line breaks",
                    filter.key
                )));
            }
            if ends_with_escape(&filter.value) {
                return Err(AppError::BadRequest(format!(
                    "pattern for `{}` cannot end with an unescaped backslash",
                    filter.key
                )));
            }
        }
        FilterCompare::Is => {
            if !is_safe_literal(&filter.value) {
                return Err(AppError::BadRequest(format!(
                    "value for `{}` must be a quoted string, a number, true, false or null, found `{}`",
                    filter.key, filter.value
                )));
            }
        }
    }
    Ok(())
}

/// An odd run of trailing backslashes escapes the closing quote of the literal.
fn ends_with_escape(pattern: &str) -> bool {
    let trailing = pattern.chars().rev().take_while(|ch| *ch == '\\').count();
    trailing % 2 == 1
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

fn is_safe_literal(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return !trimmed[1..trimmed.len() - 1].contains(['\'', '\\']);
    }
    if matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "true" | "false" | "null"
    ) {
        return true;
    }
    trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}
