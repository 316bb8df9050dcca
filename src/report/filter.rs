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

use serde::{Deserialize, Serialize};

/// One predicate against a semi-structured log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub key: String,
    pub compare: FilterCompare,
    pub value: String,
}

impl FilterCondition {
    pub fn new(key: impl Into<String>, compare: FilterCompare, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            compare,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCompare {
    Matches,
    Is,
}

/// Compiles filters into a single boolean expression joined with `AND`.
///
/// Values are interpolated verbatim: callers must only pass values they
/// trust or have checked with [`crate::execute::validate_filters`].
pub fn generate_regexp_where(filters: &[FilterCondition], prepend: bool) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let conditions = join_conditions(filters);
    if prepend {
        format!("WHERE {conditions}")
    } else {
        conditions
    }
}

/// Continues an existing `WHERE` clause; empty when there is nothing to add.
pub fn and_conditions(filters: &[FilterCondition]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    format!("AND {}", generate_regexp_where(filters, false))
}

fn join_conditions(filters: &[FilterCondition]) -> String {
    filters
        .iter()
        .map(condition_clause)
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn condition_clause(filter: &FilterCondition) -> String {
    let key = normalize_key(&filter.key);
    let value = &filter.value;
    match filter.compare {
        FilterCompare::Matches => format!("REGEXP_CONTAINS({key}, '{value}')"),
        FilterCompare::Is => format!("{key} = {value}"),
    }
}

/// Reduces a dotted path to its last two segments, the alias depth used by the
/// `unnest` joins of the report templates. Shorter keys are returned as-is.
pub fn normalize_key(key: &str) -> &str {
    let Some(last_dot) = key.rfind('.') else {
        return key;
    };
    match key[..last_dot].rfind('.') {
        Some(prev_dot) => &key[prev_dot + 1..],
        None => key,
    }
}
