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

/// Comparison operators understood by the table grid filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "~~")]
    Like,
    #[serde(rename = "~~*")]
    ILike,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    pub fn sql(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "<>",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "~~",
            FilterOperator::ILike => "~~*",
            FilterOperator::Is => "is",
            FilterOperator::In => "in",
        }
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported filter operator `{0}`")]
pub struct UnknownOperator(pub String);

impl TryFrom<String> for FilterOperator {
    type Error = UnknownOperator;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" => Ok(FilterOperator::Eq),
            "<>" | "!=" => Ok(FilterOperator::NotEq),
            ">" => Ok(FilterOperator::Gt),
            "<" => Ok(FilterOperator::Lt),
            ">=" => Ok(FilterOperator::Gte),
            "<=" => Ok(FilterOperator::Lte),
            "~~" => Ok(FilterOperator::Like),
            "~~*" => Ok(FilterOperator::ILike),
            "is" => Ok(FilterOperator::Is),
            "in" => Ok(FilterOperator::In),
            _ => Err(UnknownOperator(s.trim().to_string())),
        }
    }
}

/// A filter value after column-aware coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    fn literal(&self) -> String {
        match self {
            FilterValue::Number(number) => number_literal(*number),
            FilterValue::Text(text) => text_literal(text),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Query;

impl Query {
    pub fn new() -> Self {
        Self
    }

    pub fn from(self, table: &str, schema: Option<&str>) -> QueryAction {
        let table = match schema {
            Some(schema) if !schema.is_empty() => {
                format!("{}.{}", quote_ident(schema), quote_ident(table))
            }
            _ => quote_ident(table),
        };
        QueryAction { table }
    }
}

pub struct QueryAction {
    table: String,
}

impl QueryAction {
    pub fn count(self) -> CountQuery {
        CountQuery {
            table: self.table,
            filters: Vec::new(),
        }
    }
}

pub struct CountQuery {
    table: String,
    filters: Vec<String>,
}

impl CountQuery {
    pub fn filter(mut self, column: &str, operator: FilterOperator, value: FilterValue) -> Self {
        self.filters.push(filter_clause(column, operator, &value));
        self
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("select count(*) from {}", self.table);
        if !self.filters.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.filters.join(" and "));
        }
        sql.push(';');
        sql
    }
}

fn filter_clause(column: &str, operator: FilterOperator, value: &FilterValue) -> String {
    let column = quote_ident(column);
    let rendered = match (operator, value) {
        (FilterOperator::Is, FilterValue::Text(text)) => {
            is_keyword(text).unwrap_or_else(|| value.literal())
        }
        (FilterOperator::In, FilterValue::Text(text)) => {
            let items: Vec<String> = text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(text_literal)
                .collect();
            format!("({})", items.join(", "))
        }
        (FilterOperator::In, FilterValue::Number(_)) => format!("({})", value.literal()),
        _ => value.literal(),
    };
    format!("{column} {operator} {rendered}")
}

fn is_keyword(text: &str) -> Option<String> {
    let lower = text.trim().to_ascii_lowercase();
    match lower.as_str() {
        "null" | "not null" | "true" | "false" => Some(lower),
        _ => None,
    }
}

fn text_literal(text: &str) -> String {
    format!("'{}'", escape(text))
}

pub(crate) fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn number_literal(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    format!("{value}")
}
