mod query;

pub use query::{CountQuery, FilterOperator, FilterValue, Query, QueryAction, UnknownOperator};

use log::debug;
use serde::{Deserialize, Serialize};

/// Column formats that accept numeric literals in filters.
pub const NUMERICAL_COLUMN_TYPES: [&str; 6] = ["int2", "int4", "int8", "float4", "float8", "numeric"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFilter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<String>,
}

impl TableFilter {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: Some(value.into()),
        }
    }

    fn constrains(&self) -> bool {
        self.value.as_deref().is_some_and(|value| !value.is_empty())
    }
}

pub fn is_numerical_column(format: &str) -> bool {
    NUMERICAL_COLUMN_TYPES.contains(&format.trim().to_ascii_lowercase().as_str())
}

/// Builds the row-count statement for `table`; empty when no table is selected.
///
/// Filters without a value are skipped.
pub fn table_rows_count_sql(table: Option<&TableSchema>, filters: &[TableFilter]) -> String {
    let Some(table) = table else {
        return String::new();
    };
    let mut query = Query::new()
        .from(&table.name, table.schema.as_deref())
        .count();
    for filter in filters.iter().filter(|filter| filter.constrains()) {
        let value = format_filter_value(table, filter);
        query = query.filter(&filter.column, filter.operator, value);
    }
    let sql = query.to_sql();
    debug!("row count SQL for `{}`: {}", table.name, sql);
    sql
}

/// Coerces the filter value to a number when the column is numerical.
///
/// A non-numeric value on a numerical column passes through unchanged until the
/// filter UI validates input against the column type.
pub fn format_filter_value(table: &TableSchema, filter: &TableFilter) -> FilterValue {
    let raw = filter.value.clone().unwrap_or_default();
    let numerical = table
        .columns
        .iter()
        .find(|column| column.name == filter.column)
        .is_some_and(|column| is_numerical_column(&column.format));
    if !numerical {
        return FilterValue::Text(raw);
    }
    match parse_number(&raw) {
        Some(number) => FilterValue::Number(number),
        None => FilterValue::Text(raw),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
