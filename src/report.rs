mod datetime;
mod filter;
mod presets;

pub use datetime::{
    DatetimeHelper, QueryParams, REPORTS_DATEPICKER_HELPERS, default_helper, default_query_params,
};
pub use filter::{FilterCompare, FilterCondition, and_conditions, generate_regexp_where, normalize_key};
pub use presets::{
    Preset, PresetConfig, QueryType, RenderedQuery, ReportQuery, UnknownPreset, render_preset,
    render_query,
};
