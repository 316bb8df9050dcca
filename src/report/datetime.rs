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

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A preset range offered by the report date picker.
#[derive(Debug, Clone, Copy)]
pub struct DatetimeHelper {
    pub text: &'static str,
    pub lookback_days: i64,
    pub default: bool,
}

impl DatetimeHelper {
    /// Start of the UTC day `lookback_days` before `now`.
    pub fn calc_from(&self, now: DateTime<Utc>) -> String {
        let day = (now - Duration::days(self.lookback_days)).date_naive();
        iso_string(day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Ranges are open ended.
    pub fn calc_to(&self, _now: DateTime<Utc>) -> String {
        String::new()
    }
}

pub const REPORTS_DATEPICKER_HELPERS: [DatetimeHelper; 4] = [
    DatetimeHelper {
        text: "Last 24 hours",
        lookback_days: 1,
        default: true,
    },
    DatetimeHelper {
        text: "Last 7 days",
        lookback_days: 7,
        default: false,
    },
    // Lookback follows the label.
    DatetimeHelper {
        text: "Last 14 days",
        lookback_days: 14,
        default: false,
    },
    DatetimeHelper {
        text: "Last 30 days",
        lookback_days: 30,
        default: false,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub iso_timestamp_start: String,
    pub iso_timestamp_end: String,
}

impl QueryParams {
    /// Fills whichever bound is missing from the default range.
    pub fn resolve(start: Option<String>, end: Option<String>, now: DateTime<Utc>) -> Self {
        let defaults = default_query_params(now);
        Self {
            iso_timestamp_start: start.unwrap_or(defaults.iso_timestamp_start),
            iso_timestamp_end: end.unwrap_or(defaults.iso_timestamp_end),
        }
    }
}

pub fn default_helper() -> &'static DatetimeHelper {
    REPORTS_DATEPICKER_HELPERS
        .iter()
        .find(|helper| helper.default)
        .unwrap_or(&REPORTS_DATEPICKER_HELPERS[0])
}

pub fn default_query_params(now: DateTime<Utc>) -> QueryParams {
    let helper = default_helper();
    QueryParams {
        iso_timestamp_start: helper.calc_from(now),
        iso_timestamp_end: helper.calc_to(now),
    }
}

fn iso_string(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 17, 42, 5).unwrap()
    }

    #[test]
    fn helpers_start_at_beginning_of_day() {
        let from: Vec<_> = REPORTS_DATEPICKER_HELPERS
            .iter()
            .map(|helper| helper.calc_from(now()))
            .collect();
        assert_eq!(
            from,
            vec![
                "2024-03-14T00:00:00.000Z",
                "2024-03-08T00:00:00.000Z",
                "2024-03-01T00:00:00.000Z",
                "2024-02-14T00:00:00.000Z",
            ]
        );
    }

    #[test]
    fn helpers_are_open_ended() {
        assert!(
            REPORTS_DATEPICKER_HELPERS
                .iter()
                .all(|helper| helper.calc_to(now()).is_empty())
        );
    }

    #[test]
    fn default_params_use_last_24_hours() {
        assert_eq!(default_helper().text, "Last 24 hours");
        let params = default_query_params(now());
        assert_eq!(params.iso_timestamp_start, "2024-03-14T00:00:00.000Z");
        assert_eq!(params.iso_timestamp_end, "");
    }

    #[test]
    fn resolve_keeps_explicit_bounds() {
        let params = QueryParams::resolve(None, Some("2024-03-15T12:00:00.000Z".into()), now());
        assert_eq!(params.iso_timestamp_start, "2024-03-14T00:00:00.000Z");
        assert_eq!(params.iso_timestamp_end, "2024-03-15T12:00:00.000Z");
    }
}
