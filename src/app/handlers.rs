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

use std::time::Instant;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppError,
    execute::{
        ExecuteSqlData, ExecuteSqlRequest, TableRowsCount, TableRowsCountVariables,
        table_rows_count_request,
    },
    report::{FilterCondition, Preset, QueryParams, render_preset, render_query},
};

use super::{
    responses::{ApiResponse, DatepickerData, PresetSummary, ReportData, preset_summaries},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/reports", get(list_presets))
        .route("/api/v1/reports/datepicker", get(datepicker))
        .route("/api/v1/reports/{preset}", post(preset_report))
        .route("/api/v1/reports/{preset}/queries/{query}", post(single_report))
        .route("/api/v1/table-rows/count", post(table_rows_count))
        .route("/api/v1/table-rows/count/result", post(table_rows_count_result))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
}

#[derive(Debug, Default, Deserialize)]
struct ReportRequest {
    #[serde(default)]
    filters: Vec<FilterCondition>,
    iso_timestamp_start: Option<String>,
    iso_timestamp_end: Option<String>,
}

impl ReportRequest {
    fn params(&mut self) -> QueryParams {
        QueryParams::resolve(
            self.iso_timestamp_start.take(),
            self.iso_timestamp_end.take(),
            Utc::now(),
        )
    }
}

async fn list_presets() -> Json<ApiResponse<Vec<PresetSummary>>> {
    Json(ApiResponse::success(preset_summaries()))
}

async fn datepicker() -> Json<ApiResponse<DatepickerData>> {
    Json(ApiResponse::success(DatepickerData::evaluate(Utc::now())))
}

async fn preset_report(
    State(state): State<AppState>,
    Path(preset): Path<String>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReportData>>, AppError> {
    let preset: Preset = preset.parse()?;
    let Json(mut request) = payload?;
    state.check_filters(&request.filters)?;
    let queries = render_preset(preset, &request.filters);
    log::debug!(
        "rendered {} queries for preset {} with {} filters",
        queries.len(),
        preset,
        request.filters.len()
    );
    let params = request.params();
    Ok(Json(ApiResponse::success(ReportData::new(
        preset, params, queries,
    ))))
}

async fn single_report(
    State(state): State<AppState>,
    Path((preset, query)): Path<(String, String)>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReportData>>, AppError> {
    let preset: Preset = preset.parse()?;
    let Json(mut request) = payload?;
    state.check_filters(&request.filters)?;
    let rendered = render_query(preset, &query, &request.filters).ok_or_else(|| {
        AppError::NotFound(format!("preset {preset} has no query named `{query}`"))
    })?;
    log::debug!("report SQL for {preset}/{query}: {}", rendered.sql);
    let params = request.params();
    Ok(Json(ApiResponse::success(ReportData::new(
        preset,
        params,
        vec![rendered],
    ))))
}

async fn table_rows_count(
    payload: Result<Json<TableRowsCountVariables>, JsonRejection>,
) -> Result<Json<ApiResponse<ExecuteSqlRequest>>, AppError> {
    let Json(vars) = payload?;
    let request = table_rows_count_request(vars);
    if !request.enabled {
        log::debug!("row count request disabled: project or table missing");
    }
    Ok(Json(ApiResponse::success(request)))
}

async fn table_rows_count_result(
    payload: Result<Json<ExecuteSqlData>, JsonRejection>,
) -> Result<Json<ApiResponse<TableRowsCount>>, AppError> {
    let Json(data) = payload?;
    Ok(Json(ApiResponse::success(TableRowsCount::select(&data)?)))
}

async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();
    let response = next.run(req).await;
    let status = response.status();
    let elapsed = start.elapsed();
    log::info!(
        "method={} path={} status={} duration_ms={:.3}",
        method,
        uri.path(),
        status.as_u16(),
        elapsed.as_secs_f64() * 1000.0
    );
    response
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::router;
    use crate::app::{AppConfig, AppState};

    fn app(allow_raw_filters: bool) -> axum::Router {
        router(AppState::new(AppConfig { allow_raw_filters }))
    }

    async fn send(router: axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn lists_presets() {
        let request = Request::builder()
            .uri("/api/v1/reports")
            .body(Body::empty())
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"][0]["preset"], "API");
        assert_eq!(
            body["data"][0]["queries"],
            json!(["totalRequests", "errorCounts", "responseSpeed"])
        );
        assert_eq!(body["data"][1]["queries"], json!([]));
    }

    #[tokio::test]
    async fn renders_single_query_with_filters() {
        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/reports/api/queries/totalRequests",
            json!({
                "filters": [{"key": "m.request.headers.x", "compare": "is", "value": "'GET'"}],
                "iso_timestamp_start": "2024-03-14T00:00:00.000Z"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sql = body["data"]["queries"][0]["sql"].as_str().unwrap();
        assert!(sql.contains("WHERE headers.x = 'GET'"));
        assert_eq!(body["data"]["queries"][0]["queryType"], "logs");
        assert_eq!(
            body["data"]["params"]["iso_timestamp_start"],
            "2024-03-14T00:00:00.000Z"
        );
        assert_eq!(body["data"]["params"]["iso_timestamp_end"], "");
    }

    #[tokio::test]
    async fn renders_whole_preset() {
        let (status, body) = send(app(false), "POST", "/api/v1/reports/API", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["queries"].as_array().unwrap().len(), 3);

        let (status, body) = send(app(false), "POST", "/api/v1/reports/auth", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["queries"], json!([]));
    }

    #[tokio::test]
    async fn unknown_preset_or_query_is_not_found() {
        let (status, body) = send(app(false), "POST", "/api/v1/reports/billing", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errorType"], "not_found");

        let (status, _) = send(
            app(false),
            "POST",
            "/api/v1/reports/api/queries/latency",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsafe_filters_are_rejected_unless_allowed() {
        let body = json!({
            "filters": [{"key": "m.request.path", "compare": "matches", "value": "x') OR (1=1"}]
        });
        let (status, response) = send(
            app(false),
            "POST",
            "/api/v1/reports/api/queries/errorCounts",
            body.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], "error");

        let (status, _) = send(
            app(true),
            "POST",
            "/api/v1/reports/api/queries/errorCounts",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_filter_is_bad_request() {
        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/reports/api",
            json!({"filters": [{"key": "a.b", "compare": "like", "value": "x"}]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "bad_data");
    }

    #[tokio::test]
    async fn builds_row_count_request() {
        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/table-rows/count",
            json!({
                "projectRef": "abc",
                "queryKey": ["table-rows-count"],
                "table": {
                    "name": "orders",
                    "schema": "public",
                    "columns": [{"name": "id", "format": "int8"}]
                },
                "filters": [
                    {"column": "id", "operator": ">", "value": "42"},
                    {"column": "note", "operator": "=", "value": ""}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["sql"],
            r#"select count(*) from "public"."orders" where "id" > 42;"#
        );
        assert_eq!(body["data"]["enabled"], true);
        assert_eq!(body["data"]["queryKey"][0], "table-rows-count");
    }

    #[tokio::test]
    async fn row_count_without_table_is_disabled() {
        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/table-rows/count",
            json!({"projectRef": "abc"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sql"], "");
        assert_eq!(body["data"]["enabled"], false);
    }

    #[tokio::test]
    async fn selects_row_count_result() {
        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/table-rows/count/result",
            json!({"result": [{"count": 128}]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 128);

        let (status, body) = send(
            app(false),
            "POST",
            "/api/v1/table-rows/count/result",
            json!({"result": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorType"], "bad_data");
    }

    #[tokio::test]
    async fn datepicker_lists_ranges() {
        let request = Request::builder()
            .uri("/api/v1/reports/datepicker")
            .body(Body::empty())
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["helpers"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"]["helpers"][0]["default"], true);
        assert_eq!(body["data"]["defaults"]["iso_timestamp_end"], "");
    }
}
