/// Cleanup trigger endpoint
///
/// Invoked by an external scheduler (cron, hosted function trigger). Any
/// method other than the CORS preflight runs one cleanup pass and returns
/// the report as JSON.
use crate::{context::AppContext, jobs::reaper};
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tracing::error;

const CORS_HEADERS: [(HeaderName, &str); 2] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
];

/// Build cleanup routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/cleanup", any(trigger_cleanup))
}

/// Run one cleanup pass and report the outcome
///
/// The caller always receives structured JSON: 200 with the report for a
/// non-fatal run, 500 with `{success: false, error}` when discovery or the
/// run itself fails.
async fn trigger_cleanup(State(ctx): State<AppContext>, method: Method) -> Response {
    // CORS preflight: empty 200 with permissive headers
    if method == Method::OPTIONS {
        return (StatusCode::OK, CORS_HEADERS).into_response();
    }

    match reaper::run_cleanup(ctx.records.as_ref(), ctx.objects.as_ref(), ctx.bucket()).await {
        Ok(report) => (StatusCode::OK, CORS_HEADERS, Json(report)).into_response(),
        Err(e) => {
            error!("Cleanup run failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CORS_HEADERS,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
