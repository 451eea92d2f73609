/// Recipient response endpoints
use crate::{
    context::AppContext,
    error::{AppError, AppResult},
    model::{NewProposalResponse, ProposalResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tracing::info;

/// Build response routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/proposals/:slug/responses", post(submit_response))
        .route(
            "/api/proposals/:slug/responses/latest",
            get(latest_response),
        )
}

/// Record the recipient's answer to a proposal
async fn submit_response(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
    Json(new): Json<NewProposalResponse>,
) -> AppResult<impl IntoResponse> {
    let proposal = ctx
        .records
        .get_proposal(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Proposal not found: {}", slug)))?;

    if proposal.is_expired(Utc::now()) {
        return Err(AppError::Expired(format!(
            "Proposal is no longer available: {}",
            slug
        )));
    }

    let response = ProposalResponse {
        id: uuid::Uuid::new_v4().to_string(),
        proposal_slug: slug,
        partner_name: proposal.partner_name,
        response_type: new.response_type,
        message: new
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        photo_url: new.photo_url,
        created_at: Utc::now(),
    };

    ctx.records.create_response(&response).await?;

    info!(
        slug = %response.proposal_slug,
        response = ?response.response_type,
        "Recorded proposal response"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Most recent response for a proposal
async fn latest_response(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
) -> AppResult<Json<ProposalResponse>> {
    let response = ctx
        .records
        .latest_response(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No response yet for: {}", slug)))?;

    Ok(Json(response))
}
