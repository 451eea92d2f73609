/// Proposal publishing, viewing, and blob upload endpoints
use crate::{
    context::AppContext,
    error::{AppError, AppResult},
    model::{NewProposal, Proposal},
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tracing::info;

/// Build proposal routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/proposals", post(create_proposal))
        .route("/api/proposals/:slug", get(get_proposal))
        .route("/api/proposals/:slug/blobs", post(upload_blob))
}

/// Publish a new proposal
///
/// Generates the shareable slug, derives the expiry timestamp and view
/// limit from the selected plan, and inserts the record.
async fn create_proposal(
    State(ctx): State<AppContext>,
    Json(new): Json<NewProposal>,
) -> AppResult<impl IntoResponse> {
    if new.proposer_name.trim().is_empty()
        || new.partner_name.trim().is_empty()
        || new.love_message.trim().is_empty()
    {
        return Err(AppError::Validation(
            "proposerName, partnerName, and loveMessage are required".to_string(),
        ));
    }

    let created_at = Utc::now();
    let slug = generate_slug(&new.proposer_name, &new.partner_name);
    let expires_at = new
        .plan_type
        .live_duration()
        .map(|duration| created_at + duration);

    let proposal = Proposal {
        id: uuid::Uuid::new_v4().to_string(),
        slug,
        proposer_name: new.proposer_name,
        partner_name: new.partner_name,
        love_message: new.love_message,
        theme: new.theme,
        photos: new.photos,
        love_letter: new.love_letter,
        timeline_memories: new.timeline_memories,
        confetti_style: new.confetti_style,
        custom_ending_message: new.custom_ending_message,
        voice_note_url: new.voice_note_url,
        countdown_date: new.countdown_date,
        plan_type: new.plan_type,
        created_at,
        expires_at,
        view_count: 0,
        view_limit: new.plan_type.view_limit(),
    };

    ctx.records.create_proposal(&proposal).await?;

    info!(slug = %proposal.slug, plan = ?proposal.plan_type, "Published proposal");

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Fetch a proposal for viewing
///
/// Expired proposals are no longer served; otherwise the view counter is
/// incremented before returning (the viewing path owns the counter, the
/// cleanup job only reads it).
async fn get_proposal(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
) -> AppResult<Json<Proposal>> {
    let mut proposal = ctx
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

    ctx.records.increment_view_count(&slug).await?;
    proposal.view_count += 1;

    Ok(Json(proposal))
}

/// Which kind of blob is being uploaded
///
/// Each kind has its own storage-path convention beneath the bucket.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BlobKind {
    Photo,
    Timeline,
    Voice,
    Response,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    kind: BlobKind,
}

/// Upload a blob for a proposal and return its public URL
///
/// Uploads happen while the proposal is still being composed, so the slug
/// is not required to reference an existing record yet.
async fn upload_blob(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::Validation("Empty upload body".to_string()));
    }

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let path = storage_path_for(params.kind, &slug, &content_type);
    ctx.objects
        .upload(&path, body.to_vec(), &content_type)
        .await?;

    let url = ctx.objects.public_url(&path);

    Ok(Json(serde_json::json!({ "path": path, "url": url })))
}

/// Storage path for an uploaded blob, following the bucket's conventions
fn storage_path_for(kind: BlobKind, slug: &str, content_type: &str) -> String {
    let ext = extension_for(content_type);
    let stamp = Utc::now().timestamp_millis();
    let suffix = random_suffix(7);

    match kind {
        BlobKind::Photo => format!("proposals/{}/{}-{}.{}", slug, stamp, suffix, ext),
        BlobKind::Timeline => format!("timeline/{}/{}-{}.{}", slug, stamp, suffix, ext),
        BlobKind::Voice => format!("voice-notes/{}/voice-message.{}", slug, ext),
        BlobKind::Response => format!("{}-response-{}.{}", slug, stamp, ext),
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "audio/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        _ => "bin",
    }
}

/// Generate a shareable slug from the two names plus a random suffix
pub fn generate_slug(proposer: &str, partner: &str) -> String {
    format!(
        "{}-{}-{}",
        normalize_name(proposer),
        normalize_name(partner),
        random_suffix(6)
    )
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn random_suffix(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
