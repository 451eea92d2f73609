/// Domain models for proposals, responses, and cleanup
use crate::store::paths::extract_storage_path;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Plan tier selected when a proposal is published
///
/// The tier determines how long the microsite stays live and how many
/// views it may receive before the cleanup job removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// 24 hours live, 50 views
    Freemium,
    /// 7 days live, unlimited views
    Weekly,
    /// Never expires
    Deploy,
}

impl PlanType {
    /// How long a proposal on this plan stays live, if limited
    pub fn live_duration(&self) -> Option<Duration> {
        match self {
            PlanType::Freemium => Some(Duration::hours(24)),
            PlanType::Weekly => Some(Duration::days(7)),
            PlanType::Deploy => None,
        }
    }

    /// Maximum number of views before expiry, if limited
    pub fn view_limit(&self) -> Option<i64> {
        match self {
            PlanType::Freemium => Some(50),
            PlanType::Weekly | PlanType::Deploy => None,
        }
    }
}

/// A photo attached to a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub caption: String,
}

/// A timeline memory entry attached to a proposal
///
/// Field names follow the stored JSON shape (camelCase `photoUrl`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineMemory {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "photoUrl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A published proposal record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub slug: String,
    pub proposer_name: String,
    pub partner_name: String,
    pub love_message: String,
    pub theme: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub love_letter: Option<String>,
    #[serde(default)]
    pub timeline_memories: Vec<TimelineMemory>,
    pub confetti_style: Option<String>,
    pub custom_ending_message: Option<String>,
    pub voice_note_url: Option<String>,
    pub countdown_date: Option<DateTime<Utc>>,
    pub plan_type: PlanType,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub view_limit: Option<i64>,
}

impl Proposal {
    /// Whether this proposal is eligible for cleanup
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_eligible_for_cleanup(self.expires_at, self.view_count, self.view_limit, now)
    }
}

/// Request body for publishing a proposal
///
/// Field names follow the builder form's camelCase convention.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub proposer_name: String,
    pub partner_name: String,
    pub love_message: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub love_letter: Option<String>,
    #[serde(default)]
    pub timeline_memories: Vec<TimelineMemory>,
    pub confetti_style: Option<String>,
    pub custom_ending_message: Option<String>,
    pub voice_note_url: Option<String>,
    pub countdown_date: Option<DateTime<Utc>>,
    pub plan_type: PlanType,
}

fn default_theme() -> String {
    "classic-romance".to_string()
}

/// How the recipient answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Yes,
    No,
    NotYet,
}

/// A recipient's recorded response to a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub id: String,
    pub proposal_slug: String,
    pub partner_name: String,
    pub response_type: ResponseType,
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for submitting a response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposalResponse {
    pub response_type: ResponseType,
    pub message: Option<String>,
    pub photo_url: Option<String>,
}

/// Record fields fetched by cleanup discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupCandidate {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub timeline_memories: Vec<TimelineMemory>,
    pub voice_note_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: i64,
    pub view_limit: Option<i64>,
    pub plan_type: PlanType,
}

impl CleanupCandidate {
    /// Whether this record satisfies the expiration predicate
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_eligible_for_cleanup(self.expires_at, self.view_count, self.view_limit, now)
    }

    /// Collect all storage paths referenced by this record
    ///
    /// Runs the path extractor over every photo URL, every timeline photo
    /// URL, and the voice note URL. Unrecognized or malformed URLs are
    /// skipped. Duplicates are permitted; bulk removal tolerates them.
    pub fn storage_paths(&self, bucket: &str) -> Vec<String> {
        let mut paths = Vec::new();

        for photo in &self.photos {
            if let Some(path) = extract_storage_path(bucket, &photo.url) {
                paths.push(path);
            }
        }

        for memory in &self.timeline_memories {
            if let Some(url) = &memory.photo_url {
                if let Some(path) = extract_storage_path(bucket, url) {
                    paths.push(path);
                }
            }
        }

        if let Some(url) = &self.voice_note_url {
            if let Some(path) = extract_storage_path(bucket, url) {
                paths.push(path);
            }
        }

        paths
    }
}

/// Expiration predicate shared by the viewing path and cleanup discovery
///
/// A record is eligible for deletion when its expiry timestamp has passed,
/// or when it has a view limit and the view counter has reached it. Records
/// without a view limit are exempt from the view-count clause regardless of
/// their counter.
pub fn is_eligible_for_cleanup(
    expires_at: Option<DateTime<Utc>>,
    view_count: i64,
    view_limit: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    if let Some(expires_at) = expires_at {
        if expires_at < now {
            return true;
        }
    }

    if let Some(limit) = view_limit {
        if view_count >= limit {
            return true;
        }
    }

    false
}

/// Result of one cleanup run
///
/// Transient; returned to the invoker and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub success: bool,
    pub cleaned: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<CleanupError>>,
    pub message: String,
}

/// A per-record failure surfaced in the cleanup report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupError {
    pub slug: String,
    pub error: String,
}
