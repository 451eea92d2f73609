/// Hosted record store client (PostgREST-style API)
use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::model::{CleanupCandidate, Proposal, ProposalResponse};
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Fields selected by cleanup discovery
const CLEANUP_SELECT: &str =
    "id,slug,photos,timeline_memories,voice_note_url,expires_at,view_count,view_limit,plan_type";

/// Record store backed by the hosted backend's REST API
///
/// All calls carry the service-role credential and a per-call timeout.
pub struct PostgrestRecordStore {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl PostgrestRecordStore {
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn check(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> AppResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecordStore(format!(
                "{} returned {}: {}",
                operation, status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl RecordStore for PostgrestRecordStore {
    async fn create_proposal(&self, proposal: &Proposal) -> AppResult<()> {
        let response = self
            .authorize(self.client.post(self.table_url("proposals")))
            .header("Prefer", "return=minimal")
            .json(proposal)
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("proposal insert failed: {}", e)))?;

        self.check(response, "proposal insert").await?;
        Ok(())
    }

    async fn get_proposal(&self, slug: &str) -> AppResult<Option<Proposal>> {
        let response = self
            .authorize(self.client.get(self.table_url("proposals")))
            .query(&[
                ("select", "*".to_string()),
                ("slug", format!("eq.{}", slug)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("proposal query failed: {}", e)))?;

        let rows: Vec<Proposal> = self
            .check(response, "proposal query")
            .await?
            .json()
            .await
            .map_err(|e| AppError::RecordStore(format!("proposal decode failed: {}", e)))?;

        Ok(rows.into_iter().next())
    }

    async fn increment_view_count(&self, slug: &str) -> AppResult<()> {
        let url = format!("{}/rest/v1/rpc/increment_view_count", self.base_url);
        let response = self
            .authorize(self.client.post(url))
            .json(&serde_json::json!({ "p_slug": slug }))
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("view increment failed: {}", e)))?;

        self.check(response, "view increment").await?;
        Ok(())
    }

    async fn create_response(&self, proposal_response: &ProposalResponse) -> AppResult<()> {
        let response = self
            .authorize(self.client.post(self.table_url("proposal_responses")))
            .header("Prefer", "return=minimal")
            .json(proposal_response)
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("response insert failed: {}", e)))?;

        self.check(response, "response insert").await?;
        Ok(())
    }

    async fn latest_response(&self, slug: &str) -> AppResult<Option<ProposalResponse>> {
        let response = self
            .authorize(self.client.get(self.table_url("proposal_responses")))
            .query(&[
                ("select", "*".to_string()),
                ("proposal_slug", format!("eq.{}", slug)),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("response query failed: {}", e)))?;

        let rows: Vec<ProposalResponse> = self
            .check(response, "response query")
            .await?
            .json()
            .await
            .map_err(|e| AppError::RecordStore(format!("response decode failed: {}", e)))?;

        Ok(rows.into_iter().next())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<CleanupCandidate>> {
        // The REST filter language cannot compare two columns per row, so the
        // server-side filter over-selects (expired by timestamp, or carrying
        // any view limit) and the expiration predicate is applied here.
        let response = self
            .authorize(self.client.get(self.table_url("proposals")))
            .query(&[
                ("select", CLEANUP_SELECT.to_string()),
                (
                    "or",
                    format!(
                        "(expires_at.lt.{},view_limit.not.is.null)",
                        now.to_rfc3339()
                    ),
                ),
            ])
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("expired query failed: {}", e)))?;

        let mut candidates: Vec<CleanupCandidate> = self
            .check(response, "expired query")
            .await?
            .json()
            .await
            .map_err(|e| AppError::RecordStore(format!("expired decode failed: {}", e)))?;

        candidates.retain(|candidate| candidate.is_expired(now));
        Ok(candidates)
    }

    async fn delete_proposal(&self, id: &str) -> AppResult<()> {
        let response = self
            .authorize(self.client.delete(self.table_url("proposals")))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| AppError::RecordStore(format!("proposal delete failed: {}", e)))?;

        self.check(response, "proposal delete").await?;
        Ok(())
    }
}
