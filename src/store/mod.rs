/// Store capability traits and hosted-backend clients
///
/// Proposal records and binary blobs live in a hosted backend reached over
/// HTTP. The service depends only on the two capability traits below, so
/// tests substitute in-memory fakes for both.

pub mod objects;
pub mod paths;
pub mod records;

pub use objects::StorageObjectStore;
pub use records::PostgrestRecordStore;

use crate::error::AppResult;
use crate::model::{CleanupCandidate, Proposal, ProposalResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Record store capability: proposals and responses
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a newly published proposal
    async fn create_proposal(&self, proposal: &Proposal) -> AppResult<()>;

    /// Fetch a proposal by its slug
    async fn get_proposal(&self, slug: &str) -> AppResult<Option<Proposal>>;

    /// Increment the view counter for a proposal
    async fn increment_view_count(&self, slug: &str) -> AppResult<()>;

    /// Insert a recipient's response
    async fn create_response(&self, response: &ProposalResponse) -> AppResult<()>;

    /// Fetch the most recent response for a proposal, if any
    async fn latest_response(&self, slug: &str) -> AppResult<Option<ProposalResponse>>;

    /// Find records satisfying the expiration predicate as of `now`
    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<CleanupCandidate>>;

    /// Delete a proposal record by id
    async fn delete_proposal(&self, id: &str) -> AppResult<()>;
}

/// Object store capability: blobs under one well-known bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob at the given path
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// Remove blobs by path in one bulk call
    ///
    /// Missing paths and duplicates are tolerated; removal of a nonexistent
    /// path is treated as success.
    async fn remove(&self, paths: &[String]) -> AppResult<()>;

    /// Public URL from which a stored blob can be fetched
    fn public_url(&self, path: &str) -> String;
}
