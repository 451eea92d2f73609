/// Expired-proposal cleanup
///
/// One run discovers every record satisfying the expiration predicate,
/// removes the blobs each record references, deletes the record, and
/// reports counts and per-record errors back to the invoker. Discovery
/// failure is the only fatal condition; anything that goes wrong while
/// processing an individual record never aborts the rest of the batch.
use crate::error::AppResult;
use crate::model::{CleanupError, CleanupReport};
use crate::store::{ObjectStore, RecordStore};
use chrono::Utc;
use tracing::{info, warn};

/// Run one cleanup pass over the record store
///
/// Destructive and irreversible: expired records and their blobs are hard
/// deleted with no recovery path. Re-running immediately after a successful
/// run is a no-op, since deleted records no longer match discovery and blob
/// removal tolerates already-missing paths.
pub async fn run_cleanup(
    records: &dyn RecordStore,
    objects: &dyn ObjectStore,
    bucket: &str,
) -> AppResult<CleanupReport> {
    let now = Utc::now();

    info!("Starting cleanup of expired proposals");

    // Discovery failure aborts the entire run
    let candidates = records.find_expired(now).await?;

    if candidates.is_empty() {
        info!("No expired proposals found");
        return Ok(CleanupReport {
            success: true,
            cleaned: 0,
            errors: None,
            message: "No expired proposals found".to_string(),
        });
    }

    info!("Found {} expired proposals to clean up", candidates.len());

    let mut cleaned: u64 = 0;
    let mut errors: Vec<CleanupError> = Vec::new();

    for candidate in candidates {
        let paths = candidate.storage_paths(bucket);

        if !paths.is_empty() {
            info!(
                slug = %candidate.slug,
                "Deleting {} blobs from storage",
                paths.len()
            );
            // A failed blob removal must never block record deletion; the
            // occasional orphaned blob is an accepted trade-off.
            if let Err(e) = objects.remove(&paths).await {
                warn!(slug = %candidate.slug, error = %e, "Blob removal failed, continuing");
            }
        }

        match records.delete_proposal(&candidate.id).await {
            Ok(()) => {
                cleaned += 1;
                info!(slug = %candidate.slug, "Cleaned up expired proposal");
            }
            Err(e) => {
                warn!(slug = %candidate.slug, error = %e, "Record deletion failed");
                errors.push(CleanupError {
                    slug: candidate.slug.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Cleanup completed. Cleaned: {}, Errors: {}",
        cleaned,
        errors.len()
    );

    Ok(CleanupReport {
        success: true,
        cleaned,
        errors: if errors.is_empty() { None } else { Some(errors) },
        message: format!("Cleaned up {} expired proposals", cleaned),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::model::{CleanupCandidate, Photo, PlanType, Proposal, ProposalResponse, TimelineMemory};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeRecordStore {
        candidates: Mutex<Vec<CleanupCandidate>>,
        fail_discovery: bool,
        fail_delete_for: HashSet<String>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeRecordStore {
        fn with_candidates(candidates: Vec<CleanupCandidate>) -> Self {
            Self {
                candidates: Mutex::new(candidates),
                fail_discovery: false,
                fail_delete_for: HashSet::new(),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn failing_discovery() -> Self {
            Self {
                candidates: Mutex::new(Vec::new()),
                fail_discovery: true,
                fail_delete_for: HashSet::new(),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn fail_delete_for(mut self, slug: &str) -> Self {
            self.fail_delete_for.insert(slug.to_string());
            self
        }
    }

    #[async_trait]
    impl RecordStore for FakeRecordStore {
        async fn create_proposal(&self, _proposal: &Proposal) -> AppResult<()> {
            unimplemented!("not used by cleanup")
        }

        async fn get_proposal(&self, _slug: &str) -> AppResult<Option<Proposal>> {
            unimplemented!("not used by cleanup")
        }

        async fn increment_view_count(&self, _slug: &str) -> AppResult<()> {
            unimplemented!("not used by cleanup")
        }

        async fn create_response(&self, _response: &ProposalResponse) -> AppResult<()> {
            unimplemented!("not used by cleanup")
        }

        async fn latest_response(&self, _slug: &str) -> AppResult<Option<ProposalResponse>> {
            unimplemented!("not used by cleanup")
        }

        async fn find_expired(
            &self,
            now: DateTime<Utc>,
        ) -> AppResult<Vec<CleanupCandidate>> {
            if self.fail_discovery {
                return Err(AppError::RecordStore("connection refused".to_string()));
            }
            let candidates = self.candidates.lock().unwrap();
            Ok(candidates
                .iter()
                .filter(|c| c.is_expired(now))
                .cloned()
                .collect())
        }

        async fn delete_proposal(&self, id: &str) -> AppResult<()> {
            let mut candidates = self.candidates.lock().unwrap();
            let slug = candidates
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.slug.clone())
                .unwrap_or_default();
            if self.fail_delete_for.contains(&slug) {
                return Err(AppError::RecordStore(format!(
                    "delete failed for {}",
                    slug
                )));
            }
            candidates.retain(|c| c.id != id);
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    struct FakeObjectStore {
        removed_batches: Mutex<Vec<Vec<String>>>,
        fail_removal: bool,
    }

    impl FakeObjectStore {
        fn new() -> Self {
            Self {
                removed_batches: Mutex::new(Vec::new()),
                fail_removal: false,
            }
        }

        fn failing() -> Self {
            Self {
                removed_batches: Mutex::new(Vec::new()),
                fail_removal: true,
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakeObjectStore {
        async fn upload(
            &self,
            _path: &str,
            _data: Vec<u8>,
            _content_type: &str,
        ) -> AppResult<()> {
            unimplemented!("not used by cleanup")
        }

        async fn remove(&self, paths: &[String]) -> AppResult<()> {
            if self.fail_removal {
                return Err(AppError::ObjectStore("storage unavailable".to_string()));
            }
            self.removed_batches.lock().unwrap().push(paths.to_vec());
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://host.example/response-photos/{}", path)
        }
    }

    const BUCKET: &str = "response-photos";

    fn blob_url(path: &str) -> String {
        format!("https://host.example/storage/v1/object/public/response-photos/{}", path)
    }

    fn expired_candidate(id: &str, slug: &str) -> CleanupCandidate {
        CleanupCandidate {
            id: id.to_string(),
            slug: slug.to_string(),
            photos: vec![],
            timeline_memories: vec![],
            voice_note_url: None,
            expires_at: Some(Utc::now() - Duration::hours(1)),
            view_count: 0,
            view_limit: None,
            plan_type: PlanType::Freemium,
        }
    }

    #[tokio::test]
    async fn test_empty_discovery_returns_zero_and_skips_object_store() {
        let records = FakeRecordStore::with_candidates(vec![]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();

        assert!(report.success);
        assert_eq!(report.cleaned, 0);
        assert!(report.errors.is_none());
        assert_eq!(report.message, "No expired proposals found");
        assert!(objects.removed_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_single_bulk_delete_then_record_delete() {
        let mut candidate = expired_candidate("p1", "amy-ben-x7");
        candidate.photos = vec![
            Photo {
                url: blob_url("proposals/amy-ben-x7/1.jpg"),
                caption: String::new(),
            },
            Photo {
                url: blob_url("proposals/amy-ben-x7/2.jpg"),
                caption: String::new(),
            },
        ];
        candidate.timeline_memories = vec![TimelineMemory {
            id: "m1".to_string(),
            date: String::new(),
            title: String::new(),
            description: String::new(),
            photo_url: Some(blob_url("timeline/amy-ben-x7/m1.png")),
        }];
        candidate.voice_note_url = Some(blob_url("voice-notes/amy-ben-x7/voice-message.webm"));

        let records = FakeRecordStore::with_candidates(vec![candidate]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();

        assert_eq!(report.cleaned, 1);
        assert!(report.errors.is_none());
        assert_eq!(report.message, "Cleaned up 1 expired proposals");

        // Exactly one bulk removal carrying all four paths
        let batches = objects.removed_batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![
                "proposals/amy-ben-x7/1.jpg",
                "proposals/amy-ben-x7/2.jpg",
                "timeline/amy-ben-x7/m1.png",
                "voice-notes/amy-ben-x7/voice-message.webm",
            ]
        );
        assert_eq!(records.deleted.lock().unwrap().as_slice(), ["p1"]);
    }

    #[tokio::test]
    async fn test_record_without_blobs_skips_object_store() {
        let records = FakeRecordStore::with_candidates(vec![expired_candidate("p1", "s1")]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();

        assert_eq!(report.cleaned, 1);
        assert!(objects.removed_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated_per_record() {
        let records = FakeRecordStore::with_candidates(vec![
            expired_candidate("p1", "fails"),
            expired_candidate("p2", "succeeds"),
        ])
        .fail_delete_for("fails");
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();

        assert!(report.success);
        assert_eq!(report.cleaned, 1);
        let errors = report.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].slug, "fails");
        assert_eq!(records.deleted.lock().unwrap().as_slice(), ["p2"]);
    }

    #[tokio::test]
    async fn test_blob_removal_failure_never_blocks_record_deletion() {
        let mut candidate = expired_candidate("p1", "s1");
        candidate.photos = vec![Photo {
            url: blob_url("proposals/s1/1.jpg"),
            caption: String::new(),
        }];

        let records = FakeRecordStore::with_candidates(vec![candidate]);
        let objects = FakeObjectStore::failing();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();

        // Suppressed: logged only, never surfaced in the report
        assert_eq!(report.cleaned, 1);
        assert!(report.errors.is_none());
        assert_eq!(records.deleted.lock().unwrap().as_slice(), ["p1"]);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_fatal_with_no_deletions() {
        let records = FakeRecordStore::failing_discovery();
        let objects = FakeObjectStore::new();

        let result = run_cleanup(&records, &objects, BUCKET).await;

        assert!(result.is_err());
        assert!(records.deleted.lock().unwrap().is_empty());
        assert!(objects.removed_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_after_successful_run_is_noop() {
        let records = FakeRecordStore::with_candidates(vec![
            expired_candidate("p1", "s1"),
            expired_candidate("p2", "s2"),
        ]);
        let objects = FakeObjectStore::new();

        let first = run_cleanup(&records, &objects, BUCKET).await.unwrap();
        assert_eq!(first.cleaned, 2);

        let second = run_cleanup(&records, &objects, BUCKET).await.unwrap();
        assert_eq!(second.cleaned, 0);
        assert_eq!(second.message, "No expired proposals found");
    }

    #[tokio::test]
    async fn test_view_limited_record_is_cleaned() {
        let mut candidate = expired_candidate("p1", "s1");
        candidate.expires_at = Some(Utc::now() + Duration::days(1));
        candidate.view_count = 50;
        candidate.view_limit = Some(50);

        let records = FakeRecordStore::with_candidates(vec![candidate]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();
        assert_eq!(report.cleaned, 1);
    }

    #[tokio::test]
    async fn test_unlimited_views_record_is_not_cleaned() {
        let mut candidate = expired_candidate("p1", "s1");
        candidate.expires_at = None;
        candidate.view_count = 10_000;
        candidate.view_limit = None;
        candidate.plan_type = PlanType::Deploy;

        let records = FakeRecordStore::with_candidates(vec![candidate]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();
        assert_eq!(report.cleaned, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_urls_are_treated_as_nothing_to_delete() {
        let mut candidate = expired_candidate("p1", "s1");
        candidate.photos = vec![Photo {
            url: "blob:https://app.example/tmp-ref".to_string(),
            caption: String::new(),
        }];

        let records = FakeRecordStore::with_candidates(vec![candidate]);
        let objects = FakeObjectStore::new();

        let report = run_cleanup(&records, &objects, BUCKET).await.unwrap();
        assert_eq!(report.cleaned, 1);
        assert!(objects.removed_batches.lock().unwrap().is_empty());
    }
}
