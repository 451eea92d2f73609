/// Storage-path extraction from object-store public URLs
use url::Url;

/// Extract the storage-relative path from a public object-store URL
///
/// Public URLs embed the bucket name as one of their path segments; the
/// storage path is everything after it. Returns `None` when the URL is
/// malformed or does not reference the bucket — callers in the cleanup path
/// treat that as "nothing to delete" rather than an error.
pub fn extract_storage_path(bucket: &str, public_url: &str) -> Option<String> {
    let url = Url::parse(public_url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    let bucket_index = segments.iter().position(|segment| *segment == bucket)?;
    if bucket_index + 1 >= segments.len() {
        return None;
    }

    let path = segments[bucket_index + 1..].join("/");
    if path.is_empty() {
        return None;
    }

    Some(path)
}
