//! Content index definitions
//!
//! An index maps fetched content to a store path and a line of text
//! describing one source of that content. The canonical checksum index is
//! always active; auxiliary indexes can be registered by name from the
//! configuration.

use std::time::Duration;

use crate::pipeline::FetchResult;

/// Timestamp format used in index rows (ISO-8601, millisecond precision)
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A named index over fetched content
///
/// `path` must depend only on the content (never the task), so every task
/// producing the same payload lands on the same index file. `content`
/// returns the single row describing this task's mapping, newline
/// terminated; rows accumulate by append.
pub trait ContentIndex: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store path of the index file for this fetch
    fn path(&self, fetch: &FetchResult, root: &str) -> String;

    /// The row to append for this fetch
    fn content(&self, fetch: &FetchResult, content_path: &str) -> String;
}

/// The canonical SHA-384 checksum index; cannot be disabled
pub struct CanonicalIndex;

impl ContentIndex for CanonicalIndex {
    fn name(&self) -> &'static str {
        "sha384_checksum"
    }

    fn path(&self, fetch: &FetchResult, root: &str) -> String {
        format!("{}index/sha384_checksum/{}", root, fetch.checksum)
    }

    fn content(&self, fetch: &FetchResult, content_path: &str) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            content_path,
            fetch.task.link,
            fetch.request_uri,
            fetch.started_at.format(ROW_TIMESTAMP_FORMAT),
            format_duration(fetch.duration),
            fetch.task.parser
        )
    }
}

/// Compact single-token rendering of a duration, e.g. "1.5s" or "250ms"
pub fn format_duration(duration: Duration) -> String {
    format!("{:?}", duration)
}

/// Resolves configured auxiliary index names to implementations.
///
/// No auxiliary index ships enabled today; new ones are matched by name
/// here. Unknown names are logged and skipped rather than failing the run.
pub fn registry(enabled: &[String]) -> Vec<Box<dyn ContentIndex>> {
    let indexes: Vec<Box<dyn ContentIndex>> = Vec::new();
    for name in enabled {
        tracing::warn!("Unknown index '{}' in configuration, ignoring", name);
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Task;
    use chrono::TimeZone;
    use chrono::Utc;

    fn fetch_result() -> FetchResult {
        FetchResult {
            task: Task {
                link: "https://example.com/feeds/daily.xml".to_string(),
                parser: "RawArticle".to_string(),
                payload: String::new(),
            },
            body: b"content".to_vec(),
            checksum: "abc123".to_string(),
            status: 200,
            request_uri: "/feeds/daily.xml".to_string(),
            started_at: Utc.with_ymd_and_hms(2015, 3, 14, 9, 26, 53).unwrap(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_canonical_index_path_derives_from_checksum_only() {
        let fetch = fetch_result();
        assert_eq!(
            CanonicalIndex.path(&fetch, "test_data/"),
            "test_data/index/sha384_checksum/abc123"
        );
        assert_eq!(
            CanonicalIndex.path(&fetch, ""),
            "index/sha384_checksum/abc123"
        );
    }

    #[test]
    fn test_canonical_index_row_has_six_tab_fields() {
        let fetch = fetch_result();
        let row = CanonicalIndex.content(&fetch, "sha384_content/abc123");

        assert!(row.ends_with('\n'));
        let fields: Vec<&str> = row.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], "sha384_content/abc123");
        assert_eq!(fields[1], "https://example.com/feeds/daily.xml");
        assert_eq!(fields[2], "/feeds/daily.xml");
        assert_eq!(fields[3], "2015-03-14T09:26:53.000Z");
        assert_eq!(fields[4], "1.5s");
        assert_eq!(fields[5], "RawArticle");
    }

    #[test]
    fn test_format_duration_is_single_token() {
        for duration in [
            Duration::from_millis(250),
            Duration::from_secs(2),
            Duration::from_secs_f64(1.5),
        ] {
            let rendered = format_duration(duration);
            assert!(!rendered.contains(char::is_whitespace), "{}", rendered);
        }
    }

    #[test]
    fn test_registry_skips_unknown_names() {
        let indexes = registry(&["no_such_index".to_string()]);
        assert!(indexes.is_empty());
    }
}
