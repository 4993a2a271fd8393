use crate::importer::ContentMode;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where the API lives and how an unedited sample capture is recognised.
/// Injected into the validator, the request builder and the capture reader
/// so none of them hard-code the target service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiProfile {
    /// Substring the captured URL must contain.
    pub host: String,
    /// Base for derived URLs, without trailing slash.
    pub api_base: String,
    /// Sentinel strings that mark a capture file as not yet configured.
    pub placeholders: Vec<String>,
}

impl Default for ApiProfile {
    fn default() -> Self {
        Self {
            host: "claude.ai".to_string(),
            api_base: "https://claude.ai/api".to_string(),
            placeholders: vec!["YOUR_ORG_ID".to_string(), "YOUR_COOKIES_HERE".to_string()],
        }
    }
}

/// Configuration required to run the archive process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub curl_file: PathBuf,
    pub output_dir: PathBuf,
    pub limit: u32,
    pub request_timeout: Option<Duration>,
    pub api: ApiProfile,
    pub content_mode: ContentMode,
    /// Only replay the capture with `limit=1` and report.
    pub check_only: bool,
    pub quiet: bool,
}

/// Cut `value` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// File stem for an archived conversation: `<bucket>_<slug>`.
/// Falls back to the first 8 chars of the uuid when the title has no sluggable text.
pub fn allocate_file_name(bucket: &str, title: &str, uuid: &str) -> String {
    let raw_slug = slug::slugify(title);
    // Truncate slug to 60 chars (slug output is ASCII-only, so byte == char)
    let slug = raw_slug[..raw_slug.len().min(60)].trim_end_matches('-');

    if slug.is_empty() {
        let prefix: String = uuid.chars().take(8).collect();
        format!("{}_{}", bucket, prefix)
    } else {
        format!("{}_{}", bucket, slug)
    }
}
