//! The capture file: where the user pastes the request copied from DevTools.

use eyre::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_CAPTURE_FILE: &str = "curl_command.txt";

pub const SAMPLE_CAPTURE: &str = r#"curl 'https://claude.ai/api/organizations/YOUR_ORG_ID/chat_conversations?limit=100' \
  -H 'accept: */*' \
  -H 'accept-language: en-US,en;q=0.9' \
  -H 'content-type: application/json' \
  -b 'YOUR_COOKIES_HERE' \
  -H 'referer: https://claude.ai/recents' \
  -H 'user-agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36'

# Instructions:
# 1. Go to https://claude.ai/recents
# 2. Open DevTools (F12) > Network tab
# 3. Refresh the page
# 4. Find the 'chat_conversations' request
# 5. Right-click > Copy > Copy as cURL (bash)
# 6. Replace this entire content with the copied command
#
# The format should be multi-line with backslashes like:
# curl 'https://...' \
#   -H 'header: value' \
#   -b 'cookies' \
#   -H 'another: header'
"#;

pub const HELP_INSTRUCTIONS: &str = "\
To get the cURL command:
1. Go to https://claude.ai/recents
2. Open DevTools (F12) > Network tab
3. Refresh the page
4. Find the 'chat_conversations' request
5. Right-click > Copy > Copy as cURL (bash)
6. Paste the command into the capture file

The cURL command should be multi-line with backslashes like:
curl 'https://...' \\
  -H 'header: value' \\
  -b 'cookies' \\
  -H 'another: header'";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Missing,
    /// The file still contains one of the sample placeholders.
    Unconfigured,
    Ready(String),
}

/// Classify capture text; an unedited sample counts the same as no file.
pub fn classify(content: &str, placeholders: &[String]) -> CaptureState {
    let content = content.trim();
    if content.is_empty() {
        return CaptureState::Missing;
    }
    if placeholders
        .iter()
        .any(|p| !p.is_empty() && content.contains(p.as_str()))
    {
        return CaptureState::Unconfigured;
    }
    CaptureState::Ready(content.to_string())
}

pub fn read_capture(path: &Path, placeholders: &[String]) -> Result<CaptureState> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(classify(&content, placeholders)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CaptureState::Missing),
        Err(e) => Err(e).wrap_err_with(|| format!("Failed to read {}", path.display())),
    }
}

/// Write the sample capture file. An existing file is never overwritten.
pub fn write_sample(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, SAMPLE_CAPTURE)
        .wrap_err_with(|| format!("Failed to write sample {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestDescriptor;
    use crate::utils::ApiProfile;

    fn placeholders() -> Vec<String> {
        ApiProfile::default().placeholders
    }

    #[test]
    fn sample_is_unconfigured() {
        assert_eq!(classify(SAMPLE_CAPTURE, &placeholders()), CaptureState::Unconfigured);
    }

    #[test]
    fn sample_still_parses() {
        let d = RequestDescriptor::parse(SAMPLE_CAPTURE).unwrap();
        assert_eq!(d.cookie(), Some("YOUR_COOKIES_HERE"));
        assert_eq!(d.headers().len(), 5);
    }

    #[test]
    fn blank_file_is_missing() {
        assert_eq!(classify("  \n", &placeholders()), CaptureState::Missing);
    }

    #[test]
    fn real_capture_is_ready_and_trimmed() {
        let state = classify("\ncurl 'https://claude.ai/api/organizations/ab/x'\n", &placeholders());
        assert_eq!(
            state,
            CaptureState::Ready("curl 'https://claude.ai/api/organizations/ab/x'".to_string())
        );
    }

    #[test]
    fn reading_absent_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let state = read_capture(&dir.path().join("nope.txt"), &placeholders()).unwrap();
        assert_eq!(state, CaptureState::Missing);
    }

    #[test]
    fn sample_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CAPTURE_FILE);
        assert!(write_sample(&path).unwrap());
        assert!(!write_sample(&path).unwrap());
        assert_eq!(
            read_capture(&path, &placeholders()).unwrap(),
            CaptureState::Unconfigured
        );
    }
}
