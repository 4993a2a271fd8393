//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use claude_chat_export::executor::{CommandRunner, ProcessOutput};
use claude_chat_export::importer::ContentMode;
use claude_chat_export::utils::{ApiProfile, RunConfig};
use tempfile::TempDir;

pub const CAPTURE: &str = "curl 'https://claude.ai/api/organizations/abc-123/chat_conversations?limit=100' \\
  -H 'accept: */*' \\
  -H 'content-type: application/json' \\
  -b 'sessionKey=sk-ant-test; lastActiveOrg=abc-123' \\
  -H 'referer: https://claude.ai/recents'";

/// Runner that answers by matching a substring of the requested URL.
/// Unmatched requests fail the way curl does for a 404 with `--fail`.
pub struct RoutedRunner {
    routes: Vec<(String, ProcessOutput)>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl RoutedRunner {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn json(mut self, url_part: &str, body: &str) -> Self {
        self.routes.push((
            url_part.to_string(),
            ProcessOutput {
                status: Some(0),
                stdout: body.to_string(),
                ..Default::default()
            },
        ));
        self
    }

    pub fn fail(mut self, url_part: &str, code: i32, stderr: &str) -> Self {
        self.routes.push((
            url_part.to_string(),
            ProcessOutput {
                status: Some(code),
                stderr: stderr.to_string(),
                ..Default::default()
            },
        ));
        self
    }

    /// URL tokens of every request made, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|args| args.iter().find(|a| a.starts_with("https://")).cloned())
            .collect()
    }
}

impl CommandRunner for RoutedRunner {
    fn run(&self, args: &[String], _timeout: Option<Duration>) -> io::Result<ProcessOutput> {
        self.calls.borrow_mut().push(args.to_vec());
        let output = self
            .routes
            .iter()
            .find(|(part, _)| args.iter().any(|a| a.contains(part.as_str())))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ProcessOutput {
                status: Some(22),
                stderr: "curl: (22) The requested URL returned error: 404".to_string(),
                ..Default::default()
            });
        Ok(output)
    }
}

/// Temporary workspace holding a capture file and an output directory.
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn with_capture(self, content: &str) -> Self {
        fs::write(self.capture_path(), content).expect("Failed to write capture file");
        self
    }

    pub fn capture_path(&self) -> PathBuf {
        self.temp_dir.path().join("curl_command.txt")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    pub fn path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> RunConfig {
        RunConfig {
            curl_file: self.capture_path(),
            output_dir: self.output_dir(),
            limit: 50,
            request_timeout: Some(Duration::from_secs(5)),
            api: ApiProfile::default(),
            content_mode: ContentMode::FirstPart,
            check_only: false,
            quiet: true,
        }
    }
}

pub fn conversation_list() -> &'static str {
    r#"[
        {"uuid": "c1", "name": "Borrow checker", "created_at": "2024-01-01T00:00:00.000000Z", "updated_at": "2024-01-02T00:00:00.000000Z", "is_starred": false},
        {"uuid": "c2", "name": "Trip ideas", "created_at": "2024-01-01T12:00:00.000000Z", "updated_at": "2024-01-03T00:00:00.000000Z"},
        {"name": "broken record"}
    ]"#
}

pub fn conversation_detail() -> &'static str {
    r#"{
        "uuid": "c1",
        "name": "Borrow checker",
        "chat_messages": [
            {"uuid": "m1", "sender": "human", "created_at": "2024-01-01T00:00:05.000000Z", "content": [{"type": "text", "text": "Why does this not compile?"}]},
            {"uuid": "m2", "sender": "assistant", "created_at": "2024-01-01T00:00:09.000000Z", "content": [{"type": "text", "text": "You hold two mutable borrows."}]},
            {"uuid": "m3", "sender": "assistant", "created_at": "2024-01-01T00:00:10.000000Z", "content": []}
        ]
    }"#
}
