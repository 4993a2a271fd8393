//! # claude-chat-export
//!
//! Archives your [claude.ai](https://claude.ai) conversation history to a local JSON file.
//!
//! ## How it works
//!
//! There is no public export API, and implementing the web session flow is brittle.
//! Instead you copy one authenticated request from the browser (DevTools, Network tab,
//! "Copy as cURL") into a capture file. This crate parses that command, checks that it
//! targets the conversations endpoint, and replays it through `curl` to list your
//! conversations. For every conversation it derives a sibling request that carries
//! the same headers and cookies but points at that conversation's messages.
//!
//! The results are cleaned up (timestamps rendered in US Central time), grouped by
//! day, and written as one pretty-printed JSON archive per run.
//!
//! ## Usage
//!
//! ```sh
//! # First run writes a sample curl_command.txt with instructions
//! claude-chat-export
//!
//! # After pasting your request
//! claude-chat-export --check
//! claude-chat-export --output ~/notes/claude
//! ```
//!
//! Preferences can be persisted in `~/.config/claude-chat-export/config.toml`.
//!
//! ## Compatibility
//!
//! Tracks claude.ai's internal (undocumented) web API. Captured requests expire with
//! your browser session; capture a fresh one when requests start failing with 403.
pub mod archive;
pub mod capture;
pub mod error;
pub mod executor;
pub mod exporter;
pub mod importer;
pub mod request;
pub mod sequential;
pub mod timestamp;
pub mod utils;

pub use archive::{Archive, ConversationArchiveEntry};
pub use error::{Error, ErrorKind};
pub use executor::{ExecutionResult, Executor};
pub use request::{RequestDescriptor, ValidationResult};
