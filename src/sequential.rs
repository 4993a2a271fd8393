use crate::archive;
use crate::capture::{self, CaptureState};
use crate::executor::{CommandRunner, ExecutionResult, Executor};
use crate::exporter;
use crate::importer::{MessageRecord, transform_conversations, transform_messages};
use crate::request::{self, RequestDescriptor};
use crate::timestamp;
use crate::utils::RunConfig;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No capture file existed; a sample was written at this path.
    SampleCreated(PathBuf),
    /// The capture file still holds the sample placeholders.
    Unconfigured(PathBuf),
    /// `check_only` run: the listing request works.
    Checked { conversations: usize },
    Archived { path: PathBuf, conversations: usize },
}

/// The main entry point for the archive run: capture file, conversation
/// list, one message fetch per conversation, then the archive file.
pub fn execute(config: &RunConfig) -> Result<RunOutcome> {
    let executor = Executor::new(config.request_timeout);
    execute_with(config, &executor)
}

pub fn execute_with<R: CommandRunner>(
    config: &RunConfig,
    executor: &Executor<R>,
) -> Result<RunOutcome> {
    let text = match capture::read_capture(&config.curl_file, &config.api.placeholders)? {
        CaptureState::Ready(text) => text,
        CaptureState::Missing => {
            if capture::write_sample(&config.curl_file)? {
                log::info!("Created sample {}", config.curl_file.display());
            }
            return Ok(RunOutcome::SampleCreated(config.curl_file.clone()));
        }
        CaptureState::Unconfigured => {
            return Ok(RunOutcome::Unconfigured(config.curl_file.clone()));
        }
    };

    let descriptor = RequestDescriptor::parse(&text)?;
    let (url, org_id) = request::validate(&descriptor, &config.api).into_result()?;
    log::info!("Captured request validated (organization {})", org_id);
    log::debug!("Listing endpoint: {}", url);

    if config.check_only {
        let payload = executor
            .probe(&descriptor)
            .into_result()
            .wrap_err("Replaying the captured request failed")?;
        let batch = transform_conversations(&payload)?;
        return Ok(RunOutcome::Checked {
            conversations: batch.cleaned.len(),
        });
    }

    let payload = executor
        .get_chat_conversations(&descriptor, config.limit)
        .into_result()
        .wrap_err("Fetching the conversation list failed")?;
    let batch = transform_conversations(&payload)?;
    log::info!("Found {} conversations", batch.cleaned.len());
    for conversation in &batch.cleaned {
        log::info!("  {}", conversation.summary());
    }

    let run_ts = timestamp::run_timestamp();
    let pb = progress_bar(batch.cleaned.len() as u64, config.quiet);

    let archive = archive::assemble(
        batch.most_recent_uuid.as_deref(),
        batch.cleaned,
        |uuid| {
            let messages = fetch_message_list(executor, &descriptor, uuid, config, &pb);
            pb.inc(1);
            messages
        },
        &run_ts,
    );
    pb.finish_and_clear();

    let path = exporter::save_archive(&config.output_dir, &archive)?;
    log::info!("Archive written to {}", path.display());

    Ok(RunOutcome::Archived {
        path,
        conversations: archive.len(),
    })
}

/// A failed fetch degrades to an empty list; the rest of the archive still gets written.
/// The bar stays drawn while the request runs and is only cleared around log output.
fn fetch_message_list<R: CommandRunner>(
    executor: &Executor<R>,
    base: &RequestDescriptor,
    uuid: &str,
    config: &RunConfig,
    pb: &ProgressBar,
) -> Vec<MessageRecord> {
    pb.set_message(uuid.to_string());
    pb.suspend(|| log::debug!("Fetching messages for {}", uuid));
    match executor.fetch_messages(base, uuid, &config.api) {
        ExecutionResult::Success { payload } => {
            let messages = transform_messages(Some(&payload), config.content_mode);
            if messages.is_empty() {
                pb.suspend(|| log::warn!("No messages found in conversation {}", uuid));
            }
            messages
        }
        ExecutionResult::Failure { reason, diagnostic } => {
            pb.suspend(|| {
                log::warn!(
                    "Could not fetch messages for {} ({}): {}",
                    uuid,
                    reason,
                    diagnostic
                )
            });
            Vec::new()
        }
    }
}

fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} conversations ({percent}%) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");
    ProgressBar::new(len).with_style(style)
}
