use claude_chat_export::capture::{DEFAULT_CAPTURE_FILE, HELP_INSTRUCTIONS};
use claude_chat_export::importer::ContentMode;
use claude_chat_export::sequential::{self, RunOutcome};
use claude_chat_export::utils::{ApiProfile, DEFAULT_LIMIT, DEFAULT_TIMEOUT_SECS, RunConfig};
use claude_chat_export::{Error, ErrorKind, exporter};
use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Archive your claude.ai conversation history using a request copied from the browser.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File holding the request copied from DevTools ("Copy as cURL").
    /// Defaults to ./curl_command.txt if not set in config.
    #[arg(long, value_name = "PATH")]
    curl_file: Option<PathBuf>,

    /// Directory to write the archive into.
    /// Defaults to ~/claude-chat-export/archives if not set in config.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/claude-chat-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of conversations to list.
    #[arg(long, value_name = "N")]
    limit: Option<u32>,

    /// Per-request timeout in seconds (0 disables the timeout).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Keep every text part of a message instead of only the first.
    #[arg(long)]
    join_content_parts: bool,

    /// Only check that the captured request still works.
    #[arg(long)]
    check: bool,

    /// Log each request made.
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors; hide the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    curl_file: Option<PathBuf>,
    output_dirs: Option<Vec<String>>,
    limit: Option<u32>,
    timeout_secs: Option<u64>,
    api_host: Option<String>,
    api_base: Option<String>,
    placeholders: Option<Vec<String>>,
    join_content_parts: Option<bool>,
}

fn default_output_dirs() -> Vec<String> {
    vec!["claude-chat-export".to_string(), "archives".to_string()]
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("claude-chat-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve capture file (CLI > Config > Default)
    let curl_file = cli
        .curl_file
        .clone()
        .or(file_cfg.curl_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTURE_FILE));

    // 3. Resolve output dir (CLI > home + configured dirs)
    let output_dir = match &cli.output {
        Some(dir) => dir.clone(),
        None => {
            let parts = file_cfg.output_dirs.unwrap_or_else(default_output_dirs);
            exporter::home_output_dir(&parts).ok_or_else(|| {
                eyre!("Could not determine your home directory.\nUse --output to choose where the archive goes.")
            })?
        }
    };

    // 4. API profile: config overrides individual fields
    let defaults = ApiProfile::default();
    let api = ApiProfile {
        host: file_cfg.api_host.unwrap_or(defaults.host),
        api_base: file_cfg.api_base.unwrap_or(defaults.api_base),
        placeholders: file_cfg.placeholders.unwrap_or(defaults.placeholders),
    };

    let timeout_secs = cli
        .timeout
        .or(file_cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let join_parts = cli.join_content_parts || file_cfg.join_content_parts.unwrap_or(false);

    Ok(RunConfig {
        curl_file,
        output_dir,
        limit: cli.limit.or(file_cfg.limit).unwrap_or(DEFAULT_LIMIT),
        request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        api,
        content_mode: if join_parts {
            ContentMode::AllParts
        } else {
            ContentMode::FirstPart
        },
        check_only: cli.check,
        quiet: cli.quiet,
    })
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;

    match sequential::execute(&config)? {
        RunOutcome::SampleCreated(path) => {
            println!(
                "No capture file found. Created sample {}.\n\n{}",
                path.display(),
                HELP_INSTRUCTIONS
            );
        }
        RunOutcome::Unconfigured(path) => {
            println!(
                "Please edit {} with your actual cURL command.\n\n{}",
                path.display(),
                HELP_INSTRUCTIONS
            );
        }
        RunOutcome::Checked { conversations } => {
            println!(
                "Captured request works ({} conversation(s) returned with limit=1).",
                conversations
            );
        }
        RunOutcome::Archived {
            path,
            conversations,
        } => {
            println!(
                "Archived {} conversation(s) to {}",
                conversations,
                path.display()
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let invalid_capture = e
                .downcast_ref::<Error>()
                .is_some_and(|err| matches!(err.kind(), ErrorKind::Parse | ErrorKind::Validation));
            if invalid_capture {
                eprintln!("\n{}", HELP_INSTRUCTIONS);
            }
            ExitCode::FAILURE
        }
    }
}
