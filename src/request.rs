//! Captured-request handling: turning "Copy as cURL" text into a
//! [`RequestDescriptor`], checking it targets the API, and deriving sibling
//! requests that reuse its authentication.
//!
//! Headers and cookies are modelled as structured fields for inspection, but
//! the token sequence handed to the process is always the captured one. The
//! only token ever rewritten is the URL, so everything the browser sent is
//! replayed verbatim.

use crate::error::{Error, Result};
use crate::utils::ApiProfile;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const PROGRAM: &str = "curl";

/// Path segment identifying the conversations collection.
pub const CONVERSATIONS_SEGMENT: &str = "chat_conversations";

/// curl options that consume the following token as their value.
const VALUE_FLAGS: &[&str] = &[
    "-H",
    "--header",
    "-b",
    "--cookie",
    "-X",
    "--request",
    "-d",
    "--data",
    "--data-raw",
    "--data-binary",
    "--data-urlencode",
    "--data-ascii",
    "--url",
    "-A",
    "--user-agent",
    "-e",
    "--referer",
    "-u",
    "--user",
    "-o",
    "--output",
    "-m",
    "--max-time",
    "--connect-timeout",
    "-x",
    "--proxy",
    "-F",
    "--form",
    "-c",
    "--cookie-jar",
    "-w",
    "--write-out",
    "-r",
    "--range",
    "--retry",
];

const DATA_FLAGS: &[&str] = &[
    "-d",
    "--data",
    "--data-raw",
    "--data-binary",
    "--data-urlencode",
    "--data-ascii",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    cookie: Option<String>,
    body: Option<String>,
    args: Vec<String>,
    url_index: usize,
    /// Text before the URL in its token, e.g. `--url=`.
    url_prefix: String,
}

impl RequestDescriptor {
    /// Parse captured request text (possibly spanning lines with trailing
    /// backslashes) into a descriptor. No I/O happens here.
    pub fn parse(raw: &str) -> Result<Self> {
        let joined = join_continuations(raw);
        if joined.trim().is_empty() {
            return Err(Error::Parse("captured request is empty".to_string()));
        }

        let mut tokens = shlex::split(&joined).ok_or_else(|| {
            Error::Parse(
                "unbalanced quotes or dangling escape; re-copy the request as cURL (bash)"
                    .to_string(),
            )
        })?;
        if tokens.first().map(String::as_str) == Some(PROGRAM) {
            tokens.remove(0);
        }

        let mut args = Vec::with_capacity(tokens.len() + 1);
        args.push(PROGRAM.to_string());
        args.extend(tokens);
        Self::from_args(args)
    }

    /// Build a descriptor from a ready-to-run token sequence whose first
    /// element is the program name.
    pub fn from_args(args: Vec<String>) -> Result<Self> {
        let mut method: Option<String> = None;
        let mut headers = Vec::new();
        let mut cookie: Option<String> = None;
        let mut body: Option<String> = None;
        let mut url_index: Option<usize> = None;
        let mut url_prefix = String::new();

        let mut i = 1;
        while i < args.len() {
            let token = args[i].as_str();
            let Some((flag, inline)) = split_flag(token) else {
                if url_index.is_none() {
                    url_index = Some(i);
                }
                i += 1;
                continue;
            };

            if !takes_value(flag) {
                i += 1;
                continue;
            }

            let (value, value_index) = match inline {
                Some(v) => (v.to_string(), i),
                None => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| Error::Parse(format!("option {} is missing its value", flag)))?;
                    (v.clone(), i)
                }
            };

            match flag {
                "-H" | "--header" => headers.push(split_header(&value)),
                "-b" | "--cookie" => cookie = Some(value),
                "-X" | "--request" => method = Some(value.to_uppercase()),
                "--url" if url_index.is_none() => {
                    let token = &args[value_index];
                    url_prefix = token[..token.len() - value.len()].to_string();
                    url_index = Some(value_index);
                }
                f if DATA_FLAGS.contains(&f) => {
                    body = Some(match body {
                        Some(existing) => format!("{}&{}", existing, value),
                        None => value,
                    });
                }
                _ => {}
            }
            i += 1;
        }

        let url_index = url_index
            .ok_or_else(|| Error::Parse("no URL found in captured request".to_string()))?;
        let url = args[url_index][url_prefix.len()..].to_string();
        if url.trim().is_empty() {
            return Err(Error::Parse("captured URL is empty".to_string()));
        }

        let method = method.unwrap_or_else(|| {
            let implied = if body.is_some() { "POST" } else { "GET" };
            implied.to_string()
        });

        Ok(Self {
            method,
            url,
            headers,
            cookie,
            body,
            args,
            url_index,
            url_prefix,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Tokens ready for process invocation; `args()[0]` is the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// A new descriptor identical to this one except for its URL.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        let url = url.into();
        let mut derived = self.clone();
        derived.args[self.url_index] = format!("{}{}", self.url_prefix, url);
        derived.url = url;
        derived
    }

    /// Set the `limit` query parameter on a conversations-collection URL.
    /// Other URLs are returned unchanged. Works on the raw string so the
    /// rest of the captured URL is untouched.
    pub fn with_limit(&self, limit: u32) -> Self {
        if !self.url.contains(CONVERSATIONS_SEGMENT) {
            log::debug!("URL does not reference {}; limit left as captured", CONVERSATIONS_SEGMENT);
            return self.clone();
        }
        self.with_url(set_limit(&self.url, limit))
    }
}

/// Outcome of checking a descriptor against an [`ApiProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid { url: String, org_id: String },
    Invalid { reason: String },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    pub fn into_result(self) -> Result<(String, String)> {
        match self {
            ValidationResult::Valid { url, org_id } => Ok((url, org_id)),
            ValidationResult::Invalid { reason } => Err(Error::Validation(reason)),
        }
    }
}

/// Structural check done before any network call, so an unrelated or
/// truncated capture fails with an actionable message.
pub fn validate(descriptor: &RequestDescriptor, profile: &ApiProfile) -> ValidationResult {
    if descriptor.args().len() < 2 {
        return ValidationResult::Invalid {
            reason: "captured request has no URL".to_string(),
        };
    }

    let url = descriptor.url();
    if !url.contains(&profile.host) {
        return ValidationResult::Invalid {
            reason: format!("URL {} does not appear to be a {} API endpoint", url, profile.host),
        };
    }

    if let Err(e) = Url::parse(url) {
        return ValidationResult::Invalid {
            reason: format!("URL {} is not an absolute URL: {}", url, e),
        };
    }

    match extract_org_id(url) {
        Some(org_id) => ValidationResult::Valid {
            url: url.to_string(),
            org_id: org_id.to_string(),
        },
        None => ValidationResult::Invalid {
            reason: "could not find an organization id (/organizations/<id>/) in the URL"
                .to_string(),
        },
    }
}

pub fn extract_org_id(url: &str) -> Option<&str> {
    org_id_regex()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Descriptor for one conversation's messages, rendered as a tree with all
/// tool content, carrying the base request's authentication unchanged.
pub fn build_message_request(
    base: &RequestDescriptor,
    conversation_id: &str,
    profile: &ApiProfile,
) -> Result<RequestDescriptor> {
    if conversation_id.trim().is_empty() {
        return Err(Error::Derivation("conversation id is empty".to_string()));
    }
    let org_id = extract_org_id(base.url()).ok_or_else(|| {
        Error::Derivation(format!("no organization id in base URL {}", base.url()))
    })?;

    let url = format!(
        "{}/organizations/{}/{}/{}?tree=True&rendering_mode=messages&render_all_tools=true",
        profile.api_base.trim_end_matches('/'),
        org_id,
        CONVERSATIONS_SEGMENT,
        conversation_id
    );
    Ok(base.with_url(url))
}

fn org_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"/organizations/([0-9a-fA-F-]+)/").expect("org id regex should compile")
    })
}

fn limit_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"([?&])limit=\d+").expect("limit regex should compile"))
}

fn set_limit(url: &str, limit: u32) -> String {
    if !url.contains('?') {
        return format!("{}?limit={}", url, limit);
    }
    if limit_regex().is_match(url) {
        limit_regex()
            .replace_all(url, format!("${{1}}limit={}", limit).as_str())
            .into_owned()
    } else {
        format!("{}&limit={}", url, limit)
    }
}

/// Drop `#` comments and fold backslash-newline continuations, leaving
/// quoted values (embedded newlines included) exactly as captured.
fn join_continuations(raw: &str) -> String {
    let raw = raw.replace("\r\n", "\n");
    let mut out = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;

    for line in raw.split_inclusive('\n') {
        if quote.is_none() && line.trim_start().starts_with('#') {
            continue;
        }
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            if c == '\\' && quote != Some('\'') {
                match chars.next() {
                    Some('\n') if quote.is_none() => out.push(' '),
                    Some('\n') => {}
                    Some(escaped) => {
                        out.push(c);
                        out.push(escaped);
                    }
                    None => out.push(c),
                }
                continue;
            }
            match (quote, c) {
                (None, '#') if out.chars().last().is_none_or(char::is_whitespace) => {
                    if line.ends_with('\n') {
                        out.push('\n');
                    }
                    break;
                }
                (None, '\'' | '"') => quote = Some(c),
                (Some(q), _) if q == c => quote = None,
                _ => {}
            }
            out.push(c);
        }
    }
    out
}

/// Split an option token into its name and an attached value: `-XPOST`,
/// `--url=https://...`, or the trailing letter of a bundle such as `-sH`.
/// Returns `None` for positional tokens.
fn split_flag(token: &str) -> Option<(&str, Option<&str>)> {
    if token.starts_with("--") {
        if let Some((name, value)) = token.split_once('=')
            && takes_value(name)
        {
            return Some((name, Some(value)));
        }
        return Some((token, None));
    }

    let bundle = token.strip_prefix('-').filter(|b| !b.is_empty())?;
    let valued = bundle.char_indices().find_map(|(at, c)| {
        short_value_flag(c).map(|short| (short, &bundle[at + c.len_utf8()..]))
    });
    match valued {
        Some((short, rest)) => Some((short, (!rest.is_empty()).then_some(rest))),
        None => Some((token, None)),
    }
}

fn short_value_flag(letter: char) -> Option<&'static str> {
    VALUE_FLAGS
        .iter()
        .copied()
        .find(|f| f.len() == 2 && f[1..].starts_with(letter))
}

fn takes_value(flag: &str) -> bool {
    VALUE_FLAGS.contains(&flag)
}

fn split_header(value: &str) -> (String, String) {
    match value.split_once(':') {
        Some((name, v)) => (name.trim().to_string(), v.trim().to_string()),
        None => (value.trim().to_string(), String::new()),
    }
}
