//! Command-line interface
//!
//! Only the shape of the arguments is checked here. Combination rules (for
//! example `--url` with `--bucket`) belong to the request check, so that a
//! bad combination still produces the full report.

use crate::config::EnvManager;
use crate::credentials::Credentials;
use crate::i18n::Locale;
use crate::models::{DownloadRequest, ProbeRequest, UploadRequest};
use clap::{Args, Parser, Subcommand};
use once_cell::sync::Lazy;
use regex::Regex;

/// Diagnose why an upload to or download from BOS fails
#[derive(Parser, Debug, Clone)]
#[command(name = "bosprobe")]
#[command(version, about, long_about = None)]
#[command(after_long_help = EnvManager::display_env_help())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Echo informational log entries to the terminal
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Echo debug log entries to the terminal
    #[arg(long, global = true)]
    pub debug: bool,

    /// Report language (en, zh)
    #[arg(long, global = true, value_name = "LANG")]
    pub lang: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload one object and diagnose the result
    Upload(UploadArgs),
    /// Download one object and diagnose the result
    Download(DownloadArgs),
}

/// Options shared by both probes
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Access key id (falls back to BCE_ACCESS_KEY_ID)
    #[arg(long)]
    pub ak: Option<String>,

    /// Secret access key (falls back to BCE_SECRET_ACCESS_KEY)
    #[arg(long)]
    pub sk: Option<String>,

    /// Endpoint to probe, e.g. bj.bcebos.com
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub bucket: Option<String>,

    /// Object key
    #[arg(long)]
    pub object: Option<String>,

    /// Local file to upload, or download destination
    #[arg(long, value_name = "PATH")]
    pub local_path: Option<String>,

    /// Ignore the cached endpoint of the bucket and look it up again
    #[arg(long)]
    pub refresh_endpoint: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Full object URL; excludes --bucket, --object and --endpoint
    #[arg(long)]
    pub url: Option<String>,
}

impl Cli {
    /// Validate argument values that clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if let Some(lang) = &self.lang {
            if Locale::parse(lang).is_none() {
                return Err(format!("Unsupported language '{}', expected en or zh", lang));
            }
        }
        Ok(())
    }

    pub fn target(&self) -> &TargetArgs {
        match &self.command {
            Command::Upload(args) => &args.target,
            Command::Download(args) => &args.target,
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Build the probe request with the resolved credentials
    pub fn to_request(&self, credentials: Credentials) -> ProbeRequest {
        let target = self.target().clone();
        match &self.command {
            Command::Upload(_) => ProbeRequest::Upload(UploadRequest {
                credentials,
                endpoint: target.endpoint,
                bucket: target.bucket,
                object: target.object,
                local_path: target.local_path,
                refresh_endpoint: target.refresh_endpoint,
            }),
            Command::Download(args) => ProbeRequest::Download(DownloadRequest {
                credentials,
                endpoint: target.endpoint,
                bucket: target.bucket,
                object: target.object,
                local_path: target.local_path,
                url: args.url.clone(),
                refresh_endpoint: target.refresh_endpoint,
            }),
        }
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

const MASK: &str = "******";

static SECRET_ASSIGNMENT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(--(?:ak|sk))=.*$").ok());

fn is_secret_flag(arg: &str) -> bool {
    arg == "--ak" || arg == "--sk"
}

/// Command line for the run log with `--ak`/`--sk` values masked
pub fn sanitize_command_line<S: AsRef<str>>(args: &[S]) -> String {
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;

    for arg in args.iter().map(AsRef::as_ref) {
        if mask_next {
            out.push(MASK.to_string());
            mask_next = false;
            continue;
        }
        if is_secret_flag(arg) {
            mask_next = true;
            out.push(arg.to_string());
            continue;
        }
        let masked = match SECRET_ASSIGNMENT.as_ref() {
            Some(re) if re.is_match(arg) => {
                re.replace(arg, format!("${{1}}={}", MASK)).into_owned()
            }
            _ => arg.to_string(),
        };
        out.push(quote(masked));
    }

    out.join(" ")
}

fn quote(arg: String) -> String {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg
    }
}
