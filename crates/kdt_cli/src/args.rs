//! Offline, deterministic CLI argument parsing & validation.
//! - No networked paths (reject http/https schemes)
//! - Feature schemas are declared up front, the same way `kdt_io::FeatureSchema`
//!   requires: a flat JSON object of `feature_id -> type name`.

use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Parser)]
#[command(name = "kdt", about = "Offline Konditional engine CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a snapshot and resolve one feature for a context.
    Eval(EvalArgs),
    /// Decode two snapshots and report which features changed.
    Diff(DiffArgs),
    /// Decode a snapshot and report whether it parses cleanly.
    Validate(ValidateArgs),
}

#[derive(Debug, Parser)]
pub struct EvalArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    #[arg(long)]
    pub schema: PathBuf,
    #[arg(long)]
    pub feature: String,

    #[arg(long)]
    pub stable_id: Option<String>,
    #[arg(long)]
    pub locale: Option<String>,
    #[arg(long)]
    pub platform: Option<String>,
    #[arg(long)]
    pub app_version: Option<String>,
    /// Repeatable `key=value`; the value is parsed as JSON, falling back to a
    /// bare string if it isn't valid JSON.
    #[arg(long = "axis")]
    pub axes: Vec<String>,

    /// Build the full EXPLAIN decision trace instead of just the value.
    #[arg(long)]
    pub explain: bool,
    #[arg(long, value_parser = ["json", "html"])]
    pub render: Option<String>,
    /// JSON literal used only if `--feature` isn't declared in the snapshot.
    #[arg(long)]
    pub fallback: Option<String>,
    #[arg(long)]
    pub skip_unknown_keys: bool,
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Parser)]
pub struct DiffArgs {
    #[arg(long)]
    pub base: PathBuf,
    #[arg(long)]
    pub candidate: PathBuf,
    #[arg(long)]
    pub schema: PathBuf,
    #[arg(long, value_parser = ["json", "html"])]
    pub render: Option<String>,
    #[arg(long)]
    pub skip_unknown_keys: bool,
}

#[derive(Debug, Parser)]
pub struct ValidateArgs {
    #[arg(long)]
    pub snapshot: PathBuf,
    #[arg(long)]
    pub schema: PathBuf,
    #[arg(long)]
    pub skip_unknown_keys: bool,
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    BadSchema(String),
    BadAxis(String),
    BadFallback(String),
    BadContext(String),
    Decode(String),
    Evaluate(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadSchema(s) => write!(f, "invalid schema file: {s}"),
            BadAxis(s) => write!(f, "invalid --axis value: {s}"),
            BadFallback(s) => write!(f, "invalid --fallback value: {s}"),
            BadContext(s) => write!(f, "invalid context flag: {s}"),
            Decode(s) => write!(f, "decode failed: {s}"),
            Evaluate(s) => write!(f, "evaluation failed: {s}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Reject any explicit network scheme; local paths only.
fn has_scheme(s: &str) -> bool {
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub fn ensure_local_file(p: &Path, label: &'static str) -> Result<(), CliError> {
    let s = p.to_string_lossy().to_string();
    if has_scheme(&s) {
        return Err(CliError::NonLocalPath(format!("{label} {s}")));
    }
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {s}")))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {s}")));
    }
    Ok(())
}

pub fn read_to_string(p: &Path, label: &'static str) -> Result<String, CliError> {
    ensure_local_file(p, label)?;
    fs::read_to_string(p).map_err(|e| CliError::NotFound(format!("{label} {}: {e}", p.display())))
}

/// Parse a repeatable `--axis key=value` into its pieces, defaulting to a
/// bare string value when the right-hand side isn't valid JSON.
pub fn parse_axis(raw: &str) -> Result<(String, serde_json::Value), CliError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::BadAxis(format!("{raw} (expected key=value)")))?;
    if key.is_empty() {
        return Err(CliError::BadAxis(raw.to_string()));
    }
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_axis_accepts_json_value() {
        let (k, v) = parse_axis("age=30").unwrap();
        assert_eq!(k, "age");
        assert_eq!(v, serde_json::json!(30));
    }

    #[test]
    fn parse_axis_falls_back_to_bare_string() {
        let (k, v) = parse_axis("cohort=beta").unwrap();
        assert_eq!(k, "cohort");
        assert_eq!(v, serde_json::json!("beta"));
    }

    #[test]
    fn parse_axis_rejects_missing_equals() {
        assert!(parse_axis("cohort").is_err());
    }

    #[test]
    fn non_local_path_detection() {
        assert!(has_scheme("http://x"));
        assert!(!has_scheme("/tmp/file.json"));
    }
}
