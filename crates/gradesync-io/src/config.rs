//! Grading configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use gradesync_core::matching::{IdentityMatcher, EXACT_ONLY};
use gradesync_core::model::QuestionId;
use gradesync_core::scoring::VoidPolicy;

use crate::error::InputError;
use crate::roster::RosterOptions;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "gradesync.toml";

/// Top-level gradesync configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

/// Question voiding and penalty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Questions removed for every student.
    #[serde(default)]
    pub void: Vec<QuestionId>,
    /// Questions removed only for students who missed them.
    #[serde(default)]
    pub void_nicely: Vec<QuestionId>,
    /// Points subtracted per wrong answer. Sign is ignored.
    #[serde(default)]
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fuzzy match threshold on a 0–100 scale; 100 means exact only.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Column bindings and text format of the roster file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub id_column: Option<String>,
    #[serde(default)]
    pub name_column: Option<String>,
    #[serde(default)]
    pub mark_column: Option<String>,
    /// Reduce output to id, name and mark columns.
    #[serde(default)]
    pub simplify: bool,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_threshold() -> f64 {
    EXACT_ONLY
}
fn default_encoding() -> String {
    "utf-8".to_string()
}
fn default_separator() -> String {
    ",".to_string()
}
fn default_decimal_separator() -> String {
    ".".to_string()
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            id_column: None,
            name_column: None,
            mark_column: None,
            simplify: false,
            encoding: default_encoding(),
            separator: default_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl PolicyConfig {
    /// Build the core policy, normalizing the penalty sign.
    pub fn void_policy(&self) -> Result<VoidPolicy, InputError> {
        let penalty = normalize_penalty(self.penalty)?;
        Ok(VoidPolicy::new(
            self.void.iter().copied(),
            self.void_nicely.iter().copied(),
            penalty,
        ))
    }
}

impl MatchingConfig {
    pub fn matcher(&self) -> Result<IdentityMatcher, InputError> {
        IdentityMatcher::new(self.threshold)
            .map_err(|_| InputError::InvalidThreshold(self.threshold))
    }
}

impl RosterConfig {
    /// Resolve column bindings and text format into reader/writer options.
    pub fn options(&self) -> Result<RosterOptions, InputError> {
        let id_column = self
            .id_column
            .clone()
            .ok_or(InputError::MissingSetting("roster id column (--id-column)"))?;
        let mark_column = self
            .mark_column
            .clone()
            .ok_or(InputError::MissingSetting("roster mark column (--mark-column)"))?;

        Ok(RosterOptions {
            id_column,
            name_column: self.name_column.clone(),
            mark_column,
            simplify: self.simplify,
            encoding: resolve_encoding(&self.encoding)?,
            separator: parse_separator(&self.separator)?,
            decimal_separator: parse_decimal_separator(&self.decimal_separator)?,
        })
    }
}

/// Penalties are applied as non-negative; a negative value is flipped.
pub fn normalize_penalty(penalty: f64) -> Result<f64, InputError> {
    if !penalty.is_finite() {
        return Err(InputError::InvalidPenalty(penalty));
    }
    if penalty < 0.0 {
        tracing::warn!(
            "penalty {} is negative; using {} (penalties are always subtracted)",
            penalty,
            penalty.abs()
        );
    }
    Ok(penalty.abs())
}

/// Parse a field separator: a single character, or one of the named aliases.
pub fn parse_separator(raw: &str) -> Result<u8, InputError> {
    match raw.to_ascii_lowercase().as_str() {
        "semi" | "semicolon" => return Ok(b';'),
        "comma" => return Ok(b','),
        "tab" | "\\t" => return Ok(b'\t'),
        "pipe" => return Ok(b'|'),
        _ => {}
    }
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(InputError::InvalidSeparator(raw.to_string())),
    }
}

fn parse_decimal_separator(raw: &str) -> Result<char, InputError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(InputError::InvalidDecimalSeparator(raw.to_string())),
    }
}

/// Look up a WHATWG encoding label such as `utf-8`, `latin1` or `windows-1252`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, InputError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| InputError::UnknownEncoding(label.to_string()))
}

/// Parse a comma-separated question list, ignoring non-numeric tokens.
pub fn parse_question_list(raw: &str) -> Vec<QuestionId> {
    let mut ids: Vec<QuestionId> = raw
        .split(',')
        .filter_map(|token| {
            let token = token.trim();
            match token.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    if !token.is_empty() {
                        tracing::warn!("ignoring non-numeric question id '{token}'");
                    }
                    None
                }
            }
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradesync.toml` in the current directory
/// 2. `~/.config/gradesync/config.toml`
pub fn load_config() -> Result<GradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<GradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(GradeConfig::default()),
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradesync"))
}

/// Starter configuration written by `gradesync init`.
pub const SAMPLE_CONFIG: &str = r##"# gradesync configuration

[policy]
# Questions removed from scoring for every student.
void = []
# Questions that only count for students who answered them correctly.
void_nicely = []
# Points subtracted for each wrong (attempted) answer.
penalty = 0.0

[matching]
# Similarity needed to pair a roster id with a detected id (0-100).
# 100 accepts exact matches only.
threshold = 100

[roster]
# id_column = "ID"
# name_column = "Name"
# mark_column = "#Mark"
simplify = false
encoding = "utf-8"
# A single character, or one of: semi, comma, tab, pipe.
separator = ","
decimal_separator = "."
"##;
