// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "DEDUP_CONFIG_PATH";

/// Tunable knobs for the dedup engine. Every field has a shipped default,
/// so a partial config file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Normalized title similarity at or above this is a near-duplicate.
    pub title_similarity_threshold: f64,
    /// Normalized body similarity at or above this is a near-duplicate.
    pub body_similarity_threshold: f64,
    /// Query parameters stripped during URL canonicalization. A trailing
    /// `*` matches any parameter with the given prefix.
    pub tracking_param_denylist: Vec<String>,
    /// Source name -> id-extraction regex. First capture group is the
    /// article id; a group-less pattern uses the whole match.
    pub source_id_patterns: HashMap<String, String>,
    /// Recency window for the near-duplicate scan, in seconds. Absent
    /// means "the current UTC calendar day".
    pub near_dup_window_secs: Option<u64>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: 0.90,
            body_similarity_threshold: 0.85,
            tracking_param_denylist: default_denylist(),
            source_id_patterns: HashMap::new(),
            near_dup_window_secs: None,
        }
    }
}

impl DedupConfig {
    pub fn recency_window(&self) -> RecencyWindow {
        match self.near_dup_window_secs {
            Some(secs) => RecencyWindow::Seconds(secs),
            None => RecencyWindow::CalendarDay,
        }
    }
}

fn default_denylist() -> Vec<String> {
    [
        "utm_*", "fbclid", "gclid", "dclid", "msclkid", "yclid", "mc_cid", "mc_eid", "igshid",
        "cmpid", "ito", "ref",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// How far back the near-duplicate working set reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyWindow {
    /// Everything accepted since UTC midnight.
    CalendarDay,
    /// Everything accepted in the last N seconds.
    Seconds(u64),
}

impl RecencyWindow {
    /// Inclusive cutoff timestamp for `now_unix`.
    pub fn cutoff_unix(self, now_unix: u64) -> u64 {
        match self {
            // Unix time is UTC-midnight aligned, so flooring to the day
            // is integer math.
            RecencyWindow::CalendarDay => now_unix - (now_unix % 86_400),
            RecencyWindow::Seconds(secs) => now_unix.saturating_sub(secs),
        }
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<DedupConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading dedup config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $DEDUP_CONFIG_PATH
/// 2) config/dedup.toml
/// 3) config/dedup.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<DedupConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("DEDUP_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/dedup.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/dedup.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(DedupConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DedupConfig> {
    // Try TOML first unless the extension or content says JSON.
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        if let Ok(v) = toml::from_str::<DedupConfig>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<DedupConfig>(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<DedupConfig>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported dedup config format"))
}
