// src/canonical.rs
//! URL canonicalization: collapse the many URL spellings of one article
//! into a single canonical identity string.
//!
//! Sources that embed a stable article id in their URLs get an opaque
//! `{source}:{id}` identity, which survives even a full URL restructure
//! on the publisher's side. Everything else gets a normalized URL.

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use regex::Regex;
use url::Url;

use crate::config::DedupConfig;

/// Compiled canonicalization state. Built once per config load; cheap to
/// share behind the engine.
#[derive(Debug)]
pub struct Canonicalizer {
    /// Exact tracking-parameter names to drop.
    deny_exact: HashSet<String>,
    /// Prefixes from `*`-suffixed denylist entries ("utm_*" -> "utm_").
    deny_prefixes: Vec<String>,
    /// Source name (lowercase) -> article-id extraction pattern.
    id_patterns: HashMap<String, Regex>,
}

impl Canonicalizer {
    /// Compiles denylist globs and per-source id patterns. An invalid
    /// pattern is a config error and fails the whole load.
    pub fn from_config(cfg: &DedupConfig) -> anyhow::Result<Self> {
        let mut deny_exact = HashSet::new();
        let mut deny_prefixes = Vec::new();
        for entry in &cfg.tracking_param_denylist {
            match entry.strip_suffix('*') {
                Some(prefix) => deny_prefixes.push(prefix.to_string()),
                None => {
                    deny_exact.insert(entry.clone());
                }
            }
        }

        let mut id_patterns = HashMap::new();
        for (source, pattern) in &cfg.source_id_patterns {
            let re = Regex::new(pattern)
                .with_context(|| format!("invalid id pattern for source '{source}'"))?;
            id_patterns.insert(source.to_lowercase(), re);
        }

        Ok(Self {
            deny_exact,
            deny_prefixes,
            id_patterns,
        })
    }

    /// Canonical identity for a scraped URL. Total: malformed input falls
    /// back to the trimmed, lowercased raw string instead of failing.
    pub fn canonicalize(&self, source: &str, raw_url: &str) -> String {
        let trimmed = raw_url.trim();

        // 1) Source-specific id extraction wins over URL normalization.
        if let Some(id) = self.extract_source_id(source, trimmed) {
            return format!("{}:{}", source.to_lowercase(), id);
        }

        // 2) Structural normalization of the URL itself.
        match self.normalize_url(trimmed) {
            Some(canonical) => canonical,
            None => {
                tracing::warn!(url = %trimmed, "unparseable url, falling back to raw identity");
                trimmed.to_lowercase()
            }
        }
    }

    fn extract_source_id(&self, source: &str, url: &str) -> Option<String> {
        let re = self.id_patterns.get(&source.to_lowercase())?;
        let caps = re.captures(url)?;
        // First capture group is the id; a group-less pattern uses the
        // whole match.
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }

    fn normalize_url(&self, raw: &str) -> Option<String> {
        let mut url = Url::parse(raw).ok()?;

        // Scheme and host come back lowercased from the parser; default
        // ports are already dropped. Fragments never affect identity.
        url.set_fragment(None);

        // Drop tracking params, then sort what is left so param order
        // cannot split one article into two identities.
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !self.is_tracking_param(k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            url.set_query(Some(&query));
        }

        // Trailing slashes collapse so the result is a fixed point of
        // this function. The root path stays "/".
        let path = url.path();
        if path != "/" && path.ends_with('/') {
            let stripped = path.trim_end_matches('/').to_string();
            if stripped.is_empty() {
                url.set_path("/");
            } else {
                url.set_path(&stripped);
            }
        }

        Some(url.to_string())
    }

    fn is_tracking_param(&self, key: &str) -> bool {
        if self.deny_exact.contains(key) {
            return true;
        }
        self.deny_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }
}
