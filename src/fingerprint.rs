// src/fingerprint.rs
//! Content fingerprinting: normalized article text hashed to a fixed-length
//! identity. The fingerprint is an equality fast-path only; one changed
//! character yields a completely different hash, so similarity matching is
//! a separate concern (see `similarity`).

/// Normalize scraped article text for hashing and comparison: decode HTML
/// entities, strip markup, fold punctuation variants to ASCII, case-fold,
/// collapse whitespace.
pub fn normalize_content(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags. Tags separate words ("</p><p>"), so they become
    //    spaces for the whitespace collapse to fold.
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Fold typographic and width variants to one ASCII form
    out = fold_punctuation(&out);

    // 4) Case-fold
    out = out.to_lowercase();

    // 5) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Curly quotes, guillemets, long dashes, ellipsis, NBSP and the fullwidth
/// ASCII block all collapse onto plain ASCII so that wire-service
/// typography does not split identities.
fn fold_punctuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{3000}' => out.push(' '),
            // Fullwidth !..~ maps straight onto ASCII 0x21..0x7E.
            '\u{FF01}'..='\u{FF5E}' => {
                out.push(char::from_u32(c as u32 - 0xFEE0).unwrap_or(c));
            }
            _ => out.push(c),
        }
    }
    out
}

/// SHA-256 over normalized text, rendered as 64 lowercase hex chars.
pub fn fingerprint(text: &str) -> String {
    hash_hex(&normalize_content(text))
}

/// Hash already-normalized text. Callers that normalize once and reuse the
/// result (the engine does) skip the second normalization pass.
pub fn hash_normalized(normalized: &str) -> String {
    hash_hex(normalized)
}

fn hash_hex(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
