// tests/dedup_fingerprint.rs
use newswire_dedup::{fingerprint, normalize_content};

#[test]
fn formatting_variants_share_one_fingerprint() {
    // Same story as filed by three feeds: spacing, smart punctuation and
    // markup differ, the words do not.
    let a = "Stocks rally as Fed signals pause \u{2014} markets cheer";
    let b = "  Stocks   rally as FED signals pause - markets cheer  ";
    let c = "<p>Stocks rally as Fed signals pause &mdash; markets&nbsp;cheer</p>";

    let fp = fingerprint(a);
    assert_eq!(fingerprint(b), fp);
    assert_eq!(fingerprint(c), fp);
}

#[test]
fn fingerprints_are_64_lowercase_hex_chars() {
    let fp = fingerprint("Treasury yields slip ahead of CPI data");
    assert_eq!(fp.len(), 64);
    assert!(fp
        .chars()
        .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch)));
}

#[test]
fn distinct_stories_get_distinct_fingerprints() {
    assert_ne!(
        fingerprint("Oil rises on supply concerns"),
        fingerprint("Oil falls on demand concerns")
    );
}

#[test]
fn normalization_survives_wire_html() {
    let scraped = "<div class=\"article\"><h2>ECB &amp; Fed:</h2>\
                   <p>rates\u{00A0}on\u{00A0}hold\u{2026}</p></div>";
    assert_eq!(normalize_content(scraped), "ecb & fed: rates on hold...");
}

#[test]
fn fullwidth_digits_and_punctuation_fold() {
    // Fullwidth "ＧＤＰ＋３％" folds to ASCII before hashing.
    let wide = "\u{FF27}\u{FF24}\u{FF30}\u{FF0B}\u{FF13}\u{FF05}";
    assert_eq!(normalize_content(wide), "gdp+3%");
    assert_eq!(fingerprint(wide), fingerprint("GDP+3%"));
}
