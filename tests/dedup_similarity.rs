// tests/dedup_similarity.rs
use newswire_dedup::{similarity_ratio, ArticleKey, MatchRule, NearDupMatcher};

fn key(id: &str, fp: Option<&str>, title: &str, body: &str) -> ArticleKey {
    ArticleKey::new(id, fp.map(str::to_string), title, body)
}

#[test]
fn titles_above_threshold_match_titles_below_do_not() {
    // Suffix edits keep the arithmetic exact: appending N chars to a
    // 51-char base yields similarity 1 - N/(51+N).
    let base = "fed leaves rates unchanged citing cooling inflation";
    let near = format!("{base} now"); // 1 - 4/55  = 0.927
    let far = format!("{base} survey shows"); // 1 - 13/64 = 0.797

    let s_near = similarity_ratio(base, &near);
    let s_far = similarity_ratio(base, &far);
    assert!(s_near > 0.92, "premise: near pair at {s_near}");
    assert!(s_far < 0.81, "premise: far pair at {s_far}");

    let m = NearDupMatcher::new(0.90, 0.85);
    let a = key("https://a.example/1", None, base, "");
    let b = key("https://b.example/2", None, &near, "");
    let c = key("https://c.example/3", None, &far, "");
    assert_eq!(m.near_duplicate_rule(&a, &b), Some(MatchRule::Title));
    assert_eq!(m.near_duplicate_rule(&a, &c), None);
}

#[test]
fn the_relation_is_symmetric_over_a_mixed_grid() {
    let m = NearDupMatcher::new(0.90, 0.85);
    let grid = [
        key(
            "https://a.example/1",
            Some("x1"),
            "Fed leaves rates unchanged",
            "long body text about the fed decision",
        ),
        key("https://b.example/2", Some("x1"), "Different headline", ""),
        key(
            "https://c.example/3",
            None,
            "Fed leaves rates unchanged now",
            "long body text about the fed decision",
        ),
        key("https://d.example/4", None, "", ""),
        key("https://a.example/1", None, "Entirely different", "another body"),
        key("https://e.example/5", Some("x2"), "Fed leaves rates unchanged", "short body"),
    ];
    for x in &grid {
        for y in &grid {
            assert_eq!(m.is_near_duplicate(x, y), m.is_near_duplicate(y, x));
        }
    }
}

#[test]
fn reflexivity_holds_for_any_record_with_content() {
    let m = NearDupMatcher::new(0.90, 0.85);
    let a = key("https://a.example/1", Some("x1"), "Gold steadies near record", "");
    assert!(m.is_near_duplicate(&a, &a));
}

#[test]
fn empty_text_cannot_vacuously_match() {
    let m = NearDupMatcher::new(0.90, 0.85);

    let blank_a = key("https://a.example/1", None, "", "");
    let blank_b = key("https://b.example/2", None, "", "");
    assert!(!m.is_near_duplicate(&blank_a, &blank_b));

    let with_body = key("https://c.example/3", None, "", "some body");
    assert!(!m.is_near_duplicate(&blank_a, &with_body));
}

#[test]
fn body_threshold_applies_when_titles_differ() {
    let m = NearDupMatcher::new(0.90, 0.85);
    let body = "the bank of japan widened its yield curve control band on friday, \
                sending the yen sharply higher against the dollar";
    let edited = format!("{body} in tokyo trading");

    let s = similarity_ratio(body, &edited);
    assert!(s > 0.85, "premise: body pair at {s}");

    let a = key("https://a.example/1", None, "BOJ shocks markets", body);
    let b = key("https://b.example/2", None, "Yen surges after policy shift", &edited);
    assert_eq!(m.near_duplicate_rule(&a, &b), Some(MatchRule::Body));
}

#[test]
fn thresholds_tighten_and_loosen_the_relation() {
    let base = "fed leaves rates unchanged citing cooling inflation";
    let near = format!("{base} now"); // similarity ~0.927

    let a = key("https://a.example/1", None, base, "");
    let b = key("https://b.example/2", None, &near, "");

    let loose = NearDupMatcher::new(0.90, 0.85);
    let tight = NearDupMatcher::new(0.95, 0.85);
    assert!(loose.is_near_duplicate(&a, &b));
    assert!(!tight.is_near_duplicate(&a, &b));
}
