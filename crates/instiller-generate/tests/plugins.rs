use std::fs;

use regex::Regex;

use instiller_generate::generators::{
    ADDRESS, ALPHANUMERIC, CUSTOM_LIST, DATE, FILE2LIST, HUMAN_NAMES, NUMBER, WORD,
};
use instiller_generate::{GenerationError, PluginRegistry};

#[test]
fn defaults_register_every_builtin() {
    let registry = PluginRegistry::with_defaults(None);
    let mut expected = vec![
        ADDRESS,
        ALPHANUMERIC,
        CUSTOM_LIST,
        DATE,
        FILE2LIST,
        HUMAN_NAMES,
        NUMBER,
        WORD,
    ];
    expected.sort();
    assert_eq!(registry.names(), expected);
}

#[test]
fn alphanumeric_matches_its_pattern() {
    let registry = PluginRegistry::with_defaults(Some(1));
    let default = Regex::new("^[A-Za-z0-9]{8}$").expect("regex");
    let custom = Regex::new("^ID-[0-9]{3}$").expect("regex");

    for _ in 0..10 {
        let value = registry.invoke(ALPHANUMERIC, "", "").expect("default pattern");
        assert!(default.is_match(&value), "{value}");
        let value = registry
            .invoke(ALPHANUMERIC, "ID-[0-9]{3}", "")
            .expect("custom pattern");
        assert!(custom.is_match(&value), "{value}");
    }

    let err = registry
        .invoke(ALPHANUMERIC, "([unclosed", "")
        .expect_err("invalid regex");
    assert!(matches!(err, GenerationError::Plugin { .. }));
}

#[test]
fn seeded_registries_repeat_their_output() {
    let first = PluginRegistry::with_defaults(Some(42));
    let second = PluginRegistry::with_defaults(Some(42));
    for name in [ALPHANUMERIC, NUMBER, WORD, HUMAN_NAMES] {
        let left: Vec<String> = (0..5)
            .map(|_| first.invoke(name, "", "").expect("first"))
            .collect();
        let right: Vec<String> = (0..5)
            .map(|_| second.invoke(name, "", "").expect("second"))
            .collect();
        assert_eq!(left, right, "{name}");
    }
}

#[test]
fn numbers_stay_in_range() {
    let registry = PluginRegistry::with_defaults(Some(5));
    for _ in 0..50 {
        let value: i64 = registry
            .invoke(NUMBER, "-3,3", "")
            .expect("number")
            .parse()
            .expect("integer");
        assert!((-3..=3).contains(&value));
    }
    let err = registry.invoke(NUMBER, "low,high", "").expect_err("not numbers");
    assert!(matches!(err, GenerationError::Plugin { .. }));
}

#[test]
fn words_follow_the_requested_count() {
    let registry = PluginRegistry::with_defaults(Some(5));
    let words = registry.invoke(WORD, "3", "").expect("words");
    assert_eq!(words.split(' ').count(), 3);
    assert!(registry.invoke(WORD, "many", "").is_err());
}

#[test]
fn custom_list_picks_a_candidate() {
    let registry = PluginRegistry::with_defaults(Some(5));
    for _ in 0..20 {
        let value = registry
            .invoke(CUSTOM_LIST, "red, green ,blue", "")
            .expect("pick");
        assert!(["red", "green", "blue"].contains(&value.as_str()));
    }
    assert!(registry.invoke(CUSTOM_LIST, " , ", "").is_err());
}

#[test]
fn file_list_cycles_through_lines() {
    let path = std::env::temp_dir().join(format!("instiller-words-{}.txt", uuid::Uuid::new_v4()));
    fs::write(&path, "north\nsouth\n").expect("write word list");
    let pattern = path.display().to_string();

    let registry = PluginRegistry::with_defaults(None);
    let drawn: Vec<String> = (0..3)
        .map(|_| registry.invoke(FILE2LIST, &pattern, "").expect("line"))
        .collect();
    assert_eq!(drawn, vec!["north", "south", "north"]);

    fs::remove_file(&path).ok();
    let err = registry
        .invoke(FILE2LIST, "/no/such/list.txt", "")
        .expect_err("missing file");
    assert!(matches!(err, GenerationError::Plugin { .. }));
}

#[test]
fn dates_use_the_pattern_format() {
    let registry = PluginRegistry::with_defaults(Some(9));
    let value = registry.invoke(DATE, "", "").expect("date");
    assert!(chrono::NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok());

    let value = registry
        .invoke(DATE, "%Y", "1999-01-01,1999-12-31")
        .expect("year");
    assert_eq!(value, "1999");

    assert!(registry.invoke(DATE, "", "yesterday,today").is_err());
}

#[test]
fn address_template_fills_markers() {
    let registry = PluginRegistry::with_defaults(Some(9));
    let value = registry
        .invoke(ADDRESS, "{zip}|{country}", "")
        .expect("address");
    let parts: Vec<&str> = value.split('|').collect();
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|part| !part.is_empty() && !part.contains('{')));
}
