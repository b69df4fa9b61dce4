//! Properties of the variable model, templates and matcher, checked
//! through the public API.

use aloe::matcher::Matcher;
use aloe::runtime::{LabelFilter, ScopeChain};
use aloe::template::Template;
use aloe::variables::{MergePolicy, Variable, VariableMap};
use proptest::prelude::*;
use regex::Regex;
use serde_json::json;

fn variable_map() -> impl Strategy<Value = VariableMap> {
    prop::collection::vec(("[a-e]{1,2}", any::<i32>()), 0..6)
        .prop_map(|pairs| pairs.into_iter().map(|(k, v)| (k, Variable::from(v))).collect())
}

proptest! {
    #[test]
    fn test_overwrite_merge_is_idempotent(dst in variable_map(), src in variable_map()) {
        let once = dst.merged(MergePolicy::Overwrite, &[&src]).unwrap();
        let twice = once.merged(MergePolicy::Overwrite, &[&src]).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_conflict_detection_matches_conflict_merge(dst in variable_map(), src in variable_map()) {
        let detected = dst.is_conflict(&[&src]);
        let failed = dst.merged(MergePolicy::Conflict, &[&src]).is_err();
        prop_assert_eq!(detected, failed);
    }

    #[test]
    fn test_scope_push_agrees_with_conflict_detection(outer in variable_map(), inner in variable_map()) {
        let chain = ScopeChain::root(outer.clone());
        prop_assert_eq!(chain.push(inner.clone()).is_err(), outer.is_conflict(&[&inner]));
    }

    #[test]
    fn test_focus_always_wins(labels in prop::collection::vec("[a-c]", 0..4)) {
        let filter = LabelFilter::new(["a"], ["a", "b", "c"]);
        prop_assert_eq!(filter.selects(&labels), labels.iter().any(|l| l == "a"));
    }
}

#[test]
fn test_exists_and_regexp_operators() {
    let m = Matcher::from_pattern(&json!({"status": {"$exists": true, "$regexp": "^ok"}})).unwrap();
    assert!(m.matches(&json!({"status": "okay"})).is_ok());
    assert!(m.matches(&json!({})).is_err());
}

#[test]
fn test_len_operator() {
    let m = Matcher::from_pattern(&json!({"items": {"$len": 2}})).unwrap();
    assert!(m.matches(&json!({"items": ["a", "b"]})).is_ok());

    let failures = m.matches(&json!({"items": ["a"]})).unwrap_err();
    let rendered = aloe::matcher::render_failures(&failures);
    assert!(rendered.contains(".items"), "{}", rendered);
    assert!(rendered.contains('2') && rendered.contains('1'), "{}", rendered);
}

#[test]
fn test_random_template_follows_pattern() {
    let template = Template::parse("%{random([a-z]{5})}").unwrap();
    let shape = Regex::new("^[a-z]{5}$").unwrap();
    for _ in 0..50 {
        let rendered = template.render(&VariableMap::new()).unwrap();
        assert!(shape.is_match(&rendered), "{}", rendered);
    }
}
