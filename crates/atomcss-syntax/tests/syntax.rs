//! Integration tests for the text-level helpers.

use atomcss_syntax::entries::{entries, entries_to_css};
use atomcss_syntax::escape::to_class_selector;
use atomcss_syntax::split::split_code;
use atomcss_syntax::values::{ValueKinds, bracket, fraction, handle, percent, px, rem};
use atomcss_syntax::variant_group::{expand_variant_group, try_expand_variant_group};
use atomcss_syntax::SyntaxError;
use insta::assert_snapshot;

// ============================================================================
// Variant groups
// ============================================================================

#[test]
fn markup_class_list_expands() {
    let tokens = expand_variant_group(
        "flex md:(p-4 hover:(bg-red-500 !text-white)) w-[calc(100%_-_2rem)] grid-(cols-2 gap-1)",
    );
    assert_snapshot!(tokens.join("\n"), @r"
    flex
    md:p-4
    md:hover:bg-red-500
    !md:hover:text-white
    w-[calc(100%_-_2rem)]
    grid-cols-2
    grid-gap-1
    ");
}

#[test]
fn malformed_groups_report_positions() {
    assert_eq!(
        try_expand_variant_group("hover:(a b"),
        Err(SyntaxError::UnclosedGroup(6))
    );
    assert_eq!(
        try_expand_variant_group("a) b"),
        Err(SyntaxError::UnexpectedClose(1))
    );
    assert_eq!(expand_variant_group("a) b"), vec!["a)", "b"]);
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn handler_chains_try_in_order() {
    let chain = [bracket, fraction, percent];
    assert_eq!(handle("1/4", &chain).as_deref(), Some("25%"));
    assert_eq!(handle("30", &chain).as_deref(), Some("30%"));
    assert_eq!(handle("[2px]", &chain).as_deref(), Some("2px"));

    assert_eq!(px("3").as_deref(), Some("3px"));
    assert_eq!(rem("2").as_deref(), Some("0.5rem"));
    assert_eq!(ValueKinds::SPACING.resolve("auto").as_deref(), Some("auto"));
    assert_eq!(ValueKinds::SPACING.resolve("inherit").as_deref(), Some("inherit"));
    assert_eq!(ValueKinds::SPACING.resolve("lots"), None);
}

// ============================================================================
// Selectors, entries, splitting
// ============================================================================

#[test]
fn escaped_selector_with_body() {
    let selector = to_class_selector("sm:w-1/2");
    let body = entries_to_css(&entries(&[("width", "50%")])).unwrap_or_default();
    assert_eq!(format!("{}{{{}}}", selector, body), ".sm\\:w-1\\/2{width:50%;}");
}

#[test]
fn split_keeps_plausible_tokens() {
    let found = split_code("const cls = `p-2 ${active ? 'bg-red' : ''}`; let n = 42;");
    assert!(found.contains(&"p-2"));
    assert!(found.contains(&"bg-red"));
    assert!(!found.contains(&"42"));
}
