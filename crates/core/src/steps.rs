//! Splitting a solution description into display steps.
//!
//! Descriptions come in two shapes: plain text numbered `1) ... 2) ...`, or rich markup from
//! an editor. Markup is read from its list items first, then from numbered paragraphs, and as a
//! last resort shown whole.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<[a-z][\s\S]*>").expect("Invalid markup regex"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<li(?:\s[^>]*)?>(.*?)</li>").expect("Invalid list item regex")
});
static MARKUP_STEP_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:<p[^>]*>)?\s*(?:\d+[.)]\s*|</p>)").expect("Invalid markup step regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));
static PLAIN_STEP_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\)\s*").expect("Invalid step regex"));

/// Returns `true` if the description looks like markup rather than plain text.
pub fn is_markup(description: &str) -> bool {
    MARKUP.is_match(description)
}

/// Splits a description into its ordered steps.
///
/// Plain text is split on `N)` markers and blank parts are dropped. Markup yields the inner
/// content of each list item, or failing that the numbered fragments that still have text once
/// tags are stripped, or failing that the whole description as a single step.
pub fn parse_steps(description: &str) -> Vec<String> {
    if is_markup(description) {
        markup_steps(description)
    } else {
        PLAIN_STEP_BREAK
            .split(description)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn markup_steps(description: &str) -> Vec<String> {
    let items: Vec<String> = LIST_ITEM
        .captures_iter(description)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if !items.is_empty() {
        return items;
    }

    let fragments: Vec<String> = MARKUP_STEP_BREAK
        .split(description)
        .filter(|part| !TAG.replace_all(part, "").trim().is_empty())
        .map(|part| part.trim().to_string())
        .collect();
    if !fragments.is_empty() {
        return fragments;
    }

    vec![description.to_string()]
}

/// Strips tags for terminal display.
pub fn strip_tags(markup: &str) -> String {
    TAG.replace_all(markup, "").trim().to_string()
}
