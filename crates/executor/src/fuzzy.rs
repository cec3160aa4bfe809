//! Fuzzy matching of a target string against the last known interactables.
//!
//! Pure scoring over an explicitly passed element list. Used only after the
//! locator cascade has failed.

use webpilot_core::Interactable;

/// Scores below this are not trusted as a match.
pub const MIN_SCORE: f64 = 1.0;

const ID_WEIGHT: f64 = 3.0;
const LABEL_WEIGHT: f64 = 2.0;
const HINT_WEIGHT: f64 = 2.0;
const ROLE_WEIGHT: f64 = 1.0;

/// Weighted similarity of `query` to the element's id, label, locator hint
/// and role.
pub fn score(query: &str, element: &Interactable) -> f64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    field_score(&query, &element.id, ID_WEIGHT)
        + field_score(&query, &element.label, LABEL_WEIGHT)
        + field_score(&query, &element.locator_hint, HINT_WEIGHT)
        + field_score(&query, &element.role, ROLE_WEIGHT)
}

/// Highest scoring element that has a bounding box, if it clears
/// [`MIN_SCORE`]. Ties keep the earlier element.
pub fn best_match<'a>(query: &str, elements: &'a [Interactable]) -> Option<(&'a Interactable, f64)> {
    let mut best: Option<(&Interactable, f64)> = None;
    for element in elements.iter().filter(|e| e.bbox.is_some()) {
        let s = score(query, element);
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((element, s));
        }
    }
    best.filter(|(_, s)| *s >= MIN_SCORE)
}

fn field_score(query: &str, field: &str, weight: f64) -> f64 {
    let field = field.trim().to_lowercase();
    if field.is_empty() {
        return 0.0;
    }
    if field == query {
        return weight;
    }

    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let field_tokens = tokens(&field);
    // Containment counts only on whole-token boundaries, so a one-letter id
    // does not match every query that happens to contain that letter.
    if contains_run(&field_tokens, &query_tokens) || contains_run(&query_tokens, &field_tokens) {
        return weight * 0.6;
    }

    let shared = query_tokens
        .iter()
        .filter(|t| field_tokens.contains(t))
        .count();
    weight * 0.4 * (shared as f64 / query_tokens.len() as f64)
}

fn contains_run(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}
