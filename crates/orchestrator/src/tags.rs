// crates/orchestrator/src/tags.rs
//! Tag autocomplete for comma-delimited tag lists. Pure string logic; the
//! input field calls [`suggestions`] on every keystroke and
//! [`apply_suggestion`] when an option is picked.

/// Suggestions are capped so the dropdown stays scannable.
pub const MAX_SUGGESTIONS: usize = 8;

const DELIMITER: char = ',';

/// Case-insensitive substring match of the last comma-separated token in
/// `current` against `known`, excluding tags already present earlier in the
/// list. Ordering follows `known`; at most [`MAX_SUGGESTIONS`] results.
///
/// An empty last token (cursor right after a delimiter) matches every
/// not-yet-present option.
pub fn suggestions(current: &str, known: &[String]) -> Vec<String> {
    let tokens: Vec<&str> = current.split(DELIMITER).map(str::trim).collect();
    let (last, rest) = match tokens.split_last() {
        Some((last, rest)) => (last.to_lowercase(), rest),
        None => (String::new(), &tokens[..]),
    };
    let present: Vec<String> = rest
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    known
        .iter()
        .filter(|option| {
            let lower = option.to_lowercase();
            lower.contains(&last) && !present.contains(&lower)
        })
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Replace the last (possibly partial) token of `current` with `chosen`,
/// then normalize: drop blank tokens, de-duplicate case-insensitively
/// keeping the first-seen casing and order, join with `", "`.
pub fn apply_suggestion(current: &str, chosen: &str) -> String {
    let mut tokens: Vec<String> = current
        .split(DELIMITER)
        .map(|t| t.trim().to_string())
        .collect();
    if let Some(last) = tokens.last_mut() {
        *last = chosen.trim().to_string();
    }

    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let lower = token.to_lowercase();
        if seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        out.push(token);
    }
    out.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn known(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_suggestions_match_last_token_excluding_present() {
        let options = known(&["eth", "btc", "etf"]);
        assert_eq!(suggestions("btc, et", &options), vec!["eth", "etf"]);
    }

    #[test]
    fn test_suggestions_case_insensitive() {
        let options = known(&["ETH", "Btc", "etf"]);
        assert_eq!(suggestions("BTC, eT", &options), vec!["ETH", "etf"]);
    }

    #[test]
    fn test_suggestions_substring_not_prefix() {
        let options = known(&["solana", "anchor"]);
        assert_eq!(suggestions("an", &options), vec!["solana", "anchor"]);
    }

    #[test]
    fn test_suggestions_empty_last_token_offers_remaining() {
        let options = known(&["eth", "btc", "sol"]);
        assert_eq!(suggestions("btc, ", &options), vec!["eth", "sol"]);
    }

    #[test]
    fn test_suggestions_capped() {
        let options: Vec<String> = (0..20).map(|i| format!("tag{i}")).collect();
        assert_eq!(suggestions("tag", &options).len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_suggestions_stable_source_order() {
        let options = known(&["zeta", "alpha", "beta"]);
        assert_eq!(suggestions("a", &options), vec!["zeta", "alpha", "beta"]);
    }

    #[test]
    fn test_apply_replaces_partial_token() {
        assert_eq!(apply_suggestion("btc, et", "eth"), "btc, eth");
    }

    #[test]
    fn test_apply_chained_dedup_order_blank_free() {
        let once = apply_suggestion("a, b,", "b");
        assert_eq!(once, "a, b");
        let twice = apply_suggestion(&once, "c");
        assert_eq!(twice, "a, c");
    }

    #[test]
    fn test_apply_dedup_keeps_first_seen_casing() {
        assert_eq!(apply_suggestion("BTC, eth, bt", "btc"), "BTC, eth");
    }

    #[test]
    fn test_apply_on_empty_input() {
        assert_eq!(apply_suggestion("", "eth"), "eth");
    }

    #[test]
    fn test_apply_drops_blank_tokens() {
        assert_eq!(apply_suggestion("a, , b, ", "c"), "a, b, c");
    }
}
