/// Collapses whitespace and strips invisible characters that sneak in from pasted text.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup form used for jurisdiction and language keys.
pub(crate) fn normalize_key(value: &str) -> String {
    collapse_whitespace(value).to_ascii_lowercase()
}

/// Identity form used for fastener spec codes and finishes.
pub(crate) fn normalize_token(value: &str) -> String {
    collapse_whitespace(value).to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_pasted_whitespace() {
        assert_eq!(collapse_whitespace("  HDG\u{a0} 10d\tCommon\u{200b} "), "HDG 10d Common");
    }

    #[test]
    fn keys_and_tokens_fold_case_differently() {
        assert_eq!(normalize_key(" United  States "), "united states");
        assert_eq!(normalize_token("hdg  10d common"), "HDG 10D COMMON");
    }
}
