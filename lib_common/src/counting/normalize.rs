//! Title text normalization.
//!
//! Order matters: tags are stripped before the non-word substitution, since
//! removing `<...>` spans depends on the angle brackets still being present.

use regex::Regex;
use std::sync::OnceLock;

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static NOT_WORD_RE: OnceLock<Regex> = OnceLock::new();
static SPACES_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static pattern"))
}

fn not_word_re() -> &'static Regex {
    NOT_WORD_RE.get_or_init(|| Regex::new(r"[^\w]").expect("static pattern"))
}

fn spaces_re() -> &'static Regex {
    SPACES_RE.get_or_init(|| Regex::new(r"\s{2,}").expect("static pattern"))
}

/// Normalize a document title for matching.
///
/// Replaces `<...>` markup spans with spaces, lowercases, turns every
/// non-word character into a space, collapses whitespace runs, and trims.
/// Total for any input and idempotent.
pub fn normalize(text: &str) -> String {
    let result = tag_re().replace_all(text, " ");
    let result = result.to_lowercase();
    let result = not_word_re().replace_all(&result, " ");
    let result = spaces_re().replace_all(&result, " ");
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses() {
        assert_eq!(
            normalize("<i>or</i> HN: the Next Iteration<p>I get the impression"),
            "or hn the next iteration i get the impression"
        );
    }

    #[test]
    fn empty_and_whitespace_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n "), "");
        assert_eq!(normalize("!!! ??? ..."), "");
    }

    #[test]
    fn punctuation_becomes_single_spaces() {
        assert_eq!(normalize("Show HN: a-thing (v2.0)"), "show hn a thing v2 0");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "<i>or</i> HN: the Next Iteration<p>I get the impression",
            "Show HN: a-thing (v2.0)",
            "already normalized text",
            "",
            "Ünïcode wörds bleiben Wörter",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn underscores_are_word_characters() {
        assert_eq!(normalize("snake_case stays"), "snake_case stays");
    }
}
