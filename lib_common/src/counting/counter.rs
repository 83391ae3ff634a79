//! Whole-word mention counters.

use regex::Regex;

use super::normalize::normalize;
use super::ConfigError;

/// Counts occurrences of one configured phrase across processed titles.
///
/// The phrase is normalized the same way titles are and compiled into a
/// word-boundary-anchored literal matcher, so `"Show HN"` matches the phrase
/// as a whole (embedded spaces included) but never as part of a longer word.
/// Counts are monotonically non-decreasing and never reset.
pub struct MentionCounter {
    title: String,
    pattern: Regex,
    count: u64,
}

impl MentionCounter {
    /// Build a counter for `title`, kept verbatim for display.
    ///
    /// Fails with [`ConfigError`] when the phrase normalizes to nothing or
    /// the derived pattern does not compile; both are fatal at startup.
    pub fn new(title: &str) -> Result<Self, ConfigError> {
        let normalized = normalize(title);
        if normalized.is_empty() {
            return Err(ConfigError::EmptyMention {
                title: title.to_string(),
            });
        }
        // Escape before boundary-wrapping: the phrase is a literal, not a pattern.
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&normalized))).map_err(
            |source| ConfigError::BadPattern {
                title: title.to_string(),
                source,
            },
        )?;
        Ok(Self {
            title: title.to_string(),
            pattern,
            count: 0,
        })
    }

    /// The phrase as configured, for display.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Occurrences counted so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Add the non-overlapping matches in `normalized` to the running count.
    ///
    /// The input must already have passed through [`normalize`]; the counter
    /// does not re-normalize it.
    pub fn process_text(&mut self, normalized: &str) {
        self.count += self.pattern.find_iter(normalized).count() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted(title: &str, text: &str) -> u64 {
        let mut counter = MentionCounter::new(title).unwrap();
        counter.process_text(text);
        counter.count()
    }

    #[test]
    fn whole_word_matching() {
        assert_eq!(counted("A", "ab a abc a"), 2);
        assert_eq!(counted("Ab", "ab a abc a"), 1);
        assert_eq!(counted("b a", "ab a abc a"), 0);
        assert_eq!(counted("Abc", "ab a abc a"), 1);
        assert_eq!(counted("Abc a", "ab a abc a abc b"), 1);
    }

    #[test]
    fn counts_are_additive() {
        let mut counter = MentionCounter::new("rust").unwrap();
        counter.process_text("rust is here");
        counter.process_text("no mention");
        counter.process_text("rust rust rust");
        assert_eq!(counter.count(), 4);
    }

    #[test]
    fn title_kept_verbatim() {
        let counter = MentionCounter::new("Show HN").unwrap();
        assert_eq!(counter.title(), "Show HN");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        // '.' normalizes to a space, leaving "c 3po" as the phrase.
        let mut counter = MentionCounter::new("C.3PO").unwrap();
        counter.process_text("c 3po sighted");
        counter.process_text("cx3po is someone else");
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn empty_phrase_is_rejected() {
        assert!(matches!(
            MentionCounter::new("!!!"),
            Err(ConfigError::EmptyMention { .. })
        ));
        assert!(matches!(
            MentionCounter::new(""),
            Err(ConfigError::EmptyMention { .. })
        ));
    }
}
