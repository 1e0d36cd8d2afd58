//! Ordered "first match wins" pattern tables.
//!
//! Every rule list in the chat core (injection, extraction, off-topic, intent,
//! project and offer detection) is a [`PatternTable`]: an ordered list of
//! compiled regexes, each carrying a label. Evaluation walks the rules in
//! order and stops at the first hit, so rule order is significant.

use regex::Regex;
use tracing::warn;

/// Maps free text to an optional label.
pub trait TextClassifier<L> {
    fn first_match(&self, text: &str) -> Option<L>;

    fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }
}

#[derive(Clone, Debug)]
pub struct PatternRule<L> {
    pub label: L,
    regex: Regex,
}

impl<L> PatternRule<L> {
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[derive(Clone, Debug)]
pub struct PatternTable<L> {
    rules: Vec<PatternRule<L>>,
}

impl<L> Default for PatternTable<L> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<L: Clone> PatternTable<L> {
    /// Compiles `(label, pattern)` pairs in order. Patterns that fail to
    /// compile are skipped with a warning.
    pub fn compile<P: AsRef<str>>(specs: impl IntoIterator<Item = (L, P)>) -> Self {
        let mut table = Self::default();
        for (label, pattern) in specs {
            table.push(label, pattern.as_ref());
        }
        table
    }

    /// Appends a rule after the existing ones. Returns `false` when the
    /// pattern does not compile.
    pub fn push(&mut self, label: L, pattern: &str) -> bool {
        match Regex::new(pattern) {
            Ok(regex) => {
                self.rules.push(PatternRule { label, regex });
                true
            }
            Err(error) => {
                warn!(
                    event_name = "core.patterns.invalid",
                    pattern = %pattern,
                    error = %error,
                    "skipping pattern that failed to compile"
                );
                false
            }
        }
    }

    pub fn first_rule(&self, text: &str) -> Option<&PatternRule<L>> {
        self.rules.iter().find(|rule| rule.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PatternRule<L>] {
        &self.rules
    }
}

impl<L: Clone> TextClassifier<L> for PatternTable<L> {
    fn first_match(&self, text: &str) -> Option<L> {
        self.first_rule(text).map(|rule| rule.label.clone())
    }
}
