//! Heading heuristics used to split extracted text into sections.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default main-heading shape: `IV.`, `B.`, `3.` followed by a title.
pub const DEFAULT_MAIN_HEADING: &str = r"(?i)^(?:[IVXLCDM]+\.|[A-Z]\.|[0-9]+\.)\s+.{3,}";

/// Default sub-heading shape: `b.` or a dotted outline such as `2.1` / `2.1.3`.
///
/// The letter alternative is case-sensitive: `A.` and `I.` are main headings.
pub const DEFAULT_SUB_HEADING: &str = r"^(?:[a-z]\.|[0-9]+\.[0-9]+(?:\.[0-9]+)*)\s+.{3,}";

static MAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_MAIN_HEADING).unwrap());
static SUB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_SUB_HEADING).unwrap());

/// How a candidate line relates to the two heading patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    /// Matches the main pattern only; starts a section.
    Main,
    /// Matches the sub pattern only.
    Sub,
    /// Matches both; treated as body text.
    Ambiguous,
    Body,
}

/// Compiled heading patterns. `None` means "use the built-in default".
#[derive(Debug, Clone, Default)]
pub struct HeadingRules {
    main_re: Option<Regex>,
    sub_re: Option<Regex>,
}

impl HeadingRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_re(&self) -> &Regex {
        self.main_re.as_ref().unwrap_or(&MAIN_RE)
    }

    pub fn sub_re(&self) -> &Regex {
        self.sub_re.as_ref().unwrap_or(&SUB_RE)
    }

    pub fn classify(&self, line: &str) -> HeadingKind {
        match (self.main_re().is_match(line), self.sub_re().is_match(line)) {
            (true, false) => HeadingKind::Main,
            (false, true) => HeadingKind::Sub,
            (true, true) => HeadingKind::Ambiguous,
            (false, false) => HeadingKind::Body,
        }
    }

    /// Whether `line` may open a new section.
    pub fn is_section_title(&self, line: &str) -> bool {
        self.classify(line) == HeadingKind::Main
    }
}

/// Builder for [`HeadingRules`].
///
/// Accepts string patterns that are compiled in [`build()`](Self::build),
/// failing fast with `regex::Error` on an invalid pattern.
#[derive(Debug, Clone, Default)]
pub struct HeadingRulesBuilder {
    main_pattern: Option<String>,
    sub_pattern: Option<String>,
}

impl HeadingRulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.main_pattern = Some(pattern.into());
        self
    }

    pub fn sub_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.sub_pattern = Some(pattern.into());
        self
    }

    pub fn build(self) -> Result<HeadingRules, regex::Error> {
        Ok(HeadingRules {
            main_re: self.main_pattern.as_deref().map(Regex::new).transpose()?,
            sub_re: self.sub_pattern.as_deref().map(Regex::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roman_letter_and_integer_headings_are_main() {
        let rules = HeadingRules::new();
        for line in [
            "I. Introduction",
            "IV. Results and discussion",
            "A. Background",
            "3. Methods",
            "12. Appendix tables",
            "ii. lowercase roman",
        ] {
            assert_eq!(rules.classify(line), HeadingKind::Main, "{line}");
        }
    }

    #[test]
    fn dotted_outline_is_not_a_section_title() {
        let rules = HeadingRules::new();
        assert!(!rules.is_section_title("1.2 Details"));
        assert!(!rules.is_section_title("2.1.3 Deeper details"));
        assert_eq!(rules.classify("2.1 Background"), HeadingKind::Sub);
    }

    #[test]
    fn lowercase_letter_heading_is_ambiguous() {
        let rules = HeadingRules::new();
        assert_eq!(rules.classify("a. first point"), HeadingKind::Ambiguous);
        assert!(!rules.is_section_title("a. first point"));
    }

    #[test]
    fn short_or_unspaced_candidates_are_body() {
        let rules = HeadingRules::new();
        assert_eq!(rules.classify("I. Ab"), HeadingKind::Body);
        assert_eq!(rules.classify("3.Methods"), HeadingKind::Body);
        assert_eq!(rules.classify("Introduction"), HeadingKind::Body);
        assert_eq!(rules.classify(""), HeadingKind::Body);
    }

    #[test]
    fn builder_overrides_patterns() {
        let rules = HeadingRulesBuilder::new()
            .main_pattern(r"^Chapter \d+")
            .build()
            .unwrap();
        assert!(rules.is_section_title("Chapter 4: Graphs"));
        assert!(!rules.is_section_title("I. Introduction"));
        // sub pattern still the default
        assert_eq!(rules.classify("2.1 Trees"), HeadingKind::Sub);
    }

    #[test]
    fn builder_rejects_invalid_pattern() {
        assert!(HeadingRulesBuilder::new().sub_pattern("([").build().is_err());
    }
}
