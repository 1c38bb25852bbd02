//! Recognize file names already produced by a name pattern.
//!
//! Every placeholder becomes `.*`; literal text is escaped, and the whole
//! name must match. The matcher never extracts placeholder values.

use fileroute_core::TemplateError;
use regex::Regex;

use crate::tokens::{Token, tokenize};

/// Compiled file-name recognizer.
#[derive(Clone, Debug)]
pub struct NamePatternMatcher {
    pattern: String,
    regex: Regex,
}

impl NamePatternMatcher {
    /// Compile `pattern` into a full-string matcher.
    pub fn compile(pattern: &str) -> Result<Self, TemplateError> {
        let mut source = String::from("^");
        for token in tokenize(pattern)? {
            match token {
                Token::Literal(text) => source.push_str(&regex::escape(text)),
                Token::Placeholder(_) => source.push_str(".*"),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| TemplateError::InvalidMatcher {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    /// Whether `file_name` could have been produced by the pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DollarBraceEngine, TemplateEngine};
    use fileroute_core::Model;
    use proptest::prelude::*;

    #[test]
    fn matches_rendered_names() {
        let matcher = NamePatternMatcher::compile("item-${id}.xml").unwrap();
        assert!(matcher.matches("item-9.xml"));
        assert!(matcher.matches("item-.xml"));
        assert!(matcher.matches("item-a-b.xml"));
    }

    #[test]
    fn requires_full_match() {
        let matcher = NamePatternMatcher::compile("item-${id}.xml").unwrap();
        assert!(!matcher.matches("xitem-9.xml"));
        assert!(!matcher.matches("item-9.xml.bak"));
    }

    #[test]
    fn literal_dot_is_not_a_wildcard() {
        let matcher = NamePatternMatcher::compile("item-${id}.xml").unwrap();
        assert!(!matcher.matches("item-9Axml"));
    }

    #[test]
    fn regex_metacharacters_in_literals() {
        let matcher = NamePatternMatcher::compile("a+(b)[${x}]").unwrap();
        assert!(matcher.matches("a+(b)[zz]"));
        assert!(!matcher.matches("aa(b)[zz]"));
    }

    #[test]
    fn staging_names_do_not_match_suffixed_patterns() {
        let matcher = NamePatternMatcher::compile("${name}.csv").unwrap();
        assert!(!matcher.matches(".0b7c4e-x1y2.working"));
    }

    #[test]
    fn unterminated_placeholder_rejected() {
        assert!(NamePatternMatcher::compile("item-${id.xml").is_err());
    }

    proptest! {
        #[test]
        fn rendered_names_match_their_pattern(
            prefix in "[a-z._-]{0,8}",
            suffix in "[a-z.()+]{0,8}",
            value in "[a-zA-Z0-9.-]{0,12}",
        ) {
            let pattern = format!("{prefix}${{id}}{suffix}");
            let model: Model = [("id", value)].into_iter().collect();
            let rendered = DollarBraceEngine.render(&pattern, &model).unwrap();
            let matcher = NamePatternMatcher::compile(&pattern).unwrap();
            prop_assert!(matcher.matches(&rendered));
        }
    }
}
