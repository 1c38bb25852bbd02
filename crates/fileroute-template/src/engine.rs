//! Pattern rendering.

use fileroute_core::{Model, TemplateError};
use serde_json::Value;

use crate::tokens::{Token, tokenize};

/// Renders a pattern against a model. Implementations must be pure.
pub trait TemplateEngine: Send + Sync {
    /// Expand every placeholder in `pattern`.
    fn render(&self, pattern: &str, model: &Model) -> Result<String, TemplateError>;
}

/// Substitutes `${dotted.path}` with the model value at that path.
///
/// Strings render bare, other scalars and containers as JSON. A missing or
/// `null` value is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DollarBraceEngine;

impl TemplateEngine for DollarBraceEngine {
    fn render(&self, pattern: &str, model: &Model) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(pattern.len());
        for token in tokenize(pattern)? {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Placeholder(key) => match model.lookup(key) {
                    None | Some(Value::Null) => {
                        return Err(TemplateError::MissingValue {
                            pattern: pattern.to_owned(),
                            key: key.to_owned(),
                        });
                    }
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                },
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn model() -> Model {
        let mut model = Model::new();
        let _ = model.insert("order", json!({"orderId": "1", "item": {"itemId": 9}}));
        let _ = model.insert("flag", true);
        model
    }

    #[test]
    fn renders_nested_values() {
        let rendered = DollarBraceEngine
            .render("orderitem-${order.orderId}-${order.item.itemId}.xml", &model())
            .unwrap();
        assert_eq!(rendered, "orderitem-1-9.xml");
    }

    #[test]
    fn renders_non_string_scalars() {
        assert_eq!(DollarBraceEngine.render("${flag}", &model()).unwrap(), "true");
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = DollarBraceEngine.render("x-${nope}", &model()).unwrap_err();
        assert_matches!(err, TemplateError::MissingValue { ref key, .. } if key == "nope");
    }

    #[test]
    fn null_value_is_an_error() {
        let mut m = Model::new();
        let _ = m.insert("n", Value::Null);
        assert!(DollarBraceEngine.render("${n}", &m).is_err());
    }

    #[test]
    fn pattern_without_placeholders_is_unchanged() {
        assert_eq!(DollarBraceEngine.render("out", &Model::new()).unwrap(), "out");
    }
}
