//! Placeholder tokenizer shared by rendering and matching.

use fileroute_core::TemplateError;

/// A piece of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text copied verbatim.
    Literal(&'a str),
    /// The expression between `${` and `}`, trimmed.
    Placeholder(&'a str),
}

/// Split `pattern` into literal and placeholder tokens.
///
/// A `$` not followed by `{` is literal. An opening `${` without a closing
/// `}` is an error.
pub fn tokenize(pattern: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = pattern;
    let mut offset = 0;

    while let Some(start) = rest.find("${") {
        if start > 0 {
            tokens.push(Token::Literal(&rest[..start]));
        }
        let body = &rest[start + 2..];
        let Some(end) = body.find('}') else {
            return Err(TemplateError::Unterminated {
                pattern: pattern.to_owned(),
                offset: offset + start,
            });
        };
        tokens.push(Token::Placeholder(body[..end].trim()));

        let consumed = start + 2 + end + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    Ok(tokens)
}
