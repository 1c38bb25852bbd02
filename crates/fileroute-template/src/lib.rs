//! # fileroute-template
//!
//! Everything that reads `${...}` placeholders:
//!
//! - [`tokenize`] splits a pattern into literal and placeholder tokens
//! - [`TemplateEngine`] renders a pattern against a [`Model`]; the default
//!   [`DollarBraceEngine`] substitutes dotted model lookups
//! - [`ConditionEvaluator`] decides boolean close conditions; the default is
//!   [`SimpleConditionEvaluator`]
//! - [`PathTemplateResolver`] renders the directory, file, and list-file
//!   names of a resource
//! - [`NamePatternMatcher`] recognizes file names a pattern has already produced
//!
//! [`Model`]: fileroute_core::Model

#![deny(unsafe_code)]

pub mod condition;
pub mod engine;
pub mod matcher;
pub mod resolver;
pub mod tokens;

pub use condition::{ConditionEvaluator, SimpleConditionEvaluator};
pub use engine::{DollarBraceEngine, TemplateEngine};
pub use matcher::NamePatternMatcher;
pub use resolver::PathTemplateResolver;
pub use tokens::{Token, tokenize};
