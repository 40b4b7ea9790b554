//! Error type for the convenience parsing entry points.
//!
//! Classification never returns an error; [`CardError`] only exists for
//! callers who want a single `Result` and accept that an invalid card is a
//! failure.

use thiserror::Error;

use crate::{SyntaxError, ValidationErrors};

/// Errors returned by [`parse_text_to_v2`](crate::parse_text_to_v2) and
/// [`parse_to_v2`](crate::parse_to_v2).
#[derive(Debug, Error)]
pub enum CardError {
    /// The input is not well-formed JSON.
    #[error("invalid JSON: {0}")]
    Syntax(#[from] SyntaxError),

    /// The input is JSON but not a card.
    #[error("invalid card: {}", render_issues(.0))]
    Structure(#[from] ValidationErrors),
}

fn render_issues(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`CardError`].
pub type Result<T> = std::result::Result<T, CardError>;
