//! One-call parsing of either card version into a V2 card.

use serde_json::Value;

use crate::error::Result;
use crate::{CanonicalCard, ValidationErrors, parse_json, v1_to_v2, validate_canonical, validate_legacy};

/// Reads `value` as a V2 card, upgrading V1 cards on the way.
///
/// A backfilled card comes back as a plain V2 card. If the value is
/// neither version, the V2 schema's issues are returned.
///
/// # Examples
///
/// ```
/// use chara_card_core::*;
/// use serde_json::json;
///
/// let v1 = json!({"name": "Sui", "description": "", "personality": "",
///                 "scenario": "", "first_mes": "Hi", "mes_example": ""});
/// let v2 = parse_to_v2(&v1).unwrap();
/// assert_eq!(v2.data.first_mes, "Hi");
/// ```
pub fn parse_to_v2(value: &Value) -> std::result::Result<CanonicalCard, ValidationErrors> {
    let errors = match validate_canonical(value) {
        Ok(card) => return Ok(card),
        Err(errors) => errors,
    };
    validate_legacy(value)
        .map(|legacy| v1_to_v2(&legacy))
        .map_err(|_| errors)
}

/// Parses `text` as JSON, then as in [`parse_to_v2`].
///
/// # Errors
///
/// Returns [`CardError::Syntax`](crate::CardError::Syntax) for malformed
/// JSON and [`CardError::Structure`](crate::CardError::Structure) when the
/// value is not a card.
///
/// # Examples
///
/// ```
/// use chara_card_core::*;
///
/// assert!(matches!(parse_text_to_v2("{"), Err(CardError::Syntax(_))));
/// assert!(matches!(parse_text_to_v2("{}"), Err(CardError::Structure(_))));
/// ```
pub fn parse_text_to_v2(text: &str) -> Result<CanonicalCard> {
    let value = parse_json(text)?;
    Ok(parse_to_v2(&value)?)
}
