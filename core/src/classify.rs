//! Card classification: JSON boundary, ordered schema probing, and the
//! legacy/canonical consistency check.
//!
//! Both entry points are total. Every input, however malformed, yields one
//! variant of the corresponding classification enum.
//!
//! A backfilled V2 card is also a valid V2 card, so the more specific
//! schema is always probed first. When nothing matches, the V2 schema's
//! issues are the ones reported, even for inputs that look like V1 cards.
//!
//! # Example
//!
//! ```
//! use chara_card_core::*;
//!
//! let v1 = r#"{"name":"Sui","first_mes":"Hi","scenario":"s",
//!              "description":"d","personality":"p","mes_example":"m"}"#;
//! assert!(matches!(classify_as_legacy(v1), LegacyClassification::Legacy { .. }));
//! assert!(matches!(
//!     classify_as_canonical(v1),
//!     CanonicalClassification::InvalidStructure { .. }
//! ));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    BackfilledCard, CanonicalCard, CardSchema, LEGACY_FIELDS, LegacyCard, ValidationErrors,
    validate_backfilled, validate_canonical, validate_legacy,
};

/// The input text is not well-formed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct SyntaxError {
    /// Parser diagnostic, including position.
    pub message: String,
    /// 1-based line of the failure (0 if unknown).
    pub line: usize,
    /// 1-based column of the failure (0 if unknown).
    pub column: usize,
}

impl From<serde_json::Error> for SyntaxError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Parses raw text into a generic JSON value.
///
/// Empty, truncated, or trailing-garbage input is a [`SyntaxError`].
/// Nesting depth is unbounded; deep documents grow the stack on the heap
/// instead of overflowing it.
///
/// # Examples
///
/// ```
/// use chara_card_core::parse_json;
///
/// assert!(parse_json("{}").is_ok());
/// assert!(parse_json("").is_err());
/// assert!(parse_json("{} x").is_err());
/// ```
pub fn parse_json(text: &str) -> Result<Value, SyntaxError> {
    let mut json = serde_json::Deserializer::from_str(text);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

/// One entry in an ordered probe: the schema tried, and how a match is
/// turned into a result.
pub struct Candidate<T> {
    /// Schema this candidate validates against.
    pub schema: CardSchema,
    /// Validates the raw JSON and builds the result on success.
    pub accept: fn(&Value) -> Result<T, ValidationErrors>,
}

/// Tries `candidates` in order and returns the first match.
///
/// If none match, the issues from the `surfaced` schema's attempt are
/// returned (empty if `surfaced` was not among the candidates).
pub fn probe<T>(
    raw: &Value,
    candidates: &[Candidate<T>],
    surfaced: CardSchema,
) -> Result<T, ValidationErrors> {
    let mut surfaced_errors = None;

    for candidate in candidates {
        match (candidate.accept)(raw) {
            Ok(result) => {
                debug!(schema = candidate.schema.name(), "card matched schema");
                return Ok(result);
            }
            Err(errors) => {
                debug!(
                    schema = candidate.schema.name(),
                    issues = errors.len(),
                    "card rejected by schema"
                );
                if candidate.schema == surfaced {
                    surfaced_errors = Some(errors);
                }
            }
        }
    }

    Err(surfaced_errors.unwrap_or_default())
}

/// Returns `true` if every top-level V1 field of `raw` equals its namesake
/// inside `data`, compared as exact strings.
///
/// Operates on the JSON as typed, not on a validated card, so a field that
/// is missing on either side counts as out of sync.
///
/// # Examples
///
/// ```
/// use chara_card_core::legacy_fields_in_sync;
/// use serde_json::json;
///
/// let fields = json!({"name": "Sui", "description": "", "personality": "",
///                     "scenario": "", "first_mes": "", "mes_example": ""});
/// let mut card = fields.clone();
/// card["data"] = fields;
/// assert!(legacy_fields_in_sync(&card));
///
/// card["name"] = json!("Sui ");
/// assert!(!legacy_fields_in_sync(&card));
/// ```
pub fn legacy_fields_in_sync(raw: &Value) -> bool {
    let data = raw.get("data");
    LEGACY_FIELDS.iter().all(|field| {
        match (raw.get(field), data.and_then(|data| data.get(field))) {
            (Some(top), Some(nested)) => top == nested,
            _ => false,
        }
    })
}

/// Result of reading an input as a V2 card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalClassification {
    /// Valid V2 card without top-level V1 fields.
    Canonical { card: CanonicalCard },
    /// Valid V2 card that also carries top-level V1 fields.
    CanonicalWithLegacy { in_sync: bool, card: BackfilledCard },
    /// Valid JSON, but not a V2 card.
    InvalidStructure { errors: ValidationErrors },
    /// Not JSON.
    InvalidSyntax { error: SyntaxError },
}

impl CanonicalClassification {
    /// Returns `true` for the two valid-card variants.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Canonical { .. } | Self::CanonicalWithLegacy { .. })
    }

    /// Returns the V2 card, with any top-level V1 fields dropped.
    pub fn canonical_card(&self) -> Option<CanonicalCard> {
        match self {
            Self::Canonical { card } => Some(card.clone()),
            Self::CanonicalWithLegacy { card, .. } => Some(card.clone().into_canonical()),
            Self::InvalidStructure { .. } | Self::InvalidSyntax { .. } => None,
        }
    }
}

/// Result of reading an input as a V1 card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegacyClassification {
    /// Valid V1 card.
    Legacy { card: LegacyCard },
    /// The input is already a V2 card.
    AlreadyMigrated,
    /// The input is already a V2 card with V1 fields backfilled.
    AlreadyMigratedWithLegacy,
    /// Valid JSON, but neither a V1 nor a V2 card.
    InvalidStructure { errors: ValidationErrors },
    /// Not JSON.
    InvalidSyntax { error: SyntaxError },
}

impl LegacyClassification {
    /// Returns `true` unless the input was invalid.
    pub fn is_valid(&self) -> bool {
        !matches!(
            self,
            Self::InvalidStructure { .. } | Self::InvalidSyntax { .. }
        )
    }
}

const CANONICAL_TARGET: &[Candidate<CanonicalClassification>] = &[
    Candidate {
        schema: CardSchema::Backfilled,
        accept: accept_backfilled,
    },
    Candidate {
        schema: CardSchema::Canonical,
        accept: accept_canonical,
    },
];

const LEGACY_TARGET: &[Candidate<LegacyClassification>] = &[
    Candidate {
        schema: CardSchema::Backfilled,
        accept: accept_migrated_with_legacy,
    },
    Candidate {
        schema: CardSchema::Canonical,
        accept: accept_migrated,
    },
    Candidate {
        schema: CardSchema::Legacy,
        accept: accept_legacy,
    },
];

fn accept_backfilled(raw: &Value) -> Result<CanonicalClassification, ValidationErrors> {
    let card = validate_backfilled(raw)?;
    let in_sync = legacy_fields_in_sync(raw);
    debug!(in_sync, "checked backfilled legacy fields");
    Ok(CanonicalClassification::CanonicalWithLegacy { in_sync, card })
}

fn accept_canonical(raw: &Value) -> Result<CanonicalClassification, ValidationErrors> {
    validate_canonical(raw).map(|card| CanonicalClassification::Canonical { card })
}

fn accept_migrated_with_legacy(raw: &Value) -> Result<LegacyClassification, ValidationErrors> {
    validate_backfilled(raw).map(|_| LegacyClassification::AlreadyMigratedWithLegacy)
}

fn accept_migrated(raw: &Value) -> Result<LegacyClassification, ValidationErrors> {
    validate_canonical(raw).map(|_| LegacyClassification::AlreadyMigrated)
}

fn accept_legacy(raw: &Value) -> Result<LegacyClassification, ValidationErrors> {
    validate_legacy(raw).map(|card| LegacyClassification::Legacy { card })
}

/// Classifies `text` as a V2 card.
///
/// Probes the backfilled schema, then the plain V2 schema. On failure the
/// V2 schema's issues are reported.
pub fn classify_as_canonical(text: &str) -> CanonicalClassification {
    let raw = match parse_json(text) {
        Ok(raw) => raw,
        Err(error) => return CanonicalClassification::InvalidSyntax { error },
    };

    probe(&raw, CANONICAL_TARGET, CardSchema::Canonical)
        .unwrap_or_else(|errors| CanonicalClassification::InvalidStructure { errors })
}

/// Classifies `text` as a V1 card, recognizing inputs that are already V2.
///
/// Probes the backfilled schema, the plain V2 schema, then the V1 schema.
/// On failure the V2 schema's issues are reported, not the V1 schema's.
pub fn classify_as_legacy(text: &str) -> LegacyClassification {
    let raw = match parse_json(text) {
        Ok(raw) => raw,
        Err(error) => return LegacyClassification::InvalidSyntax { error },
    };

    probe(&raw, LEGACY_TARGET, CardSchema::Canonical)
        .unwrap_or_else(|errors| LegacyClassification::InvalidStructure { errors })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_json_reports_position() {
        let err = parse_json("{\n  \"name\": }").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.column > 0);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_parse_json_accepts_deep_nesting() {
        let depth = 1_000;
        let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_json(&text).is_ok());

        let err = parse_json(&format!("{text} x")).unwrap_err();
        assert!(err.message.contains("trailing characters"));
    }

    #[test]
    fn test_parse_json_rejects_out_of_range_number() {
        let err = parse_json(r#"{"insertion_order": 1e400}"#).unwrap_err();
        assert!(err.message.contains("number out of range"));
    }

    #[test]
    fn test_probe_returns_first_match() {
        let candidates: &[Candidate<&str>] = &[
            Candidate {
                schema: CardSchema::Legacy,
                accept: |_| Ok("first"),
            },
            Candidate {
                schema: CardSchema::Canonical,
                accept: |_| Ok("second"),
            },
        ];
        assert_eq!(probe(&json!({}), candidates, CardSchema::Legacy), Ok("first"));
    }

    #[test]
    fn test_probe_surfaces_selected_schema_errors() {
        let candidates: &[Candidate<()>] = &[
            Candidate {
                schema: CardSchema::Canonical,
                accept: |raw| validate_canonical(raw).map(|_| ()),
            },
            Candidate {
                schema: CardSchema::Legacy,
                accept: |raw| validate_legacy(raw).map(|_| ()),
            },
        ];
        let errors = probe(&json!({"name": 1}), candidates, CardSchema::Canonical).unwrap_err();
        assert!(errors.has_issue_at("spec"));
        assert!(!errors.has_issue_at("name"));
    }

    #[test]
    fn test_probe_without_surfaced_candidate_returns_empty_errors() {
        let candidates: &[Candidate<()>] = &[Candidate {
            schema: CardSchema::Legacy,
            accept: |raw| validate_legacy(raw).map(|_| ()),
        }];
        let errors = probe(&json!(null), candidates, CardSchema::Canonical).unwrap_err();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_legacy_fields_missing_in_data_is_out_of_sync() {
        let value = json!({
            "name": "a", "description": "", "personality": "",
            "scenario": "", "first_mes": "", "mes_example": "",
            "data": {}
        });
        assert!(!legacy_fields_in_sync(&value));
    }

    #[test]
    fn test_top_level_scalar_is_structural_not_syntax() {
        assert!(matches!(
            classify_as_canonical("42"),
            CanonicalClassification::InvalidStructure { .. }
        ));
        assert!(matches!(
            classify_as_legacy("\"card\""),
            LegacyClassification::InvalidStructure { .. }
        ));
    }

    #[test]
    fn test_classification_serializes_with_kind_tag() {
        let json = serde_json::to_value(classify_as_legacy("[]")).unwrap();
        assert_eq!(json["kind"], "invalid_structure");
        assert_eq!(json["errors"]["issues"][0]["path"], json!([]));
    }
}
