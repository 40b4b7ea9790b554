//! Classification, validation and backfilling of character cards.
//!
//! Character cards come in two formats:
//!
//! - [`LegacyCard`] (V1): six flat text fields.
//! - [`CanonicalCard`] (V2): a `{spec, spec_version, data}` envelope with
//!   richer metadata, an optional [`CharacterBook`], and an open
//!   `extensions` map.
//!
//! A V2 card may also carry the V1 fields at its top level so older readers
//! keep working ([`BackfilledCard`]).
//!
//! The two entry points, [`classify_as_canonical`] and
//! [`classify_as_legacy`], take raw text and never fail: syntax errors and
//! structural errors are variants of the returned classification.
//!
//! Validation ([`validate_legacy`], [`validate_canonical`],
//! [`validate_backfilled`]) returns a typed card or a [`ValidationErrors`]
//! list. Transforms ([`v1_to_v2`], [`backfill_v2`],
//! [`backfill_v2_with_obsolescence_notice`]) are pure and total.
//!
//! # Example
//!
//! ```
//! use chara_card_core::*;
//!
//! let v2 = v1_to_v2(&LegacyCard::new("Sui"));
//! let text = to_pretty_json(&backfill_v2(&v2)).unwrap();
//!
//! match classify_as_canonical(&text) {
//!     CanonicalClassification::CanonicalWithLegacy { in_sync, card } => {
//!         assert!(in_sync);
//!         assert_eq!(card.name, "Sui");
//!     }
//!     other => panic!("unexpected classification: {other:?}"),
//! }
//! ```

mod backfill;
mod classify;
mod error;
mod parse;
pub mod samples;
mod types;
mod validate;

pub use backfill::{
    OBSOLESCENCE_NOTICE, backfill_v2, backfill_v2_with_obsolescence_notice, v1_to_v2,
};
pub use classify::{
    CanonicalClassification, Candidate, LegacyClassification, SyntaxError, classify_as_canonical,
    classify_as_legacy, legacy_fields_in_sync, parse_json, probe,
};
pub use error::{CardError, Result};
pub use parse::{parse_text_to_v2, parse_to_v2};
pub use types::*;
pub use validate::{
    CardSchema, IssueKind, JsonType, PathSegment, ValidatedCard, ValidationErrors,
    ValidationIssue, validate_backfilled, validate_canonical, validate_legacy,
};
