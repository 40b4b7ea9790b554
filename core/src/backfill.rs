//! Pure transforms between V1, V2 and backfilled V2 cards.
//!
//! None of these functions can fail: they only operate on values that
//! already passed validation, and every field they fill in has a fixed
//! value.
//!
//! # Example
//!
//! ```
//! use chara_card_core::*;
//!
//! let v1 = LegacyCard::new("Sui").with_first_mes("Hi");
//! let v2 = v1_to_v2(&v1);
//! assert_eq!(v2.data.first_mes, "Hi");
//!
//! let backfilled = backfill_v2(&v2);
//! assert_eq!(backfilled.legacy(), v1);
//! ```

use crate::{BackfilledCard, CanonicalCard, CardData, LegacyCard};

/// Text written into every top-level V1 field by
/// [`backfill_v2_with_obsolescence_notice`].
pub const OBSOLESCENCE_NOTICE: &str = "This is a V2 character card. This field is obsolete: \
     please update your frontend to a version that reads the V2 `data` fields instead.";

/// Upgrades a V1 card to V2.
///
/// The six V1 fields are copied into `data`. The V2-only text fields are
/// empty strings, `alternate_greetings` and `tags` are empty lists,
/// `extensions` is an empty map, and no character book is attached.
///
/// # Examples
///
/// ```
/// use chara_card_core::*;
///
/// let v2 = v1_to_v2(&LegacyCard::new("Sui"));
/// assert_eq!(v2.spec, CardSpec::CharaCardV2);
/// assert!(v2.data.tags.is_empty());
/// assert!(v2.data.character_book.is_none());
/// ```
pub fn v1_to_v2(card: &LegacyCard) -> CanonicalCard {
    CanonicalCard::new(CardData::from_legacy(card))
}

/// Adds the V1 fields to a V2 card, mirroring their `data` counterparts.
///
/// The result classifies as in sync.
pub fn backfill_v2(card: &CanonicalCard) -> BackfilledCard {
    BackfilledCard::from_parts(card.clone(), card.data.legacy_fields())
}

/// Adds the V1 fields to a V2 card, each holding [`OBSOLESCENCE_NOTICE`].
///
/// # Examples
///
/// ```
/// use chara_card_core::*;
///
/// let card = backfill_v2_with_obsolescence_notice(&v1_to_v2(&LegacyCard::new("Sui")));
/// assert_eq!(card.name, OBSOLESCENCE_NOTICE);
/// assert_eq!(card.data.name, "Sui");
/// ```
pub fn backfill_v2_with_obsolescence_notice(card: &CanonicalCard) -> BackfilledCard {
    BackfilledCard::from_parts(card.clone(), LegacyCard::filled_with(OBSOLESCENCE_NOTICE))
}
