//! Card type definitions for the V1 and V2 character card formats.
//!
//! These types are the *normalized* output of validation: keys unknown to a
//! schema are dropped and known keys serialize in declaration order, which
//! makes the pretty-printed form of a card stable across runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Value of the `spec` discriminator carried by every V2 card.
pub const SPEC_TAG: &str = "chara_card_v2";

/// Value of the `spec_version` discriminator carried by every V2 card.
pub const SPEC_VERSION: &str = "2.0";

/// The six fields shared by V1 cards and the `data` record of V2 cards,
/// in the order they serialize.
pub const LEGACY_FIELDS: [&str; 6] = [
    "name",
    "description",
    "personality",
    "scenario",
    "first_mes",
    "mes_example",
];

/// Open-ended map for third-party data. Never inspected by validation.
pub type Extensions = Map<String, Value>;

/// The `spec` discriminator of a V2 card.
///
/// # Examples
///
/// ```
/// use chara_card_core::CardSpec;
///
/// let json = serde_json::to_string(&CardSpec::CharaCardV2).unwrap();
/// assert_eq!(json, "\"chara_card_v2\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CardSpec {
    #[default]
    #[serde(rename = "chara_card_v2")]
    CharaCardV2,
}

/// The `spec_version` discriminator of a V2 card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpecVersion {
    #[default]
    #[serde(rename = "2.0")]
    V2_0,
}

/// A legacy (V1) character card: six flat, required text fields.
///
/// # Examples
///
/// ```
/// use chara_card_core::LegacyCard;
///
/// let card = LegacyCard::new("Sui").with_first_mes("Hi");
/// assert_eq!(card.name, "Sui");
/// assert_eq!(card.first_mes, "Hi");
/// assert!(card.description.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyCard {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
}

impl LegacyCard {
    /// Creates a card with the given name and every other field empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the personality.
    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = personality.into();
        self
    }

    /// Sets the scenario.
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Sets the greeting message.
    pub fn with_first_mes(mut self, first_mes: impl Into<String>) -> Self {
        self.first_mes = first_mes.into();
        self
    }

    /// Sets the example dialogue.
    pub fn with_mes_example(mut self, mes_example: impl Into<String>) -> Self {
        self.mes_example = mes_example.into();
        self
    }

    /// Returns a card with all six fields set to `text`.
    pub fn filled_with(text: &str) -> Self {
        Self {
            name: text.to_string(),
            description: text.to_string(),
            personality: text.to_string(),
            scenario: text.to_string(),
            first_mes: text.to_string(),
            mes_example: text.to_string(),
        }
    }

    /// Returns `(field name, value)` pairs in [`LEGACY_FIELDS`] order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chara_card_core::{LEGACY_FIELDS, LegacyCard};
    ///
    /// let card = LegacyCard::new("Sui");
    /// let names: Vec<&str> = card.fields().iter().map(|(name, _)| *name).collect();
    /// assert_eq!(names, LEGACY_FIELDS);
    /// ```
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("name", self.name.as_str()),
            ("description", self.description.as_str()),
            ("personality", self.personality.as_str()),
            ("scenario", self.scenario.as_str()),
            ("first_mes", self.first_mes.as_str()),
            ("mes_example", self.mes_example.as_str()),
        ]
    }
}

/// Where a lore entry is inserted relative to the character definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPosition {
    BeforeChar,
    AfterChar,
}

impl EntryPosition {
    /// Accepted wire values, in declaration order.
    pub const VALUES: [&'static str; 2] = ["before_char", "after_char"];
}

/// A single lore entry inside a [`CharacterBook`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub keys: Vec<String>,
    pub content: String,
    pub extensions: Extensions,
    pub enabled: bool,
    pub insertion_order: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<EntryPosition>,
}

impl BookEntry {
    /// Creates an enabled entry with the required fields only.
    pub fn new(keys: Vec<String>, content: impl Into<String>, insertion_order: i64) -> Self {
        Self {
            keys,
            content: content.into(),
            extensions: Extensions::new(),
            enabled: true,
            insertion_order: Number::from(insertion_order),
            case_sensitive: None,
            name: None,
            priority: None,
            id: None,
            comment: None,
            selective: None,
            secondary_keys: None,
            constant: None,
            position: None,
        }
    }
}

/// Embedded lore ("character book") of a V2 card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_depth: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive_scanning: Option<bool>,
    pub extensions: Extensions,
    pub entries: Vec<BookEntry>,
}

/// The `data` record of a V2 card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardData {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
    pub creator_notes: String,
    pub system_prompt: String,
    pub post_history_instructions: String,
    pub alternate_greetings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_book: Option<CharacterBook>,
    pub tags: Vec<String>,
    pub creator: String,
    pub character_version: String,
    pub extensions: Extensions,
}

impl CardData {
    /// Builds a record from the legacy fields, leaving the V2-only fields at
    /// their empty defaults.
    pub fn from_legacy(legacy: &LegacyCard) -> Self {
        Self {
            name: legacy.name.clone(),
            description: legacy.description.clone(),
            personality: legacy.personality.clone(),
            scenario: legacy.scenario.clone(),
            first_mes: legacy.first_mes.clone(),
            mes_example: legacy.mes_example.clone(),
            ..Self::default()
        }
    }

    /// Copies out the six fields shared with V1 cards.
    pub fn legacy_fields(&self) -> LegacyCard {
        LegacyCard {
            name: self.name.clone(),
            description: self.description.clone(),
            personality: self.personality.clone(),
            scenario: self.scenario.clone(),
            first_mes: self.first_mes.clone(),
            mes_example: self.mes_example.clone(),
        }
    }
}

/// A canonical (V2) character card.
///
/// # Examples
///
/// ```
/// use chara_card_core::{CanonicalCard, CardData, LegacyCard};
///
/// let card = CanonicalCard::new(CardData::from_legacy(&LegacyCard::new("Sui")));
/// let json = serde_json::to_value(&card).unwrap();
/// assert_eq!(json["spec"], "chara_card_v2");
/// assert_eq!(json["spec_version"], "2.0");
/// assert_eq!(json["data"]["name"], "Sui");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalCard {
    pub spec: CardSpec,
    pub spec_version: SpecVersion,
    pub data: CardData,
}

impl CanonicalCard {
    /// Wraps `data` in the V2 envelope.
    pub fn new(data: CardData) -> Self {
        Self {
            spec: CardSpec::CharaCardV2,
            spec_version: SpecVersion::V2_0,
            data,
        }
    }
}

/// A V2 card that also carries the six V1 fields at its top level.
///
/// Older readers that only understand V1 pick up the top-level fields;
/// V2 readers use `data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackfilledCard {
    pub spec: CardSpec,
    pub spec_version: SpecVersion,
    pub data: CardData,
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
}

impl BackfilledCard {
    /// Attaches `legacy` as the top-level V1 fields of `card`.
    pub fn from_parts(card: CanonicalCard, legacy: LegacyCard) -> Self {
        Self {
            spec: card.spec,
            spec_version: card.spec_version,
            data: card.data,
            name: legacy.name,
            description: legacy.description,
            personality: legacy.personality,
            scenario: legacy.scenario,
            first_mes: legacy.first_mes,
            mes_example: legacy.mes_example,
        }
    }

    /// Copies out the top-level V1 fields.
    pub fn legacy(&self) -> LegacyCard {
        LegacyCard {
            name: self.name.clone(),
            description: self.description.clone(),
            personality: self.personality.clone(),
            scenario: self.scenario.clone(),
            first_mes: self.first_mes.clone(),
            mes_example: self.mes_example.clone(),
        }
    }

    /// Drops the top-level V1 fields.
    pub fn into_canonical(self) -> CanonicalCard {
        CanonicalCard {
            spec: self.spec,
            spec_version: self.spec_version,
            data: self.data,
        }
    }
}

/// Serializes a card (or any classification) the way the demo displayed
/// it: pretty-printed JSON with two-space indentation.
///
/// # Errors
///
/// Fails only if `value` has a `Serialize` impl that can error; the card
/// types in this crate never do.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backfilled_card_serializes_envelope_before_legacy_fields() {
        let card = CanonicalCard::new(CardData::from_legacy(&LegacyCard::new("Sui")));
        let backfilled = BackfilledCard::from_parts(card, LegacyCard::new("Sui"));

        let json = serde_json::to_value(&backfilled).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "spec",
                "spec_version",
                "data",
                "name",
                "description",
                "personality",
                "scenario",
                "first_mes",
                "mes_example"
            ]
        );
    }

    #[test]
    fn test_absent_character_book_is_not_serialized() {
        let card = CanonicalCard::new(CardData::default());
        let json = serde_json::to_value(&card).unwrap();
        assert!(json["data"].get("character_book").is_none());
    }

    #[test]
    fn test_pretty_json_uses_two_space_indent() {
        let rendered = to_pretty_json(&LegacyCard::new("Sui")).unwrap();
        assert!(rendered.starts_with("{\n  \"name\": \"Sui\",\n  \"description\": \"\""));
    }

    #[test]
    fn test_into_canonical_drops_legacy_fields() {
        let card = CanonicalCard::new(CardData::from_legacy(&LegacyCard::new("Sui")));
        let backfilled = BackfilledCard::from_parts(card.clone(), LegacyCard::filled_with("x"));
        assert_eq!(backfilled.legacy(), LegacyCard::filled_with("x"));
        assert_eq!(backfilled.into_canonical(), card);
    }
}
