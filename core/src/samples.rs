//! Example valid cards, one per supported shape.
//!
//! Useful as fixtures and as a reference for what each format looks like.

use serde_json::json;

use crate::{
    BackfilledCard, BookEntry, CanonicalCard, CardData, CharacterBook, Extensions, LegacyCard,
    backfill_v2, backfill_v2_with_obsolescence_notice,
};

/// A valid V1 card.
pub fn v1_card() -> LegacyCard {
    LegacyCard::new("Sui the card test")
        .with_description("{{char}} is very happy.")
        .with_scenario("Sui tells a nice story")
        .with_first_mes("Hi! I'm Sui.")
        .with_mes_example("{{user}}: You're cool.\n{{char}}: Thanks!")
}

/// A valid V2 card with no character book.
pub fn v2_card_without_book() -> CanonicalCard {
    let mut data = CardData::from_legacy(&v1_card());
    data.creator_notes = "Sui is nice".into();
    data.system_prompt = "Enter roleplay mode. Write {{char}}'s next reply.".into();
    data.post_history_instructions = "Your reply must end with \"desu\".".into();
    data.alternate_greetings = vec!["Hey, what's up?".into(), "Hey there.".into()];
    data.tags = vec!["female".into(), "nice".into()];
    data.creator = "malfoy".into();
    data.character_version = "1".into();
    CanonicalCard::new(data)
}

/// A valid V2 card with a one-entry character book.
pub fn v2_card() -> CanonicalCard {
    let mut entry = BookEntry::new(vec!["dummy".into()], "this is a dummy entry", 0);
    entry.enabled = false;
    entry.name = Some("dummy".into());
    entry.priority = Some(0.into());

    let mut card = v2_card_without_book();
    card.data.character_book = Some(CharacterBook {
        name: Some("the dummy book".into()),
        description: Some("dummy book".into()),
        entries: vec![entry],
        ..CharacterBook::default()
    });
    card
}

/// [`v2_card_without_book`] with mirrored V1 fields.
pub fn backfilled_card() -> BackfilledCard {
    backfill_v2(&v2_card_without_book())
}

/// [`v2_card_without_book`] with the obsolescence notice in its V1 fields.
pub fn backfilled_card_with_notice() -> BackfilledCard {
    backfill_v2_with_obsolescence_notice(&v2_card_without_book())
}

/// A V2 card carrying third-party data in `extensions`.
pub fn v2_card_with_extensions() -> CanonicalCard {
    let mut extensions = Extensions::new();
    extensions.insert(
        "agnai".into(),
        json!({"authorNote": "Your message must have a happy tone."}),
    );

    let mut card = v2_card_without_book();
    card.data.extensions = extensions;
    card
}

/// Every sample with a display title, in presentation order.
///
/// # Errors
///
/// Returns the serializer's error if a sample cannot be converted to JSON.
pub fn all() -> serde_json::Result<Vec<(&'static str, serde_json::Value)>> {
    Ok(vec![
        ("Valid V1 card", serde_json::to_value(v1_card())?),
        ("Valid V2 card", serde_json::to_value(v2_card())?),
        (
            "Valid V2 card without character book",
            serde_json::to_value(v2_card_without_book())?,
        ),
        (
            "Valid V2 card with V1 fields backfilled",
            serde_json::to_value(backfilled_card())?,
        ),
        (
            "Valid V2 card with V1 fields backfilled with obsolescence notice",
            serde_json::to_value(backfilled_card_with_notice())?,
        ),
        (
            "Valid V2 card with arbitrary data inside the extensions field",
            serde_json::to_value(v2_card_with_extensions())?,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CanonicalClassification, LegacyClassification, classify_as_canonical, classify_as_legacy,
        to_pretty_json,
    };

    #[test]
    fn test_samples_classify_as_their_kind() {
        let v1 = to_pretty_json(&v1_card()).unwrap();
        assert_eq!(
            classify_as_legacy(&v1),
            LegacyClassification::Legacy { card: v1_card() }
        );

        for card in [v2_card(), v2_card_without_book(), v2_card_with_extensions()] {
            let text = to_pretty_json(&card).unwrap();
            assert_eq!(
                classify_as_canonical(&text),
                CanonicalClassification::Canonical { card }
            );
        }

        let text = to_pretty_json(&backfilled_card()).unwrap();
        assert!(matches!(
            classify_as_canonical(&text),
            CanonicalClassification::CanonicalWithLegacy { in_sync: true, .. }
        ));

        let text = to_pretty_json(&backfilled_card_with_notice()).unwrap();
        assert!(matches!(
            classify_as_canonical(&text),
            CanonicalClassification::CanonicalWithLegacy { in_sync: false, .. }
        ));
    }

    #[test]
    fn test_all_lists_six_objects() {
        let samples = all().unwrap();
        assert_eq!(samples.len(), 6);
        assert!(samples.iter().all(|(_, value)| value.is_object()));
    }
}
