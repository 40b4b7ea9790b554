//! Rendering of classification outcomes for the terminal.
//!
//! Each subcommand turns its classification into a [`Report`], which is
//! then formatted as text, JSON or YAML.

use chara_card_core::{
    CanonicalCard, CanonicalClassification, LegacyClassification, SyntaxError, ValidationErrors,
    backfill_v2, backfill_v2_with_obsolescence_notice, samples, to_pretty_json, v1_to_v2,
};
use serde::Serialize;
use serde_json::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// How V1 fields are filled when backfilling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillStyle {
    /// Copy the V2 values.
    Mirrored,
    /// Write the obsolescence notice.
    Notice,
}

/// Overall verdict of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Invalid,
}

/// A rendered outcome: a human message plus whatever payload goes with it.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_error: Option<SyntaxError>,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
            card: None,
            errors: None,
            syntax_error: None,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            status: Status::Warning,
            ..Self::ok(message)
        }
    }

    fn with_card<T: Serialize>(mut self, card: &T) -> Result<Self, String> {
        let value = serde_json::to_value(card)
            .map_err(|e| format!("Failed to serialize card: {e}"))?;
        self.card = Some(value);
        Ok(self)
    }

    fn invalid_syntax(error: &SyntaxError) -> Self {
        Self {
            status: Status::Invalid,
            syntax_error: Some(error.clone()),
            ..Self::ok("Invalid JSON provided:")
        }
    }

    fn invalid_structure(errors: &ValidationErrors) -> Self {
        Self {
            status: Status::Invalid,
            errors: Some(errors.clone()),
            ..Self::ok("Valid JSON, but invalid card with the following error:")
        }
    }

    /// Returns `true` unless the input was rejected.
    pub fn is_valid(&self) -> bool {
        self.status != Status::Invalid
    }
}

/// Report for `chara-card validate`.
pub fn validation_report(result: &CanonicalClassification) -> Report {
    match result {
        CanonicalClassification::CanonicalWithLegacy { in_sync: true, .. } => Report::ok(
            "Valid V2 card, which also contains V1 fields backfilled. \
             The V1 fields are properly backfilled in a backward-compatible way.",
        ),
        CanonicalClassification::CanonicalWithLegacy { in_sync: false, .. } => Report::warning(
            "Valid V2 card, which also contains V1 fields backfilled. \
             CAREFUL: The backfilled V1 fields differ from the equivalent V2 fields!!!",
        ),
        CanonicalClassification::Canonical { .. } => Report::ok("Valid V2 card."),
        CanonicalClassification::InvalidSyntax { error } => Report::invalid_syntax(error),
        CanonicalClassification::InvalidStructure { errors } => Report::invalid_structure(errors),
    }
}

/// Report for `chara-card backfill`.
pub fn backfill_report(
    result: &CanonicalClassification,
    style: BackfillStyle,
) -> Result<Report, String> {
    let apply = |card: &CanonicalCard| match style {
        BackfillStyle::Mirrored => backfill_v2(card),
        BackfillStyle::Notice => backfill_v2_with_obsolescence_notice(card),
    };

    match result {
        CanonicalClassification::CanonicalWithLegacy { in_sync: true, .. }
            if style == BackfillStyle::Mirrored =>
        {
            Ok(Report::ok(
                "This V2 card already has V1 fields backfilled in a backward-compatible way.",
            ))
        }
        CanonicalClassification::CanonicalWithLegacy { in_sync, card } => {
            let message = match (*in_sync, style) {
                (true, _) => {
                    "This V2 card had V1 fields properly backfilled already, but here is the \
                     version where the fields are instead replaced with an obsolescence notice:"
                }
                (false, BackfillStyle::Notice) => {
                    "Here is the V2 card you've supplied, with V1 fields backfilled with an \
                     obsolescence notice:"
                }
                (false, BackfillStyle::Mirrored) => {
                    "Here is the V2 card you've supplied, with V1 fields backfilled with their \
                     V2 equivalent:"
                }
            };
            Report::ok(message).with_card(&apply(&card.clone().into_canonical()))
        }
        CanonicalClassification::Canonical { card } => {
            let message = match style {
                BackfillStyle::Mirrored => {
                    "Here is the card you provided with V1 fields backfilled with their \
                     equivalent V2 field:"
                }
                BackfillStyle::Notice => {
                    "Here is the card you provided with V1 fields backfilled with an \
                     obsolescence notice:"
                }
            };
            Report::ok(message).with_card(&apply(card))
        }
        CanonicalClassification::InvalidSyntax { error } => Ok(Report::invalid_syntax(error)),
        CanonicalClassification::InvalidStructure { errors } => {
            Ok(Report::invalid_structure(errors))
        }
    }
}

/// Report for `chara-card upgrade`.
pub fn upgrade_report(result: &LegacyClassification) -> Result<Report, String> {
    match result {
        LegacyClassification::AlreadyMigratedWithLegacy => Ok(Report::ok(
            "The card you've provided is already a V2 card (with V1 fields backfilled).",
        )),
        LegacyClassification::AlreadyMigrated => Ok(Report::ok(
            "The card you've provided is already a V2 card.",
        )),
        LegacyClassification::Legacy { card } => Report::ok(
            "Here's the card you've provided, upgraded to V2 format with sensible defaults:",
        )
        .with_card(&v1_to_v2(card)),
        LegacyClassification::InvalidSyntax { error } => Ok(Report::invalid_syntax(error)),
        LegacyClassification::InvalidStructure { errors } => Ok(Report::invalid_structure(errors)),
    }
}

/// Formats a report in the requested output format.
pub fn format_report(report: &Report, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => report_to_text(report),
    }
}

fn report_to_text(report: &Report) -> Result<String, String> {
    let mut out = String::new();
    out.push_str(&report.message);
    out.push('\n');

    if let Some(ref error) = report.syntax_error {
        out.push_str(&format!("{error}\n"));
    }
    if let Some(ref errors) = report.errors {
        out.push_str(&pretty(errors)?);
        out.push('\n');
    }
    if let Some(ref card) = report.card {
        out.push_str(&pretty(card)?);
        out.push('\n');
    }

    Ok(out)
}

/// Formats the example cards.
pub fn format_examples(format: OutputFormat) -> Result<String, String> {
    let examples =
        samples::all().map_err(|e| format!("Failed to serialize examples: {e}"))?;
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, Value> = examples
                .into_iter()
                .map(|(title, card)| (title.to_string(), card))
                .collect();
            serde_json::to_string_pretty(&map)
                .map_err(|e| format!("JSON serialization failed: {e}"))
        }
        OutputFormat::Yaml => {
            let map: serde_json::Map<String, Value> = examples
                .into_iter()
                .map(|(title, card)| (title.to_string(), card))
                .collect();
            serde_yaml::to_string(&map).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (title, card) in examples {
                out.push_str(&format!("## {title}\n\n"));
                out.push_str(&pretty(&card)?);
                out.push_str("\n\n");
            }
            Ok(out)
        }
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String, String> {
    to_pretty_json(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use chara_card_core::{OBSOLESCENCE_NOTICE, classify_as_canonical, classify_as_legacy};

    use super::*;

    fn canonical_text() -> String {
        to_pretty_json(&samples::v2_card_without_book()).unwrap()
    }

    #[test]
    fn test_validation_report_warns_on_out_of_sync() {
        let text = to_pretty_json(&samples::backfilled_card_with_notice()).unwrap();
        let report = validation_report(&classify_as_canonical(&text));
        assert_eq!(report.status, Status::Warning);
        assert!(report.message.contains("CAREFUL"));
        assert!(report.is_valid());
    }

    #[test]
    fn test_backfill_report_attaches_transformed_card() {
        let result = classify_as_canonical(&canonical_text());

        let mirrored = backfill_report(&result, BackfillStyle::Mirrored).unwrap();
        let card = mirrored.card.unwrap();
        assert_eq!(card["name"], card["data"]["name"]);

        let notice = backfill_report(&result, BackfillStyle::Notice).unwrap();
        assert_eq!(notice.card.unwrap()["name"], OBSOLESCENCE_NOTICE);
    }

    #[test]
    fn test_backfill_report_skips_card_already_in_sync() {
        let text = to_pretty_json(&samples::backfilled_card()).unwrap();
        let result = classify_as_canonical(&text);

        let report = backfill_report(&result, BackfillStyle::Mirrored).unwrap();
        assert!(report.card.is_none());

        let report = backfill_report(&result, BackfillStyle::Notice).unwrap();
        assert!(report.message.starts_with("This V2 card had V1 fields properly backfilled"));
        assert_eq!(report.card.unwrap()["first_mes"], OBSOLESCENCE_NOTICE);
    }

    #[test]
    fn test_upgrade_report_for_v1_card() {
        let text = to_pretty_json(&samples::v1_card()).unwrap();
        let report = upgrade_report(&classify_as_legacy(&text)).unwrap();
        let card = report.card.unwrap();
        assert_eq!(card["spec"], "chara_card_v2");
        assert_eq!(card["data"]["name"], "Sui the card test");
    }

    #[test]
    fn test_invalid_reports_render_diagnostics() {
        let report = validation_report(&classify_as_canonical("{"));
        assert!(!report.is_valid());
        let text = format_report(&report, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Invalid JSON provided:\n"));

        let report = validation_report(&classify_as_canonical("{}"));
        let json = format_report(&report, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "invalid");
        assert_eq!(value["errors"]["issues"][0]["path"][0], "spec");
    }

    #[test]
    fn test_format_examples_text_has_every_title() {
        let text = format_examples(OutputFormat::Text).unwrap();
        assert!(text.contains("## Valid V1 card\n"));
        assert!(text.contains("## Valid V2 card with arbitrary data inside the extensions field"));
    }
}
