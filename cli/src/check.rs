//! Batch classification of card files.

use std::fs;
use std::path::{Path, PathBuf};

use chara_card_core::{
    CanonicalClassification, LegacyClassification, classify_as_canonical, classify_as_legacy,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{CheckConfig, CheckTarget};

/// Outcome recorded for one file.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub path: PathBuf,
    /// Classification kind, e.g. `canonical` or `invalid_structure`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_sync: Option<bool>,
    /// Number of structural issues, or the syntax error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub passed: bool,
}

/// Aggregate result of a check run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckSummary {
    pub entries: Vec<CheckEntry>,
    pub passed: usize,
    pub failed: usize,
}

impl CheckSummary {
    fn push(&mut self, entry: CheckEntry) {
        if entry.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.entries.push(entry);
    }

    /// Returns `true` if no file failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Expands `inputs` into a sorted list of card files.
///
/// Files named explicitly are always kept unless excluded; directories are
/// scanned (non-recursively) for the configured extensions.
pub fn collect_card_paths(inputs: &[PathBuf], config: &CheckConfig) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .map_err(|err| format!("Failed to read directory '{}': {err}", input.display()))?;
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(dir = %input.display(), "skipping unreadable entry: {err}");
                        continue;
                    }
                };
                let path = entry.path();
                if path.is_file() && config.has_card_extension(&path) && !is_excluded(&path, config)
                {
                    paths.push(path);
                }
            }
        } else if input.is_file() {
            if !is_excluded(input, config) {
                paths.push(input.clone());
            }
        } else {
            return Err(format!("Input path does not exist: {}", input.display()));
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn is_excluded(path: &Path, config: &CheckConfig) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| config.is_excluded(name))
}

/// Classifies every file in `paths` under the configured policy.
///
/// A file that cannot be read or is not UTF-8 fails on its own entry; the
/// rest of the batch still runs.
pub fn run_check(paths: &[PathBuf], config: &CheckConfig) -> CheckSummary {
    let mut summary = CheckSummary::default();

    for path in paths {
        let entry = match fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => check_text(path, &text, config),
                Err(err) => failed_entry(
                    path,
                    "invalid_syntax",
                    format!("not valid UTF-8: {}", err.utf8_error()),
                ),
            },
            Err(err) => {
                warn!(path = %path.display(), "failed to read card: {err}");
                failed_entry(path, "unreadable", err.to_string())
            }
        };
        info!(
            path = %path.display(),
            outcome = %entry.outcome,
            passed = entry.passed,
            "checked card"
        );
        summary.push(entry);
    }

    summary
}

fn failed_entry(path: &Path, outcome: &str, detail: String) -> CheckEntry {
    CheckEntry {
        path: path.to_path_buf(),
        outcome: outcome.to_string(),
        in_sync: None,
        detail: Some(detail),
        passed: false,
    }
}

/// Classifies a single card text under the configured policy.
pub fn check_text(path: &Path, text: &str, config: &CheckConfig) -> CheckEntry {
    let policy = &config.policy;
    let entry = |outcome: &str, in_sync: Option<bool>, detail: Option<String>, passed: bool| {
        CheckEntry {
            path: path.to_path_buf(),
            outcome: outcome.to_string(),
            in_sync,
            detail,
            passed,
        }
    };

    match policy.target {
        CheckTarget::Canonical => match classify_as_canonical(text) {
            CanonicalClassification::Canonical { .. } => entry("canonical", None, None, true),
            CanonicalClassification::CanonicalWithLegacy { in_sync, .. } => entry(
                "canonical_with_legacy",
                Some(in_sync),
                None,
                in_sync || !policy.fail_on_out_of_sync,
            ),
            CanonicalClassification::InvalidSyntax { error } => {
                entry("invalid_syntax", None, Some(error.message), false)
            }
            CanonicalClassification::InvalidStructure { errors } => {
                if policy.allow_legacy
                    && matches!(classify_as_legacy(text), LegacyClassification::Legacy { .. })
                {
                    entry("legacy", None, None, true)
                } else {
                    entry(
                        "invalid_structure",
                        None,
                        Some(format!("{} issue(s)", errors.len())),
                        false,
                    )
                }
            }
        },
        CheckTarget::Legacy => match classify_as_legacy(text) {
            LegacyClassification::Legacy { .. } => entry("legacy", None, None, true),
            LegacyClassification::AlreadyMigrated => entry("already_migrated", None, None, true),
            LegacyClassification::AlreadyMigratedWithLegacy => {
                entry("already_migrated_with_legacy", None, None, true)
            }
            LegacyClassification::InvalidSyntax { error } => {
                entry("invalid_syntax", None, Some(error.message), false)
            }
            LegacyClassification::InvalidStructure { errors } => entry(
                "invalid_structure",
                None,
                Some(format!("{} issue(s)", errors.len())),
                false,
            ),
        },
    }
}

/// Renders a summary as a plain-text table.
pub fn summary_to_table(summary: &CheckSummary) -> String {
    let mut out = String::new();
    let width = summary
        .entries
        .iter()
        .map(|entry| entry.path.display().to_string().len())
        .max()
        .unwrap_or(4)
        .max(4);

    out.push_str(&format!("{:<width$}  {:<4}  {}\n", "FILE", "OK", "OUTCOME"));
    for entry in &summary.entries {
        let mut outcome = entry.outcome.clone();
        if entry.in_sync == Some(false) {
            outcome.push_str(" (out of sync)");
        }
        if let Some(ref detail) = entry.detail {
            outcome.push_str(&format!(": {detail}"));
        }
        out.push_str(&format!(
            "{:<width$}  {:<4}  {}\n",
            entry.path.display().to_string(),
            if entry.passed { "yes" } else { "no" },
            outcome
        ));
    }
    out.push_str(&format!(
        "\nPassed: {}, Failed: {}\n",
        summary.passed, summary.failed
    ));
    out
}
