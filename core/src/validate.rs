//! Structural validation of untrusted JSON against the card schemas.
//!
//! Validation walks a [`serde_json::Value`] and collects *every* structural
//! problem it finds, each tagged with the path where it occurred. Only when
//! the list is empty is the value decoded into its typed, normalized form.
//! Nothing in this module panics on malformed input; failures are returned
//! as [`ValidationErrors`].
//!
//! # Examples
//!
//! ```
//! use chara_card_core::*;
//! use serde_json::json;
//!
//! let legacy = json!({
//!     "name": "Sui", "description": "d", "personality": "p",
//!     "scenario": "s", "first_mes": "Hi", "mes_example": "m"
//! });
//! assert_eq!(validate_legacy(&legacy).unwrap().name, "Sui");
//!
//! let errors = validate_canonical(&legacy).unwrap_err();
//! assert_eq!(errors.len(), 3); // spec, spec_version, data
//! ```

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{BackfilledCard, CanonicalCard, EntryPosition, LEGACY_FIELDS, LegacyCard};
use crate::{SPEC_TAG, SPEC_VERSION};

/// JSON type names as they appear in validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
    /// The key was absent.
    Undefined,
}

impl JsonType {
    /// Returns the type of `value`, or [`JsonType::Undefined`] when absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use chara_card_core::JsonType;
    /// use serde_json::json;
    ///
    /// assert_eq!(JsonType::of(Some(&json!([1]))), JsonType::Array);
    /// assert_eq!(JsonType::of(None), JsonType::Undefined);
    /// ```
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => Self::Undefined,
            Some(Value::Null) => Self::Null,
            Some(Value::Bool(_)) => Self::Boolean,
            Some(Value::Number(_)) => Self::Number,
            Some(Value::String(_)) => Self::String,
            Some(Value::Array(_)) => Self::Array,
            Some(Value::Object(_)) => Self::Object,
        }
    }

    /// Returns the lowercase name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step in the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// What went wrong at a given path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    /// The value (or its absence) has the wrong JSON type.
    InvalidType {
        expected: JsonType,
        received: JsonType,
    },
    /// A discriminator did not hold its required literal value.
    InvalidLiteral {
        expected: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        received: Option<Value>,
    },
    /// A string outside a closed set of options.
    InvalidEnumValue {
        options: Vec<String>,
        received: Value,
    },
    /// The value passed the structural checks but could not be decoded.
    Custom,
}

/// A single structural validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    /// Returns the path joined with dots, or `<root>` for the top level.
    ///
    /// # Examples
    ///
    /// ```
    /// use chara_card_core::*;
    /// use serde_json::json;
    ///
    /// let errors = validate_canonical(&json!({"spec": "chara_card_v2"})).unwrap_err();
    /// let paths: Vec<String> = errors.iter().map(|i| i.dotted_path()).collect();
    /// assert_eq!(paths, vec!["spec_version", "data"]);
    /// ```
    pub fn dotted_path(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dotted_path(), self.message)
    }
}

/// The structured error list returned by a failed validation.
///
/// Serializes as `{"issues": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("card failed validation with {} issue(s)", .issues.len())]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` when no issue was recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Iterates over the issues in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }

    /// Returns `true` if an issue was reported at `path` (dotted form).
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.dotted_path() == path)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

/// The card schemas known to the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSchema {
    /// Flat V1 card.
    Legacy,
    /// V2 envelope.
    Canonical,
    /// V2 envelope plus top-level V1 fields.
    Backfilled,
}

impl CardSchema {
    /// Short name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Canonical => "canonical",
            Self::Backfilled => "canonical-with-legacy",
        }
    }

    /// Validates `value` against this schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use chara_card_core::*;
    /// use serde_json::json;
    ///
    /// let result = CardSchema::Canonical.validate(&json!("not a card"));
    /// let errors = result.unwrap_err();
    /// assert_eq!(errors.issues[0].message, "Expected object, received string");
    /// ```
    pub fn validate(self, value: &Value) -> Result<ValidatedCard, ValidationErrors> {
        match self {
            Self::Legacy => validate_legacy(value).map(ValidatedCard::Legacy),
            Self::Canonical => validate_canonical(value).map(ValidatedCard::Canonical),
            Self::Backfilled => validate_backfilled(value).map(ValidatedCard::Backfilled),
        }
    }
}

/// A value that passed validation, in its typed form.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedCard {
    Legacy(LegacyCard),
    Canonical(CanonicalCard),
    Backfilled(BackfilledCard),
}

/// Validates a V1 card.
pub fn validate_legacy(value: &Value) -> Result<LegacyCard, ValidationErrors> {
    validate_with(value, |checker, root| {
        if let Some(obj) = checker.object_here(Some(root)) {
            check_legacy_fields(checker, obj);
        }
    })
}

/// Validates a V2 card. Unknown top-level keys, including V1 fields, are
/// dropped from the result.
pub fn validate_canonical(value: &Value) -> Result<CanonicalCard, ValidationErrors> {
    validate_with(value, |checker, root| {
        if let Some(obj) = checker.object_here(Some(root)) {
            check_envelope(checker, obj);
        }
    })
}

/// Validates a V2 card that must also carry the V1 fields at its top level.
///
/// Issues for the V1 fields come first, then the envelope's.
pub fn validate_backfilled(value: &Value) -> Result<BackfilledCard, ValidationErrors> {
    validate_with(value, |checker, root| {
        if let Some(obj) = checker.object_here(Some(root)) {
            check_legacy_fields(checker, obj);
            check_envelope(checker, obj);
        }
    })
}

fn validate_with<T, F>(value: &Value, check: F) -> Result<T, ValidationErrors>
where
    T: DeserializeOwned,
    F: FnOnce(&mut Checker, &Value),
{
    let mut checker = Checker::default();
    check(&mut checker, value);
    if !checker.issues.is_empty() {
        return Err(ValidationErrors {
            issues: checker.issues,
        });
    }

    T::deserialize(value).map_err(|err| ValidationErrors {
        issues: vec![ValidationIssue {
            kind: IssueKind::Custom,
            path: Vec::new(),
            message: err.to_string(),
        }],
    })
}

fn check_legacy_fields(checker: &mut Checker, obj: &Map<String, Value>) {
    for field in LEGACY_FIELDS {
        checker.required(obj, field, JsonType::String);
    }
}

fn check_envelope(checker: &mut Checker, obj: &Map<String, Value>) {
    checker.literal(obj, "spec", SPEC_TAG);
    checker.literal(obj, "spec_version", SPEC_VERSION);

    checker.enter("data");
    if let Some(data) = checker.object_here(obj.get("data")) {
        check_data(checker, data);
    }
    checker.leave();
}

fn check_data(checker: &mut Checker, data: &Map<String, Value>) {
    check_legacy_fields(checker, data);
    checker.required(data, "creator_notes", JsonType::String);
    checker.required(data, "system_prompt", JsonType::String);
    checker.required(data, "post_history_instructions", JsonType::String);
    checker.string_array(data, "alternate_greetings", false);

    if data.contains_key("character_book") {
        checker.enter("character_book");
        if let Some(book) = checker.object_here(data.get("character_book")) {
            check_book(checker, book);
        }
        checker.leave();
    }

    checker.string_array(data, "tags", false);
    checker.required(data, "creator", JsonType::String);
    checker.required(data, "character_version", JsonType::String);
    checker.required(data, "extensions", JsonType::Object);
}

fn check_book(checker: &mut Checker, book: &Map<String, Value>) {
    checker.optional(book, "name", JsonType::String);
    checker.optional(book, "description", JsonType::String);
    checker.optional(book, "scan_depth", JsonType::Number);
    checker.optional(book, "token_budget", JsonType::Number);
    checker.optional(book, "recursive_scanning", JsonType::Boolean);
    checker.required(book, "extensions", JsonType::Object);

    if let Some(Value::Array(entries)) = checker.required(book, "entries", JsonType::Array) {
        checker.enter("entries");
        for (index, entry) in entries.iter().enumerate() {
            checker.enter_index(index);
            if let Some(entry) = checker.object_here(Some(entry)) {
                check_entry(checker, entry);
            }
            checker.leave();
        }
        checker.leave();
    }
}

fn check_entry(checker: &mut Checker, entry: &Map<String, Value>) {
    checker.string_array(entry, "keys", false);
    checker.required(entry, "content", JsonType::String);
    checker.required(entry, "extensions", JsonType::Object);
    checker.required(entry, "enabled", JsonType::Boolean);
    checker.required(entry, "insertion_order", JsonType::Number);
    checker.optional(entry, "case_sensitive", JsonType::Boolean);
    checker.optional(entry, "name", JsonType::String);
    checker.optional(entry, "priority", JsonType::Number);
    checker.optional(entry, "id", JsonType::Number);
    checker.optional(entry, "comment", JsonType::String);
    checker.optional(entry, "selective", JsonType::Boolean);
    checker.string_array(entry, "secondary_keys", true);
    checker.optional(entry, "constant", JsonType::Boolean);
    checker.one_of(entry, "position", &EntryPosition::VALUES);
}

/// Walks a value while tracking the current path and the issues found.
#[derive(Debug, Default)]
struct Checker {
    path: Vec<PathSegment>,
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn enter(&mut self, key: &str) {
        self.path.push(PathSegment::Key(key.to_string()));
    }

    fn enter_index(&mut self, index: usize) {
        self.path.push(PathSegment::Index(index));
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn report(&mut self, kind: IssueKind, message: String) {
        self.issues.push(ValidationIssue {
            kind,
            path: self.path.clone(),
            message,
        });
    }

    fn report_type(&mut self, expected: JsonType, found: Option<&Value>) {
        let received = JsonType::of(found);
        let message = if received == JsonType::Undefined {
            "Required".to_string()
        } else {
            format!("Expected {expected}, received {received}")
        };
        self.report(IssueKind::InvalidType { expected, received }, message);
    }

    /// Requires an object at the current path.
    fn object_here<'v>(&mut self, value: Option<&'v Value>) -> Option<&'v Map<String, Value>> {
        match value {
            Some(Value::Object(obj)) => Some(obj),
            other => {
                self.report_type(JsonType::Object, other);
                None
            }
        }
    }

    fn required<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        expected: JsonType,
    ) -> Option<&'v Value> {
        let value = obj.get(key);
        if JsonType::of(value) == expected {
            return value;
        }
        self.enter(key);
        self.report_type(expected, value);
        self.leave();
        None
    }

    fn optional<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        expected: JsonType,
    ) -> Option<&'v Value> {
        if obj.contains_key(key) {
            self.required(obj, key, expected)
        } else {
            None
        }
    }

    fn string_array(&mut self, obj: &Map<String, Value>, key: &str, optional: bool) {
        let array = if optional {
            self.optional(obj, key, JsonType::Array)
        } else {
            self.required(obj, key, JsonType::Array)
        };
        let Some(Value::Array(items)) = array else {
            return;
        };

        self.enter(key);
        for (index, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.enter_index(index);
                self.report_type(JsonType::String, Some(item));
                self.leave();
            }
        }
        self.leave();
    }

    fn literal(&mut self, obj: &Map<String, Value>, key: &str, expected: &str) {
        let value = obj.get(key);
        if value.and_then(Value::as_str) == Some(expected) {
            return;
        }
        self.enter(key);
        self.report(
            IssueKind::InvalidLiteral {
                expected: expected.to_string(),
                received: value.cloned(),
            },
            format!("Invalid literal value, expected \"{expected}\""),
        );
        self.leave();
    }

    fn one_of(&mut self, obj: &Map<String, Value>, key: &str, options: &[&str]) {
        let Some(value) = obj.get(key) else {
            return;
        };
        if value.as_str().is_some_and(|s| options.contains(&s)) {
            return;
        }

        let expected = options
            .iter()
            .map(|option| format!("'{option}'"))
            .collect::<Vec<_>>()
            .join(" | ");
        let received = match value {
            Value::String(s) => format!("'{s}'"),
            other => other.to_string(),
        };
        self.enter(key);
        self.report(
            IssueKind::InvalidEnumValue {
                options: options.iter().map(|o| o.to_string()).collect(),
                received: value.clone(),
            },
            format!("Invalid enum value. Expected {expected}, received {received}"),
        );
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn legacy_json() -> Value {
        json!({
            "name": "Sui",
            "description": "d",
            "personality": "p",
            "scenario": "s",
            "first_mes": "Hi",
            "mes_example": "m"
        })
    }

    fn canonical_json() -> Value {
        json!({
            "spec": "chara_card_v2",
            "spec_version": "2.0",
            "data": {
                "name": "Sui",
                "description": "d",
                "personality": "p",
                "scenario": "s",
                "first_mes": "Hi",
                "mes_example": "m",
                "creator_notes": "",
                "system_prompt": "",
                "post_history_instructions": "",
                "alternate_greetings": [],
                "tags": [],
                "creator": "",
                "character_version": "",
                "extensions": {}
            }
        })
    }

    #[test]
    fn test_validate_legacy_accepts_six_string_fields() {
        let card = validate_legacy(&legacy_json()).unwrap();
        assert_eq!(card.first_mes, "Hi");
        assert_eq!(card.mes_example, "m");
    }

    #[test]
    fn test_validate_legacy_reports_missing_field_as_required() {
        let mut value = legacy_json();
        value.as_object_mut().unwrap().remove("scenario");

        let errors = validate_legacy(&value).unwrap_err();
        assert_eq!(
            errors.issues,
            vec![ValidationIssue {
                kind: IssueKind::InvalidType {
                    expected: JsonType::String,
                    received: JsonType::Undefined,
                },
                path: vec![PathSegment::Key("scenario".into())],
                message: "Required".into(),
            }]
        );
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let value = json!({"name": 1, "description": null});
        let errors = validate_legacy(&value).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.issues[0].message, "Expected string, received number");
        assert_eq!(errors.issues[1].message, "Expected string, received null");
        assert_eq!(errors.issues[2].message, "Required");
    }

    #[test]
    fn test_validate_rejects_non_object_root() {
        let errors = validate_legacy(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.issues[0].dotted_path(), "<root>");
        assert_eq!(errors.issues[0].message, "Expected object, received array");
    }

    #[test]
    fn test_validate_canonical_rejects_wrong_discriminators() {
        let mut value = canonical_json();
        value["spec"] = json!("chara_card_v3");
        value["spec_version"] = json!(2.0);

        let errors = validate_canonical(&value).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.issues[0].kind,
            IssueKind::InvalidLiteral {
                expected: "chara_card_v2".into(),
                received: Some(json!("chara_card_v3")),
            }
        );
        assert_eq!(
            errors.issues[1].message,
            "Invalid literal value, expected \"2.0\""
        );
    }

    #[test]
    fn test_validate_canonical_reports_nested_paths() {
        let mut value = canonical_json();
        value["data"]["tags"] = json!(["ok", 3]);
        value["data"].as_object_mut().unwrap().remove("creator");

        let errors = validate_canonical(&value).unwrap_err();
        let paths: Vec<String> = errors.iter().map(ValidationIssue::dotted_path).collect();
        assert_eq!(paths, vec!["data.tags.1", "data.creator"]);
    }

    #[test]
    fn test_validate_canonical_strips_unknown_keys() {
        let mut value = canonical_json();
        value["unknown"] = json!(true);
        value["data"]["also_unknown"] = json!("x");

        let card = validate_canonical(&value).unwrap();
        let normalized = serde_json::to_value(&card).unwrap();
        assert!(normalized.get("unknown").is_none());
        assert!(normalized["data"].get("also_unknown").is_none());
    }

    #[test]
    fn test_validate_canonical_accepts_arbitrary_extensions() {
        let mut value = canonical_json();
        value["data"]["extensions"] = json!({
            "agnai": {"authorNote": "happy", "nested": [1, {"deep": null}]},
            "flag": false
        });

        let card = validate_canonical(&value).unwrap();
        assert_eq!(card.data.extensions["agnai"]["nested"][1], json!({"deep": null}));
        assert_eq!(card.data.extensions["flag"], json!(false));
    }

    #[test]
    fn test_validate_canonical_rejects_array_extensions() {
        let mut value = canonical_json();
        value["data"]["extensions"] = json!([]);

        let errors = validate_canonical(&value).unwrap_err();
        assert!(errors.has_issue_at("data.extensions"));
    }

    #[test]
    fn test_validate_character_book_entries() {
        let mut value = canonical_json();
        value["data"]["character_book"] = json!({
            "extensions": {},
            "entries": [
                {
                    "keys": ["dummy"],
                    "content": "c",
                    "extensions": {},
                    "enabled": true,
                    "insertion_order": 0,
                    "position": "before_char"
                },
                {
                    "keys": ["x"],
                    "content": "c",
                    "extensions": {},
                    "enabled": "yes",
                    "insertion_order": 1,
                    "position": "middle"
                }
            ]
        });

        let errors = validate_canonical(&value).unwrap_err();
        let paths: Vec<String> = errors.iter().map(ValidationIssue::dotted_path).collect();
        assert_eq!(
            paths,
            vec![
                "data.character_book.entries.1.enabled",
                "data.character_book.entries.1.position"
            ]
        );
        assert_eq!(
            errors.issues[1].message,
            "Invalid enum value. Expected 'before_char' | 'after_char', received 'middle'"
        );
    }

    #[test]
    fn test_validate_character_book_decodes_typed_entries() {
        let mut value = canonical_json();
        value["data"]["character_book"] = json!({
            "name": "book",
            "extensions": {},
            "entries": [{
                "keys": ["dummy"],
                "content": "c",
                "extensions": {},
                "enabled": false,
                "insertion_order": 0,
                "priority": 10,
                "position": "after_char"
            }]
        });

        let card = validate_canonical(&value).unwrap();
        let book = card.data.character_book.unwrap();
        assert_eq!(book.name.as_deref(), Some("book"));
        assert_eq!(book.entries[0].position, Some(EntryPosition::AfterChar));
        assert_eq!(book.entries[0].priority.as_ref().and_then(|n| n.as_i64()), Some(10));
    }

    #[test]
    fn test_validate_backfilled_reports_legacy_fields_first() {
        let errors = validate_backfilled(&canonical_json()).unwrap_err();
        let paths: Vec<String> = errors.iter().map(ValidationIssue::dotted_path).collect();
        assert_eq!(paths, LEGACY_FIELDS.to_vec());
    }

    #[test]
    fn test_issue_serializes_with_code_first() {
        let errors = validate_legacy(&json!({})).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json["issues"][0],
            json!({
                "code": "invalid_type",
                "expected": "string",
                "received": "undefined",
                "path": ["name"],
                "message": "Required"
            })
        );
    }
}
