/// Shared types used across the codebase

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque JSON document (question metadata, edge conditions, themes, answers).
///
/// Validated once when it enters the system: it must be a JSON object. Past that
/// boundary the content is carried around uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Document(Value);

impl Document {
    pub fn empty() -> Self {
        Document(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(_) => Ok(Document(value)),
            other => Err(DocumentError(json_kind(&other))),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Document::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a JSON object, found {0}")]
pub struct DocumentError(&'static str);

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "team_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    Owner,
    Member,
}

/// Form lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "form_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    Draft,
    Published,
    Closed,
    Archived,
}

impl FormStatus {
    pub fn accepts_responses(self) -> bool {
        matches!(self, FormStatus::Published)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "page_layout", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageLayout {
    #[default]
    SinglePage,
    MultiStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "question_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    ShortText,
    LongText,
    Email,
    Phone,
    Number,
    Url,
    Date,
    Time,
    SingleChoice,
    MultipleChoice,
    Dropdown,
    Checkbox,
    YesNo,
    Rating,
    OpinionScale,
    Nps,
    Ranking,
    Matrix,
    FileUpload,
    Signature,
    Address,
    WelcomeScreen,
    EndScreen,
    Statement,
    Legal,
}

impl QuestionType {
    /// Types whose answers are picked from the question's option set
    pub fn has_options(self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice
                | QuestionType::MultipleChoice
                | QuestionType::Dropdown
                | QuestionType::Checkbox
                | QuestionType::Ranking
        )
    }
}

/// What an uploaded object is for; becomes a path segment of its storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadIntent {
    Settings,
    Response,
    Question,
    Other,
}

impl UploadIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadIntent::Settings => "settings",
            UploadIntent::Response => "response",
            UploadIntent::Question => "question",
            UploadIntent::Other => "other",
        }
    }
}

impl fmt::Display for UploadIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_accepts_objects_only() {
        assert!(Document::from_value(json!({"op": "eq"})).is_ok());
        let err = Document::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "expected a JSON object, found an array");
    }

    #[test]
    fn document_deserialize_rejects_scalars() {
        let parsed: Result<Document, _> = serde_json::from_value(json!("nope"));
        assert!(parsed.is_err());

        let parsed: Document = serde_json::from_value(json!({"color": "#fff"})).unwrap();
        assert_eq!(parsed.as_value()["color"], "#fff");
    }

    #[test]
    fn question_type_wire_names() {
        let t: QuestionType = serde_json::from_value(json!("MULTIPLE_CHOICE")).unwrap();
        assert_eq!(t, QuestionType::MultipleChoice);
        assert!(t.has_options());
        assert!(!QuestionType::Nps.has_options());
    }

    #[test]
    fn upload_intent_is_lowercase() {
        let i: UploadIntent = serde_json::from_value(json!("response")).unwrap();
        assert_eq!(i.to_string(), "response");
        assert!(serde_json::from_value::<UploadIntent>(json!("avatar")).is_err());
    }
}
