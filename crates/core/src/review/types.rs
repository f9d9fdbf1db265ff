use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::ReviewError;

/// Schema-less document body: arbitrary key-value fields.
pub type Fields = serde_json::Map<String, Value>;

/// Producer-assigned pending id field.
pub const ID_FIELD: &str = "id";
/// Verdict field correlating a completed review to its pending item.
pub const REVIEW_ID_FIELD: &str = "review_id";
/// Server-assigned completed document id.
pub const DOC_ID_FIELD: &str = "_id";
/// Server-assigned submission timestamp.
pub const SUBMITTED_AT_FIELD: &str = "submitted_at";

/// Fields dropped from completed reviews on the summary path.
pub const LARGE_FIELDS: [&str; 3] = ["response", "context", "expected_output"];

/// Canonical form of a pending item id.
///
/// Producers may emit ids as strings or integers; both normalise to the same
/// string so `"7"` and `7` address the same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Parses an id from a JSON value.
    pub fn from_value(value: &Value, field: &'static str) -> Result<Self, ReviewError> {
        match value {
            Value::String(s) if s.trim().is_empty() => Err(ReviewError::InvalidField {
                field,
                reason: "must not be empty".to_string(),
            }),
            Value::String(s) => Ok(Self(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(n.to_string())),
            other => Err(ReviewError::InvalidField {
                field,
                reason: format!("expected a string or integer, got {}", json_type_name(other)),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn into_fields(value: Value) -> Result<Fields, ReviewError> {
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(ReviewError::NotAnObject),
    }
}

/// Formats a submission timestamp so that string order equals time order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp produced by [`format_timestamp`] (any RFC 3339 is accepted).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ReviewError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ReviewError::InvalidField {
            field: SUBMITTED_AT_FIELD,
            reason: e.to_string(),
        })
}

// ============================================================================
// ReviewItem
// ============================================================================

/// A pending review item: an opaque document that always carries an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Fields", try_from = "Fields")]
pub struct ReviewItem {
    id: ItemId,
    fields: Fields,
}

impl ReviewItem {
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Fields> for ReviewItem {
    type Error = ReviewError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        let id = fields.get(ID_FIELD).ok_or(ReviewError::MissingId)?;
        let id = ItemId::from_value(id, ID_FIELD)?;
        Ok(Self { id, fields })
    }
}

impl TryFrom<Value> for ReviewItem {
    type Error = ReviewError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::try_from(into_fields(value)?)
    }
}

impl From<ReviewItem> for Fields {
    fn from(item: ReviewItem) -> Self {
        item.fields
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// A reviewer's submission: arbitrary verdict fields plus, optionally, the
/// `review_id` of the pending item it judges.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    review_id: Option<ItemId>,
    fields: Fields,
}

impl Verdict {
    pub fn review_id(&self) -> Option<&ItemId> {
        self.review_id.as_ref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The submitted `review_id` when it was present but could not be used
    /// as an item id (blank string, float, boolean, ...).
    pub fn unusable_review_id(&self) -> Option<&Value> {
        if self.review_id.is_some() {
            return None;
        }
        match self.fields.get(REVIEW_ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
    }
}

impl TryFrom<Value> for Verdict {
    type Error = ReviewError;

    /// Only a non-object body is rejected. A `review_id` that is not a usable
    /// item id leaves the verdict uncorrelated.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let fields = into_fields(value)?;
        let review_id = fields
            .get(REVIEW_ID_FIELD)
            .and_then(|v| ItemId::from_value(v, REVIEW_ID_FIELD).ok());
        Ok(Self { review_id, fields })
    }
}

// ============================================================================
// CompletedReview
// ============================================================================

/// An append-only record of a rendered verdict.
///
/// Carries every submitted field plus the server-owned `_id` and
/// `submitted_at`, which override anything the client sent under those keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Fields", try_from = "Fields")]
pub struct CompletedReview {
    doc_id: String,
    submitted_at: DateTime<Utc>,
    review_id: Option<ItemId>,
    fields: Fields,
}

impl CompletedReview {
    /// Stamps a verdict with its document id and submission time.
    pub fn record(verdict: Verdict, doc_id: Uuid, submitted_at: DateTime<Utc>) -> Self {
        let Verdict {
            review_id,
            mut fields,
        } = verdict;
        let doc_id = doc_id.to_string();
        fields.insert(DOC_ID_FIELD.to_string(), Value::String(doc_id.clone()));
        fields.insert(
            SUBMITTED_AT_FIELD.to_string(),
            Value::String(format_timestamp(&submitted_at)),
        );
        Self {
            doc_id,
            submitted_at,
            review_id,
            fields,
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn review_id(&self) -> Option<&ItemId> {
        self.review_id.as_ref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Looks up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl TryFrom<Fields> for CompletedReview {
    type Error = ReviewError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        let doc_id = match fields.get(DOC_ID_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(ReviewError::InvalidField {
                    field: DOC_ID_FIELD,
                    reason: "missing document id".to_string(),
                })
            }
        };
        let submitted_at = match fields.get(SUBMITTED_AT_FIELD) {
            Some(Value::String(s)) => parse_timestamp(s)?,
            _ => {
                return Err(ReviewError::InvalidField {
                    field: SUBMITTED_AT_FIELD,
                    reason: "missing submission timestamp".to_string(),
                })
            }
        };
        // Stored documents are trusted; an unusable review_id just means "uncorrelated".
        let review_id = fields
            .get(REVIEW_ID_FIELD)
            .and_then(|v| ItemId::from_value(v, REVIEW_ID_FIELD).ok());

        Ok(Self {
            doc_id,
            submitted_at,
            review_id,
            fields,
        })
    }
}

impl TryFrom<Value> for CompletedReview {
    type Error = ReviewError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::try_from(into_fields(value)?)
    }
}

impl From<CompletedReview> for Fields {
    fn from(review: CompletedReview) -> Self {
        review.fields
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Which view of a completed review a caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Omits [`LARGE_FIELDS`].
    #[default]
    Summary,
    /// The full document.
    Detail,
}
