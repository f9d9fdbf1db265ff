//! Aggregates and exports over completed reviews.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::operations::numeric_field;
use super::types::{CompletedReview, SUBMITTED_AT_FIELD};

/// Default minimum rating for a review to be exported as training data.
pub const DEFAULT_MIN_TRAINING_RATING: f64 = 4.0;

/// Rating summary for one `feature` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
}

/// Summary statistics across completed reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: u64,
    /// Reviews whose `acceptable` field is truthy.
    pub acceptable: u64,
    pub not_acceptable: u64,
    /// `acceptable / total_reviews` as a percentage; 0 for an empty log.
    pub acceptance_rate: f64,
    /// Distinct `reviewer` values.
    pub reviewers: u64,
    /// Distinct `organization_name` values.
    pub organizations: u64,
    /// Distinct `feature` values.
    pub features: u64,
    pub rated_reviews: u64,
    pub avg_rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub by_feature: BTreeMap<String, FeatureStats>,
}

#[derive(Default)]
struct RatingAccumulator {
    count: u64,
    sum: f64,
}

impl RatingAccumulator {
    fn push(&mut self, rating: f64) {
        self.count += 1;
        self.sum += rating;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// JSON truthiness: `false`, `null`, zero, and empty strings, arrays and
/// objects are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn distinct_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Computes [`ReviewStats`]. Reviews without a numeric `rating` count towards
/// the totals but not the rating aggregates.
pub fn compute_stats(reviews: &[CompletedReview]) -> ReviewStats {
    let mut acceptable = 0u64;
    let mut reviewers = BTreeSet::new();
    let mut organizations = BTreeSet::new();
    let mut distinct_features = BTreeSet::new();
    for review in reviews {
        if review.get("acceptable").is_some_and(is_truthy) {
            acceptable += 1;
        }
        for (key, seen) in [
            ("reviewer", &mut reviewers),
            ("organization_name", &mut organizations),
            ("feature", &mut distinct_features),
        ] {
            if let Some(value) = review.get(key).filter(|v| is_truthy(v)) {
                seen.insert(distinct_key(value));
            }
        }
    }
    let total_reviews = reviews.len() as u64;
    let acceptance_rate = if total_reviews == 0 {
        0.0
    } else {
        acceptable as f64 / total_reviews as f64 * 100.0
    };

    let mut overall = RatingAccumulator::default();
    let mut min_rating: Option<f64> = None;
    let mut max_rating: Option<f64> = None;
    let mut features: BTreeMap<String, (u64, RatingAccumulator)> = BTreeMap::new();

    for review in reviews {
        let rating = numeric_field(review.fields(), "rating");
        if let Some(rating) = rating {
            overall.push(rating);
            min_rating = Some(min_rating.map_or(rating, |m| m.min(rating)));
            max_rating = Some(max_rating.map_or(rating, |m| m.max(rating)));
        }

        if let Some(feature) = review.get("feature").and_then(Value::as_str) {
            let (count, acc) = features.entry(feature.to_string()).or_default();
            *count += 1;
            if let Some(rating) = rating {
                acc.push(rating);
            }
        }
    }

    ReviewStats {
        total_reviews,
        acceptable,
        not_acceptable: total_reviews - acceptable,
        acceptance_rate,
        reviewers: reviewers.len() as u64,
        organizations: organizations.len() as u64,
        features: distinct_features.len() as u64,
        rated_reviews: overall.count,
        avg_rating: overall.mean(),
        min_rating,
        max_rating,
        by_feature: features
            .into_iter()
            .map(|(feature, (count, acc))| {
                (
                    feature,
                    FeatureStats {
                        count,
                        avg_rating: acc.mean(),
                    },
                )
            })
            .collect(),
    }
}

/// Metadata carried alongside a training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub feature: Value,
    pub reviewer: Value,
    pub timestamp: Value,
}

/// One line of the fine-tuning export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub prompt: Value,
    pub context: Value,
    pub response: Value,
    pub rating: Value,
    pub metadata: TrainingMetadata,
}

fn field_or_null(review: &CompletedReview, key: &str) -> Value {
    review.get(key).cloned().unwrap_or(Value::Null)
}

/// Selects reviews rated at least `min_rating` and shapes them for export.
pub fn training_examples(reviews: &[CompletedReview], min_rating: f64) -> Vec<TrainingExample> {
    reviews
        .iter()
        .filter(|review| numeric_field(review.fields(), "rating").is_some_and(|r| r >= min_rating))
        .map(|review| TrainingExample {
            prompt: field_or_null(review, "prompt"),
            context: field_or_null(review, "context"),
            response: field_or_null(review, "response"),
            rating: field_or_null(review, "rating"),
            metadata: TrainingMetadata {
                feature: field_or_null(review, "feature"),
                reviewer: field_or_null(review, "reviewer"),
                timestamp: review
                    .get("timestamp")
                    .or_else(|| review.get(SUBMITTED_AT_FIELD))
                    .cloned()
                    .unwrap_or(Value::Null),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(doc_id: &str, extra: Value) -> CompletedReview {
        let mut fields = extra.as_object().cloned().unwrap_or_default();
        fields.insert("_id".to_string(), json!(doc_id));
        fields.insert(
            "submitted_at".to_string(),
            json!("2024-05-01T12:00:00.000000Z"),
        );
        CompletedReview::try_from(fields).unwrap()
    }

    #[test]
    fn test_stats_empty() {
        let stats = compute_stats(&[]);

        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.acceptance_rate, 0.0);
        assert_eq!(stats.avg_rating, None);
        assert!(stats.by_feature.is_empty());
    }

    #[test]
    fn test_stats_counts_verdicts_and_distinct_values() {
        let reviews = vec![
            completed(
                "a",
                json!({"acceptable": true, "reviewer": "ana", "organization_name": "Springfield", "feature": "summary"}),
            ),
            completed(
                "b",
                json!({"acceptable": false, "reviewer": "ana", "organization_name": "Shelbyville"}),
            ),
            completed("c", json!({"acceptable": true, "reviewer": "bo", "feature": "summary"})),
            completed("d", json!({"reviewer": "", "feature": "search"})),
        ];

        let stats = compute_stats(&reviews);

        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.acceptable, 2);
        assert_eq!(stats.not_acceptable, 2);
        assert_eq!(stats.acceptance_rate, 50.0);
        assert_eq!(stats.reviewers, 2);
        assert_eq!(stats.organizations, 2);
        assert_eq!(stats.features, 2);
    }

    #[test]
    fn test_stats_aggregates_ratings_and_features() {
        let reviews = vec![
            completed("a", json!({"rating": 5, "feature": "summary"})),
            completed("b", json!({"rating": 3, "feature": "summary"})),
            completed("c", json!({"rating": "2", "feature": "search"})),
            completed("d", json!({"feature": "search"})),
        ];

        let stats = compute_stats(&reviews);

        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.rated_reviews, 3);
        assert_eq!(stats.avg_rating, Some(10.0 / 3.0));
        assert_eq!(stats.min_rating, Some(2.0));
        assert_eq!(stats.max_rating, Some(5.0));
        assert_eq!(stats.by_feature["summary"].count, 2);
        assert_eq!(stats.by_feature["summary"].avg_rating, Some(4.0));
        assert_eq!(stats.by_feature["search"].count, 2);
        assert_eq!(stats.by_feature["search"].avg_rating, Some(2.0));
    }

    #[test]
    fn test_training_examples_filter_by_rating() {
        let reviews = vec![
            completed(
                "a",
                json!({"rating": 5, "prompt": "p", "response": "r", "reviewer": "ana"}),
            ),
            completed("b", json!({"rating": 3, "prompt": "low"})),
            completed("c", json!({"prompt": "unrated"})),
        ];

        let examples = training_examples(&reviews, DEFAULT_MIN_TRAINING_RATING);

        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].prompt, json!("p"));
        assert_eq!(examples[0].context, Value::Null);
        assert_eq!(examples[0].metadata.reviewer, json!("ana"));
    }

    #[test]
    fn test_training_timestamp_falls_back_to_submission_time() {
        let reviews = vec![
            completed("a", json!({"rating": 4})),
            completed("b", json!({"rating": 4, "timestamp": "2024-04-01T00:00:00"})),
        ];

        let examples = training_examples(&reviews, 4.0);

        assert_eq!(
            examples[0].metadata.timestamp,
            json!("2024-05-01T12:00:00.000000Z")
        );
        assert_eq!(examples[1].metadata.timestamp, json!("2024-04-01T00:00:00"));
    }
}
