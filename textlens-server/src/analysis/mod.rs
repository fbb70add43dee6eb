//! Text analysis: records, keyword extraction and the orchestrator.
//!
//! - `keywords`: local, infallible keyword heuristic
//! - `orchestrator`: fan-out of the LLM calls and assembly of the record

pub mod keywords;
pub mod orchestrator;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{ExtractedMetadata, Sentiment};

pub use keywords::extract_keywords;
pub use orchestrator::Analyzer;

/// Structured metadata attached to an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub title: String,
    pub topics: Vec<String>,
    pub sentiment: Sentiment,
    pub keywords: Vec<String>,
}

/// One completed analysis, as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub text: String,
    pub summary: String,
    pub metadata: AnalysisMetadata,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Assemble a new record stamped with the current time
    pub fn new(
        text: impl Into<String>,
        summary: impl Into<String>,
        metadata: ExtractedMetadata,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            summary: summary.into(),
            metadata: AnalysisMetadata {
                title: metadata.title,
                topics: metadata.topics,
                sentiment: metadata.sentiment,
                keywords,
            },
            // Storage keeps microseconds
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AnalysisRecord::new(
            "Some text",
            "Some text",
            ExtractedMetadata {
                title: "Title".to_string(),
                topics: vec!["a".to_string()],
                sentiment: Sentiment::Positive,
            },
            vec!["text".to_string()],
        );

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["metadata"]["sentiment"], "positive");
        assert_eq!(json["metadata"]["keywords"][0], "text");
    }
}
