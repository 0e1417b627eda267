use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One solved question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub question: String,
    pub solution: String,
}

/// Question identifier ("Q1", "Q2", ...) to solution, exactly as generated.
///
/// Entries are relayed verbatim, so a generator that adds extra fields or
/// deviates from `{question, solution}` is passed through; only the outer
/// shape is enforced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SolutionSet(Map<String, Value>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolutionsError {
    #[error("{0}")]
    InvalidJson(String),

    #[error("expected a non-empty JSON object")]
    InvalidShape,
}

impl SolutionSet {
    /// Parse generated text. It must be JSON and must be a non-empty object.
    pub fn parse(text: &str) -> Result<Self, SolutionsError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SolutionsError::InvalidJson(e.to_string()))?;

        match value {
            Value::Object(map) if !map.is_empty() => Ok(Self(map)),
            _ => Err(SolutionsError::InvalidShape),
        }
    }

    /// Number of solved questions; never zero.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Identifiers whose entry is not a `{question, solution}` record.
    pub fn malformed_ids(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, entry)| Solution::deserialize(*entry).is_err())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Solution> {
        self.0
            .get(id)
            .and_then(|entry| Solution::deserialize(entry).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_keyed_solutions() {
        let set = SolutionSet::parse(
            r#"{"Q1": {"question": "What is 2 + 2?", "solution": "4"},
                "Q2": {"question": "Define gravity.", "solution": "Attraction between masses."}}"#,
        )
        .unwrap();

        assert_eq!(set.count(), 2);
        assert!(set.malformed_ids().is_empty());
        assert_eq!(
            set.get("Q1"),
            Some(Solution {
                question: "What is 2 + 2?".to_string(),
                solution: "4".to_string(),
            })
        );
    }

    #[test]
    fn relays_entries_verbatim() {
        let raw = json!({ "Q1": { "question": "q", "solution": "s", "confidence": 0.9 } });
        let set = SolutionSet::parse(&raw.to_string()).unwrap();
        assert_eq!(serde_json::to_value(&set).unwrap(), raw);
    }

    #[test]
    fn rejects_non_json() {
        let err = SolutionSet::parse("not json").unwrap_err();
        assert!(matches!(err, SolutionsError::InvalidJson(_)));
    }

    #[test]
    fn rejects_lists_scalars_and_empty_objects() {
        for text in ["[]", r#"[{"question": "q", "solution": "s"}]"#, "42", "\"Q1\"", "null", "{}"] {
            assert_eq!(
                SolutionSet::parse(text).unwrap_err(),
                SolutionsError::InvalidShape,
                "{text}"
            );
        }
    }

    #[test]
    fn reports_entries_missing_fields() {
        let set = SolutionSet::parse(r#"{"Q1": {"question": "q"}, "Q2": {"question": "q", "solution": "s"}}"#)
            .unwrap();
        assert_eq!(set.malformed_ids(), vec!["Q1"]);
    }
}
