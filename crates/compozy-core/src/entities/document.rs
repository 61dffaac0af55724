use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DocumentKind;

/// A versioned PRD or technical specification attached to a problem.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub problem_id: String,
    pub kind: DocumentKind,
    pub version: i64,
    pub content: String,
    pub summary: String,
    pub word_count: i64,
    pub created_by: Option<String>,
    pub is_approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub change_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whitespace-delimited word count. Tokens without a letter or digit,
    /// such as markdown `#` and `-` markers, are not words.
    #[must_use]
    pub fn count_words(content: &str) -> i64 {
        let words = content
            .split_whitespace()
            .filter(|token| token.chars().any(char::is_alphanumeric))
            .count();
        i64::try_from(words).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(Document::count_words("fast   login\t\n flow"), 3);
        assert_eq!(Document::count_words(""), 0);
    }

    #[test]
    fn word_count_skips_markdown_markers() {
        assert_eq!(Document::count_words("  # Goals\n\n- fast   login\t"), 3);
        assert_eq!(Document::count_words("p99 < 2s"), 2);
        assert_eq!(Document::count_words("## --- *"), 0);
    }
}
