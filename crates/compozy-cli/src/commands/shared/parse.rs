use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an optional enum flag.
pub fn parse_opt_enum<T>(raw: Option<&str>, field: &str) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned,
{
    raw.map(|value| parse_enum(value, field)).transpose()
}

/// Parse a JSON argument.
pub fn parse_json(raw: &str, field: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|error| anyhow::anyhow!("invalid JSON for {field}: {error}"))
}

#[cfg(test)]
mod tests {
    use compozy_core::enums::{ProblemStatus, TaskStatus};
    use pretty_assertions::assert_eq;

    use super::{parse_enum, parse_json, parse_opt_enum};

    #[test]
    fn parses_snake_case_enum() {
        let status: ProblemStatus = parse_enum("prd_review", "status").expect("status should parse");
        assert_eq!(status, ProblemStatus::PrdReview);
    }

    #[test]
    fn parses_hyphenated_alias() {
        let status: TaskStatus = parse_enum("In-Progress", "status").expect("status should parse");
        assert_eq!(status, TaskStatus::InProgress);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<ProblemStatus>("archived", "status").expect_err("should fail");
        assert!(err.to_string().contains("invalid status 'archived'"));
    }

    #[test]
    fn optional_passthrough() {
        assert_eq!(parse_opt_enum::<TaskStatus>(None, "status").unwrap(), None);
        assert!(parse_json("{\"a\":1}", "output").is_ok());
        assert!(parse_json("{a:1}", "output").is_err());
    }
}
