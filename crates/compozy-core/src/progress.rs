//! Pure classification queries over problem status.
//!
//! Nothing here touches storage or emits events.

use crate::enums::ProblemStatus;

/// Workflow completion percentage for a status.
#[must_use]
pub const fn progress_percentage(status: ProblemStatus) -> u8 {
    match status {
        ProblemStatus::Draft | ProblemStatus::Failed | ProblemStatus::Cancelled => 0,
        ProblemStatus::Analyzing => 10,
        ProblemStatus::PrdGeneration => 20,
        ProblemStatus::PrdReview => 30,
        ProblemStatus::SpecGeneration => 40,
        ProblemStatus::SpecReview => 50,
        ProblemStatus::TaskCreation => 60,
        ProblemStatus::TaskSelection => 70,
        ProblemStatus::Executing => 80,
        ProblemStatus::Testing => 90,
        ProblemStatus::Completed => 100,
    }
}

/// Progress for a raw stored status string. Unknown strings yield 0.
#[must_use]
pub fn progress_for(raw: &str) -> u8 {
    serde_json::from_value::<ProblemStatus>(serde_json::Value::String(raw.to_string()))
        .map_or(0, progress_percentage)
}

#[must_use]
pub const fn is_terminal(status: ProblemStatus) -> bool {
    matches!(
        status,
        ProblemStatus::Completed | ProblemStatus::Failed | ProblemStatus::Cancelled
    )
}

#[must_use]
pub const fn is_active(status: ProblemStatus) -> bool {
    !is_terminal(status)
}

/// Waiting on a human decision.
#[must_use]
pub const fn is_awaiting_review(status: ProblemStatus) -> bool {
    matches!(
        status,
        ProblemStatus::PrdReview | ProblemStatus::SpecReview | ProblemStatus::TaskSelection
    )
}

/// An agent is working on the problem.
#[must_use]
pub const fn is_in_progress(status: ProblemStatus) -> bool {
    matches!(
        status,
        ProblemStatus::Analyzing
            | ProblemStatus::PrdGeneration
            | ProblemStatus::SpecGeneration
            | ProblemStatus::TaskCreation
            | ProblemStatus::Executing
            | ProblemStatus::Testing
    )
}

/// Human-facing notice for statuses that need someone's attention.
#[must_use]
pub const fn review_notice(status: ProblemStatus) -> Option<&'static str> {
    match status {
        ProblemStatus::PrdReview => Some("PRD ready for review"),
        ProblemStatus::SpecReview => Some("Technical specification ready for review"),
        ProblemStatus::TaskSelection => Some("Tasks ready for selection"),
        ProblemStatus::Completed => Some("Problem completed"),
        ProblemStatus::Failed => Some("Problem failed"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProblemStatus::Draft, 0)]
    #[case(ProblemStatus::Analyzing, 10)]
    #[case(ProblemStatus::PrdGeneration, 20)]
    #[case(ProblemStatus::PrdReview, 30)]
    #[case(ProblemStatus::SpecGeneration, 40)]
    #[case(ProblemStatus::SpecReview, 50)]
    #[case(ProblemStatus::TaskCreation, 60)]
    #[case(ProblemStatus::TaskSelection, 70)]
    #[case(ProblemStatus::Executing, 80)]
    #[case(ProblemStatus::Testing, 90)]
    #[case(ProblemStatus::Completed, 100)]
    #[case(ProblemStatus::Failed, 0)]
    #[case(ProblemStatus::Cancelled, 0)]
    fn progress_table(#[case] status: ProblemStatus, #[case] expected: u8) {
        assert_eq!(progress_percentage(status), expected);
        assert_eq!(progress_for(status.as_str()), expected);
    }

    #[test]
    fn unknown_raw_status_is_zero() {
        assert_eq!(progress_for("archived"), 0);
        assert_eq!(progress_for(""), 0);
    }

    #[test]
    fn classification_partitions() {
        for status in ProblemStatus::ALL {
            assert_ne!(is_active(status), is_terminal(status));
            if is_awaiting_review(status) || is_in_progress(status) {
                assert!(is_active(status), "{status}");
            }
            assert!(!(is_awaiting_review(status) && is_in_progress(status)));
        }
        assert!(!is_in_progress(ProblemStatus::Draft));
        assert!(!is_awaiting_review(ProblemStatus::Draft));
    }

    #[test]
    fn review_notices() {
        assert!(review_notice(ProblemStatus::SpecReview).is_some());
        assert!(review_notice(ProblemStatus::Failed).is_some());
        assert!(review_notice(ProblemStatus::Executing).is_none());
    }
}
