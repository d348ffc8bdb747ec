//! Input rules applied to user-supplied fields before they reach the store.
//!
//! The `is_valid_*` predicates are pure checks over already-trimmed input.
//! The `check_*` helpers trim, apply the predicate, and hand back the value
//! to persist. Lengths are counted in Unicode scalar values, not bytes.

use crate::clock::ONE_DAY_MS;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_COMMENT_LEN: usize = 1000;

/// How far in the past a due date may lie and still be accepted.
pub const DUE_DATE_TOLERANCE_MS: i64 = ONE_DAY_MS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Task title must be between 1 and 200 characters")]
    Title { len: usize },

    #[error("Task description must be at most 2000 characters")]
    Description { len: usize },

    #[error("Comment must be between 1 and 1000 characters")]
    Comment { len: usize },

    #[error("Due date must not be more than 24 hours in the past")]
    DueDate { due_ms: i64, now_ms: i64 },
}

impl ValidationError {
    /// Name of the rejected field, as callers spell it.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::Description { .. } => "description",
            Self::Comment { .. } => "content",
            Self::DueDate { .. } => "dueDate",
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[must_use]
pub fn is_valid_task_title(title: &str) -> bool {
    (1..=MAX_TITLE_LEN).contains(&char_len(title))
}

#[must_use]
pub fn is_valid_task_description(description: Option<&str>) -> bool {
    description.is_none_or(|d| char_len(d) <= MAX_DESCRIPTION_LEN)
}

#[must_use]
pub fn is_valid_comment_content(content: &str) -> bool {
    (1..=MAX_COMMENT_LEN).contains(&char_len(content))
}

#[must_use]
pub const fn is_valid_due_date(due_ms: Option<i64>, now_ms: i64) -> bool {
    match due_ms {
        None => true,
        Some(due) => due >= now_ms - DUE_DATE_TOLERANCE_MS,
    }
}

/// Trim and validate a title.
///
/// # Errors
///
/// Returns [`ValidationError::Title`] if the trimmed title is empty or too long.
pub fn check_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if is_valid_task_title(title) {
        Ok(title.to_string())
    } else {
        Err(ValidationError::Title {
            len: char_len(title),
        })
    }
}

/// Trim and validate an optional description.
///
/// A description that is empty after trimming is stored as absent.
///
/// # Errors
///
/// Returns [`ValidationError::Description`] if the trimmed text is too long.
pub fn check_description(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(text) = raw.map(str::trim) else {
        return Ok(None);
    };
    if !is_valid_task_description(Some(text)) {
        return Err(ValidationError::Description {
            len: char_len(text),
        });
    }
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Trim and validate comment text.
///
/// # Errors
///
/// Returns [`ValidationError::Comment`] if the trimmed content is empty or
/// too long.
pub fn check_comment(raw: &str) -> Result<String, ValidationError> {
    let content = raw.trim();
    if is_valid_comment_content(content) {
        Ok(content.to_string())
    } else {
        Err(ValidationError::Comment {
            len: char_len(content),
        })
    }
}

/// # Errors
///
/// Returns [`ValidationError::DueDate`] if `due_ms` is more than a day
/// before `now_ms`.
pub const fn check_due_date(
    due_ms: Option<i64>,
    now_ms: i64,
) -> Result<Option<i64>, ValidationError> {
    match due_ms {
        Some(due) if !is_valid_due_date(due_ms, now_ms) => Err(ValidationError::DueDate {
            due_ms: due,
            now_ms,
        }),
        _ => Ok(due_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ONE_HOUR_MS;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn title_boundaries() {
        assert!(check_title(&"a".repeat(200)).is_ok());
        assert_eq!(
            check_title(&"a".repeat(201)),
            Err(ValidationError::Title { len: 201 })
        );
        assert_eq!(check_title(""), Err(ValidationError::Title { len: 0 }));
        assert_eq!(check_title("   \t"), Err(ValidationError::Title { len: 0 }));
    }

    #[test]
    fn title_is_trimmed_before_counting() {
        let padded = format!("  {}  ", "b".repeat(200));
        assert_eq!(check_title(&padded), Ok("b".repeat(200)));
        assert_eq!(check_title("  Buy milk "), Ok("Buy milk".to_string()));
    }

    #[test]
    fn multibyte_characters_count_once() {
        let title = "é".repeat(200);
        assert!(title.len() > 200);
        assert!(is_valid_task_title(&title));
    }

    #[test]
    fn description_rules() {
        assert_eq!(check_description(None), Ok(None));
        assert_eq!(check_description(Some("   ")), Ok(None));
        assert_eq!(check_description(Some(" notes ")), Ok(Some("notes".to_string())));
        assert!(check_description(Some(&"d".repeat(2000))).is_ok());
        assert_eq!(
            check_description(Some(&"d".repeat(2001))),
            Err(ValidationError::Description { len: 2001 })
        );
    }

    #[test]
    fn comment_rules() {
        assert_eq!(check_comment(" hi "), Ok("hi".to_string()));
        assert_eq!(check_comment(""), Err(ValidationError::Comment { len: 0 }));
        assert!(check_comment(&"c".repeat(1000)).is_ok());
        assert!(check_comment(&"c".repeat(1001)).is_err());
    }

    #[test]
    fn due_date_tolerates_one_day_in_the_past() {
        assert_eq!(check_due_date(None, NOW), Ok(None));
        let recent = NOW - 23 * ONE_HOUR_MS;
        assert_eq!(check_due_date(Some(recent), NOW), Ok(Some(recent)));
        assert_eq!(
            check_due_date(Some(NOW - DUE_DATE_TOLERANCE_MS), NOW),
            Ok(Some(NOW - DUE_DATE_TOLERANCE_MS))
        );

        let stale = NOW - 25 * ONE_HOUR_MS;
        assert_eq!(
            check_due_date(Some(stale), NOW),
            Err(ValidationError::DueDate {
                due_ms: stale,
                now_ms: NOW
            })
        );
    }

    #[test]
    fn errors_name_their_field() {
        assert_eq!(ValidationError::Title { len: 0 }.field(), "title");
        assert_eq!(ValidationError::Comment { len: 0 }.field(), "content");
        assert_eq!(
            ValidationError::Title { len: 0 }.to_string(),
            "Task title must be between 1 and 200 characters"
        );
    }

    proptest! {
        #[test]
        fn title_validity_matches_char_count(title in "\\PC{0,260}") {
            let trimmed = title.trim();
            let n = trimmed.chars().count();
            prop_assert_eq!(check_title(&title).is_ok(), (1..=200).contains(&n));
        }

        #[test]
        fn future_due_dates_always_pass(offset in 0_i64..10 * ONE_DAY_MS) {
            prop_assert!(is_valid_due_date(Some(NOW + offset), NOW));
        }

        #[test]
        fn due_dates_older_than_a_day_always_fail(offset in 1_i64..10 * ONE_DAY_MS) {
            prop_assert!(!is_valid_due_date(Some(NOW - DUE_DATE_TOLERANCE_MS - offset), NOW));
        }
    }
}
