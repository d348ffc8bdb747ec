use std::fmt;

use crate::validate::ValidationError;

/// Machine-readable error codes surfaced to callers alongside every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotAuthenticated,
    NotAuthorized,
    TaskNotFound,
    CommentNotFound,
    InvalidInput,
    RateLimited,
    ConfigParseError,
    StoreUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "E1001",
            Self::NotAuthorized => "E1002",
            Self::TaskNotFound => "E2001",
            Self::CommentNotFound => "E2002",
            Self::InvalidInput => "E3001",
            Self::RateLimited => "E4001",
            Self::ConfigParseError => "E5001",
            Self::StoreUnavailable => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Not authenticated",
            Self::NotAuthorized => "Not authorized",
            Self::TaskNotFound => "Task not found",
            Self::CommentNotFound => "Comment not found",
            Self::InvalidInput => "Invalid input",
            Self::RateLimited => "Rate limit exceeded",
            Self::ConfigParseError => "Config file parse error",
            Self::StoreUnavailable => "Store unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotAuthenticated => Some("Set --user or TASKLANE_USER and retry."),
            Self::NotAuthorized => Some("Only the owner of a record may read or change it."),
            Self::TaskNotFound | Self::CommentNotFound => None,
            Self::InvalidInput => Some("Fix the rejected field and retry."),
            Self::RateLimited => Some("Wait for the indicated delay before retrying."),
            Self::ConfigParseError => Some("Fix syntax in .tasklane/config.toml and retry."),
            Self::StoreUnavailable => Some("Run `tl init` to create the task store."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kinds of record an operation may look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Task,
    Comment,
}

impl Resource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single request.
///
/// None of these are retried inside the pipeline. `RateLimited` carries the
/// delay after which the caller may try again.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("not authorized to access this {0}")]
    Unauthorized(Resource),

    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rate limit exceeded for {action}; retry after {retry_after_ms}ms")]
    RateLimited {
        action: &'static str,
        retry_after_ms: u64,
    },

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthenticated => ErrorCode::NotAuthenticated,
            Self::Unauthorized(_) => ErrorCode::NotAuthorized,
            Self::NotFound {
                resource: Resource::Task,
                ..
            } => ErrorCode::TaskNotFound,
            Self::NotFound {
                resource: Resource::Comment,
                ..
            } => ErrorCode::CommentNotFound,
            Self::Validation(_) => ErrorCode::InvalidInput,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::Store(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Optional remediation hint for operators and users.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Retry delay for rate-limited requests; `None` for every other kind.
    #[must_use]
    pub const fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorCode, Resource};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotAuthenticated,
            ErrorCode::NotAuthorized,
            ErrorCode::TaskNotFound,
            ErrorCode::CommentNotFound,
            ErrorCode::InvalidInput,
            ErrorCode::RateLimited,
            ErrorCode::ConfigParseError,
            ErrorCode::StoreUnavailable,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::RateLimited.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_maps_to_resource_specific_code() {
        let task = ApiError::NotFound {
            resource: Resource::Task,
            id: 7,
        };
        assert_eq!(task.code(), ErrorCode::TaskNotFound);
        assert_eq!(task.to_string(), "task 7 not found");

        let comment = ApiError::NotFound {
            resource: Resource::Comment,
            id: 3,
        };
        assert_eq!(comment.code(), ErrorCode::CommentNotFound);
    }

    #[test]
    fn only_rate_limit_carries_retry_delay() {
        let limited = ApiError::RateLimited {
            action: "createTask",
            retry_after_ms: 1_500,
        };
        assert_eq!(limited.retry_after_ms(), Some(1_500));
        assert_eq!(ApiError::Unauthenticated.retry_after_ms(), None);
    }
}
