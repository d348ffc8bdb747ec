//! tasklane-core library.
//!
//! Task, comment, activity, and preference storage behind a request
//! pipeline of identity, rate limiting, ownership, validation, persistence,
//! and audit. Callers go through [`api`]; everything else is plumbing it
//! composes.
//!
//! # Conventions
//!
//! - **Errors**: store functions return `anyhow::Result`; operations return
//!   [`error::ApiResult`].
//! - **Logging**: `tracing` macros with structured fields (`op`, `user`,
//!   `task_id`).

pub mod api;
pub mod audit;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod ratelimit;
pub mod validate;

pub use api::{Backend, Operation, RequestContext};
pub use error::{ApiError, ApiResult, ErrorCode};
