//! HTTP middleware for axum.
//!
//! - `auth` - Identity extractors for learners and administrators

pub mod auth;

pub use auth::{AdminIdentity, AuthRejection, LearnerIdentity, ADMIN_HEADER, USER_HEADER};
