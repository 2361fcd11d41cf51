//! Tutorly - Subscription lifecycle core for the Tutorly learning platform.
//!
//! Owns plans, learner subscriptions and their state machine, gateway
//! payment verification, expiry sweeps, admin overrides with an audit
//! trail, and read-only revenue analytics.
//!
//! Layout follows ports and adapters: `domain` holds the rules, `ports`
//! the persistence traits, `application` one handler per operation, and
//! `adapters` the PostgreSQL, in-memory, HTTP and scheduler implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
