//! Session persistence adapters.
//!
//! Provides [`JsonlSessionRepository`], implementing the domain's
//! [`SessionRepository`](murlix_domain::SessionRepository) port.

mod jsonl;

pub use jsonl::JsonlSessionRepository;
