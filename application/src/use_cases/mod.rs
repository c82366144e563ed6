//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod runner;
pub mod session_manager;

#[cfg(test)]
pub(crate) mod test_support;
