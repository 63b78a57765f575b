//! Portfolio Advisor
//!
//! A conversational investment planner that:
//! - Collects capital, monthly contribution, risk tier and preferences over
//!   several chat turns (slot filling)
//! - Builds a deterministic, preference-adjusted allocation plan
//! - Recommends a bounded sample of instruments per asset class
//! - Verifies plan invariants before presenting the result
//!
//! TURN LOOP:
//! CLASSIFY → MERGE → INTAKE → ALLOCATE → VERIFY → PRESENT

pub mod advisor;
pub mod allocation;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod models;
pub mod nlu;
pub mod presentation;
pub mod session;
pub mod verification;

pub use error::Result;

// Re-export common types
pub use advisor::{Advisor, ChatReply};
pub use allocation::AllocationEngine;
pub use models::*;
