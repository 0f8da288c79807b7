//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate session and repository calls into use-case level APIs.
//! - Keep the binary decoupled from storage details.

pub mod startup;
