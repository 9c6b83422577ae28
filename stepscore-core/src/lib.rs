// stepscore-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Table source and sink contracts.
pub mod ports;

// 2. Domain (Scoring rules)
// Scale registry, Likert normalization, demographic parsing, reverse coding, aggregation.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// CSV / spreadsheet readers, CSV writer, YAML configuration, atomic writes.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration of the scoring pipeline and the end-to-end run.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::ScoringError;
