//! Fabrica - test-data factory profiler with call correlation
//!
//! This library ingests instrumentation events emitted while a test suite
//! runs its data factories, aggregates per-factory timing reports, infers
//! which factories invoke which others from call-stack containment, and
//! flags in-memory `build` calls that trigger persistence-hitting `create`
//! calls through associations.

pub mod cli;
pub mod config;
pub mod correlation;
pub mod events;
pub mod factory_call;
pub mod frames;
pub mod json_output;
pub mod report;
pub mod session;
pub mod text_report;
