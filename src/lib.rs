#![deny(missing_docs)]

//! Core library for the Summarist PDF summarization server.

/// HTTP routing and REST handlers.
pub mod api;
/// Completion-service client abstraction and OpenAI adapter.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// Document text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Service counters.
pub mod metrics;
/// Upload and summarization pipeline.
pub mod processing;
/// Content-addressed document store and summary cache.
pub mod storage;
