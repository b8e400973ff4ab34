#![deny(missing_docs)]

//! Core library for the SummarizePro summarization service.

/// HTTP routing and REST handlers.
pub mod api;
/// Line-based chunking under a character budget.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Plain-text extraction for PDF, DOCX and TXT uploads.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Request and chunk counters.
pub mod metrics;
/// Summarization pipeline shared by both endpoints.
pub mod service;
/// Summarization model adapters.
pub mod summarization;
