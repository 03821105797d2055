//! Integration tests for task orchestration
//!
//! Every test drives a real `Orchestrator` over scripted collaborators: a
//! fake page-load capability, a fake link extractor and an in-memory store.

mod crawl_tests;
mod lifecycle_tests;
mod pipeline_tests;
mod support;
