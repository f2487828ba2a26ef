//! Crate-level tests for the query flow.

mod rag_answer;
mod support;
