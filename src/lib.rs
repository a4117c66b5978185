//! Voice-driven question answering over a small retrieval corpus.
//!
//! A question (spoken or typed) is matched against the corpus; close matches
//! are answered extractively, everything else by a generative model, and the
//! answer is spoken back and remembered in a semantic conversation history.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
