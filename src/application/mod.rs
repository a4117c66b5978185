//! Application layer - Use cases and orchestration.
//!
//! Services here sequence the domain ports into the question-answering
//! pipeline. They depend on domain ports (traits) rather than concrete
//! implementations, so every stage can be swapped or faked.

pub mod services;

pub use services::*;
