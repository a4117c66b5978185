use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Best-matching document text and how far it sits from the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub distance: f32,
}

/// Outcome of a lookup that may legitimately come back empty.
///
/// `NotFound` means the stage ran and had nothing to offer; `Failed` means
/// the stage could not run. Callers decide what either means for the user.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(DomainError),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::Failed(err) => Lookup::Failed(err),
        }
    }
}

impl Lookup<String> {
    /// Blank text counts as nothing found.
    pub fn non_empty(self) -> Self {
        match self {
            Self::Found(text) if text.trim().is_empty() => Self::NotFound,
            other => other,
        }
    }
}
