use serde::{Deserialize, Serialize};

/// Actions recognised directly from the wording of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookAppointment,
}

impl Intent {
    /// Keyword match over the lowercased query.
    pub fn detect(query: &str) -> Option<Self> {
        let query = query.to_lowercase();
        if query.contains("appointment") {
            return Some(Self::BookAppointment);
        }
        None
    }

    pub fn execute(&self) -> &'static str {
        match self {
            Self::BookAppointment => "Your appointment has been successfully booked.",
        }
    }
}
