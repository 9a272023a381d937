//! The closed set of expense categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of an expense.
///
/// The set is fixed; [`Category::ALL`] gives the canonical order used by the
/// per-category breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Food,
        Self::Transport,
        Self::Shopping,
        Self::Bills,
        Self::Entertainment,
        Self::Other,
    ];

    /// Value stored in the database and submitted by forms.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Bills => "bills",
            Self::Entertainment => "entertainment",
            Self::Other => "other",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food & Dining",
            Self::Transport => "Transportation",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills & Utilities",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for Category {
    type Error = String;

    /// Matches an exact slug. The error is the message shown on the form.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|category| category.slug() == value)
            .ok_or_else(|| {
                format!("Select a valid choice. {value} is not one of the available choices.")
            })
    }
}
