//! Request and response shapes shared by the server and its clients.
//!
//! Form bodies are `application/x-www-form-urlencoded`; every field defaults to
//! an empty string so a missing field is reported by validation instead of
//! being rejected by the extractor. Pages are the JSON view models a template
//! would render.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub mod message {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Level {
        Success,
        Info,
        Error,
    }

    /// One-shot notice shown on the next rendered page.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Message {
        pub level: Level,
        pub text: String,
    }

    impl Message {
        pub fn new(level: Level, text: impl Into<String>) -> Self {
            Self {
                level,
                text: text.into(),
            }
        }

        pub fn success(text: impl Into<String>) -> Self {
            Self::new(Level::Success, text)
        }

        pub fn info(text: impl Into<String>) -> Self {
            Self::new(Level::Info, text)
        }

        pub fn error(text: impl Into<String>) -> Self {
            Self::new(Level::Error, text)
        }
    }
}

pub mod auth {
    use super::*;
    use crate::message::Message;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct SignupForm {
        pub username: String,
        pub password1: String,
        pub password2: String,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LoginForm {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SignupPage {
        pub messages: Vec<Message>,
        /// Submitted username, echoed back after a failed attempt.
        pub username: String,
        pub errors: FieldErrors,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LoginPage {
        pub messages: Vec<Message>,
        pub username: String,
    }
}

pub mod expense {
    use super::*;

    /// Expense form body, also used to prefill the edit form.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ExpenseForm {
        pub date: String,
        pub category: String,
        pub description: String,
        pub amount: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryOption {
        pub slug: String,
        pub label: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i32,
        pub date: chrono::NaiveDate,
        pub category: String,
        pub category_label: String,
        pub description: String,
        /// Amount in cents.
        pub amount_minor: i64,
        /// Amount formatted with two decimals.
        pub amount: String,
    }
}

pub mod summary {
    use super::*;

    /// One bar of the category chart.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ChartEntry {
        pub slug: String,
        pub label: String,
        pub total_minor: i64,
        pub total: String,
        /// Width relative to the largest category, 0 to 100.
        pub percent: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct SummaryView {
        pub total_minor: i64,
        pub today_total_minor: i64,
        pub highest_minor: i64,
        pub total: String,
        pub today_total: String,
        pub highest: String,
        pub chart_data: Vec<ChartEntry>,
        pub max_value_minor: i64,
        pub has_expenses: bool,
    }
}

pub mod tracker {
    use super::*;
    use crate::{
        expense::{CategoryOption, ExpenseForm, ExpenseView},
        message::Message,
        summary::SummaryView,
    };

    /// Dashboard, also rendered when the edit form is open.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardPage {
        pub messages: Vec<Message>,
        pub form: ExpenseForm,
        pub errors: FieldErrors,
        pub is_editing: bool,
        /// The expense being edited.
        pub expense: Option<ExpenseView>,
        pub expenses: Vec<ExpenseView>,
        pub categories: Vec<CategoryOption>,
        #[serde(flatten)]
        pub summary: SummaryView,
    }
}

pub mod report {
    use super::*;
    use crate::{expense::ExpenseView, message::Message, summary::SummaryView};

    /// Query string of `/reports`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ReportQuery {
        pub filter: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub range: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportPage {
        pub messages: Vec<Message>,
        pub expenses: Vec<ExpenseView>,
        pub start_date: String,
        pub end_date: String,
        pub range_type: String,
        pub filter_type: Option<String>,
        pub highest_expense: Option<ExpenseView>,
        #[serde(flatten)]
        pub summary: SummaryView,
    }
}
