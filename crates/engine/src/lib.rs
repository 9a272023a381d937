//! Domain layer of the expense tracker.
//!
//! [`Engine`] owns the database connection and exposes every operation the
//! HTTP server and the admin console perform: expense CRUD, signup, login and
//! sessions. The pure pieces ([`Summary`], [`ReportRequest`], form
//! validation) do not touch the database and can be used on their own.

pub use category::Category;
pub use error::EngineError;
pub use expenses::{Expense, ExpenseDraft, ExpenseInput, parse_form_date};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, ExpenseSearch};
pub use password::{SignupInput, normalize_username, password_policy_errors};
pub use report::{
    DateWindow, REPORT_DATE_FORMAT, RangeKind, ReportRequest, ResolvedRange, month_of, week_of,
    year_of,
};
pub use sessions::Session;
pub use summary::{CategoryTotal, Summary};
pub use users::User;
pub use validation::FieldErrors;

mod category;
mod error;
mod expenses;
mod money;
mod ops;
mod password;
mod report;
mod sessions;
mod summary;
mod users;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
