//! Expense records and the form that creates or edits them.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Category, EngineError, FieldErrors, Money, ResultEngine, validation::required};

/// Longest accepted description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 255;

/// Date layouts accepted by the expense form, tried in order.
///
/// `%y` comes before `%Y`: chrono's `%Y` also takes a two digit year and would
/// read `03/05/24` as year 24, while a four digit year leaves trailing input
/// under `%y` and falls through.
const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i32,
    pub user_id: String,
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub amount: Money,
}

/// Raw expense form as submitted by the client.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpenseInput<'a> {
    pub date: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub amount: &'a str,
}

/// A validated expense form, ready to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub amount: Money,
}

impl ExpenseInput<'_> {
    /// Checks every field and returns either a draft or all field errors.
    pub fn validate(&self) -> Result<ExpenseDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let date = required(&mut errors, "date", self.date).and_then(|raw| {
            let parsed = parse_form_date(raw);
            if parsed.is_none() {
                errors.add("date", "Enter a valid date.");
            }
            parsed
        });

        let category = required(&mut errors, "category", self.category).and_then(|raw| {
            Category::try_from(raw)
                .map_err(|message| errors.add("category", message))
                .ok()
        });

        let description = required(&mut errors, "description", self.description).and_then(|raw| {
            let chars = raw.chars().count();
            if chars > DESCRIPTION_MAX_CHARS {
                errors.add(
                    "description",
                    format!(
                        "Ensure this value has at most {DESCRIPTION_MAX_CHARS} characters (it has {chars})."
                    ),
                );
                return None;
            }
            Some(raw.to_string())
        });

        let amount = required(&mut errors, "amount", self.amount).and_then(|raw| {
            match raw.parse::<Money>() {
                Ok(amount) => Some(amount),
                Err(EngineError::InvalidAmount(message)) => {
                    errors.add("amount", message);
                    None
                }
                Err(other) => {
                    errors.add("amount", other.to_string());
                    None
                }
            }
        });

        match (date, category, description, amount) {
            (Some(date), Some(category), Some(description), Some(amount)) => Ok(ExpenseDraft {
                date,
                category,
                description,
                amount,
            }),
            _ => Err(errors),
        }
    }
}

/// Parses a date the way the expense form accepts it.
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub date: Date,
    pub category: String,
    pub description: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Overwrites the editable columns with a validated draft.
    pub(crate) fn apply_draft(&mut self, draft: &ExpenseDraft) {
        self.date = ActiveValue::Set(draft.date);
        self.category = ActiveValue::Set(draft.category.slug().to_string());
        self.description = ActiveValue::Set(draft.description.clone());
        self.amount_minor = ActiveValue::Set(draft.amount.cents());
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let category = Category::try_from(model.category.as_str())
            .map_err(|_| EngineError::KeyNotFound(format!("category {}", model.category)))?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            date: model.date,
            category,
            description: model.description,
            amount: Money::new(model.amount_minor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::REQUIRED;

    fn input<'a>(date: &'a str, category: &'a str, description: &'a str, amount: &'a str) -> ExpenseInput<'a> {
        ExpenseInput {
            date,
            category,
            description,
            amount,
        }
    }

    #[test]
    fn valid_form_produces_draft() {
        let draft = input("2024-03-05", "food", "  Lunch ", "12.50").validate().unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(draft.category, Category::Food);
        assert_eq!(draft.description, "Lunch");
        assert_eq!(draft.amount, Money::new(1250));
    }

    #[test]
    fn accepts_us_style_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_form_date("03/05/2024"), expected);
        assert_eq!(parse_form_date("03/05/24"), expected);
        assert_eq!(parse_form_date("2024-13-01"), None);
        assert_eq!(parse_form_date("12/31/1999"), NaiveDate::from_ymd_opt(1999, 12, 31));
        assert_eq!(parse_form_date("12/31/99"), NaiveDate::from_ymd_opt(1999, 12, 31));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let errors = input("2024-03-05", "food", "Lunch", "twelve")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("amount"), ["Enter a number.".to_string()]);
        assert!(!errors.contains("date"));
    }

    #[test]
    fn every_field_is_checked() {
        let errors = input("yesterday", "groceries", "", "1.234")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("date"), ["Enter a valid date.".to_string()]);
        assert_eq!(
            errors.get("category"),
            ["Select a valid choice. groceries is not one of the available choices.".to_string()]
        );
        assert_eq!(errors.get("description"), [REQUIRED.to_string()]);
        assert_eq!(
            errors.get("amount"),
            ["Ensure that there are no more than 2 decimal places.".to_string()]
        );
    }

    #[test]
    fn long_description_reports_length() {
        let long = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        let errors = input("2024-03-05", "other", &long, "1").validate().unwrap_err();
        assert_eq!(
            errors.get("description"),
            ["Ensure this value has at most 255 characters (it has 256).".to_string()]
        );
    }
}
