//! Aggregate totals over a set of expenses.
//!
//! The caller decides which expenses are in scope (all of a user's records for
//! the dashboard, a date window for reports); this module only folds them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Category, Expense, Money};

/// Total spent in one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of every amount.
    pub total: Money,
    /// Sum of the amounts dated `today`.
    pub today_total: Money,
    /// Largest single amount.
    pub highest: Money,
    /// One row per category, in [`Category::ALL`] order.
    pub categories: Vec<CategoryTotal>,
    /// Largest category total, never below zero. Used to scale charts.
    pub max_category_total: Money,
    /// `true` when at least one category total is nonzero.
    pub has_expenses: bool,
}

impl Summary {
    /// Folds `expenses` into a summary. Empty input yields all zeros.
    pub fn compute<'a, I>(expenses: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut total = Money::ZERO;
        let mut today_total = Money::ZERO;
        let mut highest: Option<Money> = None;
        let mut by_category = Category::ALL.map(|category| CategoryTotal {
            category,
            total: Money::ZERO,
        });

        for expense in expenses {
            total += expense.amount;
            if expense.date == today {
                today_total += expense.amount;
            }
            highest = Some(highest.map_or(expense.amount, |h| h.max(expense.amount)));
            if let Some(row) = by_category
                .iter_mut()
                .find(|row| row.category == expense.category)
            {
                row.total += expense.amount;
            }
        }

        let max_category_total = by_category
            .iter()
            .map(|row| row.total)
            .fold(Money::ZERO, Money::max);
        let has_expenses = by_category.iter().any(|row| !row.total.is_zero());

        Self {
            total,
            today_total,
            highest: highest.unwrap_or(Money::ZERO),
            categories: by_category.to_vec(),
            max_category_total,
            has_expenses,
        }
    }

    /// Chart width of `row` relative to the largest category, in percent.
    pub fn share_percent(&self, row: &CategoryTotal) -> f64 {
        row.total.percent_of(self.max_category_total)
    }
}
