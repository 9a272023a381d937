//! Mapping from engine values to the JSON view models in `api_types`.

use api_types::{
    FieldErrors as FieldErrorMap,
    expense::{CategoryOption, ExpenseForm, ExpenseView},
    summary::{ChartEntry, SummaryView},
};
use engine::{Category, Expense, ExpenseInput, FieldErrors, Summary};

pub(crate) fn expense(expense: &Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        date: expense.date,
        category: expense.category.slug().to_string(),
        category_label: expense.category.label().to_string(),
        description: expense.description.clone(),
        amount_minor: expense.amount.cents(),
        amount: expense.amount.to_string(),
    }
}

/// Prefills the edit form with the stored values.
pub(crate) fn expense_form(expense: &Expense) -> ExpenseForm {
    ExpenseForm {
        date: expense.date.format("%Y-%m-%d").to_string(),
        category: expense.category.slug().to_string(),
        description: expense.description.clone(),
        amount: expense.amount.to_string(),
    }
}

pub(crate) fn expense_input(form: &ExpenseForm) -> ExpenseInput<'_> {
    ExpenseInput {
        date: &form.date,
        category: &form.category,
        description: &form.description,
        amount: &form.amount,
    }
}

pub(crate) fn categories() -> Vec<CategoryOption> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryOption {
            slug: category.slug().to_string(),
            label: category.label().to_string(),
        })
        .collect()
}

pub(crate) fn summary(summary: &Summary) -> SummaryView {
    let chart_data = summary
        .categories
        .iter()
        .map(|row| ChartEntry {
            slug: row.category.slug().to_string(),
            label: row.category.label().to_string(),
            total_minor: row.total.cents(),
            total: row.total.to_string(),
            percent: summary.share_percent(row),
        })
        .collect();

    SummaryView {
        total_minor: summary.total.cents(),
        today_total_minor: summary.today_total.cents(),
        highest_minor: summary.highest.cents(),
        total: summary.total.to_string(),
        today_total: summary.today_total.to_string(),
        highest: summary.highest.to_string(),
        chart_data,
        max_value_minor: summary.max_category_total.cents(),
        has_expenses: summary.has_expenses,
    }
}

pub(crate) fn field_errors(errors: &FieldErrors) -> FieldErrorMap {
    let mut map = FieldErrorMap::new();
    for (field, message) in errors.iter() {
        map.entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }
    map
}
