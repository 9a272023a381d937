use api_types::{
    expense::ExpenseForm,
    message::Message,
    tracker::DashboardPage,
};
use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use engine::{EngineError, Expense, FieldErrors, Summary, User};

use crate::{
    ServerError, flash,
    server::{HOME_PATH, ServerState},
    views,
};

/// Builds the dashboard over every expense of `user`.
async fn dashboard_page(
    state: &ServerState,
    user: &User,
    messages: Vec<Message>,
    form: ExpenseForm,
    errors: &FieldErrors,
    editing: Option<&Expense>,
) -> Result<DashboardPage, ServerError> {
    let expenses = state.engine.list_expenses(&user.username, None).await?;
    let summary = Summary::compute(&expenses, state.options.today());

    Ok(DashboardPage {
        messages,
        form,
        errors: views::field_errors(errors),
        is_editing: editing.is_some(),
        expense: editing.map(views::expense),
        expenses: expenses.iter().map(views::expense).collect(),
        categories: views::categories(),
        summary: views::summary(&summary),
    })
}

pub async fn dashboard(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    let (jar, messages) = flash::take(jar);
    let page = dashboard_page(
        &state,
        &user,
        messages,
        ExpenseForm::default(),
        &FieldErrors::new(),
        None,
    )
    .await?;
    Ok((jar, Json(page)).into_response())
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, ServerError> {
    let result = state
        .engine
        .create_expense(&user.username, views::expense_input(&form))
        .await;

    match result {
        Ok(expense) => {
            tracing::debug!(id = expense.id, username = %user.username, "expense added");
            let jar = flash::push(jar, Message::success("Expense added successfully!"));
            Ok((jar, Redirect::to(HOME_PATH)).into_response())
        }
        Err(EngineError::Validation(errors)) => {
            let (jar, messages) = flash::take(jar);
            let page = dashboard_page(&state, &user, messages, form, &errors, None).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, jar, Json(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Dashboard with the edit form prefilled from the stored expense.
pub async fn edit_form(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    let expense = state.engine.expense(&user.username, id).await?;
    let (jar, messages) = flash::take(jar);
    let form = views::expense_form(&expense);
    let page = dashboard_page(
        &state,
        &user,
        messages,
        form,
        &FieldErrors::new(),
        Some(&expense),
    )
    .await?;
    Ok((jar, Json(page)).into_response())
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    jar: CookieJar,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, ServerError> {
    let result = state
        .engine
        .update_expense(&user.username, id, views::expense_input(&form))
        .await;

    match result {
        Ok(expense) => {
            tracing::debug!(id = expense.id, username = %user.username, "expense updated");
            let jar = flash::push(jar, Message::success("Expense updated successfully!"));
            Ok((jar, Redirect::to(HOME_PATH)).into_response())
        }
        Err(EngineError::Validation(errors)) => {
            let expense = state.engine.expense(&user.username, id).await?;
            let (jar, messages) = flash::take(jar);
            let page =
                dashboard_page(&state, &user, messages, form, &errors, Some(&expense)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, jar, Json(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    jar: CookieJar,
) -> Result<Response, ServerError> {
    state.engine.delete_expense(&user.username, id).await?;
    tracing::debug!(id, username = %user.username, "expense deleted");

    let jar = flash::push(jar, Message::success("Expense deleted successfully!"));
    Ok((jar, Redirect::to(HOME_PATH)).into_response())
}
