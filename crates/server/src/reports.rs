use api_types::report::{ReportPage, ReportQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use engine::{REPORT_DATE_FORMAT, ReportRequest, Summary, User};

use crate::{ServerError, flash, server::ServerState, views};

/// Expenses and totals over the requested date window.
pub async fn report(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ServerError> {
    let today = state.options.today();
    let request = ReportRequest {
        filter: query.filter.as_deref(),
        start_date: query.start_date.as_deref(),
        end_date: query.end_date.as_deref(),
        range: query.range.as_deref(),
    };
    let resolved = request.resolve(today);
    let range_type = request.range_label().to_string();

    let expenses = state
        .engine
        .list_expenses(&user.username, Some(resolved.window))
        .await?;
    let summary = Summary::compute(&expenses, today);
    // First of the largest amounts, in listing order.
    let highest_expense = expenses
        .iter()
        .reduce(|best, e| if e.amount > best.amount { e } else { best })
        .map(views::expense);

    let (jar, messages) = flash::take(jar);
    let page = ReportPage {
        messages,
        expenses: expenses.iter().map(views::expense).collect(),
        start_date: resolved.window.start.format(REPORT_DATE_FORMAT).to_string(),
        end_date: resolved.window.end.format(REPORT_DATE_FORMAT).to_string(),
        range_type,
        filter_type: query.filter,
        highest_expense,
        summary: views::summary(&summary),
    };
    Ok((jar, Json(page)).into_response())
}
