//! Date windows for the report view.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Layout of the explicit `start_date` / `end_date` parameters.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Granularity of a report window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Weekly,
    #[default]
    Monthly,
    Yearly,
    Custom,
}

impl RangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }

    /// Reads a range token. Missing or unknown tokens select `Monthly`.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("weekly") => Self::Weekly,
            Some("yearly") => Self::Yearly,
            Some("custom") => Self::Custom,
            _ => Self::Monthly,
        }
    }
}

/// What the client asked for.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportRequest<'a> {
    pub filter: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub range: Option<&'a str>,
}

/// Inclusive `[start, end]` date window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A resolved report window together with the range it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedRange {
    pub window: DateWindow,
    pub kind: RangeKind,
}

impl ReportRequest<'_> {
    /// Resolves the window, in priority order:
    ///
    /// 1. `filter=today` selects today only;
    /// 2. explicit `start_date` and `end_date` are used as given, and fall back
    ///    to the first of the month up to today when either does not parse;
    /// 3. otherwise the range token picks the current week, month or year.
    pub fn resolve(&self, today: NaiveDate) -> ResolvedRange {
        let kind = RangeKind::from_token(self.range);

        if self.filter.map(str::trim) == Some("today") {
            return ResolvedRange {
                window: DateWindow::new(today, today),
                kind: RangeKind::Custom,
            };
        }

        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }
        if let (Some(start), Some(end)) = (non_empty(self.start_date), non_empty(self.end_date)) {
            let parsed = NaiveDate::parse_from_str(start, REPORT_DATE_FORMAT)
                .and_then(|start| Ok((start, NaiveDate::parse_from_str(end, REPORT_DATE_FORMAT)?)));
            let window = match parsed {
                Ok((start, end)) => DateWindow::new(start, end),
                Err(_) => DateWindow::new(first_of_month(today), today),
            };
            return ResolvedRange { window, kind };
        }

        let window = match kind {
            RangeKind::Weekly => week_of(today),
            RangeKind::Yearly => year_of(today),
            RangeKind::Monthly | RangeKind::Custom => month_of(today),
        };
        ResolvedRange { window, kind }
    }

    /// Range token to echo back to the client.
    ///
    /// `filter=today` reports `custom`; otherwise the token is returned as
    /// sent, even when unknown, and a missing one reads as `monthly`.
    pub fn range_label(&self) -> &str {
        if self.filter.map(str::trim) == Some("today") {
            return RangeKind::Custom.as_str();
        }
        self.range.unwrap_or(RangeKind::Monthly.as_str())
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Monday on or before `day` through the following Sunday.
pub fn week_of(day: NaiveDate) -> DateWindow {
    let offset = u64::from(day.weekday().num_days_from_monday());
    let start = day.checked_sub_days(Days::new(offset)).unwrap_or(day);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    DateWindow::new(start, end)
}

/// First through last day of the month containing `day`.
pub fn month_of(day: NaiveDate) -> DateWindow {
    let start = first_of_month(day);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(day);
    DateWindow::new(start, end)
}

/// January 1st through December 31st of the year containing `day`.
pub fn year_of(day: NaiveDate) -> DateWindow {
    let start = NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day);
    let end = NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day);
    DateWindow::new(start, end)
}
