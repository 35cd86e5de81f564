use chrono::{Datelike, NaiveDate};

use crate::api::{Endpoint, Query, Transport};
use crate::error::PortalResult;
use crate::models::{AttendanceRecord, AttendanceSummary};
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Phase, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceFilter {
    Month { month: u32, year: i32 },
    Range { start: NaiveDate, end: NaiveDate },
}

impl AttendanceFilter {
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn query(&self) -> Query {
        match self {
            Self::Month { month, year } => Query::new().with("month", month).with("year", year),
            Self::Range { start, end } => Query::new()
                .with("startDate", start.format("%Y-%m-%d"))
                .with("endDate", end.format("%Y-%m-%d")),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Month { month, year } => NaiveDate::from_ymd_opt(*year, *month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| format!("{month}/{year}")),
            Self::Range { start, end } => format!("{start} to {end}"),
        }
    }
}

pub struct AttendanceView {
    pub state: ViewState<Vec<AttendanceRecord>>,
    pub filter: AttendanceFilter,
}

impl AttendanceView {
    pub fn new(filter: AttendanceFilter) -> Self {
        Self {
            state: ViewState::new(),
            filter,
        }
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        self.state.data().map(Vec::as_slice).unwrap_or_default()
    }

    /// Derived from the loaded records, never from the backend's own totals.
    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary::from_records(self.records())
    }

    /// Reloads for a new filter; the previous records stay visible meanwhile.
    pub async fn load(
        &mut self,
        api: &dyn Transport,
        child_id: &str,
        notices: &mut Notifications,
    ) -> Phase {
        let ticket = self.state.begin(Some(child_id));
        let result = fetch(api, child_id, &self.filter).await;
        self.state.resolve(&ticket, result);
        if self.state.phase() == Phase::Error {
            let err = self.state.error().unwrap_or_default().to_string();
            notices.error("Failed to load attendance:", err);
        }
        self.state.phase()
    }
}

/// Newest first.
pub async fn fetch(
    api: &dyn Transport,
    child_id: &str,
    filter: &AttendanceFilter,
) -> PortalResult<Vec<AttendanceRecord>> {
    let resp = api
        .get(&Endpoint::ChildAttendance(child_id.to_string()), &filter.query())
        .await?;
    let mut records: Vec<AttendanceRecord> = normalize::extract_items(&resp, shapes::ATTENDANCE);
    records.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(records)
}
