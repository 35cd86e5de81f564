use chrono::Weekday;
use serde_json::Value;

use crate::api::{Endpoint, Query, Transport};
use crate::error::PortalResult;
use crate::models::Period;
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Blank, Phase, ViewState};

pub const SCHOOL_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Monday to Saturday, each day's periods ordered by period number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyTimetable {
    days: Vec<(Weekday, Vec<Period>)>,
}

impl Blank for WeeklyTimetable {
    fn is_blank(&self) -> bool {
        self.days.iter().all(|(_, periods)| periods.is_empty())
    }
}

fn parse_day(raw: &str) -> Option<Weekday> {
    let lower = raw.trim().to_ascii_lowercase();
    let day = match lower.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn parse_periods(value: &Value) -> Vec<Period> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let periods: Vec<Period> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();
    if periods.len() < items.len() {
        tracing::warn!(
            skipped = items.len() - periods.len(),
            total = items.len(),
            "Dropped timetable periods with an unexpected shape"
        );
    }
    periods
}

impl WeeklyTimetable {
    /// Rebuilds the grid from either a per-day map (`{"Monday": [...]}`), a
    /// list of `{day, periods}` entries, or a flat list of periods carrying `day`.
    pub fn from_payload(payload: &Value) -> Self {
        let mut timetable = Self {
            days: SCHOOL_DAYS.iter().map(|day| (*day, Vec::new())).collect(),
        };

        match payload {
            Value::Object(map) => {
                for (key, value) in map {
                    if let Some(day) = parse_day(key) {
                        timetable.extend(day, parse_periods(value));
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    let day = item.get("day").and_then(Value::as_str).and_then(parse_day);
                    match (day, item.get("periods")) {
                        (Some(day), Some(periods)) => timetable.extend(day, parse_periods(periods)),
                        (Some(day), None) => match serde_json::from_value::<Period>(item.clone()) {
                            Ok(period) => timetable.extend(day, vec![period]),
                            Err(err) => {
                                tracing::warn!(error = %err, "Dropped timetable period with an unexpected shape")
                            }
                        },
                        (None, _) => {}
                    }
                }
            }
            _ => {}
        }

        for (_, periods) in &mut timetable.days {
            periods.sort_by_key(|p| p.period_number);
        }
        timetable
    }

    fn extend(&mut self, day: Weekday, periods: Vec<Period>) {
        match self.days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, slot)) => slot.extend(periods),
            None if !periods.is_empty() => self.days.push((day, periods)),
            None => {}
        }
    }

    pub fn days(&self) -> &[(Weekday, Vec<Period>)] {
        &self.days
    }

    pub fn day(&self, day: Weekday) -> &[Period] {
        self.days
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, periods)| periods.as_slice())
            .unwrap_or_default()
    }

    /// Sorted, de-duplicated period numbers across the week: the grid's rows.
    pub fn period_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .days
            .iter()
            .flat_map(|(_, periods)| periods.iter().map(|p| p.period_number))
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    pub fn period_at(&self, day: Weekday, number: u32) -> Option<&Period> {
        self.day(day).iter().find(|p| p.period_number == number)
    }
}

#[derive(Default)]
pub struct TimetableView {
    pub state: ViewState<WeeklyTimetable>,
}

impl TimetableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(
        &mut self,
        api: &dyn Transport,
        child_id: &str,
        notices: &mut Notifications,
    ) -> Phase {
        let ticket = self.state.begin(Some(child_id));
        let result = fetch(api, child_id).await;
        self.state.resolve(&ticket, result);
        if self.state.phase() == Phase::Error {
            let err = self.state.error().unwrap_or_default().to_string();
            notices.error("Failed to load timetable:", err);
        }
        self.state.phase()
    }
}

pub async fn fetch(api: &dyn Transport, child_id: &str) -> PortalResult<WeeklyTimetable> {
    let resp = api
        .get(&Endpoint::ChildTimetable(child_id.to_string()), &Query::new())
        .await?;
    let payload = normalize::extract(&resp, shapes::TIMETABLE)
        .cloned()
        .unwrap_or(Value::Null);
    Ok(WeeklyTimetable::from_payload(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_list_is_grouped_by_day_and_sorted() {
        let payload = json!([
            { "day": "Tuesday", "periodNumber": 2, "subject": "Science" },
            { "day": "MONDAY", "periodNumber": 2, "subject": "English" },
            { "day": "Monday", "periodNumber": 1, "subject": "Maths" },
            { "day": "Funday", "periodNumber": 1, "subject": "Nap" }
        ]);
        let timetable = WeeklyTimetable::from_payload(&payload);

        let monday: Vec<_> = timetable.day(Weekday::Mon).iter().map(|p| p.subject.as_str()).collect();
        assert_eq!(monday, ["Maths", "English"]);
        assert_eq!(timetable.period_at(Weekday::Tue, 2).unwrap().subject, "Science");
        assert_eq!(timetable.period_numbers(), vec![1, 2]);
        assert_eq!(timetable.days().len(), 6);
    }

    #[test]
    fn per_day_map_and_day_entries_agree() {
        let map = json!({
            "Wednesday": [{ "periodNumber": 3, "subject": "Art" }, { "periodNumber": 1, "subject": "PE" }]
        });
        let entries = json!([
            { "day": "Wednesday", "periods": [{ "periodNumber": 1, "subject": "PE" }, { "periodNumber": 3, "subject": "Art" }] }
        ]);
        assert_eq!(
            WeeklyTimetable::from_payload(&map),
            WeeklyTimetable::from_payload(&entries)
        );
    }

    #[test]
    fn malformed_periods_are_skipped() {
        let map = json!({
            "Friday": [
                { "periodNumber": "first", "subject": "Music" },
                { "periodNumber": 2, "subject": "History", "isBreak": null },
                "lunch"
            ]
        });
        let timetable = WeeklyTimetable::from_payload(&map);
        let friday: Vec<_> = timetable.day(Weekday::Fri).iter().map(|p| p.subject.as_str()).collect();
        assert_eq!(friday, ["History"]);
    }

    #[test]
    fn nothing_scheduled_is_blank() {
        assert!(WeeklyTimetable::from_payload(&json!({})).is_blank());
        assert!(WeeklyTimetable::from_payload(&Value::Null).is_blank());
    }
}
