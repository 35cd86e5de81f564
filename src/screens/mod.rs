//! One module per dashboard screen. Each screen owns its fetched data and
//! its notifications; nothing is shared between screens.

pub mod announcements;
pub mod attendance;
pub mod dashboard;
pub mod fees;
pub mod inbox;
pub mod profile;
pub mod results;
pub mod timetable;

pub use announcements::AnnouncementsFeed;
pub use attendance::{AttendanceFilter, AttendanceView};
pub use dashboard::{DependentData, ParentDashboard, SelectionTicket};
pub use fees::{FeeOverview, FeeView};
pub use inbox::Inbox;
pub use profile::{ProfileConfig, ProfileScreen};
pub use results::ResultsView;
pub use timetable::{TimetableView, WeeklyTimetable};

/// Keeps only characters that are safe in a file name.
pub(crate) fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let collapsed = cleaned
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if collapsed.is_empty() {
        "download".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_stem;

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(sanitize_file_stem("Mid Term / 2024"), "Mid-Term-2024");
        assert_eq!(sanitize_file_stem("R_001"), "R_001");
        assert_eq!(sanitize_file_stem("  ??  "), "download");
    }
}
