//! HTML rendering of screen state.
//!
//! Every function here is pure apart from [`notices`], which reads the clock
//! to leave out expired notices. Each section has a loading placeholder, an
//! empty placeholder with guidance, and the populated view; a failed reload
//! keeps the last data and adds a banner.

use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{AttendanceStatus, EnrollmentStatus, SenderType};
use crate::notify::{NoticeKind, Notifications};
use crate::screens::{
    AnnouncementsFeed, AttendanceView, FeeView, Inbox, ParentDashboard, ProfileScreen,
    ResultsView, TimetableView,
};
use crate::storage::photo_url;
use crate::view_state::{Blank, Phase, ViewState};

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 960px; margin: 0 auto; padding: 20px; }
    h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
    h2 { color: #34495e; margin-top: 30px; }
    .section { margin-bottom: 40px; }
    .placeholder { padding: 15px; background: #f8f9fa; color: #6c757d; border-radius: 5px; }
    .banner-error { padding: 10px; background: #f8d7da; color: #721c24; border-radius: 5px; }
    .notice { padding: 8px 12px; border-radius: 4px; margin: 4px 0; color: white; }
    .notice-success { background: #28a745; } .notice-warning { background: #ffc107; color: #333; } .notice-error { background: #dc3545; }
    .item { margin: 15px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; border-left: 3px solid #6c757d; }
    .item-emergency { border-left-color: #dc3545; background: #fdf2f2; }
    .item-meta { font-size: 13px; color: #6c757d; }
    .child { display: inline-block; padding: 8px 12px; margin: 4px; border: 1px solid #dee2e6; border-radius: 5px; }
    .child-selected { border-color: #3498db; background: #e8f4f8; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #dee2e6; padding: 6px; text-align: left; }
    .status-present { color: #28a745; } .status-absent { color: #dc3545; } .status-late { color: #fd7e14; }
    .msg-parent { text-align: right; } .msg-teacher { text-align: left; }
"#;

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escapes, then turns `**text**` into `<strong>text</strong>`.
fn format_markdown(text: &str) -> String {
    BOLD_RE
        .replace_all(&escape(text), "<strong>$1</strong>")
        .to_string()
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn placeholder(text: &str) -> String {
    format!("<div class=\"placeholder\">{}</div>\n", escape(text))
}

/// Shared loading/empty/error/populated branching for one section.
fn section<T: Blank>(
    title: &str,
    state: &ViewState<T>,
    empty_hint: &str,
    body: impl FnOnce(&T) -> String,
) -> String {
    let mut html = format!("<div class=\"section\">\n  <h2>{}</h2>\n", escape(title));

    if state.phase() == Phase::Error {
        html.push_str(&format!(
            "<div class=\"banner-error\">{}</div>\n",
            escape(state.error().unwrap_or("Something went wrong"))
        ));
    }

    match (state.phase(), state.data()) {
        (Phase::Loading, Some(data)) => {
            html.push_str("<div class=\"item-meta\">Refreshing…</div>\n");
            html.push_str(&body(data));
        }
        (Phase::Idle, None) | (Phase::Loading, None) => html.push_str(&placeholder("Loading…")),
        (Phase::Empty, _) | (Phase::Error, None) => html.push_str(&placeholder(empty_hint)),
        (_, Some(data)) => html.push_str(&body(data)),
        (Phase::Populated, None) => html.push_str(&placeholder(empty_hint)),
    }

    html.push_str("</div>\n");
    html
}

pub fn notices(notices: &Notifications) -> String {
    notices_at(notices, Utc::now())
}

fn notices_at(notices: &Notifications, now: DateTime<Utc>) -> String {
    notices
        .active(now)
        .map(|notice| {
            format!(
                "<div class=\"notice notice-{}\" data-notice-id=\"{}\">{}</div>\n",
                notice.kind.as_str(),
                notice.id,
                escape(&notice.content)
            )
        })
        .collect()
}

pub fn profile(screen: &ProfileScreen, api_url: &str, school_id: Option<&str>) -> String {
    let config = screen.config();
    let mut html = section(
        config.title,
        &screen.state,
        "Profile details are not available yet. Try again later or contact the school office.",
        |profile| {
            let mut body = String::new();
            if let Some(url) = profile
                .photo
                .as_deref()
                .and_then(|photo| photo_url(api_url, school_id, photo))
            {
                body.push_str(&format!(
                    "<img src=\"{}\" alt=\"Profile photo\" width=\"96\">\n",
                    escape(&url)
                ));
            }
            body.push_str("<table>\n");
            body.push_str(&format!(
                "<tr><th>Email</th><td>{}</td></tr>\n",
                escape(&profile.email)
            ));
            for (name, value) in screen.form().fields() {
                body.push_str(&format!(
                    "<tr><th>{}</th><td><input name=\"{}\" value=\"{}\"></td></tr>\n",
                    escape(&capitalize(name)),
                    name,
                    escape(value)
                ));
            }
            body.push_str("</table>\n");
            if config.change_password.is_some() {
                body.push_str(
                    "<form class=\"password\"><input type=\"password\" name=\"currentPassword\"> \
                     <input type=\"password\" name=\"newPassword\"> \
                     <input type=\"password\" name=\"confirmPassword\"></form>\n",
                );
            }
            body
        },
    );
    html.insert_str(0, &notices(&screen.notices));
    html
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn children_selector(dashboard: &ParentDashboard) -> String {
    section(
        "My Children",
        &dashboard.profile,
        "No children are linked to your account. Contact the school office to link a student.",
        |_| {
            let children = dashboard.children();
            if children.is_empty() {
                return placeholder(
                    "No children are linked to your account. Contact the school office to link a student.",
                );
            }
            let selected = dashboard.selected_child().map(|c| c.id.as_str());
            children
                .iter()
                .map(|child| {
                    let class = if Some(child.id.as_str()) == selected {
                        "child child-selected"
                    } else {
                        "child"
                    };
                    let status = match &child.status {
                        EnrollmentStatus::Registered => "Registered".to_string(),
                        EnrollmentStatus::Enrolled => "Enrolled".to_string(),
                        EnrollmentStatus::Other(other) => other.clone(),
                    };
                    format!(
                        "<button class=\"{}\" data-child-id=\"{}\">{}<div class=\"item-meta\">{} | Roll {} | {}</div></button>\n",
                        class,
                        escape(&child.id),
                        escape(&child.name),
                        escape(&child.class_label()),
                        escape(&child.roll_number),
                        escape(&status)
                    )
                })
                .collect()
        },
    )
}

pub fn attendance(view: &AttendanceView) -> String {
    let title = format!("Attendance - {}", view.filter.label());
    section(
        &title,
        &view.state,
        "No attendance has been recorded for this period. Pick another month to see earlier records.",
        |records| {
            let summary = view.summary();
            let mut body = format!(
                "<div class=\"summary\"><strong>{}%</strong> attendance | Present {} | Late {} | Absent {} | Total {}</div>\n<table>\n<tr><th>Date</th><th>Status</th><th>Remarks</th><th>Marked by</th></tr>\n",
                summary.percentage(),
                summary.present_days,
                summary.late_days,
                summary.absent_days,
                summary.total_days
            );
            for record in records {
                let class = match record.status {
                    AttendanceStatus::Present => "status-present",
                    AttendanceStatus::Absent => "status-absent",
                    AttendanceStatus::Late => "status-late",
                    AttendanceStatus::Other(_) => "",
                };
                body.push_str(&format!(
                    "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
                    record
                        .date
                        .map(|d| d.format("%d %b %Y").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    class,
                    escape(record.status.as_str()),
                    escape(&record.remarks),
                    escape(&record.marked_by)
                ));
            }
            body.push_str("</table>\n");
            body
        },
    )
}

pub fn fees(view: &FeeView) -> String {
    section(
        "Fees",
        &view.state,
        "No fee details are available for this student yet.",
        |fees| {
            let mut body = format!(
                "<table>\n<tr><th>Total</th><td>{}</td></tr>\n<tr><th>Paid</th><td>{}</td></tr>\n<tr><th>Pending</th><td>{}</td></tr>\n</table>\n",
                money(fees.details.total_fee),
                money(fees.details.paid_amount),
                money(fees.details.pending_amount)
            );
            if fees.payments.is_empty() {
                body.push_str(&placeholder("No payments made yet."));
            } else {
                body.push_str("<h3>Payment history</h3>\n<table>\n<tr><th>Receipt</th><th>Date</th><th>Amount</th><th>Mode</th><th>Status</th></tr>\n");
                for payment in &fees.payments {
                    body.push_str(&format!(
                        "<tr data-payment-id=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                        escape(&payment.id),
                        escape(&payment.receipt_number),
                        payment
                            .payment_date
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        money(payment.amount),
                        escape(&payment.payment_mode),
                        escape(&payment.status)
                    ));
                }
                body.push_str("</table>\n");
            }
            body
        },
    )
}

pub fn timetable(view: &TimetableView) -> String {
    section(
        "Timetable",
        &view.state,
        "The timetable has not been published yet.",
        |week| {
            let mut body = String::from("<table>\n<tr><th>Period</th>");
            for (day, _) in week.days() {
                body.push_str(&format!("<th>{}</th>", day));
            }
            body.push_str("</tr>\n");
            for number in week.period_numbers() {
                body.push_str(&format!("<tr><th>{}</th>", number));
                for (day, _) in week.days() {
                    let cell = match week.period_at(*day, number) {
                        Some(p) if p.is_break => "<em>Break</em>".to_string(),
                        Some(p) => format!(
                            "{}<div class=\"item-meta\">{} | {}-{}</div>",
                            escape(&p.subject),
                            escape(&p.teacher),
                            escape(&p.start_time),
                            escape(&p.end_time)
                        ),
                        None => String::new(),
                    };
                    body.push_str(&format!("<td>{}</td>", cell));
                }
                body.push_str("</tr>\n");
            }
            body.push_str("</table>\n");
            body
        },
    )
}

pub fn results(view: &ResultsView) -> String {
    section(
        "Results",
        &view.state,
        "No exam results have been published yet.",
        |_| {
            let visible = view.visible();
            if visible.is_empty() {
                return placeholder(&format!(
                    "No results match \"{}\". Clear the search to see all exams.",
                    view.search()
                ));
            }
            let mut body = String::from(
                "<table>\n<tr><th>Exam</th><th>Type</th><th>Year</th><th>Percentage</th><th>Grade</th></tr>\n",
            );
            for result in visible {
                body.push_str(&format!(
                    "<tr data-result-id=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    escape(&result.id),
                    escape(&result.exam_name),
                    escape(&result.exam_type),
                    escape(&result.academic_year),
                    result
                        .overall_percentage
                        .map(|p| format!("{:.1}%", p))
                        .unwrap_or_else(|| "-".to_string()),
                    escape(&result.overall_grade)
                ));
            }
            body.push_str("</table>\n");
            body
        },
    )
}

pub fn announcements(feed: &AnnouncementsFeed) -> String {
    let mut html = notices(&feed.notices);
    html.push_str(&section(
        "Announcements",
        &feed.state,
        "There are no announcements right now. New notices from the school will appear here.",
        |_| {
            let visible = feed.visible();
            if visible.is_empty() {
                return placeholder("No announcements of this type.");
            }
            let mut body = String::new();
            for item in visible {
                let class = if item.kind == crate::models::AnnouncementKind::Emergency {
                    "item item-emergency"
                } else {
                    "item"
                };
                body.push_str(&format!(
                    "<div class=\"{}\">\n  <div class=\"item-header\">[{}] {}</div>\n  <div class=\"item-meta\">{}</div>\n  <div class=\"item-content\">{}</div>\n",
                    class,
                    escape(item.kind.as_str()),
                    escape(&item.title),
                    format_time(item.created_at),
                    format_markdown(&item.content)
                ));
                if !item.attachments.is_empty() {
                    body.push_str("  <ul>\n");
                    for attachment in &item.attachments {
                        body.push_str(&format!(
                            "    <li><a href=\"{}\">{}</a></li>\n",
                            escape(&attachment.file_url),
                            escape(&attachment.file_name)
                        ));
                    }
                    body.push_str("  </ul>\n");
                }
                body.push_str("</div>\n");
            }
            body
        },
    ));
    html
}

pub fn inbox(inbox: &Inbox) -> String {
    let mut html = notices(&inbox.notices);
    html.push_str(&section(
        "Messages",
        &inbox.threads,
        "No conversations yet. Messages from teachers will appear here.",
        |threads| {
            let open_id = inbox.open_thread_id();
            threads
                .iter()
                .map(|thread| {
                    let context = thread
                        .context
                        .as_ref()
                        .and_then(|c| c.section_name.as_deref())
                        .map(|s| format!(" | {}", escape(s)))
                        .unwrap_or_default();
                    let marker = if Some(thread.id.as_str()) == open_id { " (open)" } else { "" };
                    format!(
                        "<div class=\"item\" data-thread-id=\"{}\"><div class=\"item-header\">{}{}</div><div class=\"item-meta\">{}{}</div></div>\n",
                        escape(&thread.id),
                        escape(&thread.display_title),
                        marker,
                        format_time(thread.last_message_at),
                        context
                    )
                })
                .collect()
        },
    ));

    if inbox.open.phase() != Phase::Idle {
        html.push_str(&section(
            "Conversation",
            &inbox.open,
            "No messages in this conversation yet. Write the first one below.",
            |thread| {
                thread
                    .messages
                    .iter()
                    .map(|message| {
                        let (class, who) = match message.sender_type {
                            SenderType::Parent => ("msg-parent", "You"),
                            SenderType::Teacher => ("msg-teacher", "Teacher"),
                        };
                        format!(
                            "<div class=\"{}\"><div class=\"item-meta\">{} | {}</div>{}</div>\n",
                            class,
                            who,
                            format_time(message.created_at),
                            escape(&message.content)
                        )
                    })
                    .collect()
            },
        ));
    }
    html
}

fn page(title: &str, body: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>{title}</title>\n  <style>{STYLE}</style>\n</head>\n<body>\n  <h1>{title}</h1>\n{body}  <div class=\"footer item-meta\">Generated {timestamp}</div>\n</body>\n</html>\n",
        title = escape(title),
    )
}

pub fn parent_page(
    dashboard: &ParentDashboard,
    feed: &AnnouncementsFeed,
    inbox_screen: &Inbox,
    api_url: &str,
    school_id: Option<&str>,
) -> String {
    let mut body = notices(&dashboard.notices);
    if let Some(parent) = dashboard.profile.data() {
        let photo = parent
            .photo
            .as_deref()
            .and_then(|p| photo_url(api_url, school_id, p))
            .map(|url| format!("<img src=\"{}\" alt=\"\" width=\"48\"> ", escape(&url)))
            .unwrap_or_default();
        body.push_str(&format!(
            "<div class=\"item-meta\">{}Welcome, {}</div>\n",
            photo,
            escape(&parent.name)
        ));
    }
    body.push_str(&children_selector(dashboard));
    if dashboard.selected_child().is_some() {
        body.push_str(&attendance(&dashboard.attendance));
        body.push_str(&fees(&dashboard.fees));
        body.push_str(&timetable(&dashboard.timetable));
        body.push_str(&results(&dashboard.results));
    }
    body.push_str(&announcements(feed));
    body.push_str(&inbox(inbox_screen));
    page("Parent Dashboard", &body)
}

pub fn admin_page(
    profile_screen: &ProfileScreen,
    feed: &AnnouncementsFeed,
    api_url: &str,
    school_id: Option<&str>,
) -> String {
    let mut body = profile(profile_screen, api_url, school_id);
    body.push_str(&announcements(feed));
    page("Admin Dashboard", &body)
}

/// Tag-stripped, whitespace-collapsed text for terminal previews.
pub fn plain_preview(html: &str, max_chars: usize) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

/// Severity of the worst queued notice, for log lines and exit codes.
pub fn worst_notice(all: &[&Notifications]) -> Option<NoticeKind> {
    let kinds: Vec<NoticeKind> = all.iter().flat_map(|n| n.iter().map(|x| x.kind)).collect();
    if kinds.contains(&NoticeKind::Error) {
        Some(NoticeKind::Error)
    } else if kinds.contains(&NoticeKind::Warning) {
        Some(NoticeKind::Warning)
    } else {
        kinds.first().copied()
    }
}
