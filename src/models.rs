use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ids arrive as numbers on some routes and strings on others.
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Amounts arrive as numbers or numeric strings.
fn lenient_amount<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_opt_amount<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts `2024-06-01` as well as full timestamps, keeping the date part.
fn lenient_date<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())))
}

/// `null` reads as the field's default, the same as a missing key.
fn null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(de: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub email: String,
    #[serde(deserialize_with = "null_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_default")]
    pub address: String,
    #[serde(deserialize_with = "null_default")]
    pub designation: String,
    #[serde(deserialize_with = "null_default")]
    pub occupation: String,
    #[serde(alias = "profilePhoto", alias = "photoUrl")]
    pub photo: Option<String>,
    #[serde(alias = "school_id")]
    pub school_id: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub children: Vec<Child>,
}

impl Profile {
    /// Reads a named editable field.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "phone" => Some(&self.phone),
            "address" => Some(&self.address),
            "designation" => Some(&self.designation),
            "occupation" => Some(&self.occupation),
            _ => None,
        }
    }

    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "address" => self.address = value,
            "designation" => self.designation = value,
            "occupation" => self.occupation = value,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Child {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub class_name: String,
    #[serde(deserialize_with = "null_default")]
    pub section: String,
    #[serde(deserialize_with = "lenient_id")]
    pub roll_number: String,
    #[serde(deserialize_with = "null_default")]
    pub status: EnrollmentStatus,
    pub fee_details: Option<FeeDetails>,
    #[serde(alias = "attendance")]
    pub attendance_summary: Option<AttendanceSummary>,
}

impl Child {
    pub fn class_label(&self) -> String {
        match (self.class_name.is_empty(), self.section.is_empty()) {
            (true, _) => String::new(),
            (false, true) => self.class_name.clone(),
            (false, false) => format!("{} - {}", self.class_name, self.section),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrollmentStatus {
    #[default]
    Registered,
    Enrolled,
    Other(String),
}

impl From<String> for EnrollmentStatus {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "REGISTERED" => Self::Registered,
            "ENROLLED" => Self::Enrolled,
            _ => Self::Other(value),
        }
    }
}

impl From<EnrollmentStatus> for String {
    fn from(value: EnrollmentStatus) -> Self {
        match value {
            EnrollmentStatus::Registered => "REGISTERED".to_string(),
            EnrollmentStatus::Enrolled => "ENROLLED".to_string(),
            EnrollmentStatus::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeDetails {
    #[serde(deserialize_with = "lenient_amount")]
    pub total_fee: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub paid_amount: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub pending_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceSummary {
    #[serde(deserialize_with = "null_default")]
    pub total_days: u32,
    #[serde(deserialize_with = "null_default")]
    pub present_days: u32,
    #[serde(deserialize_with = "null_default")]
    pub absent_days: u32,
    #[serde(deserialize_with = "null_default")]
    pub late_days: u32,
    #[serde(deserialize_with = "lenient_opt_amount")]
    pub percentage: Option<f64>,
}

impl AttendanceSummary {
    /// Late days count as attended.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut summary = Self {
            total_days: records.len() as u32,
            ..Self::default()
        };
        for record in records {
            match record.status {
                AttendanceStatus::Present => summary.present_days += 1,
                AttendanceStatus::Absent => summary.absent_days += 1,
                AttendanceStatus::Late => summary.late_days += 1,
                AttendanceStatus::Other(_) => {}
            }
        }
        summary.percentage = Some(summary.computed_percentage());
        summary
    }

    fn computed_percentage(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        let attended = f64::from(self.present_days + self.late_days);
        (attended / f64::from(self.total_days) * 1000.0).round() / 10.0
    }

    pub fn percentage(&self) -> f64 {
        self.percentage.unwrap_or_else(|| self.computed_percentage())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnouncementKind {
    #[default]
    General,
    Emergency,
    Event,
    Holiday,
    Other(String),
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::General => "GENERAL",
            Self::Emergency => "EMERGENCY",
            Self::Event => "EVENT",
            Self::Holiday => "HOLIDAY",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for AnnouncementKind {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "GENERAL" => Self::General,
            "EMERGENCY" => Self::Emergency,
            "EVENT" => Self::Event,
            "HOLIDAY" => Self::Holiday,
            _ => Self::Other(value),
        }
    }
}

impl From<AnnouncementKind> for String {
    fn from(value: AnnouncementKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Announcement {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub kind: AnnouncementKind,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub content: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_default")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    #[serde(deserialize_with = "null_default")]
    pub file_name: String,
    #[serde(deserialize_with = "null_default")]
    pub file_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadContext {
    pub section_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageThread {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub display_title: String,
    pub context: Option<ThreadContext>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_default")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    #[default]
    Parent,
    Teacher,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(deserialize_with = "null_default")]
    pub sender_type: SenderType,
    #[serde(deserialize_with = "null_default")]
    pub content: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Other(String),
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for AttendanceStatus {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "PRESENT" => Self::Present,
            "ABSENT" => Self::Absent,
            "LATE" => Self::Late,
            _ => Self::Other(value),
        }
    }
}

impl From<AttendanceStatus> for String {
    fn from(value: AttendanceStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceRecord {
    #[serde(deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "null_default")]
    pub status: AttendanceStatus,
    #[serde(deserialize_with = "null_default")]
    pub remarks: String,
    #[serde(deserialize_with = "null_default")]
    pub marked_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeePayment {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub receipt_number: String,
    #[serde(deserialize_with = "lenient_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(deserialize_with = "null_default")]
    pub payment_mode: String,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Period {
    #[serde(deserialize_with = "null_default")]
    pub period_number: u32,
    #[serde(deserialize_with = "null_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_default")]
    pub teacher: String,
    #[serde(deserialize_with = "null_default")]
    pub start_time: String,
    #[serde(deserialize_with = "null_default")]
    pub end_time: String,
    #[serde(deserialize_with = "null_default")]
    pub is_break: bool,
    /// Present only when the backend sends a flat list of periods.
    pub day: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamResult {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub exam_name: String,
    #[serde(deserialize_with = "null_default")]
    pub exam_type: String,
    #[serde(deserialize_with = "null_default")]
    pub academic_year: String,
    #[serde(deserialize_with = "lenient_opt_amount")]
    pub overall_percentage: Option<f64>,
    #[serde(deserialize_with = "null_default")]
    pub overall_grade: String,
}
