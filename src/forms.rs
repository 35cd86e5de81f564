//! Editable form state and the checks run before anything is submitted.

use serde_json::{json, Value};

use crate::api::{Body, FilePart, FormPayload};
use crate::error::ValidationError;
use crate::models::{AnnouncementKind, Profile};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_MESSAGE_LEN: usize = 2000;

const PHOTO_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
const PHOTO_FIELD: &str = "photo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !PHOTO_MIME_TYPES.contains(&self.mime.as_str()) {
            return Err(ValidationError::UnsupportedFileType(self.mime.clone()));
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(ValidationError::FileTooLarge {
                size: self.bytes.len(),
                limit: MAX_PHOTO_BYTES,
            });
        }
        Ok(())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Editable mirror of the configured profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    fields: Vec<(&'static str, String)>,
    photo: Option<PhotoUpload>,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile, field_names: &[&'static str]) -> Self {
        let fields = field_names
            .iter()
            .map(|name| (*name, profile.field(name).unwrap_or_default().to_string()))
            .collect();
        Self {
            fields,
            photo: None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns false when the field is not part of this form.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn attach_photo(&mut self, photo: PhotoUpload) {
        self.photo = Some(photo);
    }

    pub fn photo(&self) -> Option<&PhotoUpload> {
        self.photo.as_ref()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.get("name").is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::Required { field: "name" });
        }
        if let Some(photo) = &self.photo {
            photo.validate()?;
        }
        Ok(())
    }

    /// Every field is resent; a photo switches the payload to multipart.
    pub fn to_body(&self) -> Body {
        match &self.photo {
            Some(photo) => Body::Multipart(FormPayload {
                fields: self
                    .fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.trim().to_string()))
                    .collect(),
                file: Some(FilePart {
                    field: PHOTO_FIELD.to_string(),
                    file_name: photo.file_name.clone(),
                    mime: photo.mime.clone(),
                    bytes: photo.bytes.clone(),
                }),
            }),
            None => {
                let map = self
                    .fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.trim().to_string())))
                    .collect();
                Body::Json(Value::Object(map))
            }
        }
    }

    /// Copies the submitted values onto the loaded entity.
    pub fn apply_to(&self, profile: &mut Profile) {
        for (name, value) in &self.fields {
            profile.set_field(name, value.trim().to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

impl PasswordChange {
    pub fn new(current: &str, new: &str, confirm: &str) -> Self {
        Self {
            current: current.to_string(),
            new: new.to_string(),
            confirm: confirm.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.current.is_empty() {
            return Err(ValidationError::Required {
                field: "current password",
            });
        }
        if self.new != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.new == self.current {
            return Err(ValidationError::PasswordUnchanged);
        }
        Ok(())
    }

    pub fn to_body(&self) -> Body {
        Body::Json(json!({
            "currentPassword": self.current,
            "newPassword": self.new,
        }))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMode {
    #[default]
    Cash,
    Card,
    Upi,
    NetBanking,
    Cheque,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 5] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::Upi,
        PaymentMode::NetBanking,
        PaymentMode::Cheque,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Upi => "UPI",
            Self::NetBanking => "NET_BANKING",
            Self::Cheque => "CHEQUE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ValidationError::UnknownOption {
                field: "payment mode",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentForm {
    pub amount: String,
    pub mode: PaymentMode,
    pub remarks: String,
}

impl PaymentForm {
    pub fn new(amount: &str, mode: PaymentMode) -> Self {
        Self {
            amount: amount.to_string(),
            mode,
            remarks: String::new(),
        }
    }

    /// Returns the parsed amount once it is positive and covered by `pending`.
    pub fn validate(&self, pending: f64) -> Result<f64, ValidationError> {
        let raw = self.amount.trim();
        if raw.is_empty() {
            return Err(ValidationError::Required { field: "amount" });
        }
        let amount: f64 = raw
            .parse()
            .ok()
            .filter(|value: &f64| value.is_finite())
            .ok_or(ValidationError::NotANumber { field: "amount" })?;
        if amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        if amount > pending {
            return Err(ValidationError::ExceedsPending { amount, pending });
        }
        Ok(amount)
    }

    pub fn to_body(&self, amount: f64) -> Body {
        Body::Json(json!({
            "amount": amount,
            "paymentMode": self.mode.as_str(),
            "remarks": self.remarks.trim(),
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub content: String,
}

impl MessageDraft {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::Required { field: "message" });
        }
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(ValidationError::TooLong {
                field: "message",
                max: MAX_MESSAGE_LEN,
            });
        }
        Ok(())
    }

    pub fn to_body(&self) -> Body {
        Body::Json(json!({ "content": self.content.trim() }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncementDraft {
    pub kind: AnnouncementKind,
    pub title: String,
    pub content: String,
}

impl AnnouncementDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Required { field: "title" });
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::Required { field: "content" });
        }
        if let AnnouncementKind::Other(value) = &self.kind {
            return Err(ValidationError::UnknownOption {
                field: "announcement type",
                value: value.clone(),
            });
        }
        Ok(())
    }

    pub fn to_body(&self) -> Body {
        Body::Json(json!({
            "type": self.kind.as_str(),
            "title": self.title.trim(),
            "content": self.content.trim(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules_in_order() {
        assert_eq!(
            PasswordChange::new("", "secret1", "secret1").validate(),
            Err(ValidationError::Required { field: "current password" })
        );
        assert_eq!(
            PasswordChange::new("old-pass", "secret1", "secret2").validate(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            PasswordChange::new("old-pass", "abc", "abc").validate(),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(
            PasswordChange::new("secret1", "secret1", "secret1").validate(),
            Err(ValidationError::PasswordUnchanged)
        );
        assert!(PasswordChange::new("old-pass", "secret1", "secret1").validate().is_ok());
    }

    #[test]
    fn payment_amount_bounds() {
        let form = |amount: &str| PaymentForm::new(amount, PaymentMode::Upi);
        assert_eq!(form("  ").validate(100.0), Err(ValidationError::Required { field: "amount" }));
        assert_eq!(form("ten").validate(100.0), Err(ValidationError::NotANumber { field: "amount" }));
        assert_eq!(form("0").validate(100.0), Err(ValidationError::NonPositiveAmount));
        assert_eq!(
            form("100.01").validate(100.0),
            Err(ValidationError::ExceedsPending { amount: 100.01, pending: 100.0 })
        );
        assert_eq!(form("100").validate(100.0), Ok(100.0));
    }

    #[test]
    fn payment_mode_parsing() {
        assert_eq!(PaymentMode::parse("net_banking"), Ok(PaymentMode::NetBanking));
        assert!(PaymentMode::parse("barter").is_err());
    }

    #[test]
    fn oversized_or_non_image_photo_is_rejected() {
        let big = PhotoUpload::new("me.png", vec![0; MAX_PHOTO_BYTES + 1]);
        assert!(matches!(big.validate(), Err(ValidationError::FileTooLarge { .. })));

        let pdf = PhotoUpload::new("me.pdf", vec![1, 2, 3]);
        assert!(matches!(pdf.validate(), Err(ValidationError::UnsupportedFileType(_))));

        assert!(PhotoUpload::new("ME.JPG", vec![1]).validate().is_ok());
    }

    #[test]
    fn profile_form_switches_to_multipart_with_photo() {
        let profile = Profile {
            name: "Meera".into(),
            phone: "555-0100".into(),
            ..Profile::default()
        };
        let mut form = ProfileForm::from_profile(&profile, &["name", "phone", "address"]);
        assert!(form.set("address", " 12 Lake Road "));
        assert!(!form.set("salary", "lots"));

        let Body::Json(json) = form.to_body() else {
            panic!("expected json body without a photo");
        };
        assert_eq!(json["address"], "12 Lake Road");

        form.attach_photo(PhotoUpload::new("me.png", vec![9, 9]));
        let Body::Multipart(payload) = form.to_body() else {
            panic!("expected multipart body with a photo");
        };
        assert_eq!(payload.field("name"), Some("Meera"));
        assert_eq!(payload.file.unwrap().mime, "image/png");
    }

    #[test]
    fn blank_name_is_required() {
        let mut form = ProfileForm::from_profile(&Profile::default(), &["name"]);
        form.set("name", "   ");
        assert_eq!(form.validate(), Err(ValidationError::Required { field: "name" }));
    }

    #[test]
    fn message_and_announcement_drafts() {
        assert!(MessageDraft::new("  ").validate().is_err());
        assert!(MessageDraft::new(&"x".repeat(MAX_MESSAGE_LEN + 1)).validate().is_err());
        assert!(MessageDraft::new("See you at 4").validate().is_ok());

        let draft = AnnouncementDraft {
            kind: AnnouncementKind::Emergency,
            title: "Closed today".into(),
            content: "Heavy rain".into(),
        };
        assert!(draft.validate().is_ok());
        let Body::Json(body) = draft.to_body() else { unreachable!() };
        assert_eq!(body["type"], "EMERGENCY");
    }
}
