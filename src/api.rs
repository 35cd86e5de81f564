//! Request layer: named endpoint templates and the transport that serves them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::config::PortalConfig;
use crate::error::RequestError;

/// Every backend route the screens talk to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ParentProfile,
    UpdateParentProfile,
    ParentChangePassword,
    ChildAttendance(String),
    ChildTimetable(String),
    ChildFees(String),
    SubmitFeePayment(String),
    DownloadReceipt(String),
    ChildResults(String),
    DownloadResult(String),
    ParentAnnouncements,
    MessageThreads,
    MessageThread(String),
    SendMessage(String),
    AdminProfile,
    UpdateAdminProfile,
    AdminChangePassword,
    AdminAnnouncements,
    CreateAnnouncement,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Self::ParentProfile | Self::UpdateParentProfile => "/parent/profile".into(),
            Self::ParentChangePassword => "/parent/change-password".into(),
            Self::ChildAttendance(id) => format!("/parent/children/{id}/attendance"),
            Self::ChildTimetable(id) => format!("/parent/children/{id}/timetable"),
            Self::ChildFees(id) => format!("/parent/children/{id}/fees"),
            Self::SubmitFeePayment(id) => format!("/parent/children/{id}/fees/pay"),
            Self::DownloadReceipt(payment_id) => format!("/parent/fees/receipt/{payment_id}"),
            Self::ChildResults(id) => format!("/parent/children/{id}/results"),
            Self::DownloadResult(result_id) => format!("/parent/results/{result_id}/download"),
            Self::ParentAnnouncements => "/parent/announcements".into(),
            Self::MessageThreads => "/parent/messages/threads".into(),
            Self::MessageThread(id) | Self::SendMessage(id) => {
                format!("/parent/messages/threads/{id}")
            }
            Self::AdminProfile | Self::UpdateAdminProfile => "/admin/profile".into(),
            Self::AdminChangePassword => "/admin/change-password".into(),
            Self::AdminAnnouncements | Self::CreateAnnouncement => "/admin/announcements".into(),
        }
    }

    /// Human-readable name used in logs and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ParentProfile => "parent profile",
            Self::UpdateParentProfile => "update parent profile",
            Self::ParentChangePassword | Self::AdminChangePassword => "change password",
            Self::ChildAttendance(_) => "child attendance",
            Self::ChildTimetable(_) => "child timetable",
            Self::ChildFees(_) => "child fees",
            Self::SubmitFeePayment(_) => "submit fee payment",
            Self::DownloadReceipt(_) => "download receipt",
            Self::ChildResults(_) => "child results",
            Self::DownloadResult(_) => "download result",
            Self::ParentAnnouncements | Self::AdminAnnouncements => "announcements",
            Self::MessageThreads => "message threads",
            Self::MessageThread(_) => "message thread",
            Self::SendMessage(_) => "send message",
            Self::AdminProfile => "admin profile",
            Self::UpdateAdminProfile => "update admin profile",
            Self::CreateAnnouncement => "create announcement",
        }
    }
}

/// Optional filters appended to read requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Binary part of a multipart write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file, sent as multipart/form-data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl FormPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn into_multipart(self) -> Result<reqwest::multipart::Form, RequestError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|err| RequestError::Body(err.to_string()))?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Multipart(FormPayload),
}

/// A fetched binary payload and the filename the server suggested, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub suggested_name: Option<String>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &Endpoint, query: &Query) -> Result<Value, RequestError>;

    async fn post(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError>;

    async fn put(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError>;

    async fn download(&self, endpoint: &Endpoint) -> Result<Download, RequestError>;
}

/// reqwest-backed transport against the configured API base URL.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    download_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &PortalConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            download_timeout: config.download_timeout,
        })
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn write(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Body,
    ) -> Result<Value, RequestError> {
        tracing::debug!(method = %method, endpoint = endpoint.label(), "Sending write request");
        let builder = self.request(method, endpoint).header(ACCEPT, "application/json");
        let builder = match body {
            Body::Json(value) => builder.header(CONTENT_TYPE, "application/json").json(&value),
            Body::Multipart(payload) => builder.multipart(payload.into_multipart()?),
        };
        let resp = builder.send().await?;
        read_json(endpoint, resp).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &Endpoint, query: &Query) -> Result<Value, RequestError> {
        tracing::debug!(endpoint = endpoint.label(), path = %endpoint.path(), "Fetching");
        let resp = self
            .request(Method::GET, endpoint)
            .header(ACCEPT, "application/json")
            .query(query.pairs())
            .send()
            .await?;
        read_json(endpoint, resp).await
    }

    async fn post(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError> {
        self.write(Method::POST, endpoint, body).await
    }

    async fn put(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError> {
        self.write(Method::PUT, endpoint, body).await
    }

    async fn download(&self, endpoint: &Endpoint) -> Result<Download, RequestError> {
        tracing::debug!(endpoint = endpoint.label(), "Downloading");
        let resp = self
            .request(Method::GET, endpoint)
            .timeout(self.download_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let headers = resp.headers();
        let suggested_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();

        Ok(Download {
            bytes,
            suggested_name,
            content_type,
        })
    }
}

async fn read_json(endpoint: &Endpoint, resp: reqwest::Response) -> Result<Value, RequestError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        tracing::warn!(
            endpoint = endpoint.label(),
            status = status.as_u16(),
            "Backend rejected request"
        );
        return Err(status_error(status, &body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|err| RequestError::Body(err.to_string()))
}

/// Prefers the backend's own `message`/`error` text over the bare status.
pub(crate) fn status_error(status: StatusCode, body: &str) -> RequestError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            crate::normalize::extract(&value, &["message", "error", "data.message"])
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    RequestError::status(status.as_u16(), message)
}

fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
