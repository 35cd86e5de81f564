//! Parent and admin dashboards for a school-management REST backend.
//!
//! Each screen follows the same cycle: fetch through a [`api::Transport`],
//! pick the payload out of whatever wrapper the backend used
//! ([`normalize`]), track it in a [`view_state::ViewState`], and render it
//! to HTML ([`render`]). Forms validate locally before any write is issued.

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod render;
pub mod screens;
pub mod storage;
pub mod view_state;

pub use api::{Body, Endpoint, HttpTransport, Query, Transport};
pub use config::{PortalConfig, Role};
pub use error::{PortalError, PortalResult, RequestError, ValidationError};
