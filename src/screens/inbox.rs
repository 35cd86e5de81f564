use std::sync::Arc;

use chrono::Utc;

use crate::api::{Endpoint, Query, Transport};
use crate::error::{PortalError, PortalResult};
use crate::forms::MessageDraft;
use crate::models::{Message, MessageThread, SenderType};
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Phase, ViewState};

pub struct Inbox {
    api: Arc<dyn Transport>,
    pub threads: ViewState<Vec<MessageThread>>,
    pub open: ViewState<MessageThread>,
    pub notices: Notifications,
}

impl Inbox {
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            api,
            threads: ViewState::new(),
            open: ViewState::new(),
            notices: Notifications::default(),
        }
    }

    pub fn open_thread_id(&self) -> Option<&str> {
        self.open.tag()
    }

    pub async fn mount(&mut self) -> Phase {
        let ticket = self.threads.begin(None);
        let result = fetch_threads(self.api.as_ref()).await;
        self.threads.resolve(&ticket, result);
        if self.threads.phase() == Phase::Error {
            let err = self.threads.error().unwrap_or_default().to_string();
            self.notices.error("Failed to load conversations:", err);
        }
        self.threads.phase()
    }

    /// Opening another thread before this one resolves discards this one's response.
    pub async fn open_thread(&mut self, thread_id: &str) -> Phase {
        let ticket = self.open.begin(Some(thread_id));
        let result = fetch_thread(self.api.as_ref(), thread_id).await;
        self.open.resolve(&ticket, result);
        if self.open.phase() == Phase::Error {
            let err = self.open.error().unwrap_or_default().to_string();
            self.notices.error("Failed to load conversation:", err);
        }
        self.open.phase()
    }

    pub async fn send(&mut self, draft: &MessageDraft) -> PortalResult<()> {
        let Some(thread_id) = self.open_thread_id().map(str::to_string) else {
            self.notices.warning("Open a conversation first");
            return Err(PortalError::not_found("thread", "none open"));
        };
        if let Err(err) = draft.validate() {
            self.notices.error("Message not sent:", &err);
            return Err(err.into());
        }

        let endpoint = Endpoint::SendMessage(thread_id.clone());
        if let Err(err) = self.api.post(&endpoint, draft.to_body()).await {
            self.notices.error("Failed to send message:", &err);
            return Err(err.into());
        }

        tracing::info!(thread_id = %thread_id, "Message sent");
        let now = Utc::now();
        if let Some(thread) = self.open.data_mut() {
            thread.messages.push(Message {
                sender_type: SenderType::Parent,
                content: draft.content.trim().to_string(),
                created_at: Some(now),
            });
            thread.last_message_at = Some(now);
        }
        if let Some(threads) = self.threads.data_mut() {
            if let Some(summary) = threads.iter_mut().find(|t| t.id == thread_id) {
                summary.last_message_at = Some(now);
            }
            sort_threads(threads);
        }

        self.open_thread(&thread_id).await;
        Ok(())
    }
}

/// Most recent activity first; threads without activity sink to the bottom.
fn sort_threads(threads: &mut [MessageThread]) {
    threads.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}

async fn fetch_threads(api: &dyn Transport) -> PortalResult<Vec<MessageThread>> {
    let resp = api.get(&Endpoint::MessageThreads, &Query::new()).await?;
    let mut threads: Vec<MessageThread> = normalize::extract_items(&resp, shapes::THREADS);
    sort_threads(&mut threads);
    Ok(threads)
}

async fn fetch_thread(api: &dyn Transport, thread_id: &str) -> PortalResult<MessageThread> {
    let resp = api
        .get(&Endpoint::MessageThread(thread_id.to_string()), &Query::new())
        .await?;
    let mut thread = normalize::extract_entity::<MessageThread>(&resp, shapes::THREAD).unwrap_or_default();
    if thread.messages.is_empty() {
        thread.messages = normalize::extract_items(&resp, shapes::MESSAGES);
    }
    if thread.id.is_empty() && !thread.messages.is_empty() {
        thread.id = thread_id.to_string();
    }
    thread.messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(thread)
}
