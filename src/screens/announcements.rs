use std::sync::Arc;

use crate::api::{Endpoint, Query, Transport};
use crate::config::Role;
use crate::error::{PortalError, PortalResult};
use crate::forms::AnnouncementDraft;
use crate::models::{Announcement, AnnouncementKind};
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Phase, ViewState};

pub struct AnnouncementsFeed {
    api: Arc<dyn Transport>,
    role: Role,
    pub state: ViewState<Vec<Announcement>>,
    kind_filter: Option<AnnouncementKind>,
    pub notices: Notifications,
}

/// Emergencies first, then newest first.
fn order_feed(items: &mut [Announcement]) {
    items.sort_by(|a, b| {
        let a_urgent = a.kind == AnnouncementKind::Emergency;
        let b_urgent = b.kind == AnnouncementKind::Emergency;
        b_urgent
            .cmp(&a_urgent)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

impl AnnouncementsFeed {
    pub fn new(api: Arc<dyn Transport>, role: Role) -> Self {
        Self {
            api,
            role,
            state: ViewState::new(),
            kind_filter: None,
            notices: Notifications::default(),
        }
    }

    fn list_endpoint(&self) -> Endpoint {
        match self.role {
            Role::Parent => Endpoint::ParentAnnouncements,
            Role::Admin => Endpoint::AdminAnnouncements,
        }
    }

    pub fn can_publish(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn set_kind_filter(&mut self, kind: Option<AnnouncementKind>) {
        self.kind_filter = kind;
    }

    pub fn kind_filter(&self) -> Option<&AnnouncementKind> {
        self.kind_filter.as_ref()
    }

    pub fn visible(&self) -> Vec<&Announcement> {
        self.state
            .data()
            .map(|items| {
                items
                    .iter()
                    .filter(|a| self.kind_filter.as_ref().map_or(true, |k| &a.kind == k))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn mount(&mut self) -> Phase {
        let ticket = self.state.begin(None);
        let result = self.fetch().await;
        self.state.resolve(&ticket, result);
        if self.state.phase() == Phase::Error {
            let err = self.state.error().unwrap_or_default().to_string();
            self.notices.error("Failed to load announcements:", err);
        }
        self.state.phase()
    }

    async fn fetch(&self) -> PortalResult<Vec<Announcement>> {
        let resp = self.api.get(&self.list_endpoint(), &Query::new()).await?;
        let mut items: Vec<Announcement> = normalize::extract_items(&resp, shapes::ANNOUNCEMENTS);
        order_feed(&mut items);
        Ok(items)
    }

    pub async fn publish(&mut self, draft: &AnnouncementDraft) -> PortalResult<()> {
        if !self.can_publish() {
            self.notices.warning("Only administrators can publish announcements");
            return Err(PortalError::Unsupported("publishing announcements"));
        }
        if let Err(err) = draft.validate() {
            self.notices.error("Announcement not published:", &err);
            return Err(err.into());
        }

        match self.api.post(&Endpoint::CreateAnnouncement, draft.to_body()).await {
            Ok(resp) => {
                tracing::info!(kind = draft.kind.as_str(), "Announcement published");
                if let Some(created) = normalize::extract_as::<Announcement>(
                    &resp,
                    &["data.announcement", "announcement", "data"],
                ) {
                    if let Some(items) = self.state.data_mut() {
                        items.insert(0, created);
                        order_feed(items);
                    }
                }
                self.notices.success("Announcement published");
                self.mount().await;
                Ok(())
            }
            Err(err) => {
                self.notices.error("Failed to publish announcement:", &err);
                Err(err.into())
            }
        }
    }
}
