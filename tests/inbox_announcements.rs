mod common;

use std::sync::Arc;

use serde_json::json;

use common::MockTransport;
use school_portal::api::{Body, Endpoint, Transport};
use school_portal::config::Role;
use school_portal::forms::{AnnouncementDraft, MessageDraft, MAX_MESSAGE_LEN};
use school_portal::models::{AnnouncementKind, SenderType};
use school_portal::render;
use school_portal::screens::{AnnouncementsFeed, Inbox};
use school_portal::view_state::Phase;
use school_portal::{PortalError, RequestError, ValidationError};

fn seed_inbox(mock: &MockTransport) {
    mock.on_get(
        Endpoint::MessageThreads,
        json!({ "data": { "threads": [
            { "_id": "t-old", "displayTitle": "Class 4A", "lastMessageAt": "2025-02-01T08:00:00Z" },
            { "_id": "t-new", "displayTitle": "Maths homework", "context": { "sectionName": "4A" }, "lastMessageAt": "2025-02-03T10:00:00Z" }
        ] } }),
    );
    mock.on_get(
        Endpoint::MessageThread("t-new".into()),
        json!({ "data": {
            "thread": { "_id": "t-new", "displayTitle": "Maths homework" },
            "messages": [
                { "senderType": "parent", "content": "Thanks!", "createdAt": "2025-02-03T10:00:00Z" },
                { "senderType": "teacher", "content": "Worksheet is on page 12", "createdAt": "2025-02-03T09:00:00Z" }
            ]
        } }),
    );
}

fn inbox(mock: &Arc<MockTransport>) -> Inbox {
    let api: Arc<dyn Transport> = mock.clone();
    Inbox::new(api)
}

#[tokio::test]
async fn threads_are_listed_by_latest_activity() {
    let mock = MockTransport::new();
    seed_inbox(&mock);
    let mut inbox = inbox(&mock);

    assert_eq!(inbox.mount().await, Phase::Populated);
    let ids: Vec<_> = inbox
        .threads
        .data()
        .unwrap()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, ["t-new", "t-old"]);
}

#[tokio::test]
async fn opened_thread_shows_messages_oldest_first() {
    let mock = MockTransport::new();
    seed_inbox(&mock);
    let mut inbox = inbox(&mock);
    inbox.mount().await;

    assert_eq!(inbox.open_thread("t-new").await, Phase::Populated);
    assert_eq!(inbox.open_thread_id(), Some("t-new"));

    let thread = inbox.open.data().unwrap();
    assert_eq!(thread.messages[0].sender_type, SenderType::Teacher);
    assert_eq!(thread.messages[1].content, "Thanks!");

    let html = render::inbox(&inbox);
    assert!(html.contains("Worksheet is on page 12"));
}

#[tokio::test]
async fn sending_posts_once_and_reloads_thread() {
    let mock = MockTransport::new();
    seed_inbox(&mock);
    mock.on_post(Endpoint::SendMessage("t-new".into()), json!({ "success": true }));
    let mut inbox = inbox(&mock);
    inbox.mount().await;
    inbox.open_thread("t-new").await;
    mock.reset_calls();

    inbox.send(&MessageDraft::new("  See you at the meeting  ")).await.unwrap();

    let posts = mock.calls_to("POST", &Endpoint::SendMessage("t-new".into()));
    assert_eq!(posts.len(), 1);
    let Some(Body::Json(body)) = &posts[0].body else {
        panic!("message should be sent as json");
    };
    assert_eq!(body["content"], "See you at the meeting");
    assert_eq!(mock.calls_to("GET", &Endpoint::MessageThread("t-new".into())).len(), 1);
}

#[tokio::test]
async fn invalid_messages_are_not_sent() {
    let mock = MockTransport::new();
    seed_inbox(&mock);
    let mut inbox = inbox(&mock);
    inbox.mount().await;

    let no_thread = inbox.send(&MessageDraft::new("Hello")).await;
    assert!(matches!(no_thread, Err(PortalError::NotFound { entity: "thread", .. })));

    inbox.open_thread("t-new").await;
    let blank = inbox.send(&MessageDraft::new("   ")).await;
    assert!(matches!(
        blank,
        Err(PortalError::Validation(ValidationError::Required { field: "message" }))
    ));

    let long = "x".repeat(MAX_MESSAGE_LEN + 1);
    let too_long = inbox.send(&MessageDraft::new(&long)).await;
    assert!(matches!(
        too_long,
        Err(PortalError::Validation(ValidationError::TooLong { .. }))
    ));
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn failed_send_keeps_the_conversation() {
    let mock = MockTransport::new();
    seed_inbox(&mock);
    mock.fail_post(
        Endpoint::SendMessage("t-new".into()),
        RequestError::Timeout,
    );
    let mut inbox = inbox(&mock);
    inbox.mount().await;
    inbox.open_thread("t-new").await;

    assert!(inbox.send(&MessageDraft::new("Hello?")).await.is_err());
    assert_eq!(inbox.open.data().unwrap().messages.len(), 2);
    assert!(inbox.notices.has_errors());
}

fn feed_payload() -> serde_json::Value {
    json!({ "data": [
        { "_id": "a-1", "type": "GENERAL", "title": "PTA meeting", "content": "Friday **5pm**", "createdAt": "2025-03-01T09:00:00Z" },
        { "_id": "a-2", "type": "EMERGENCY", "title": "School closed", "content": "Heavy rain", "createdAt": "2025-02-20T06:00:00Z" },
        { "_id": "a-3", "type": "HOLIDAY", "title": "Spring break", "content": "Back on the 14th", "createdAt": "2025-03-05T09:00:00Z" }
    ] })
}

#[tokio::test]
async fn feed_pins_emergencies_and_filters_by_kind() {
    let mock = MockTransport::new();
    mock.on_get(Endpoint::ParentAnnouncements, feed_payload());
    let api: Arc<dyn Transport> = mock.clone();
    let mut feed = AnnouncementsFeed::new(api, Role::Parent);

    assert_eq!(feed.mount().await, Phase::Populated);
    let ids: Vec<_> = feed.visible().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a-2", "a-3", "a-1"]);

    feed.set_kind_filter(Some(AnnouncementKind::Holiday));
    assert_eq!(feed.visible().len(), 1);
    assert_eq!(feed.visible()[0].title, "Spring break");

    feed.set_kind_filter(None);
    let html = render::announcements(&feed);
    assert!(html.contains("<strong>5pm</strong>"));
}

#[tokio::test]
async fn parents_cannot_publish() {
    let mock = MockTransport::new();
    mock.on_get(Endpoint::ParentAnnouncements, feed_payload());
    let api: Arc<dyn Transport> = mock.clone();
    let mut feed = AnnouncementsFeed::new(api, Role::Parent);

    let draft = AnnouncementDraft {
        kind: AnnouncementKind::Event,
        title: "Sports day".into(),
        content: "Wear whites".into(),
    };
    let err = feed.publish(&draft).await.unwrap_err();
    assert!(matches!(err, PortalError::Unsupported(_)));
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn admin_publish_posts_and_refreshes_feed() {
    let mock = MockTransport::new();
    mock.on_get(Endpoint::AdminAnnouncements, feed_payload());
    mock.on_post(
        Endpoint::CreateAnnouncement,
        json!({ "data": { "announcement": { "_id": "a-9", "type": "EVENT", "title": "Sports day" } } }),
    );
    let api: Arc<dyn Transport> = mock.clone();
    let mut feed = AnnouncementsFeed::new(api, Role::Admin);
    feed.mount().await;

    let draft = AnnouncementDraft {
        kind: AnnouncementKind::Event,
        title: " Sports day ".into(),
        content: "Wear whites".into(),
    };
    feed.publish(&draft).await.unwrap();

    let posts = mock.calls_to("POST", &Endpoint::CreateAnnouncement);
    assert_eq!(posts.len(), 1);
    let Some(Body::Json(body)) = &posts[0].body else {
        panic!("announcement should be sent as json");
    };
    assert_eq!(body["type"], "EVENT");
    assert_eq!(body["title"], "Sports day");
    assert_eq!(mock.calls_to("GET", &Endpoint::AdminAnnouncements).len(), 2);
}

#[tokio::test]
async fn admin_publish_rejects_incomplete_drafts() {
    let mock = MockTransport::new();
    let api: Arc<dyn Transport> = mock.clone();
    let mut feed = AnnouncementsFeed::new(api, Role::Admin);

    let draft = AnnouncementDraft {
        kind: AnnouncementKind::General,
        title: "".into(),
        content: "Body".into(),
    };
    let err = feed.publish(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        PortalError::Validation(ValidationError::Required { field: "title" })
    ));
    assert!(mock.writes().is_empty());
}
