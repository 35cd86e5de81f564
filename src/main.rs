use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, Utc};

use school_portal::config::{PortalConfig, Role};
use school_portal::logger;
use school_portal::notify::NoticeKind;
use school_portal::render;
use school_portal::screens::{
    AnnouncementsFeed, AttendanceFilter, Inbox, ParentDashboard, ProfileConfig, ProfileScreen,
};
use school_portal::storage::SchoolIdStore;
use school_portal::{HttpTransport, Transport};

const PREVIEW_CHARS: usize = 1500;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init_logging();

    let config = PortalConfig::from_env().context("Invalid portal configuration")?;
    let store = SchoolIdStore::open(&config.db_path).context("Failed to open local store")?;
    let api: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config).context("Failed to build HTTP client")?);

    tracing::info!(
        api_url = %config.api_url,
        role = ?config.role,
        authenticated = config.token.is_some(),
        "Starting school portal"
    );

    let html = match config.role {
        Role::Parent => parent_dashboard(&config, api, &store).await?,
        Role::Admin => admin_dashboard(&config, api, &store).await?,
    };

    match &config.output {
        Some(path) => {
            tokio::fs::write(path, &html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = html.len(), "Dashboard written");
        }
        None => {
            println!("\n{}", "=".repeat(80));
            println!("{}", render::plain_preview(&html, PREVIEW_CHARS));
            println!("{}\n", "=".repeat(80));
        }
    }

    Ok(())
}

async fn parent_dashboard(
    config: &PortalConfig,
    api: Arc<dyn Transport>,
    store: &SchoolIdStore,
) -> Result<String> {
    let mut dashboard = ParentDashboard::new(
        api.clone(),
        AttendanceFilter::month_of(Local::now().date_naive()),
    )
    .with_download_dir(&config.download_dir);
    let mut feed = AnnouncementsFeed::new(api.clone(), Role::Parent);
    let mut inbox = Inbox::new(api);

    tracing::info!("Loading parent dashboard");
    dashboard.mount().await;
    feed.mount().await;
    inbox.mount().await;

    if let Some(school_id) = dashboard
        .profile
        .data()
        .and_then(|p| p.school_id.as_deref())
        .filter(|id| !id.is_empty())
    {
        store.set_school_id(school_id)?;
    }
    let school_id = store.school_id()?;

    tracing::info!(
        children = dashboard.children().len(),
        selected = dashboard.selected_child().map(|c| c.name.as_str()).unwrap_or("-"),
        announcements = feed.visible().len(),
        download_dir = %dashboard.download_dir().display(),
        "Parent dashboard loaded"
    );
    log_notices(&[&dashboard.notices, &feed.notices, &inbox.notices]);
    let now = Utc::now();
    for notices in [&mut dashboard.notices, &mut feed.notices, &mut inbox.notices] {
        notices.prune(now);
    }

    Ok(render::parent_page(
        &dashboard,
        &feed,
        &inbox,
        &config.api_url,
        school_id.as_deref(),
    ))
}

async fn admin_dashboard(
    config: &PortalConfig,
    api: Arc<dyn Transport>,
    store: &SchoolIdStore,
) -> Result<String> {
    let mut profile = ProfileScreen::new(api.clone(), ProfileConfig::admin());
    let mut feed = AnnouncementsFeed::new(api, Role::Admin);

    tracing::info!("Loading admin dashboard");
    profile.mount().await;
    feed.mount().await;

    profile.remember_school_id(store)?;
    let school_id = store.school_id()?;

    log_notices(&[&profile.notices, &feed.notices]);
    let now = Utc::now();
    profile.notices.prune(now);
    feed.notices.prune(now);
    Ok(render::admin_page(
        &profile,
        &feed,
        &config.api_url,
        school_id.as_deref(),
    ))
}

fn log_notices(all: &[&school_portal::notify::Notifications]) {
    match render::worst_notice(all) {
        Some(NoticeKind::Error) => tracing::warn!("Dashboard rendered with errors"),
        Some(NoticeKind::Warning) => tracing::info!("Dashboard rendered with warnings"),
        _ => tracing::info!("Dashboard rendered"),
    }
}
