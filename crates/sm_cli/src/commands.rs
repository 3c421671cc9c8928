use anyhow::{Context, Result};
use sm_capture::{fetch_page, load_bookmarks, VisitObserver};
use sm_core::{KeyValueStore, PageRecord, SearchOutcome, UploadFlag};
use sm_inference::RemoteClient;
use sm_progress::{drive, Session, SessionAction, SessionState};
use sm_storage::LocalHistoryStore;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const NO_HISTORY_MESSAGE: &str = "There is no data in History";
pub const NO_BOOKMARKS_MESSAGE: &str = "There is no data in Bookmarks";
pub const UPLOAD_FAILED_MESSAGE: &str = "There is a problem uploading data";

/// Shared handles for one CLI invocation.
pub struct App {
    pub store: Arc<dyn KeyValueStore>,
    pub history: LocalHistoryStore,
    pub client: RemoteClient,
    pub session: Session,
}

impl App {
    pub async fn initialize(
        store: Arc<dyn KeyValueStore>,
        history: LocalHistoryStore,
        client: RemoteClient,
    ) -> Result<Self> {
        let user_id = sm_storage::ensure_user_id(store.as_ref())
            .await
            .context("Failed to load the user id")?;
        let update_flag = sm_storage::update_flag(store.as_ref()).await.unwrap_or(false);

        let mut session = Session::new();
        session.dispatch(SessionAction::Initialized {
            user_id,
            update_flag,
        });
        Ok(Self {
            store,
            history,
            client,
            session,
        })
    }

    fn user_id(&self) -> String {
        self.session.state().user_id.clone()
    }

    fn notify(&mut self, message: &str) {
        self.session.dispatch(SessionAction::Notify(message.to_string()));
        println!("{}", message);
    }
}

pub async fn visit(app: &App, url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let html = fetch_page(&client, url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    capture(app, url, &html).await;
    Ok(())
}

pub async fn capture_file(app: &App, url: &str, html_path: &Path) -> Result<()> {
    let html = tokio::fs::read_to_string(html_path)
        .await
        .with_context(|| format!("Failed to read {}", html_path.display()))?;
    capture(app, url, &html).await;
    Ok(())
}

async fn capture(app: &App, url: &str, html: &str) {
    let observer = VisitObserver::new(app.history.clone());
    match observer.on_visit(url, html).await {
        Some(record) => println!("📄 {} - {}", record.title, record.url),
        None => println!("⏭️ {} was not recorded", url),
    }
}

pub async fn list(app: &App, as_json: bool) -> Result<()> {
    let records = app.history.records().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", NO_HISTORY_MESSAGE);
    }
    for record in &records {
        println!("{}  {}  {}", record.captured_at, record.title, record.url);
    }
    Ok(())
}

pub async fn clear(app: &App) -> Result<()> {
    app.history.clear().await?;
    println!("🧹 History cleared");
    Ok(())
}

pub async fn dismiss_update(app: &mut App) -> Result<()> {
    sm_storage::set_update_flag(app.store.as_ref(), true).await?;
    app.session.dispatch(SessionAction::UpdateDismissed);
    Ok(())
}

/// Upload the stored history. Failures are reported, not returned.
pub async fn sync_history(app: &mut App) -> Result<bool> {
    let records: Vec<PageRecord> = app.history.records().await?;
    if records.is_empty() {
        app.notify(NO_HISTORY_MESSAGE);
        return Ok(false);
    }

    app.session.dispatch(SessionAction::SyncStarted);
    let user_id = app.user_id();
    match app.client.upload(&records, &user_id, UploadFlag::History).await {
        Ok(()) => {
            app.session.dispatch(SessionAction::SyncFinished);
            info!("🔄 Synced {} history records", records.len());
            Ok(true)
        }
        Err(e) => {
            warn!("History sync failed: {}", e);
            app.session.dispatch(SessionAction::SyncFailed);
            println!("{}", app.session.state().notification);
            Ok(false)
        }
    }
}

async fn upload_bookmarks(app: &mut App, path: &Path) -> Result<bool> {
    let bookmarks = load_bookmarks(path)
        .await
        .with_context(|| format!("Failed to read bookmarks from {}", path.display()))?;
    if bookmarks.is_empty() {
        app.notify(NO_BOOKMARKS_MESSAGE);
        return Ok(false);
    }

    app.notify("Uploading Your Bookmarks...");
    let user_id = app.user_id();
    match app.client.upload(&bookmarks, &user_id, UploadFlag::Bookmark).await {
        Ok(()) => Ok(true),
        Err(sm_core::Error::Upload(message)) => {
            app.notify(&message);
            Ok(false)
        }
        Err(e) => {
            warn!("Bookmark upload failed: {}", e);
            app.notify(UPLOAD_FAILED_MESSAGE);
            Ok(false)
        }
    }
}

pub async fn search(app: &mut App, query: &str, bookmarks: Option<&Path>) -> Result<()> {
    let flag = match bookmarks {
        Some(path) => {
            if !upload_bookmarks(app, path).await? {
                return Ok(());
            }
            UploadFlag::Bookmark
        }
        None => {
            if !sync_history(app).await? {
                return Ok(());
            }
            UploadFlag::History
        }
    };

    app.session.begin_search()?;
    println!("{}", app.session.state().notification);

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let user_id = app.user_id();
    let reader = app
        .client
        .search_stream(&user_id, query, flag, cancel.clone())
        .await;

    let mut last_notification = app.session.state().notification.clone();
    let outcome = drive(&mut app.session, reader.into_stream(), &cancel, |state| {
        print_update(state, &mut last_notification)
    })
    .await;
    watcher.abort();

    match outcome {
        Some(outcome) => println!("{}", render_outcome(&outcome)),
        None => println!("Search cancelled"),
    }
    Ok(())
}

fn print_update(state: &SessionState, last_notification: &mut String) {
    if let Some(projection) = state.progress.projection() {
        info!("{}: {}", projection.title, projection.content);
    }
    if !state.notification.is_empty() && state.notification != *last_notification {
        println!("{}", state.notification);
    }
    *last_notification = state.notification.clone();
}

pub fn render_outcome(outcome: &SearchOutcome) -> String {
    if let Some(message) = &outcome.error_message {
        return format!("❌ {}", message);
    }

    let mut lines = Vec::new();
    if !outcome.summary_text.is_empty() {
        lines.push(outcome.summary_text.clone());
    }
    for document in &outcome.documents {
        lines.push(format!(
            "🔗 {} ({}) {}",
            document.title, document.match_date, document.source_url
        ));
    }
    lines.join("\n")
}
