// Application state and orchestration logic.
//
// The central event loop that coordinates period loading tasks and user
// commands from the TUI. Loads run on spawned tasks tagged with a generation
// counter; database writes are fire-and-forget through a single writer task
// that applies them in submission order.

use std::sync::Arc;

use drawzone_core::access::CurrentUser;
use drawzone_core::classify::classify_all;
use drawzone_core::config::Config;
use drawzone_core::db::{Annotation, AnnotationStore, Database};
use chrono::NaiveDate;
use drawzone_core::draw::Draw;
use drawzone_core::loader::{list_periods, load_period};
use drawzone_core::period::PeriodDescriptor;
use drawzone_core::source::DrawSource;
use drawzone_core::zones::GroupSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{
    AnnotationMap, ClassifiedDraw, PeriodView, SessionInfo, UiUpdate, UserCommand,
};

/// `app_state` key holding the name of the last successfully loaded period.
pub const LAST_PERIOD_KEY: &str = "last_period";
/// `app_state` key holding the group last shown in the zone panel.
pub const LAST_GROUP_KEY: &str = "last_group";

// ---------------------------------------------------------------------------
// Load events
// ---------------------------------------------------------------------------

/// Results sent back from spawned load tasks.
#[derive(Debug)]
pub enum LoadEvent {
    Periods(Result<Vec<PeriodDescriptor>, String>),
    Period {
        generation: u64,
        name: String,
        result: Result<(Vec<Draw>, Vec<Annotation>), String>,
    },
}

// ---------------------------------------------------------------------------
// Database writer
// ---------------------------------------------------------------------------

/// One queued database write.
#[derive(Debug, Clone, PartialEq)]
pub enum DbWrite {
    /// Store `note` for (date, group); a blank note removes it.
    Annotation {
        date: NaiveDate,
        group: String,
        note: String,
    },
    State {
        key: &'static str,
        value: serde_json::Value,
    },
}

impl DbWrite {
    fn apply(&self, db: &Database) -> anyhow::Result<()> {
        match self {
            DbWrite::Annotation { date, group, note } => db.put(*date, group, note),
            DbWrite::State { key, value } => db.save_state(key, value),
        }
    }

    fn describe(&self) -> String {
        match self {
            DbWrite::Annotation { date, group, .. } => format!("saving annotation {date}/{group}"),
            DbWrite::State { key, .. } => format!("saving {key}"),
        }
    }
}

/// Spawn the task that owns all database writes. Writes run one at a time on
/// the blocking pool in the order they were sent; failures are only logged.
/// The task ends once every sender is dropped and the queue is drained.
pub fn spawn_db_writer(
    db: Arc<Database>,
) -> (mpsc::UnboundedSender<DbWrite>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<DbWrite>();
    let handle = tokio::spawn(async move {
        while let Some(write) = rx.recv().await {
            let db = Arc::clone(&db);
            let joined = tokio::task::spawn_blocking(move || {
                let result = write.apply(&db);
                (write, result)
            })
            .await;
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((write, Err(e))) => warn!("{} failed: {e:#}", write.describe()),
                Err(e) => warn!("database write task failed: {e}"),
            }
        }
        debug!("database writer stopped");
    });
    (tx, handle)
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub groups: GroupSet,
    pub default_group: String,
    pub user: CurrentUser,
    pub source: Arc<dyn DrawSource>,
    pub db: Arc<Database>,
    pub periods: Vec<PeriodDescriptor>,
    /// Name of the period currently shown (or being loaded).
    pub current_period: Option<String>,
    /// Incremented for every load request. Results carrying an older value
    /// are discarded, so the latest request always wins.
    pub load_generation: u64,
    pub current_load: Option<tokio::task::JoinHandle<()>>,
    load_tx: mpsc::Sender<LoadEvent>,
    writes: mpsc::UnboundedSender<DbWrite>,
    writer: Option<tokio::task::JoinHandle<()>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        user: CurrentUser,
        source: Arc<dyn DrawSource>,
        db: Arc<Database>,
        load_tx: mpsc::Sender<LoadEvent>,
    ) -> Self {
        let (writes, writer) = spawn_db_writer(Arc::clone(&db));
        AppState {
            groups: config.groups.clone(),
            default_group: config.ui.default_group.clone(),
            user,
            source,
            db,
            periods: Vec::new(),
            current_period: None,
            load_generation: 0,
            current_load: None,
            load_tx,
            writes,
            writer: Some(writer),
        }
    }

    /// Queue a database write without waiting for it.
    pub fn persist(&self, write: DbWrite) {
        if self.writes.send(write).is_err() {
            warn!("database writer is gone; write dropped");
        }
    }

    /// Close the write queue and wait for queued writes to land.
    pub async fn flush_writes(&mut self) {
        let (closed, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.writes, closed));
        if let Some(handle) = self.writer.take() {
            if let Err(e) = handle.await {
                warn!("database writer ended abnormally: {e}");
            }
        }
    }

    /// Session facts for the TUI. A remembered zone-panel group wins over
    /// the configured default when it still exists.
    pub fn session_info(&self) -> SessionInfo {
        let remembered = match self.db.load_state(LAST_GROUP_KEY) {
            Ok(value) => value.and_then(|v| v.as_str().map(str::to_string)),
            Err(e) => {
                warn!("failed to read {LAST_GROUP_KEY}: {e:#}");
                None
            }
        };
        let default_group = remembered
            .filter(|g| self.groups.get(g).is_some())
            .unwrap_or_else(|| self.default_group.clone());

        SessionInfo {
            user_label: self.user.label().to_string(),
            source: self.source.describe(),
            groups: self.groups.clone(),
            default_group,
        }
    }

    /// Spawn a listing task.
    pub fn refresh_periods(&self) {
        let source = Arc::clone(&self.source);
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = list_periods(source.as_ref()).await.map_err(|e| e.to_string());
            let _ = tx.send(LoadEvent::Periods(result)).await;
        });
    }

    /// Spawn a load task for `name`, superseding any load in flight.
    pub fn start_load(&mut self, name: String) {
        if let Some(handle) = self.current_load.take() {
            handle.abort();
        }

        self.load_generation += 1;
        let generation = self.load_generation;
        self.current_period = Some(name.clone());

        let source = Arc::clone(&self.source);
        let store: Arc<dyn AnnotationStore> = self.db.clone();
        let tx = self.load_tx.clone();

        let handle = tokio::spawn(async move {
            let result = match load_period(source.as_ref(), &name).await {
                Ok(draws) => {
                    let annotations = read_annotations(store, &draws).await;
                    Ok((draws, annotations))
                }
                Err(e) => Err(e.to_string()),
            };
            let _ = tx
                .send(LoadEvent::Period {
                    generation,
                    name,
                    result,
                })
                .await;
        });
        self.current_load = Some(handle);
        info!("loading period (gen: {})", generation);
    }

    fn descriptor_for(&self, name: &str) -> PeriodDescriptor {
        self.periods
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| PeriodDescriptor::from_name(name))
    }

    /// Period to open once the listing arrives: the remembered one if it is
    /// still listed, else the first entry.
    fn initial_period(&self) -> Option<String> {
        let remembered = self
            .db
            .load_state(LAST_PERIOD_KEY)
            .ok()
            .flatten()
            .and_then(|v| v.as_str().map(str::to_string));
        remembered
            .filter(|name| self.periods.iter().any(|p| &p.name == name))
            .or_else(|| self.periods.first().map(|p| p.name.clone()))
    }
}

/// Annotations for the loaded draws. Failures are logged and yield none.
async fn read_annotations(store: Arc<dyn AnnotationStore>, draws: &[Draw]) -> Vec<Annotation> {
    let dates: Vec<_> = draws.iter().map(|d| d.date).collect();
    let joined = tokio::task::spawn_blocking(move || store.load_for_dates(&dates)).await;
    match joined {
        Ok(Ok(annotations)) => annotations,
        Ok(Err(e)) => {
            warn!("failed to read annotations: {e:#}");
            Vec::new()
        }
        Err(e) => {
            warn!("annotation read task failed: {e}");
            Vec::new()
        }
    }
}

/// Classify every draw against `groups` and attach annotations.
pub fn build_period_view(
    period: PeriodDescriptor,
    draws: Vec<Draw>,
    annotations: Vec<Annotation>,
    groups: &GroupSet,
) -> PeriodView {
    let draws = draws
        .into_iter()
        .map(|draw| ClassifiedDraw {
            classifications: classify_all(&draw.numbers, groups),
            draw,
        })
        .collect();
    let annotations: AnnotationMap = annotations
        .into_iter()
        .map(|a| ((a.draw_date, a.group), a.note))
        .collect();
    PeriodView {
        period,
        draws,
        annotations,
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Sends the session info, starts the period listing, then services load
/// results and user commands until `Quit` or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut load_rx: mpsc::Receiver<LoadEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let _ = ui_tx
        .send(UiUpdate::Session(Box::new(state.session_info())))
        .await;
    state.refresh_periods();

    loop {
        tokio::select! {
            event = load_rx.recv() => {
                match event {
                    Some(event) => handle_load_event(&mut state, event, &ui_tx).await,
                    // AppState holds a sender, so this only happens on teardown.
                    None => break,
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    if let Some(handle) = state.current_load.take() {
        handle.abort();
    }
    state.flush_writes().await;
    Ok(())
}

async fn handle_load_event(state: &mut AppState, event: LoadEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    match event {
        LoadEvent::Periods(Ok(periods)) => {
            info!("{} periods available from {}", periods.len(), state.source.describe());
            state.periods = periods.clone();
            let _ = ui_tx.send(UiUpdate::Periods(periods)).await;

            if state.current_period.is_none() {
                if let Some(name) = state.initial_period() {
                    let _ = ui_tx.send(UiUpdate::Loading(name.clone())).await;
                    state.start_load(name);
                }
            }
        }
        LoadEvent::Periods(Err(message)) => {
            warn!("period listing failed: {}", message);
            let _ = ui_tx.send(UiUpdate::PeriodsFailed(message)).await;
        }
        LoadEvent::Period { generation, .. } if generation != state.load_generation => {
            debug!(
                "Discarding stale load result (event gen: {}, current gen: {})",
                generation, state.load_generation
            );
        }
        LoadEvent::Period {
            name,
            result: Ok((draws, annotations)),
            ..
        } => {
            state.current_load = None;
            let view = build_period_view(state.descriptor_for(&name), draws, annotations, &state.groups);
            info!("period {} ready ({} draws)", name, view.draws.len());
            let _ = ui_tx.send(UiUpdate::PeriodLoaded(Box::new(view))).await;

            state.persist(DbWrite::State {
                key: LAST_PERIOD_KEY,
                value: serde_json::Value::String(name),
            });
        }
        LoadEvent::Period {
            name,
            result: Err(message),
            ..
        } => {
            state.current_load = None;
            warn!("loading {} failed: {}", name, message);
            let _ = ui_tx.send(UiUpdate::LoadFailed { name, message }).await;
        }
    }
}

async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::LoadPeriod(name) => {
            let _ = ui_tx.send(UiUpdate::Loading(name.clone())).await;
            state.start_load(name);
        }
        UserCommand::RefreshPeriods => state.refresh_periods(),
        UserCommand::SaveAnnotation { date, group, note } => {
            let note = note.trim().to_string();
            state.persist(DbWrite::Annotation {
                date,
                group: group.clone(),
                note: note.clone(),
            });
            let _ = ui_tx
                .send(UiUpdate::AnnotationChanged { date, group, note })
                .await;
        }
        UserCommand::SelectGroup(group) => {
            state.persist(DbWrite::State {
                key: LAST_GROUP_KEY,
                value: serde_json::Value::String(group),
            });
        }
        UserCommand::Quit => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
