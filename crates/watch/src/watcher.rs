use crate::{Result, WatchError};
use bomref_graph::{GraphSnapshot, Reconstructor, SnapshotStore};
use log::{error, info, warn};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{broadcast, mpsc};
use tokio::time;

const DEFAULT_REASON: &str = "fs_event";

/// Outcome of one rebuild cycle.
#[derive(Debug, Clone)]
pub struct RebuildUpdate {
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub generation: u64,
    pub nodes: usize,
    pub edges: usize,
    pub success: bool,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct DocumentWatcherConfig {
    pub debounce: Duration,
    pub max_batch_wait: Duration,
    pub notify_poll_interval: Duration,
}

impl Default for DocumentWatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(750),
            max_batch_wait: Duration::from_secs(3),
            notify_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Watches a document directory and keeps a `SnapshotStore` current.
#[derive(Clone)]
pub struct DocumentWatcher {
    inner: Arc<DocumentWatcherInner>,
}

struct DocumentWatcherInner {
    command_tx: mpsc::Sender<WatcherCommand>,
    update_tx: broadcast::Sender<RebuildUpdate>,
    store: Arc<SnapshotStore>,
    _watcher: Arc<std::sync::Mutex<Option<RecommendedWatcher>>>,
}

enum WatcherCommand {
    Trigger { reason: String },
    Shutdown,
}

impl DocumentWatcher {
    pub fn start(
        root: impl Into<PathBuf>,
        store: Arc<SnapshotStore>,
        config: DocumentWatcherConfig,
    ) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (update_tx, _) = broadcast::channel(32);

        let watcher = create_fs_watcher(&root, event_tx, config.notify_poll_interval)?;
        let watcher = Arc::new(std::sync::Mutex::new(Some(watcher)));

        spawn_rebuild_loop(
            root,
            store.clone(),
            config,
            event_rx,
            command_rx,
            update_tx.clone(),
        );

        Ok(Self {
            inner: Arc::new(DocumentWatcherInner {
                command_tx,
                update_tx,
                store,
                _watcher: watcher,
            }),
        })
    }

    /// Request a rebuild outside the filesystem event flow (explicit pull
    /// from the query interface).
    pub async fn trigger(&self, reason: impl Into<String>) -> Result<()> {
        self.inner
            .command_tx
            .send(WatcherCommand::Trigger {
                reason: reason.into(),
            })
            .await
            .map_err(|e| WatchError::Other(format!("failed to send trigger: {e}")))?;
        Ok(())
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<RebuildUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn store(&self) -> Arc<SnapshotStore> {
        self.inner.store.clone()
    }
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(WatcherCommand::Shutdown);
        }
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )
    .map_err(|e| WatchError::Other(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|e| WatchError::Other(format!("failed to watch {}: {e}", root.display())))?;
    Ok(watcher)
}

fn spawn_rebuild_loop(
    root: PathBuf,
    store: Arc<SnapshotStore>,
    config: DocumentWatcherConfig,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    update_tx: broadcast::Sender<RebuildUpdate>,
) {
    tokio::spawn(async move {
        let mut state = DebounceState::new(config.debounce, config.max_batch_wait);

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                Some(event) = event_rx.recv() => {
                    handle_event(&root, event, &mut state);
                }
                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        WatcherCommand::Trigger { reason } => state.force_run(reason),
                        WatcherCommand::Shutdown => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if state.should_run() && next_deadline.is_some() => {
                    let reason = state
                        .take_reason()
                        .unwrap_or_else(|| DEFAULT_REASON.to_string());
                    let update = run_rebuild(&root, &store, reason).await;
                    let _ = update_tx.send(update);
                    state.reset();
                }
            }
        }
    });
}

async fn run_rebuild(root: &Path, store: &Arc<SnapshotStore>, reason: String) -> RebuildUpdate {
    let started = Instant::now();
    let scan_root = root.to_path_buf();
    let scanned =
        tokio::task::spawn_blocking(move || Reconstructor::new(scan_root).scan()).await;

    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = started.elapsed().as_millis() as u64;

    match scanned {
        Ok(Ok(reconstruction)) => {
            let snapshot = GraphSnapshot::from_graph(&reconstruction.graph);
            let published = store.publish(snapshot);
            info!(
                "rebuild ({reason}) finished in {duration_ms}ms: generation {}, {} nodes, {} edges",
                published.generation,
                published.node_count(),
                published.edge_count()
            );
            RebuildUpdate {
                completed_at: SystemTime::now(),
                duration_ms,
                generation: published.generation,
                nodes: published.node_count(),
                edges: published.edge_count(),
                success: true,
                reason,
            }
        }
        Ok(Err(err)) => {
            error!("rebuild ({reason}) failed: {err}");
            failed_update(store, duration_ms, reason)
        }
        Err(err) => {
            error!("rebuild ({reason}) task panicked: {err}");
            failed_update(store, duration_ms, reason)
        }
    }
}

fn failed_update(store: &Arc<SnapshotStore>, duration_ms: u64, reason: String) -> RebuildUpdate {
    // The previous generation stays published; a failed rebuild never
    // replaces a good snapshot.
    let current = store.current();
    RebuildUpdate {
        completed_at: SystemTime::now(),
        duration_ms,
        generation: current.generation,
        nodes: current.node_count(),
        edges: current.edge_count(),
        success: false,
        reason,
    }
}

fn handle_event(root: &Path, event: notify::Result<Event>, state: &mut DebounceState) {
    match event {
        Ok(event) => {
            if event.paths.is_empty() {
                state.record_event(DEFAULT_REASON);
                return;
            }
            let mut relevant = false;
            for path in event.paths {
                if is_relevant_path(root, &path) && state.record_path_if_new(&path) {
                    relevant = true;
                }
            }
            if relevant {
                state.record_event(DEFAULT_REASON);
            }
        }
        Err(err) => warn!("watcher error: {err}"),
    }
}

/// Only document files can dirty the rebuild state; temp files from atomic
/// writes and anything outside the root are ignored.
fn is_relevant_path(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).is_ok() && path.extension().is_some_and(|ext| ext == "json")
}

/// Coalescing state for the rebuild loop: any number of events or triggers
/// collapse into at most one pending rebuild, released when the debounce
/// window closes or the max batch wait expires.
struct DebounceState {
    debounce: Duration,
    max_batch: Duration,
    dirty: bool,
    last_event: Option<Instant>,
    first_event: Option<Instant>,
    reason: Option<String>,
    force_immediate: bool,
    recent_paths: VecDeque<(String, Instant)>,
    dedup_window: Duration,
}

impl DebounceState {
    const fn new(debounce: Duration, max_batch: Duration) -> Self {
        Self {
            debounce,
            max_batch,
            dirty: false,
            last_event: None,
            first_event: None,
            reason: None,
            force_immediate: false,
            recent_paths: VecDeque::new(),
            dedup_window: Duration::from_millis(750),
        }
    }

    fn record_event(&mut self, reason: &str) {
        self.reason = Some(reason.to_string());
        self.last_event = Some(Instant::now());
        self.first_event.get_or_insert_with(Instant::now);
        self.dirty = true;
    }

    fn force_run(&mut self, reason: String) {
        self.reason = Some(reason);
        self.force_immediate = true;
        self.dirty = true;
    }

    const fn should_run(&self) -> bool {
        self.dirty
    }

    fn next_deadline(&self) -> Option<time::Instant> {
        if !self.dirty {
            return None;
        }
        if self.force_immediate {
            return Some(time::Instant::now());
        }

        let mut deadline = self.last_event.map(|last| last + self.debounce);
        if let Some(first) = self.first_event {
            let forced = first + self.max_batch;
            deadline = Some(match deadline {
                Some(current) if current < forced => current,
                _ => forced,
            });
        }
        deadline.map(time::Instant::from_std)
    }

    fn take_reason(&mut self) -> Option<String> {
        self.reason.take()
    }

    fn reset(&mut self) {
        self.dirty = false;
        self.last_event = None;
        self.first_event = None;
        self.reason = None;
        self.force_immediate = false;
        self.recent_paths.clear();
    }

    /// Dedup repeated events for one path within the dedup window.
    fn record_path_if_new(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        let key = path.to_string_lossy().to_string();
        self.recent_paths
            .retain(|(_, ts)| now.duration_since(*ts) <= self.dedup_window);
        if self.recent_paths.iter().any(|(p, _)| p == &key) {
            return false;
        }
        self.recent_paths.push_back((key, now));
        true
    }
}
