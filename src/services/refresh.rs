//! Refresh/alert controller.
//!
//! Polls the backend for positions and margin status, keeps the last good data
//! (or a designated fallback) when a fetch fails, and raises an edge-triggered
//! margin-call alert.
//!
//! The controller runs as one task that exclusively owns [`DashboardState`].
//! Commands arrive over an mpsc channel, fetch completions through a
//! `JoinSet`, and every state change is published as a [`DashboardSnapshot`]
//! on a watch channel.

use super::FallbackDataset;
use crate::error::{AppError, Result};
use crate::sources::RiskDataSource;
use crate::types::{MarginStatus, Position};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Data loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing fetched yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Last fetch succeeded.
    Ready,
    /// Last fetch failed; showing cached or fallback data.
    Degraded,
}

/// Margin-call alert state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Clear,
    Alerting,
    Dismissed,
}

/// Where the data currently shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Live,
    Cached,
    Fallback,
}

/// Result of one completed refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Ready,
    Degraded { error: String, origin: DataOrigin },
}

/// Notification sent after every completed refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshEvent {
    /// Sequence number of the cycle, in request order.
    pub cycle: u64,
    pub outcome: RefreshOutcome,
    /// Whether this cycle raised a new margin-call alert.
    pub alert_fired: bool,
    pub margin_call_triggered: bool,
    /// A newer cycle had already completed before this one.
    pub out_of_order: bool,
    pub completed_at: DateTime<Utc>,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub load_state: LoadState,
    pub alert_state: AlertState,
    pub positions: Vec<Position>,
    pub margin_status: Option<MarginStatus>,
    /// Completion time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    /// Error of the last failed fetch, cleared on success.
    pub error: Option<String>,
    pub origin: Option<DataOrigin>,
    /// Fetches currently in flight.
    pub in_flight: usize,
    pub cycles_completed: u64,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            load_state: LoadState::Idle,
            alert_state: AlertState::Clear,
            positions: Vec::new(),
            margin_status: None,
            last_updated: None,
            error: None,
            origin: None,
            in_flight: 0,
            cycles_completed: 0,
        }
    }
}

impl DashboardSnapshot {
    pub fn is_alerting(&self) -> bool {
        self.alert_state == AlertState::Alerting
    }
}

/// Dashboard state machine. Pure: no I/O, no clock.
#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: DashboardSnapshot,
    fallback: FallbackDataset,
    issued_cycles: u64,
    newest_applied: u64,
}

impl DashboardState {
    pub fn new(fallback: FallbackDataset) -> Self {
        Self {
            snapshot: DashboardSnapshot::default(),
            fallback,
            issued_cycles: 0,
            newest_applied: 0,
        }
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    /// Mark a fetch as started and return its cycle number.
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued_cycles += 1;
        self.snapshot.in_flight += 1;
        self.snapshot.load_state = LoadState::Loading;
        self.issued_cycles
    }

    /// Apply a successful fetch. Positions and status replace the current ones
    /// together.
    pub fn apply_success(
        &mut self,
        cycle: u64,
        positions: Vec<Position>,
        margin_status: MarginStatus,
        now: DateTime<Utc>,
    ) -> RefreshEvent {
        let out_of_order = self.complete(cycle);
        let triggered = margin_status.margin_call_triggered();

        self.snapshot.positions = positions;
        self.snapshot.margin_status = Some(margin_status);
        self.snapshot.last_updated = Some(now);
        self.snapshot.error = None;
        self.snapshot.origin = Some(DataOrigin::Live);
        self.snapshot.load_state = LoadState::Ready;

        let alert_fired = self.observe_margin_call(triggered);
        RefreshEvent {
            cycle,
            outcome: RefreshOutcome::Ready,
            alert_fired,
            margin_call_triggered: triggered,
            out_of_order,
            completed_at: now,
        }
    }

    /// Apply a failed fetch: keep cached data if there is any, otherwise load
    /// the fallback dataset. The shown status still drives alerting.
    pub fn apply_failure(&mut self, cycle: u64, error: &str, now: DateTime<Utc>) -> RefreshEvent {
        let out_of_order = self.complete(cycle);

        let origin = match self.snapshot.origin {
            Some(DataOrigin::Live) | Some(DataOrigin::Cached) => DataOrigin::Cached,
            Some(DataOrigin::Fallback) => DataOrigin::Fallback,
            None => {
                self.snapshot.positions = self.fallback.positions.clone();
                self.snapshot.margin_status = Some(self.fallback.margin_status.clone());
                DataOrigin::Fallback
            }
        };
        self.snapshot.origin = Some(origin);
        self.snapshot.error = Some(error.to_string());
        self.snapshot.load_state = LoadState::Degraded;

        let triggered = self
            .snapshot
            .margin_status
            .as_ref()
            .map(MarginStatus::margin_call_triggered)
            .unwrap_or(false);
        let alert_fired = self.observe_margin_call(triggered);

        RefreshEvent {
            cycle,
            outcome: RefreshOutcome::Degraded {
                error: error.to_string(),
                origin,
            },
            alert_fired,
            margin_call_triggered: triggered,
            out_of_order,
            completed_at: now,
        }
    }

    /// Acknowledge an active alert. Returns whether anything changed.
    pub fn dismiss_alert(&mut self) -> bool {
        if self.snapshot.alert_state == AlertState::Alerting {
            self.snapshot.alert_state = AlertState::Dismissed;
            true
        } else {
            false
        }
    }

    /// Edge detection: fire only on Clear -> Alerting; a healthy status
    /// re-arms.
    fn observe_margin_call(&mut self, triggered: bool) -> bool {
        match (triggered, self.snapshot.alert_state) {
            (true, AlertState::Clear) => {
                self.snapshot.alert_state = AlertState::Alerting;
                true
            }
            (true, _) => false,
            (false, _) => {
                self.snapshot.alert_state = AlertState::Clear;
                false
            }
        }
    }

    fn complete(&mut self, cycle: u64) -> bool {
        self.snapshot.in_flight = self.snapshot.in_flight.saturating_sub(1);
        self.snapshot.cycles_completed += 1;
        let out_of_order = cycle < self.newest_applied;
        self.newest_applied = self.newest_applied.max(cycle);
        out_of_order
    }
}

/// Capability to drive a refresh controller.
pub trait RefreshRequester {
    /// Start a refresh cycle now.
    fn request_refresh(&self) -> Result<()>;

    /// Acknowledge the active margin-call alert.
    fn dismiss_alert(&self) -> Result<()>;
}

/// Capability to be told about completed refresh cycles.
pub trait RefreshListener: Send + Sync {
    fn on_refresh_complete(&self, event: &RefreshEvent);
}

/// Listener that writes every cycle to the log.
pub struct LoggingListener;

impl RefreshListener for LoggingListener {
    fn on_refresh_complete(&self, event: &RefreshEvent) {
        match &event.outcome {
            RefreshOutcome::Ready => info!(cycle = event.cycle, "Dashboard data refreshed"),
            RefreshOutcome::Degraded { error, origin } => warn!(
                cycle = event.cycle,
                ?origin,
                "Failed to fetch data, showing fallback: {}",
                error
            ),
        }
        if event.alert_fired {
            error!(cycle = event.cycle, "MARGIN CALL TRIGGERED");
        }
    }
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub client_id: u64,
    pub interval: Duration,
    pub fallback: FallbackDataset,
}

#[derive(Debug)]
enum Command {
    Refresh,
    DismissAlert,
    Shutdown,
}

/// Cloneable command side of a running controller.
#[derive(Debug, Clone)]
pub struct RefreshCommander {
    commands: mpsc::UnboundedSender<Command>,
}

impl RefreshCommander {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::ControllerStopped)
    }
}

impl RefreshRequester for RefreshCommander {
    fn request_refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    fn dismiss_alert(&self) -> Result<()> {
        self.send(Command::DismissAlert)
    }
}

/// Owner of a running refresh controller. Dropping it stops the periodic
/// timer and aborts in-flight fetches.
pub struct RefreshHandle {
    commander: RefreshCommander,
    snapshots: watch::Receiver<DashboardSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Spawn the controller. The first refresh runs immediately, then every
    /// `settings.interval`.
    pub fn spawn(
        source: Arc<dyn RiskDataSource>,
        settings: RefreshSettings,
        listeners: Vec<Arc<dyn RefreshListener>>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(DashboardSnapshot::default());

        let task = tokio::spawn(run_controller(
            source,
            settings,
            listeners,
            command_rx,
            snapshot_tx,
        ));

        Self {
            commander: RefreshCommander {
                commands: command_tx,
            },
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// Cloneable command sender.
    pub fn commander(&self) -> RefreshCommander {
        self.commander.clone()
    }

    /// Stop the controller and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.commander.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Refresh controller task failed: {}", e);
                }
            }
        }
    }
}

impl RefreshRequester for RefreshHandle {
    fn request_refresh(&self) -> Result<()> {
        self.commander.request_refresh()
    }

    fn dismiss_alert(&self) -> Result<()> {
        self.commander.dismiss_alert()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

type CycleResult = (u64, Result<(Vec<Position>, MarginStatus)>);

async fn run_controller(
    source: Arc<dyn RiskDataSource>,
    settings: RefreshSettings,
    listeners: Vec<Arc<dyn RefreshListener>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    publisher: watch::Sender<DashboardSnapshot>,
) {
    let client_id = settings.client_id;
    let mut state = DashboardState::new(settings.fallback);
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: JoinSet<CycleResult> = JoinSet::new();

    info!(
        client_id,
        interval_secs = settings.interval.as_secs(),
        "Refresh controller started"
    );

    let start_cycle = |state: &mut DashboardState, in_flight: &mut JoinSet<CycleResult>| {
        let cycle = state.begin_refresh();
        publisher.send_replace(state.snapshot().clone());
        debug!(cycle, "Starting refresh cycle");

        let source = source.clone();
        in_flight.spawn(async move { (cycle, fetch_cycle(source.as_ref(), client_id).await) });
    };

    loop {
        tokio::select! {
            _ = ticker.tick() => start_cycle(&mut state, &mut in_flight),
            command = commands.recv() => match command {
                Some(Command::Refresh) => start_cycle(&mut state, &mut in_flight),
                Some(Command::DismissAlert) => {
                    if state.dismiss_alert() {
                        info!("Margin call alert dismissed");
                        publisher.send_replace(state.snapshot().clone());
                    }
                }
                Some(Command::Shutdown) | None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let now = Utc::now();
                let event = match joined {
                    Ok((cycle, Ok((positions, status)))) => {
                        state.apply_success(cycle, positions, status, now)
                    }
                    Ok((cycle, Err(e))) => state.apply_failure(cycle, &e.to_string(), now),
                    // the fetch task panicked; its cycle number is lost with it
                    Err(e) => state.apply_failure(0, &format!("refresh task failed: {}", e), now),
                };
                if event.out_of_order {
                    debug!(cycle = event.cycle, "Older refresh completed last and overwrote newer data");
                }
                for listener in &listeners {
                    listener.on_refresh_complete(&event);
                }
                publisher.send_replace(state.snapshot().clone());
            }
        }
    }

    in_flight.abort_all();
    info!("Refresh controller stopped");
}

/// Fetch positions and margin status concurrently; the cycle fails if either
/// does.
async fn fetch_cycle(
    source: &dyn RiskDataSource,
    client_id: u64,
) -> Result<(Vec<Position>, MarginStatus)> {
    tokio::try_join!(
        source.fetch_positions(client_id),
        source.fetch_margin_status(client_id)
    )
}
