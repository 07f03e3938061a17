//! Refresh/alert controller tests.

use chrono::Utc;
use margin_monitor::error::{AppError, Result};
use margin_monitor::services::{
    AlertState, DashboardSnapshot, DashboardState, DataOrigin, FallbackDataset, LoadState,
    MarginCalculator, RefreshEvent, RefreshHandle, RefreshListener, RefreshOutcome,
    RefreshRequester, RefreshSettings,
};
use margin_monitor::sources::{BoxFuture, RiskDataSource};
use margin_monitor::types::{
    IncreaseLoanRequest, LoanResponse, MarginStatus, MarketQuote, PayLoanRequest, Position,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

fn healthy() -> MarginStatus {
    MarginCalculator::compute(162_500.0, 50_000.0, 0.25)
}

fn margin_call() -> MarginStatus {
    MarginCalculator::compute(60_000.0, 50_000.0, 0.25)
}

fn positions() -> Vec<Position> {
    vec![Position::new(7, "MSFT", 10.0, 300.0, 320.0)]
}

fn backend_down() -> AppError {
    AppError::Api {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

/// Serves margin statuses from a script, one per fetch.
struct ScriptedSource {
    statuses: Mutex<VecDeque<Result<MarginStatus>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<MarginStatus>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(script.into()),
        })
    }
}

impl RiskDataSource for ScriptedSource {
    fn fetch_positions(&self, _client_id: u64) -> BoxFuture<'_, Result<Vec<Position>>> {
        Box::pin(async { Ok(positions()) })
    }

    fn fetch_margin_status(&self, _client_id: u64) -> BoxFuture<'_, Result<MarginStatus>> {
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(healthy()));
        Box::pin(async move { next })
    }

    fn fetch_market_data(&self) -> BoxFuture<'_, Result<Vec<MarketQuote>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn pay_loan(&self, _request: PayLoanRequest) -> BoxFuture<'_, Result<LoanResponse>> {
        Box::pin(async { Err(backend_down()) })
    }

    fn increase_loan(&self, _request: IncreaseLoanRequest) -> BoxFuture<'_, Result<LoanResponse>> {
        Box::pin(async { Err(backend_down()) })
    }
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<RefreshEvent>>,
}

impl RefreshListener for RecordingListener {
    fn on_refresh_complete(&self, event: &RefreshEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn settings() -> RefreshSettings {
    RefreshSettings {
        client_id: 1,
        interval: Duration::from_secs(3600),
        fallback: FallbackDataset::default(),
    }
}

async fn wait_for_cycles(rx: &mut watch::Receiver<DashboardSnapshot>, cycles: u64) -> DashboardSnapshot {
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.cycles_completed >= cycles && s.in_flight == 0),
    )
    .await
    .expect("timed out waiting for refresh")
    .expect("controller stopped")
    .clone()
}

#[test]
fn test_alert_fires_on_rising_edges_only() {
    let mut state = DashboardState::new(FallbackDataset::default());
    let script = [margin_call(), margin_call(), healthy(), margin_call()];

    let fired: Vec<u64> = script
        .into_iter()
        .filter_map(|status| {
            let cycle = state.begin_refresh();
            let event = state.apply_success(cycle, positions(), status, Utc::now());
            event.alert_fired.then_some(event.cycle)
        })
        .collect();

    assert_eq!(fired, vec![1, 4]);
}

#[test]
fn test_failure_keeps_cached_data() {
    let mut state = DashboardState::new(FallbackDataset::default());
    let first = Utc::now();

    let cycle = state.begin_refresh();
    state.apply_success(cycle, positions(), healthy(), first);

    let cycle = state.begin_refresh();
    let event = state.apply_failure(cycle, "connection refused", Utc::now());

    let snapshot = state.snapshot();
    assert_eq!(snapshot.load_state, LoadState::Degraded);
    assert_eq!(snapshot.positions, positions());
    assert_eq!(snapshot.margin_status, Some(healthy()));
    assert_eq!(snapshot.last_updated, Some(first));
    assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
    assert_eq!(
        event.outcome,
        RefreshOutcome::Degraded {
            error: "connection refused".to_string(),
            origin: DataOrigin::Cached
        }
    );
}

#[test]
fn test_failure_without_cache_uses_fallback() {
    let fallback = FallbackDataset::default();
    let mut state = DashboardState::new(fallback.clone());

    let cycle = state.begin_refresh();
    state.apply_failure(cycle, "timeout", Utc::now());

    let snapshot = state.snapshot();
    assert_eq!(snapshot.origin, Some(DataOrigin::Fallback));
    assert_eq!(snapshot.positions, fallback.positions);
    assert_eq!(snapshot.margin_status, Some(fallback.margin_status));
    assert!(snapshot.last_updated.is_none());
}

#[test]
fn test_fallback_status_drives_alerting() {
    let calculator = MarginCalculator::default();
    let underwater = FallbackDataset::new(positions(), 10_000.0, &calculator);
    let mut state = DashboardState::new(underwater);

    let cycle = state.begin_refresh();
    let event = state.apply_failure(cycle, "timeout", Utc::now());

    assert!(event.alert_fired);
    assert_eq!(state.snapshot().alert_state, AlertState::Alerting);
}

#[test]
fn test_success_after_failure_clears_error() {
    let mut state = DashboardState::new(FallbackDataset::default());

    let cycle = state.begin_refresh();
    state.apply_failure(cycle, "timeout", Utc::now());
    let cycle = state.begin_refresh();
    state.apply_success(cycle, positions(), healthy(), Utc::now());

    let snapshot = state.snapshot();
    assert_eq!(snapshot.load_state, LoadState::Ready);
    assert_eq!(snapshot.origin, Some(DataOrigin::Live));
    assert!(snapshot.error.is_none());
}

#[test]
fn test_overlapping_cycles_last_completion_wins() {
    let mut state = DashboardState::new(FallbackDataset::default());
    let older = state.begin_refresh();
    let newer = state.begin_refresh();

    let newer_status = MarginCalculator::compute(100_000.0, 10_000.0, 0.25);
    let event = state.apply_success(newer, positions(), newer_status, Utc::now());
    assert!(!event.out_of_order);
    assert_eq!(state.snapshot().in_flight, 1);

    let event = state.apply_success(older, vec![], healthy(), Utc::now());
    assert!(event.out_of_order);
    assert_eq!(state.snapshot().margin_status, Some(healthy()));
    assert!(state.snapshot().positions.is_empty());
    assert_eq!(state.snapshot().in_flight, 0);
}

#[tokio::test]
async fn test_controller_refreshes_on_start() {
    let source = ScriptedSource::new(vec![Ok(healthy())]);
    let handle = RefreshHandle::spawn(source, settings(), Vec::new());
    let mut rx = handle.subscribe();

    let snapshot = wait_for_cycles(&mut rx, 1).await;
    assert_eq!(snapshot.load_state, LoadState::Ready);
    assert_eq!(snapshot.positions, positions());
    assert_eq!(snapshot.margin_status, Some(healthy()));
    assert!(snapshot.last_updated.is_some());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_controller_refreshes_on_interval() {
    let source = ScriptedSource::new(Vec::new());
    let mut fast = settings();
    fast.interval = Duration::from_millis(20);
    let listener = Arc::new(RecordingListener::default());
    let handle = RefreshHandle::spawn(source, fast, vec![listener.clone() as Arc<dyn RefreshListener>]);
    let mut rx = handle.subscribe();

    let snapshot = wait_for_cycles(&mut rx, 3).await;
    assert!(snapshot.cycles_completed >= 3);
    assert_eq!(snapshot.load_state, LoadState::Ready);

    let mut cycles: Vec<u64> = listener.events.lock().unwrap().iter().map(|e| e.cycle).collect();
    cycles.sort_unstable();
    assert!(cycles.len() >= 3);
    assert_eq!(&cycles[..3], &[1, 2, 3]);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_controller_alert_sequence() {
    let source = ScriptedSource::new(vec![
        Ok(margin_call()),
        Ok(margin_call()),
        Ok(healthy()),
        Ok(margin_call()),
    ]);
    let listener = Arc::new(RecordingListener::default());
    let handle = RefreshHandle::spawn(source, settings(), vec![listener.clone() as Arc<dyn RefreshListener>]);
    let mut rx = handle.subscribe();

    wait_for_cycles(&mut rx, 1).await;
    for cycle in 2..=4 {
        handle.request_refresh().unwrap();
        wait_for_cycles(&mut rx, cycle).await;
    }

    let events = listener.events.lock().unwrap().clone();
    assert_eq!(events.len(), 4);
    let fired: Vec<u64> = events.iter().filter(|e| e.alert_fired).map(|e| e.cycle).collect();
    assert_eq!(fired, vec![1, 4]);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_controller_degrades_and_dismisses() {
    let source = ScriptedSource::new(vec![Err(backend_down())]);
    let mut fallback = settings();
    fallback.fallback = FallbackDataset::new(positions(), 10_000.0, &MarginCalculator::default());
    let handle = RefreshHandle::spawn(source, fallback, Vec::new());
    let mut rx = handle.subscribe();

    let snapshot = wait_for_cycles(&mut rx, 1).await;
    assert_eq!(snapshot.load_state, LoadState::Degraded);
    assert_eq!(snapshot.origin, Some(DataOrigin::Fallback));
    assert!(snapshot.error.unwrap().contains("Service Unavailable"));
    assert_eq!(snapshot.alert_state, AlertState::Alerting);

    handle.dismiss_alert().unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.alert_state == AlertState::Dismissed),
    )
    .await
    .expect("timed out waiting for dismissal")
    .expect("controller stopped");

    handle.shutdown().await;
}

#[tokio::test]
async fn test_commands_fail_after_shutdown() {
    let source = ScriptedSource::new(Vec::new());
    let handle = RefreshHandle::spawn(source, settings(), Vec::new());
    let commander = handle.commander();

    handle.shutdown().await;

    assert!(matches!(
        commander.request_refresh(),
        Err(AppError::ControllerStopped)
    ));
}

#[tokio::test]
async fn test_dropping_handle_stops_controller() {
    let source = ScriptedSource::new(Vec::new());
    let handle = RefreshHandle::spawn(source, settings(), Vec::new());
    let mut rx = handle.subscribe();
    wait_for_cycles(&mut rx, 1).await;

    drop(handle);

    // the publisher goes away with the aborted task
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while rx.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok());
}
