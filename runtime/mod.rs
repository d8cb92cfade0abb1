/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Run lifecycle: the shared run host and the execution controller.
//!
//! Threading model: one UI-owning thread plus at most one worker per
//! run. All shared state lives in [`RunHost`] behind a
//! `parking_lot::RwLock` (the graph) and atomics (flags). The worker
//! takes the graph lock only inside individual accessor calls and
//! never across `step()`, so the UI thread can always read the graph
//! between algorithm moves.
//!
//! Cancellation is cooperative: `request_stop` raises a flag that the
//! algorithm polls through `is_stopped`. Code that never polls runs to
//! completion; there is no kill.

pub mod history;
pub mod log;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, RwLock};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::RunError;
use crate::graph::{EdgeId, ElementState, Graph, RenderHook, StateChange, VertexId};
use crate::script::Script;
use crate::script::vars::ScriptVars;
use crate::settings::{MAX_SPEED, MIN_SPEED};

use self::log::RunLog;

/// Lifecycle of a run. Terminal states persist until the next `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Summary of a finished run, delivered over the event channel.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunState,
    pub script: String,
    pub elapsed: f64,
    pub solved: bool,
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    Finished(RunReport),
}

/// Callback for non-fatal operational messages (history append
/// failure, save problems). UI shows these in the status bar.
pub type StatusHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Shared state of the running system: the graph plus everything an
/// in-flight run reads and writes. Handed to the worker behind an
/// `Arc`; the proxy layer is a thin veneer over these methods.
pub struct RunHost {
    graph: RwLock<Graph>,
    log: Mutex<RunLog>,
    vars: RwLock<ScriptVars>,

    stopped: AtomicBool,
    solved: AtomicBool,
    animation: AtomicBool,
    speed: AtomicU8,
    execution_time: Mutex<f64>,

    /// Open polyline the script is currently appending to.
    area: Mutex<Vec<(f32, f32)>>,
    /// Closed polylines (region annotations for the canvas).
    regions: Mutex<Vec<Vec<(f32, f32)>>>,

    render: RwLock<Option<RenderHook>>,
}

impl RunHost {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: RwLock::new(graph),
            log: Mutex::new(RunLog::new()),
            vars: RwLock::new(ScriptVars::default()),
            stopped: AtomicBool::new(false),
            solved: AtomicBool::new(false),
            animation: AtomicBool::new(true),
            speed: AtomicU8::new(MAX_SPEED),
            execution_time: Mutex::new(0.0),
            area: Mutex::new(Vec::new()),
            regions: Mutex::new(Vec::new()),
            render: RwLock::new(None),
        }
    }

    /// Read access to the graph. The lock is held only for the
    /// closure's duration.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.graph.read())
    }

    /// Write access to the graph.
    pub fn with_graph_mut<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        f(&mut self.graph.write())
    }

    /// Install the rendering callback (UI layer, once at startup).
    pub fn set_render_hook(&self, hook: RenderHook) {
        *self.render.write() = Some(hook);
    }

    fn emit(&self, change: StateChange) {
        if !self.animation.load(Ordering::Relaxed) {
            // Batched: the UI redraws once on the completion event.
            return;
        }
        let render = self.render.read();
        if let Some(hook) = render.as_ref() {
            hook(change);
        }
    }

    /// Set a vertex's state, notifying the render hook. Unknown ids
    /// no-op (stale handle across runs).
    pub fn set_vertex_state(&self, id: VertexId, state: ElementState) {
        let change = self.graph.write().set_vertex_state(id, state);
        if let Some(change) = change {
            self.emit(change);
        }
    }

    /// Set an edge's state, notifying the render hook.
    pub fn set_edge_state(&self, id: EdgeId, state: ElementState) {
        let change = self.graph.write().set_edge_state(id, state);
        if let Some(change) = change {
            self.emit(change);
        }
    }

    pub fn set_edge_weight(&self, id: EdgeId, weight: f64) {
        let _ = self.graph.write().set_edge_weight(id, weight);
    }

    /// Animation pacing: sleep `(10 - speed)^2 / 100` seconds. Speed
    /// 10 returns immediately.
    pub fn step(&self) {
        let speed = self.speed.load(Ordering::Relaxed);
        if speed >= MAX_SPEED {
            return;
        }
        let gap = (MAX_SPEED - speed) as f64;
        std::thread::sleep(Duration::from_secs_f64(gap * gap / 100.0));
    }

    pub fn set_speed(&self, speed: u8) {
        self.speed
            .store(speed.clamp(MIN_SPEED, MAX_SPEED), Ordering::Relaxed);
    }

    pub fn speed(&self) -> u8 {
        self.speed.load(Ordering::Relaxed)
    }

    pub fn set_animation(&self, on: bool) {
        self.animation.store(on, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Raise the cooperative stop flag. Idempotent.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn set_solved(&self, solved: bool) {
        self.solved.store(solved, Ordering::Relaxed);
    }

    pub fn solved(&self) -> bool {
        self.solved.load(Ordering::Relaxed)
    }

    pub fn set_execution_time(&self, secs: f64) {
        *self.execution_time.lock() = secs;
    }

    pub fn execution_time(&self) -> f64 {
        *self.execution_time.lock()
    }

    /// Append a line to the run log.
    pub fn log_line(&self, text: impl Into<String>, system: bool) {
        self.log.lock().push(text, system);
    }

    /// Read the run log under the lock.
    pub fn with_log<R>(&self, f: impl FnOnce(&RunLog) -> R) -> R {
        f(&self.log.lock())
    }

    pub fn set_vars(&self, vars: ScriptVars) {
        *self.vars.write() = vars;
    }

    pub fn get_var(&self, name: &str) -> Option<serde_json::Value> {
        self.vars.read().get(name).cloned()
    }

    /// Append a point to the open region polyline.
    pub fn area_add(&self, x: f32, y: f32) {
        self.area.lock().push((x, y));
    }

    /// Close the open polyline into a finished region. Empty close is
    /// a no-op.
    pub fn area_close(&self) {
        let mut area = self.area.lock();
        if area.is_empty() {
            return;
        }
        let region = std::mem::take(&mut *area);
        self.regions.lock().push(region);
    }

    pub fn regions(&self) -> Vec<Vec<(f32, f32)>> {
        self.regions.lock().clone()
    }

    /// Reset per-run state and freeze the model for the worker.
    fn prepare_run(&self) {
        self.log.lock().clear();
        self.area.lock().clear();
        self.regions.lock().clear();
        self.stopped.store(false, Ordering::Relaxed);
        self.solved.store(false, Ordering::Relaxed);
        *self.execution_time.lock() = 0.0;
        let mut graph = self.graph.write();
        graph.clear_states();
        graph.set_editable(false);
    }
}

/// Owns the run lifecycle: precondition checks, worker spawn, outcome
/// classification, history append, completion event.
pub struct ExecutionController {
    host: Arc<RunHost>,
    state: Arc<Mutex<RunState>>,
    worker: Option<JoinHandle<()>>,
    events_tx: Sender<RunEvent>,
    events_rx: Receiver<RunEvent>,

    /// Graph name recorded in the history file.
    graph_name: String,
    /// History file; `None` disables history recording.
    history_path: Option<PathBuf>,
    status: Option<StatusHook>,
}

impl ExecutionController {
    pub fn new(graph: Graph) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            host: Arc::new(RunHost::new(graph)),
            state: Arc::new(Mutex::new(RunState::Idle)),
            worker: None,
            events_tx,
            events_rx,
            graph_name: String::new(),
            history_path: None,
            status: None,
        }
    }

    pub fn host(&self) -> &Arc<RunHost> {
        &self.host
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events_rx
    }

    pub fn set_graph_name(&mut self, name: impl Into<String>) {
        self.graph_name = name.into();
    }

    pub fn set_history_path(&mut self, path: Option<PathBuf>) {
        self.history_path = path;
    }

    pub fn set_status_hook(&mut self, hook: StatusHook) {
        self.status = Some(hook);
    }

    /// Start a run. Exactly one worker thread exists per accepted
    /// call; the second concurrent call is rejected without touching
    /// the first.
    pub fn run(&mut self, script: Box<dyn Script>) -> Result<(), RunError> {
        {
            let mut state = self.state.lock();
            if *state == RunState::Running {
                return Err(RunError::AlreadyRunning);
            }
            if self.host.with_graph(|g| g.vertex_count() == 0) {
                return Err(RunError::NothingToRun);
            }
            *state = RunState::Running;
        }
        // The previous worker has already finished (state was not
        // Running); reap its handle.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        self.host.prepare_run();
        self.host
            .log_line(format!("running {}", script.name()), true);

        let host = Arc::clone(&self.host);
        let state = Arc::clone(&self.state);
        let events = self.events_tx.clone();
        let graph_name = self.graph_name.clone();
        let history_path = self.history_path.clone();
        let status = self.status.clone();

        self.worker = Some(std::thread::spawn(move || {
            run_worker(host, state, events, graph_name, history_path, status, script);
        }));
        Ok(())
    }

    /// Cooperative stop request; see module docs.
    pub fn request_stop(&self) {
        self.host.request_stop();
    }

    /// Block until the current run finishes and return its report.
    /// Used by the CLI driver and tests; a UI polls `events()` instead.
    pub fn wait(&mut self) -> Option<RunReport> {
        let handle = self.worker.take()?;
        let _ = handle.join();
        match self.events_rx.try_recv() {
            Ok(RunEvent::Finished(report)) => Some(report),
            Err(_) => None,
        }
    }
}

fn run_worker(
    host: Arc<RunHost>,
    state: Arc<Mutex<RunState>>,
    events: Sender<RunEvent>,
    graph_name: String,
    history_path: Option<PathBuf>,
    status: Option<StatusHook>,
    mut script: Box<dyn Script>,
) {
    let script_name = script.name().to_string();
    let started = Instant::now();
    let proxy = crate::script::HostProxy::new(Arc::clone(&host));

    // Contain algorithm faults: a panic or error inside the script
    // must never take the host down.
    let result = catch_unwind(AssertUnwindSafe(|| script.run(&proxy)));

    let outcome = match result {
        Ok(Ok(())) => {
            if host.is_stopped() {
                RunState::Cancelled
            } else {
                RunState::Completed
            }
        }
        Ok(Err(err)) => {
            ::log::warn!("algorithm '{script_name}' failed: {err}");
            host.log_line(format!("algorithm error: {err}"), true);
            RunState::Failed
        }
        Err(_) => {
            ::log::warn!("algorithm '{script_name}' panicked");
            host.log_line(format!("algorithm '{script_name}' panicked"), true);
            RunState::Failed
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    host.set_execution_time(elapsed);
    host.with_graph_mut(|g| g.set_editable(true));

    if let Some(path) = history_path {
        if let Err(err) = history::append(&path, &graph_name, &script_name, elapsed, host.solved())
        {
            let message = format!("failed to record execution history: {err}");
            match &status {
                Some(hook) => hook(&message),
                None => ::log::warn!("{message}"),
            }
        }
    }

    *state.lock() = outcome;
    let _ = events.send(RunEvent::Finished(RunReport {
        outcome,
        script: script_name,
        elapsed,
        solved: host.solved(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use crate::script::HostProxy;
    use euclid::default::Point2D;

    fn two_vertex_graph() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_vertex("a", Point2D::new(0.0, 0.0)).unwrap();
        let b = graph.add_vertex("b", Point2D::new(1.0, 0.0)).unwrap();
        graph.add_edge(a, b, 1.0).unwrap();
        graph
    }

    struct FnScript<F: FnMut(&HostProxy) -> Result<(), ScriptError> + Send> {
        name: &'static str,
        body: F,
    }

    impl<F: FnMut(&HostProxy) -> Result<(), ScriptError> + Send> Script for FnScript<F> {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&mut self, app: &HostProxy) -> Result<(), ScriptError> {
            (self.body)(app)
        }
    }

    fn script(
        name: &'static str,
        body: impl FnMut(&HostProxy) -> Result<(), ScriptError> + Send + 'static,
    ) -> Box<dyn Script> {
        Box::new(FnScript { name, body })
    }

    #[test]
    fn test_completed_run() {
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller
            .run(script("ok", |app| {
                app.log("$hello");
                app.set_solved(true);
                Ok(())
            }))
            .unwrap();

        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Completed);
        assert!(report.solved);
        assert_eq!(controller.state(), RunState::Completed);
        assert!(controller.host().with_graph(|g| g.is_editable()));
    }

    #[test]
    fn test_empty_graph_rejected() {
        let mut controller = ExecutionController::new(Graph::new());
        let result = controller.run(script("noop", |_| Ok(())));
        assert_eq!(result.unwrap_err(), RunError::NothingToRun);
        assert_eq!(controller.state(), RunState::Idle);
    }

    #[test]
    fn test_concurrent_run_rejected() {
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller
            .run(script("slow", move |_| {
                let _ = release_rx.recv();
                Ok(())
            }))
            .unwrap();

        let rejected = controller.run(script("second", |_| Ok(())));
        assert_eq!(rejected.unwrap_err(), RunError::AlreadyRunning);

        release_tx.send(()).unwrap();
        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Completed);
    }

    #[test]
    fn test_script_error_is_contained() {
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller
            .run(script("broken", |_| Err(ScriptError::new("no such vertex"))))
            .unwrap();

        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Failed);
        // The failure is visible as a system log line.
        let logged = controller
            .host()
            .with_log(|log| log.visible("").join("\n"));
        assert!(logged.contains("no such vertex"));
        assert!(controller.host().with_graph(|g| g.is_editable()));
    }

    #[test]
    fn test_panic_is_contained() {
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller
            .run(script("panicky", |_| panic!("scripted explosion")))
            .unwrap();

        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Failed);
        assert!(controller.host().with_graph(|g| g.is_editable()));
        // The controller is usable again.
        controller.run(script("after", |_| Ok(()))).unwrap();
        assert_eq!(controller.wait().unwrap().outcome, RunState::Completed);
    }

    #[test]
    fn test_cooperative_cancellation() {
        let mut controller = ExecutionController::new(two_vertex_graph());
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);
        controller
            .run(script("poller", move |app| {
                let _ = started_tx.send(());
                while !app.is_stopped() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Ok(())
            }))
            .unwrap();

        started_rx.recv().unwrap();
        controller.request_stop();
        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Cancelled);
    }

    #[test]
    fn test_run_resets_previous_state() {
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller
            .run(script("first", |app| {
                app.log("$leftover");
                app.set_solved(true);
                app.vertex(1)
                    .ok_or_else(|| ScriptError::new("missing"))?
                    .set_state(ElementState::Active);
                Ok(())
            }))
            .unwrap();
        controller.wait().unwrap();

        controller.run(script("second", |_| Ok(()))).unwrap();
        let report = controller.wait().unwrap();
        assert!(!report.solved);
        controller.host().with_graph(|g| {
            assert_eq!(g.vertex_at(0).unwrap().state(), ElementState::None);
        });
        let visible = controller.host().with_log(|log| log.visible("$").join(""));
        assert!(!visible.contains("leftover"));
    }

    #[test]
    fn test_history_appended_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(history::HISTORY_FILE);

        let mut controller = ExecutionController::new(two_vertex_graph());
        controller.set_graph_name("pair");
        controller.set_history_path(Some(path.clone()));
        controller
            .run(script("ok", |app| {
                app.set_solved(true);
                Ok(())
            }))
            .unwrap();
        controller.wait().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\tpair\tok\t"));
        assert!(contents.trim_end().ends_with("true"));
    }

    #[test]
    fn test_history_failure_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the history path makes the append fail.
        let path = dir.path().join("history_dir");
        std::fs::create_dir(&path).unwrap();

        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<String>();
        let mut controller = ExecutionController::new(two_vertex_graph());
        controller.set_history_path(Some(path));
        controller.set_status_hook(Arc::new(move |message: &str| {
            let _ = msg_tx.send(message.to_string());
        }));
        controller.run(script("ok", |_| Ok(()))).unwrap();

        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Completed);
        let message = msg_rx.try_recv().unwrap();
        assert!(message.contains("execution history"));
    }

    #[test]
    fn test_step_is_immediate_at_full_speed() {
        let host = RunHost::new(Graph::new());
        host.set_speed(10);
        let started = Instant::now();
        for _ in 0..100 {
            host.step();
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_speed_is_clamped() {
        let host = RunHost::new(Graph::new());
        host.set_speed(0);
        assert_eq!(host.speed(), MIN_SPEED);
        host.set_speed(200);
        assert_eq!(host.speed(), MAX_SPEED);
    }

    #[test]
    fn test_area_regions() {
        let host = RunHost::new(Graph::new());
        host.area_close();
        assert!(host.regions().is_empty());

        host.area_add(0.0, 0.0);
        host.area_add(1.0, 0.0);
        host.area_add(0.0, 1.0);
        host.area_close();
        host.area_add(5.0, 5.0);
        host.area_close();

        let regions = host.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].len(), 3);
        assert_eq!(regions[1], vec![(5.0, 5.0)]);
    }

    #[test]
    fn test_render_hook_fires_only_when_animating() {
        let (seen_tx, seen_rx) = crossbeam_channel::unbounded::<StateChange>();
        let mut graph = Graph::new();
        let v = graph.add_vertex("a", Point2D::new(0.0, 0.0)).unwrap();
        let host = RunHost::new(graph);
        host.set_render_hook(Box::new(move |change| {
            let _ = seen_tx.send(change);
        }));

        host.set_vertex_state(v, ElementState::Testing);
        assert_eq!(seen_rx.try_recv().unwrap().state, ElementState::Testing);

        host.set_animation(false);
        host.set_vertex_state(v, ElementState::Active);
        assert!(seen_rx.try_recv().is_err());
    }
}
