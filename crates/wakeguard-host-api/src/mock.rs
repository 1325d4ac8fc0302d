//! Mock host for testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use wakeguard_api::{StatusMessage, TrayPresence};

use crate::{
    ExecutionState, Host, HostCapabilities, HostError, HostResult, InputBatch, InputInjector,
    MessageLevel, PowerRequest, PromptOutcome, StatusSurface, TrayEvent,
};

/// In-memory power request
pub struct MockPower {
    state: Mutex<ExecutionState>,
    history: Mutex<Vec<ExecutionState>>,

    /// Configure set_state to fail
    pub fail_set: Arc<Mutex<bool>>,
}

impl MockPower {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ExecutionState::BASELINE),
            history: Mutex::new(Vec::new()),
            fail_set: Arc::new(Mutex::new(false)),
        }
    }

    /// Every state successfully applied, in order (no-op sets excluded)
    pub fn history(&self) -> Vec<ExecutionState> {
        self.history.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail_set.lock().unwrap() = fail;
    }
}

impl Default for MockPower {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerRequest for MockPower {
    fn set_state(&self, state: ExecutionState) -> HostResult<ExecutionState> {
        if *self.fail_set.lock().unwrap() {
            return Err(HostError::DBus("Mock power request failure".into()));
        }

        let mut current = self.state.lock().unwrap();
        let previous = *current;
        if previous != state {
            *current = state;
            self.history.lock().unwrap().push(state);
        }
        Ok(previous)
    }

    fn current(&self) -> ExecutionState {
        *self.state.lock().unwrap()
    }
}

/// In-memory input injector
pub struct MockInput {
    batches: Mutex<Vec<InputBatch>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,

    /// Configure inject to fail
    pub fail_inject: Arc<Mutex<bool>>,

    /// Block inside inject for this long (simulates a slow OS call)
    pub delay: Arc<Mutex<Option<Duration>>>,
}

impl MockInput {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_inject: Arc::new(Mutex::new(false)),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Batches delivered successfully
    pub fn batches(&self) -> Vec<InputBatch> {
        self.batches.lock().unwrap().clone()
    }

    /// Every inject call, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of inject calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail_inject.lock().unwrap() = fail;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }
}

impl Default for MockInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for MockInput {
    fn inject(&self, batch: &InputBatch) -> HostResult<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if *self.fail_inject.lock().unwrap() {
            return Err(HostError::InjectionRejected("Mock injection failure".into()));
        }

        self.batches.lock().unwrap().push(batch.clone());
        Ok(batch.len())
    }
}

/// In-memory status surface
pub struct MockSurface {
    tray: Mutex<Option<TrayPresence>>,
    hide_calls: AtomicUsize,
    event_tx: mpsc::UnboundedSender<TrayEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<TrayEvent>>>,
    prompts: Mutex<Vec<StatusMessage>>,
    prompt_script: Mutex<VecDeque<PromptOutcome>>,
    hold_prompts: AtomicBool,
    prompt_release: Notify,
    messages: Mutex<Vec<(MessageLevel, String, String)>>,
}

impl MockSurface {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            tray: Mutex::new(None),
            hide_calls: AtomicUsize::new(0),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
            prompts: Mutex::new(Vec::new()),
            prompt_script: Mutex::new(VecDeque::new()),
            hold_prompts: AtomicBool::new(false),
            prompt_release: Notify::new(),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Simulate a primary click on the tray icon
    pub fn click(&self) {
        let _ = self.event_tx.send(TrayEvent::PrimaryClick);
    }

    /// Simulate selecting the "Exit" menu item
    pub fn select_exit(&self) {
        let _ = self.event_tx.send(TrayEvent::MenuExit);
    }

    /// Queue the answer for the next prompt. Unscripted prompts are dismissed.
    pub fn script_prompt(&self, outcome: PromptOutcome) {
        self.prompt_script.lock().unwrap().push_back(outcome);
    }

    /// Keep prompts open until [`MockSurface::release_prompt`] is called
    pub fn hold_prompts(&self, hold: bool) {
        self.hold_prompts.store(hold, Ordering::SeqCst);
    }

    /// Let one held prompt answer
    pub fn release_prompt(&self) {
        self.prompt_release.notify_one();
    }

    /// Tray presence currently shown, if any
    pub fn tray(&self) -> Option<TrayPresence> {
        self.tray.lock().unwrap().clone()
    }

    pub fn hide_calls(&self) -> usize {
        self.hide_calls.load(Ordering::SeqCst)
    }

    /// Every prompt shown, in order
    pub fn prompts(&self) -> Vec<StatusMessage> {
        self.prompts.lock().unwrap().clone()
    }

    /// Every one-way message shown, in order
    pub fn messages(&self) -> Vec<(MessageLevel, String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusSurface for MockSurface {
    fn show_tray(&self, presence: &TrayPresence) {
        *self.tray.lock().unwrap() = Some(presence.clone());
    }

    fn hide_tray(&self) {
        self.hide_calls.fetch_add(1, Ordering::SeqCst);
        *self.tray.lock().unwrap() = None;
    }

    fn subscribe(&self) -> HostResult<mpsc::UnboundedReceiver<TrayEvent>> {
        self.event_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| HostError::Internal("tray already has a subscriber".into()))
    }

    async fn prompt(&self, message: &StatusMessage) -> HostResult<PromptOutcome> {
        self.prompts.lock().unwrap().push(message.clone());

        if self.hold_prompts.load(Ordering::SeqCst) {
            self.prompt_release.notified().await;
        }

        let outcome = self.prompt_script.lock().unwrap().pop_front();
        Ok(outcome.unwrap_or(PromptOutcome::Dismissed))
    }

    async fn message(&self, level: MessageLevel, title: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, title.to_string(), body.to_string()));
    }
}

/// Mock host wiring the three doubles together
pub struct MockHost {
    capabilities: HostCapabilities,
    pub power: Arc<MockPower>,
    pub input: Arc<MockInput>,
    pub surface: Arc<MockSurface>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::mock(),
            power: Arc::new(MockPower::new()),
            input: Arc::new(MockInput::new()),
            surface: Arc::new(MockSurface::new()),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn power(&self) -> Arc<dyn PowerRequest> {
        self.power.clone()
    }

    fn input(&self) -> Arc<dyn InputInjector> {
        self.input.clone()
    }

    fn surface(&self) -> Arc<dyn StatusSurface> {
        self.surface.clone()
    }
}
