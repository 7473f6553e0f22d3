//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. Input comes from a script; renders, alerts and
//! exits are recorded. It implements [`Driver`] so the same
//! [`carebridge_app::Runtime`] orchestration code runs in both production and
//! simulation.

use std::collections::VecDeque;

use carebridge_app::{App, AppEvent, Driver, KeyInput, Phase};
use carebridge_core::env::Environment;

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted input step.
#[derive(Debug)]
pub enum Step {
    /// Deliver an event.
    Event(AppEvent),
    /// Poll once without input.
    Idle,
    /// Fail the poll with a driver error.
    Fail(String),
}

/// What the screen showed at the last render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScreen {
    /// Screen phase.
    pub phase: Phase,
    /// Number of participant tiles.
    pub tiles: usize,
    /// Number of transcript entries.
    pub messages: usize,
    /// Composer text.
    pub composer: String,
    /// Microphone on.
    pub microphone: bool,
    /// Camera on.
    pub camera: bool,
}

/// Simulation driver for deterministic testing.
///
/// Once the script is exhausted, polls never resolve, so the loop is driven
/// by room events alone. Scripts should therefore end by leaving the call.
#[derive(Debug, Default)]
pub struct SimDriver {
    script: VecDeque<Step>,
    renders: usize,
    last_screen: Option<RenderedScreen>,
    alerts: Vec<String>,
    exits: usize,
    /// Successful renders allowed before every further render fails.
    render_budget: Option<usize>,
}

impl SimDriver {
    /// Driver with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver that plays `steps` in order.
    pub fn scripted(steps: impl IntoIterator<Item = Step>) -> Self {
        Self { script: steps.into_iter().collect(), ..Self::default() }
    }

    /// Append a step.
    pub fn push(&mut self, step: Step) {
        self.script.push_back(step);
    }

    /// Append key presses typing `text`.
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.push(Step::Event(AppEvent::Key(KeyInput::Char(c))));
        }
    }

    /// Append a single key press.
    pub fn press(&mut self, key: KeyInput) {
        self.push(Step::Event(AppEvent::Key(key)));
    }

    /// Make every render fail.
    #[must_use]
    pub fn failing_render(self) -> Self {
        self.failing_render_after(0)
    }

    /// Let `successes` renders through, then fail every later one.
    #[must_use]
    pub fn failing_render_after(mut self, successes: usize) -> Self {
        self.render_budget = Some(successes);
        self
    }

    /// Number of successful renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Screen at the last successful render. `None` before the first.
    pub fn last_screen(&self) -> Option<&RenderedScreen> {
        self.last_screen.as_ref()
    }

    /// Alerts shown, in order.
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Number of exit calls.
    pub fn exits(&self) -> usize {
        self.exits
    }

    /// Steps not yet played.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, SimDriverError> {
        match self.script.pop_front() {
            Some(Step::Event(event)) => Ok(Some(event)),
            Some(Step::Idle) => Ok(None),
            Some(Step::Fail(reason)) => Err(SimDriverError(reason)),
            None => std::future::pending().await,
        }
    }

    fn render<E: Environment>(&mut self, app: &App<E>) -> Result<(), SimDriverError> {
        if self.render_budget.is_some_and(|budget| self.renders >= budget) {
            return Err(SimDriverError("render failed".to_string()));
        }

        self.renders += 1;
        self.last_screen = Some(RenderedScreen {
            phase: app.phase(),
            tiles: app.tiles().len(),
            messages: app.transcript().len(),
            composer: app.composer().text().to_string(),
            microphone: app.microphone_enabled(),
            camera: app.camera_enabled(),
        });
        Ok(())
    }

    fn alert(&mut self, message: &str) -> Result<(), SimDriverError> {
        tracing::debug!(message, "sim alert");
        self.alerts.push(message.to_string());
        Ok(())
    }

    fn exit(&mut self) {
        self.exits += 1;
    }
}
