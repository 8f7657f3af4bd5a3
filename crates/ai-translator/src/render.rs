// RenderScheduler — paced, typewriter-style commit of streamed text to a DisplaySink.
//
// Arrival and display are decoupled: pushes grow a target buffer, and a
// drain task commits a prefix of it every tick. Steps grow with the backlog
// so bursts catch up without appearing all at once.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use ai_translator_types::{DisplaySink, RenderPacing, Update};

/// Target and committed text of the panel. Lengths are counted in chars.
///
/// Invariant: `committed` is always a prefix of `target`.
#[derive(Debug, Default)]
pub struct RenderState {
    target: String,
    target_chars: usize,
    committed_chars: usize,
    committed_bytes: usize,
    active: bool,
    generation: u64,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to the target. A non-incremental push starts over:
    /// the target becomes `text` and nothing is committed.
    pub fn push(&mut self, text: &str, incremental: bool) {
        if !incremental {
            self.target.clear();
            self.target_chars = 0;
            self.committed_chars = 0;
            self.committed_bytes = 0;
        }
        self.target.push_str(text);
        self.target_chars += text.chars().count();
    }

    /// Chars received but not yet committed.
    pub fn backlog(&self) -> usize {
        self.target_chars - self.committed_chars
    }

    /// Commit one step. Returns the new committed text, or `None` when there
    /// was nothing left to commit.
    pub fn advance(&mut self, pacing: &RenderPacing) -> Option<&str> {
        let backlog = self.backlog();
        if backlog == 0 {
            return None;
        }
        let step = pacing.step_for(backlog).min(backlog);
        let rest = &self.target[self.committed_bytes..];
        let advance_bytes = rest
            .char_indices()
            .nth(step)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.committed_bytes += advance_bytes;
        self.committed_chars += step;
        Some(self.committed())
    }

    pub fn committed(&self) -> &str {
        &self.target[..self.committed_bytes]
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clear all text and start a new generation. Drain loops of earlier
    /// generations stop at their next tick.
    pub fn reset(&mut self) {
        self.target.clear();
        self.target_chars = 0;
        self.committed_chars = 0;
        self.committed_bytes = 0;
        self.active = false;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            target: self.target.clone(),
            committed: self.committed().to_string(),
            backlog: self.backlog(),
            active: self.active,
        }
    }
}

/// A point-in-time copy of the render state, without the generation counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub target: String,
    pub committed: String,
    pub backlog: usize,
    pub active: bool,
}

/// Drives a [`DisplaySink`] from pushed updates.
///
/// At most one drain task runs at a time. `push` must be called from within
/// a tokio runtime.
pub struct RenderScheduler {
    sink: Arc<dyn DisplaySink>,
    pacing: RenderPacing,
    state: Arc<Mutex<RenderState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("pacing", &self.pacing)
            .field("state", &self.snapshot())
            .finish()
    }
}

impl RenderScheduler {
    pub fn new(sink: Arc<dyn DisplaySink>, pacing: RenderPacing) -> Self {
        Self {
            sink,
            pacing,
            state: Arc::new(Mutex::new(RenderState::new())),
            task: Mutex::new(None),
        }
    }

    pub fn pacing(&self) -> &RenderPacing {
        &self.pacing
    }

    /// Current generation. Changes on every [`reset`](Self::reset).
    pub fn generation(&self) -> u64 {
        lock(&self.state).generation
    }

    /// Queue `update` for display and make sure a drain task is running.
    pub fn push(&self, update: Update) {
        self.push_locked(lock(&self.state), update);
    }

    /// Push `update` only if no reset happened since `generation` was read.
    /// Returns whether the update was accepted.
    pub fn push_if_current(&self, generation: u64, update: Update) -> bool {
        let state = lock(&self.state);
        if state.generation != generation {
            return false;
        }
        self.push_locked(state, update);
        true
    }

    /// The check, the push and the spawn all happen under the caller's guard,
    /// so a concurrent `reset` lands either before or after the whole step.
    fn push_locked(&self, mut state: MutexGuard<'_, RenderState>, update: Update) {
        state.push(update.text(), update.is_incremental());
        if state.active || state.backlog() == 0 {
            return;
        }
        state.active = true;

        let handle = tokio::spawn(drain(
            Arc::clone(&self.state),
            Arc::clone(&self.sink),
            self.pacing.clone(),
            state.generation,
        ));
        *lock(&self.task) = Some(handle);
    }

    /// Stop any drain task and clear all text.
    pub fn reset(&self) {
        lock(&self.state).reset();
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        lock(&self.state).snapshot()
    }

    /// Wait until the drain task has gone idle: everything is committed, the
    /// panel was hidden, or a reset happened.
    pub async fn settle(&self) {
        while lock(&self.state).active {
            tokio::time::sleep(self.pacing.tick()).await;
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

async fn drain(
    state: Arc<Mutex<RenderState>>,
    sink: Arc<dyn DisplaySink>,
    pacing: RenderPacing,
    generation: u64,
) {
    let tick = pacing.tick();
    loop {
        tokio::time::sleep(tick).await;

        let mut guard = lock(&state);
        if guard.generation != generation {
            return;
        }
        if !sink.is_visible() {
            tracing::warn!(backlog = guard.backlog(), "Result panel hidden, stopping render loop");
            guard.active = false;
            return;
        }
        match guard.advance(&pacing) {
            // Rendered under the lock so a concurrent reset cannot interleave.
            Some(committed) => sink.render(committed),
            None => {
                guard.active = false;
                return;
            }
        }
    }
}
