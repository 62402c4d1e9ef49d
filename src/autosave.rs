use crate::clock::Millis;
use crate::deferred::Deferred;
use crate::session::{instant_of, DraftSnapshot};
use crate::storage::{write_json, Storage, StorageError, CURRENT_DRAFT_KEY};
use chrono::Local;

/// Quiet period before a scheduled snapshot is written.
pub const DEFAULT_DEBOUNCE_MS: Millis = 1000;
/// How long `Saving` stays visible after a write.
pub const DEFAULT_SAVING_VISIBLE_MS: Millis = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved(Millis),
}

impl SaveStatus {
    /// Status line text, e.g. "Saving..." or "Saved 14:05".
    pub fn label(&self) -> Option<String> {
        match self {
            SaveStatus::Idle => None,
            SaveStatus::Saving => Some("Saving...".to_string()),
            SaveStatus::Saved(at) => {
                let at = instant_of(*at)?.with_timezone(&Local);
                Some(format!("Saved {}", at.format("%H:%M")))
            }
        }
    }
}

/// Coalesces draft snapshots into one scratch-slot write per quiet period.
///
/// Only the most recent snapshot is kept; scheduling again restarts the
/// quiet period. `flush` and `cancel` settle the pending write immediately,
/// so nothing fires after the draft changes identity.
#[derive(Debug)]
pub struct AutosaveScheduler<S: Storage> {
    storage: S,
    debounce_ms: Millis,
    saving_visible_ms: Millis,
    pending: Deferred<DraftSnapshot>,
    settle: Deferred<Millis>,
    status: SaveStatus,
}

impl<S: Storage> AutosaveScheduler<S> {
    pub fn new(storage: S) -> Self {
        Self::with_timings(storage, DEFAULT_DEBOUNCE_MS, DEFAULT_SAVING_VISIBLE_MS)
    }

    pub fn with_timings(storage: S, debounce_ms: Millis, saving_visible_ms: Millis) -> Self {
        Self {
            storage,
            debounce_ms,
            saving_visible_ms,
            pending: Deferred::new(),
            settle: Deferred::new(),
            status: SaveStatus::Idle,
        }
    }

    /// Supersedes any pending snapshot with `snapshot`.
    pub fn schedule(&mut self, snapshot: DraftSnapshot, now: Millis) {
        self.pending.arm(now + self.debounce_ms, snapshot);
    }

    /// Runs whatever is due at `now`. Returns whether a write happened.
    pub fn poll(&mut self, now: Millis) -> Result<bool, StorageError> {
        let mut wrote = false;
        if let Some(snapshot) = self.pending.take_due(now) {
            self.write_or_rearm(snapshot, now, now + self.debounce_ms)?;
            wrote = true;
        }
        if let Some(saved_at) = self.settle.take_due(now) {
            self.status = SaveStatus::Saved(saved_at);
        }
        Ok(wrote)
    }

    /// Writes the pending snapshot right away, if there is one.
    ///
    /// A failed write leaves the snapshot pending and due immediately.
    pub fn flush(&mut self, now: Millis) -> Result<bool, StorageError> {
        match self.pending.cancel() {
            Some(snapshot) => {
                self.write_or_rearm(snapshot, now, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drops the pending snapshot without writing it.
    pub fn cancel(&mut self) -> bool {
        if let Some(saved_at) = self.settle.cancel() {
            self.status = SaveStatus::Saved(saved_at);
        }
        self.pending.cancel().is_some()
    }

    /// Forgets the last save, as when a fresh entry is started.
    pub fn reset_status(&mut self) {
        self.settle.cancel();
        self.status = SaveStatus::Idle;
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn pending_snapshot(&self) -> Option<&DraftSnapshot> {
        self.pending.peek()
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_due(&self) -> Option<Millis> {
        match (self.pending.due_at(), self.settle.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn write_or_rearm(
        &mut self,
        snapshot: DraftSnapshot,
        now: Millis,
        retry_at: Millis,
    ) -> Result<(), StorageError> {
        if let Err(e) = write_json(&self.storage, CURRENT_DRAFT_KEY, &snapshot) {
            tracing::warn!(id = %snapshot.id, error = %e, "autosave failed, will retry");
            self.pending.arm(retry_at, snapshot);
            return Err(e);
        }
        tracing::debug!(id = %snapshot.id, chars = snapshot.content.len(), "autosaved draft");
        self.status = SaveStatus::Saving;
        self.settle.arm(now + self.saving_visible_ms, now);
        Ok(())
    }
}
