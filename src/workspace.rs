use crate::autosave::{AutosaveScheduler, SaveStatus};
use crate::clock::{Clock, IdSource, Millis};
use crate::config::Config;
use crate::edit_policy::{check_edit, mode_notice, EditIntent, EditRejected};
use crate::export::{export_text, Export, ExportError};
use crate::metrics::words_per_minute;
use crate::session::{Draft, PaperStyle, Presentation, Session};
use crate::storage::{Storage, StorageError};
use crate::store::SessionStore;
use crate::timer::{Timer, TimerState};
use chrono::{DateTime, Utc};

/// The writing desk as seen by the editor chrome and session picker.
///
/// All state changes arrive as discrete calls on a single thread. Deferred
/// work (countdown ticks, autosave) runs from [`Workspace::poll`]. Any
/// call that changes which draft is open flushes the autosave first, so a
/// pending write can never land under the wrong id.
#[derive(Debug)]
pub struct Workspace<S: Storage + Clone, C: Clock, I: IdSource> {
    store: SessionStore<S, C, I>,
    timer: Timer,
    autosave: AutosaveScheduler<S>,
}

impl<S: Storage + Clone, C: Clock, I: IdSource> Workspace<S, C, I> {
    pub fn open(storage: S, clock: C, ids: I, config: &Config) -> Self {
        let store = SessionStore::open(storage.clone(), clock, ids, Presentation::from(config));
        let timer = match store.restored_time_left() {
            Some(time_left) => Timer::restore(config.countdown_secs, time_left),
            None => Timer::new(config.countdown_secs),
        };
        let autosave = AutosaveScheduler::with_timings(
            storage,
            config.autosave_debounce_ms,
            config.saving_visible_ms,
        );
        Self {
            store,
            timer,
            autosave,
        }
    }

    pub fn get_sessions(&self) -> &[Session] {
        self.store.sessions()
    }

    pub fn draft(&self) -> &Draft {
        self.store.draft()
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn words_per_minute(&self) -> u32 {
        words_per_minute(self.store.draft().counts.words, self.timer.elapsed_secs())
    }

    /// When the draft was started, for the heading above the text.
    pub fn display_date(&self) -> DateTime<Utc> {
        self.store.draft_created_at()
    }

    /// The editor's text changed to `content`.
    pub fn on_content_change(&mut self, content: impl Into<String>) {
        let now = self.store.now_millis();
        self.store.set_content(content.into());
        self.timer.observe_content(&self.store.draft().content, now);
        self.schedule_snapshot(now);
    }

    /// Asks whether an edit may be applied under the current no-delete mode.
    pub fn check_edit(&self, intent: EditIntent) -> Result<(), EditRejected> {
        check_edit(self.store.draft().presentation.is_no_delete_mode, intent)
    }

    /// Flips no-delete mode, returning the notice to show.
    pub fn toggle_no_delete_mode(&mut self) -> &'static str {
        let presentation = self.store.presentation_mut();
        presentation.is_no_delete_mode = !presentation.is_no_delete_mode;
        let enabled = presentation.is_no_delete_mode;
        self.schedule_snapshot(self.store.now_millis());
        mode_notice(enabled)
    }

    pub fn set_font_size(&mut self, font_size: impl Into<String>) {
        self.store.presentation_mut().font_size = font_size.into();
        self.schedule_snapshot(self.store.now_millis());
    }

    pub fn set_font_family(&mut self, font_family: impl Into<String>) {
        self.store.presentation_mut().font_family = font_family.into();
        self.schedule_snapshot(self.store.now_millis());
    }

    pub fn set_paper_style(&mut self, paper_style: PaperStyle) {
        self.store.presentation_mut().paper_style = paper_style;
        self.schedule_snapshot(self.store.now_millis());
    }

    pub fn toggle_timer(&mut self) -> TimerState {
        self.timer.toggle(self.store.now_millis())
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    /// Saves the open draft into the session collection.
    pub fn save(&mut self) -> Result<Option<Session>, StorageError> {
        self.store.upsert(self.timer.elapsed_secs())
    }

    /// Starts a fresh entry, saving the current one first.
    pub fn create_entry(&mut self) -> Result<String, StorageError> {
        let now = self.store.now_millis();
        self.autosave.flush(now)?;
        let id = self.store.new_draft(self.timer.elapsed_secs())?;
        self.timer.reset();
        self.autosave.reset_status();
        self.schedule_snapshot(now);
        Ok(id)
    }

    /// Opens the session with `id`, saving the current draft first.
    /// Returns `false` when there is no such session.
    pub fn select_session(&mut self, id: &str) -> Result<bool, StorageError> {
        let now = self.store.now_millis();
        self.autosave.flush(now)?;
        if !self.store.switch_to(id, self.timer.elapsed_secs())? {
            return Ok(false);
        }
        self.timer.reset();
        self.schedule_snapshot(now);
        Ok(true)
    }

    /// Opens the most recently modified session dated today, if any.
    pub fn open_latest_today(&mut self) -> Result<bool, StorageError> {
        let today = self.store.today();
        let latest = self.store.sessions_on(today).next().map(|s| s.id.clone());
        match latest {
            Some(id) => self.select_session(&id),
            None => Ok(false),
        }
    }

    pub fn export_current_draft(&self) -> Result<Export, ExportError> {
        export_text(&self.store.draft().content)
    }

    /// Runs due countdown ticks and autosave work.
    pub fn poll(&mut self) -> Result<(), StorageError> {
        let now = self.store.now_millis();
        self.timer.poll(now);
        self.autosave.poll(now)?;
        Ok(())
    }

    /// Earliest instant at which [`Workspace::poll`] has work to do.
    pub fn next_wakeup(&self) -> Option<Millis> {
        [self.timer.next_tick_at(), self.autosave.next_due()]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Teardown: stops the countdown and writes any pending snapshot.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.timer.cancel_tick();
        let now = self.store.now_millis();
        self.autosave.flush(now)?;
        Ok(())
    }

    fn schedule_snapshot(&mut self, now: Millis) {
        let snapshot = self.store.draft().snapshot(self.timer.time_left(), now);
        self.autosave.schedule(snapshot, now);
    }
}
