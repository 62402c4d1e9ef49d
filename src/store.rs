use crate::clock::{Clock, IdSource, Millis};
use crate::session::{
    created_at_from_id, date_of, instant_of, Draft, DraftSnapshot, Presentation, Session,
};
use crate::storage::{write_json, Storage, StorageError, CURRENT_DRAFT_KEY, SESSIONS_KEY};
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;

/// Owns the durable session collection and the single open draft.
///
/// Every mutation of the collection rewrites `writing-sessions` in full.
/// The collection holds at most one record per id and stays sorted by
/// `timestamp`, most recent first.
#[derive(Debug)]
pub struct SessionStore<S: Storage, C: Clock, I: IdSource> {
    storage: S,
    clock: C,
    ids: I,
    sessions: Vec<Session>,
    draft: Draft,
    restored_time_left: Option<u32>,
}

impl<S: Storage, C: Clock, I: IdSource> SessionStore<S, C, I> {
    /// Loads the collection and restores the scratch draft, or starts a
    /// blank draft with a fresh id when there is none.
    pub fn open(storage: S, clock: C, ids: I, defaults: Presentation) -> Self {
        let mut store = Self {
            storage,
            clock,
            ids,
            sessions: Vec::new(),
            draft: Draft::blank(String::new(), defaults),
            restored_time_left: None,
        };
        store.sessions = store.load_all();

        match store.load_current_draft() {
            Some(mut snapshot) => {
                if snapshot.id.trim().is_empty() {
                    snapshot.id = store.ids.new_id();
                }
                store.restored_time_left = Some(snapshot.time_left);
                tracing::debug!(id = %snapshot.id, "restored draft from scratch slot");
                store.draft = Draft::from_snapshot(snapshot);
            }
            None => {
                store.draft.id = store.ids.new_id();
                tracing::debug!(id = %store.draft.id, "started fresh draft");
            }
        }
        store
    }

    /// Reads the durable collection. Absent or malformed data yields an
    /// empty list; individual malformed records are skipped.
    pub fn load_all(&self) -> Vec<Session> {
        let raw = match self.storage.get(SESSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read sessions");
                return Vec::new();
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load sessions, starting empty");
                return Vec::new();
            }
        };

        let mut sessions = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<Session>(record) {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!(error = %e, "skipping malformed session record"),
            }
        }

        sessions
            .into_iter()
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .unique_by(|s| s.id.clone())
            .collect()
    }

    /// Reads the scratch slot; malformed data counts as no draft.
    pub fn load_current_draft(&self) -> Option<DraftSnapshot> {
        let raw = match self.storage.get(CURRENT_DRAFT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read current draft");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load current draft");
                None
            }
        }
    }

    /// Writes the open draft into the collection.
    ///
    /// An existing record is replaced in place, keeping its `date`. A draft
    /// with no record is promoted only when it has content. Returns the
    /// written record, or `None` when nothing was written.
    pub fn upsert(&mut self, elapsed_secs: u32) -> Result<Option<Session>, StorageError> {
        let now = self.clock.now_millis();
        let existing = self.sessions.iter().position(|s| s.id == self.draft.id);

        let (date, timestamp) = match existing {
            Some(idx) => {
                let previous = &self.sessions[idx];
                (previous.date, now.max(previous.timestamp))
            }
            None if self.draft.is_blank() => {
                tracing::debug!(id = %self.draft.id, "blank draft, nothing to promote");
                return Ok(None);
            }
            None => (self.creation_date(&self.draft.id, now), now),
        };

        let session = Session {
            id: self.draft.id.clone(),
            content: self.draft.content.clone(),
            date,
            timestamp,
            word_count: self.draft.counts.words,
            char_count: self.draft.counts.chars,
            duration: elapsed_secs,
            title: self.draft.title(),
            is_no_delete_mode: self.draft.presentation.is_no_delete_mode,
            paper_style: self.draft.presentation.paper_style,
        };

        // in-memory state only follows a successful write
        let mut sessions = self.sessions.clone();
        if let Some(idx) = existing {
            sessions.remove(idx);
        }
        sessions.insert(0, session.clone());
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        write_json(&self.storage, SESSIONS_KEY, &sessions)?;

        match existing {
            Some(_) => tracing::debug!(id = %session.id, "updated session"),
            None => tracing::debug!(id = %session.id, %date, "promoted draft"),
        }
        self.sessions = sessions;
        Ok(Some(session))
    }

    /// Saves the open draft, then starts a blank one under a fresh id.
    pub fn new_draft(&mut self, elapsed_secs: u32) -> Result<String, StorageError> {
        self.upsert(elapsed_secs)?;
        let id = self.ids.new_id();
        self.storage.remove(CURRENT_DRAFT_KEY)?;
        tracing::debug!(previous = %self.draft.id, %id, "new draft");
        self.draft = Draft::blank(id.clone(), self.draft.presentation.clone());
        self.restored_time_left = None;
        Ok(id)
    }

    /// Saves the open draft, then opens the session with `id` in its place.
    ///
    /// Returns `false`, leaving the open draft in place, when no such
    /// session exists.
    pub fn switch_to(&mut self, id: &str, elapsed_secs: u32) -> Result<bool, StorageError> {
        self.upsert(elapsed_secs)?;
        let Some(session) = self.sessions.iter().find(|s| s.id == id) else {
            tracing::warn!(%id, "no session to switch to");
            return Ok(false);
        };
        tracing::debug!(from = %self.draft.id, to = %id, "switching draft");
        self.draft = Draft::from_session(session, &self.draft.presentation);
        self.restored_time_left = None;
        Ok(true)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Sessions created on `date`, most recently modified first.
    pub fn sessions_on(&self, date: NaiveDate) -> impl Iterator<Item = &Session> {
        self.sessions.iter().filter(move |s| s.date == date)
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_content(&mut self, content: String) {
        self.draft.set_content(content);
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.draft.presentation
    }

    /// `timeLeft` found in the scratch slot when the store was opened.
    pub fn restored_time_left(&self) -> Option<u32> {
        self.restored_time_left
    }

    /// Creation instant of the open draft, or now if its id carries none.
    pub fn draft_created_at(&self) -> DateTime<Utc> {
        created_at_from_id(&self.draft.id)
            .or_else(|| instant_of(self.clock.now_millis()))
            .unwrap_or_default()
    }

    pub fn today(&self) -> NaiveDate {
        date_of(self.clock.now_millis())
    }

    pub fn now_millis(&self) -> Millis {
        self.clock.now_millis()
    }

    fn creation_date(&self, id: &str, now: Millis) -> NaiveDate {
        match created_at_from_id(id) {
            Some(created) => created.date_naive(),
            None => {
                tracing::warn!(%id, "draft id is not a timestamp, dating session today");
                date_of(now)
            }
        }
    }
}
