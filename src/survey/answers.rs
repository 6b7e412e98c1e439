//! Per-user survey state
//!
//! State is memory-resident and lost on restart by design. The step
//! cursor and the captured answers live in one [`SurveySession`] value, so
//! a user has a cursor exactly when it has answers; the two can never
//! drift apart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Captured answers, one named slot per passed step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyAnswers {
    fields: BTreeMap<String, String>,
}

impl SurveyAnswers {
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One user's questionnaire progress: step cursor plus captured answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveySession {
    /// Index into the pipeline of the step awaiting an answer
    pub step: usize,
    pub answers: SurveyAnswers,
}

/// Concurrency-safe store of in-progress sessions, keyed by user id.
///
/// Each operation is one atomic map access; a session update is a whole
/// value replace. Concurrent messages from the same user race with
/// last-write-wins semantics, which the survey accepts.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, SurveySession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)initialize a user's session at step 0 with empty answers,
    /// overwriting any in-progress state.
    pub fn start(&self, user_id: i64) {
        self.lock().insert(user_id, SurveySession::default());
    }

    /// Clone out a user's session, if one exists.
    pub fn get(&self, user_id: i64) -> Option<SurveySession> {
        self.lock().get(&user_id).cloned()
    }

    /// Replace a user's session wholesale.
    pub fn put(&self, user_id: i64, session: SurveySession) {
        self.lock().insert(user_id, session);
    }

    /// Remove a user's session, returning it if present.
    pub fn remove(&self, user_id: i64) -> Option<SurveySession> {
        self.lock().remove(&user_id)
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.lock().contains_key(&user_id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    // A panicked holder cannot leave the map in a torn state (every write
    // is a single insert/remove), so poisoning is recovered.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, SurveySession>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
