use super::NavigationState;
use crate::store::{JsonFileStore, StoreError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Activity type tag identifying a restoration record written by this app.
pub const ACTIVITY_TYPE: &str = "com.recipeapp.restoration";

/// Persisted activity record holding the encoded navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_type: String,
    /// Encoded [`NavigationState`]
    pub navigation: String,
}

impl Default for ActivityRecord {
    fn default() -> Self {
        ActivityRecord::new(&NavigationState::default())
    }
}

impl ActivityRecord {
    pub fn new(state: &NavigationState) -> Self {
        let mut record = ActivityRecord {
            activity_type: ACTIVITY_TYPE.to_string(),
            navigation: String::new(),
        };
        record.set_navigation(state);
        record
    }

    /// Decoded navigation, or the default state if it cannot be decoded.
    pub fn navigation(&self) -> NavigationState {
        NavigationState::decode(self.navigation.as_bytes())
    }

    /// Encodes `state` into the record. If encoding fails the default state
    /// is stored instead.
    pub fn set_navigation(&mut self, state: &NavigationState) {
        let encoded = state
            .encode()
            .or_else(|e| {
                tracing::warn!(error = %e, "storing default navigation");
                NavigationState::default().encode()
            })
            .unwrap_or_default();
        self.navigation = String::from_utf8_lossy(&encoded).into_owned();
    }
}

/// Tracks the current navigation and writes it through to the activity record.
#[derive(Debug)]
pub struct NavigationRecorder {
    record: ActivityRecord,
    file: JsonFileStore<ActivityRecord>,
}

impl NavigationRecorder {
    /// Loads the activity record at `path`.
    ///
    /// A missing, unreadable or foreign record starts from the default state.
    pub fn load(path: impl Into<Utf8PathBuf>) -> Self {
        let file = JsonFileStore::<ActivityRecord>::new(path);
        let mut record = file.load_or_default();
        if record.activity_type != ACTIVITY_TYPE {
            tracing::warn!(
                activity_type = %record.activity_type,
                "ignoring activity record of unknown type"
            );
            record = ActivityRecord::default();
        }
        NavigationRecorder { record, file }
    }

    pub fn path(&self) -> &Utf8Path {
        self.file.path()
    }

    pub fn record(&self) -> &ActivityRecord {
        &self.record
    }

    /// The navigation state to restore.
    pub fn current(&self) -> NavigationState {
        self.record.navigation()
    }

    /// Records `state` as the current navigation and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PersistenceWriteFailed`] if the record could not
    /// be written. The in-memory navigation is updated either way.
    pub fn set(&mut self, state: &NavigationState) -> Result<(), StoreError> {
        tracing::debug!(?state, "navigation changed");
        self.record.set_navigation(state);
        self.file.write(&self.record)
    }
}
