use super::StoreError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A single JSON document on disk holding one value of type `T`.
///
/// The whole value is rewritten on every [`write`](Self::write); there is no
/// incremental persistence.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: Utf8PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        JsonFileStore {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads the stored value. `Ok(None)` means nothing has been stored yet.
    pub fn read(&self) -> Result<Option<T>, StoreError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::read(&self.path, e)),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| StoreError::read(&self.path, e))
    }

    /// Reads the stored value, substituting `T::default()` when the file is
    /// missing or unreadable. Failures are logged, never returned.
    pub fn load_or_default(&self) -> T {
        match self.read() {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(path = %self.path, "no stored data yet");
                T::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored data");
                T::default()
            }
        }
    }

    /// Serializes `value` and replaces the file contents.
    ///
    /// The data is written to a sibling `.tmp` file which is then renamed
    /// over the target, so an interrupted write never leaves a truncated
    /// document behind.
    pub fn write(&self, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec(value).map_err(|e| StoreError::write(&self.path, e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::write(&self.path, e))?;
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, data).map_err(|e| StoreError::write(&tmp_path, e))?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StoreError::write(&self.path, e));
        }
        tracing::debug!(path = %self.path, "stored data written");
        Ok(())
    }

    fn tmp_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.tmp", self.path))
    }
}
