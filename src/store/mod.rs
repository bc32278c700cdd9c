//! Local persistence.
//!
//! [`SavedRecipeStore`] owns the user's saved recipes and writes the whole
//! collection through to disk after every mutation. Persistence is
//! best-effort: a failed read starts from an empty collection and a failed
//! write keeps the in-memory change.

mod file;

pub use file::JsonFileStore;

use crate::model::RecipeListItem;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Display;
use thiserror::Error;

/// Errors raised by local persistence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to read {path}: {message}")]
    PersistenceReadFailed { path: Utf8PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    PersistenceWriteFailed { path: Utf8PathBuf, message: String },
}

impl StoreError {
    pub(crate) fn read(path: &Utf8Path, err: impl Display) -> Self {
        StoreError::PersistenceReadFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(path: &Utf8Path, err: impl Display) -> Self {
        StoreError::PersistenceWriteFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// The user's saved recipes, in the order they were saved.
///
/// This is the single source of truth for saved state. Screens never touch
/// it directly; they go through [`SaveNotificationHub`](crate::hub::SaveNotificationHub).
#[derive(Debug)]
pub struct SavedRecipeStore {
    recipes: Vec<RecipeListItem>,
    file: JsonFileStore<Vec<RecipeListItem>>,
}

impl SavedRecipeStore {
    /// Loads the saved recipes stored at `path`.
    ///
    /// A missing or unreadable file yields an empty collection.
    pub fn load(path: impl Into<Utf8PathBuf>) -> Self {
        let file = JsonFileStore::<Vec<RecipeListItem>>::new(path);
        let recipes = file.load_or_default();
        tracing::info!(path = %file.path(), count = recipes.len(), "loaded saved recipes");
        SavedRecipeStore { recipes, file }
    }

    pub fn path(&self) -> &Utf8Path {
        self.file.path()
    }

    pub fn recipes(&self) -> &[RecipeListItem] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Returns `true` if a recipe with the same identifier has been saved.
    pub fn is_saved(&self, recipe: &RecipeListItem) -> bool {
        self.recipes.contains(recipe)
    }

    /// Appends `recipe` and rewrites the stored collection.
    ///
    /// Saving a recipe that is already saved appends it again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PersistenceWriteFailed`] if the collection could
    /// not be written. The recipe stays saved in memory either way.
    pub fn save(&mut self, mut recipe: RecipeListItem) -> Result<(), StoreError> {
        recipe.newly_added = false;
        self.recipes.push(recipe);
        self.persist()
    }

    /// Removes every entry with the same identifier as `recipe` and rewrites
    /// the stored collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PersistenceWriteFailed`] if the collection could
    /// not be written. The removal is kept in memory either way.
    pub fn unsave(&mut self, recipe: &RecipeListItem) -> Result<(), StoreError> {
        self.recipes.retain(|saved| saved != recipe);
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.file.write(&self.recipes)
    }
}
