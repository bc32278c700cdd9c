//! Save-notification hub.
//!
//! Every save or unsave in the app goes through [`SaveNotificationHub`]. The
//! hub commits the change to the [`SavedRecipeStore`] (including the write to
//! disk) and only then tells the interested screens, so no screen is ever
//! notified about a change the store has not applied.
//!
//! Screens are held weakly. A screen that is dropped without deregistering is
//! pruned the next time the hub fans out.
//!
//! A save or unsave holds the dispatch lock from the store commit until the
//! last screen has been notified, so concurrent calls reach every screen in
//! the order they were committed and "last call wins" holds for the screens
//! as well as the store. The store lock itself is released before screens
//! are notified, so observers may read saved state from their callbacks.
//! They must not save or unsave from inside a callback.

use crate::model::RecipeListItem;
use crate::store::SavedRecipeStore;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// A screen showing a list of recipes with a saved indicator per row.
pub trait RecipeListObserver: Send + Sync {
    fn update_save_state(&self, recipe: &RecipeListItem, saved: bool);
}

/// The saved-recipes screen, which lists the saved recipes themselves.
pub trait SavedRecipesObserver: Send + Sync {
    fn recipe_was_saved(&self, recipe: &RecipeListItem);
    fn recipe_was_unsaved(&self, recipe: &RecipeListItem);
}

pub struct SaveNotificationHub {
    dispatch: Mutex<()>,
    store: Mutex<SavedRecipeStore>,
    saved_recipes_screen: Mutex<Option<Weak<dyn SavedRecipesObserver>>>,
    list_screens: Mutex<Vec<Weak<dyn RecipeListObserver>>>,
}

impl SaveNotificationHub {
    pub fn new(store: SavedRecipeStore) -> Self {
        SaveNotificationHub {
            dispatch: Mutex::new(()),
            store: Mutex::new(store),
            saved_recipes_screen: Mutex::new(None),
            list_screens: Mutex::new(Vec::new()),
        }
    }

    /// Sets the screen told about additions and removals, replacing any
    /// previous one.
    pub fn set_saved_recipes_screen(&self, screen: Weak<dyn SavedRecipesObserver>) {
        *lock(&self.saved_recipes_screen) = Some(screen);
    }

    /// Adds a list screen to the fan-out set. Registering the same screen
    /// twice has no effect.
    pub fn register_list_screen(&self, screen: Weak<dyn RecipeListObserver>) {
        let mut screens = lock(&self.list_screens);
        if screens.iter().any(|s| same_screen(s, &screen)) {
            tracing::debug!("list screen already registered");
            return;
        }
        screens.push(screen);
    }

    pub fn deregister_list_screen(&self, screen: &Weak<dyn RecipeListObserver>) {
        lock(&self.list_screens).retain(|s| !same_screen(s, screen));
    }

    /// Number of registered list screens that are still alive.
    pub fn list_screen_count(&self) -> usize {
        lock(&self.list_screens)
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    pub fn is_saved(&self, recipe: &RecipeListItem) -> bool {
        lock(&self.store).is_saved(recipe)
    }

    /// Snapshot of the saved recipes in save order.
    pub fn saved_recipes(&self) -> Vec<RecipeListItem> {
        lock(&self.store).recipes().to_vec()
    }

    /// Saves `recipe`, then notifies the saved-recipes screen and every list
    /// screen.
    ///
    /// A failed write is logged and otherwise ignored; the recipe is saved in
    /// memory and screens are notified regardless.
    pub fn save(&self, recipe: RecipeListItem) {
        tracing::info!(identifier = %recipe.identifier, name = %recipe.name, "saving recipe");
        let _dispatch = lock(&self.dispatch);
        {
            let mut store = lock(&self.store);
            if let Err(e) = store.save(recipe.clone()) {
                tracing::warn!(error = %e, "saved recipe not persisted");
            }
        }

        if let Some(screen) = self.saved_recipes_observer() {
            screen.recipe_was_saved(&recipe);
        }
        for screen in self.live_list_screens() {
            screen.update_save_state(&recipe, true);
        }
    }

    /// Unsaves `recipe`, then notifies the saved-recipes screen and every
    /// list screen.
    pub fn unsave(&self, recipe: &RecipeListItem) {
        tracing::info!(identifier = %recipe.identifier, name = %recipe.name, "unsaving recipe");
        let _dispatch = lock(&self.dispatch);
        {
            let mut store = lock(&self.store);
            if let Err(e) = store.unsave(recipe) {
                tracing::warn!(error = %e, "unsaved recipe not persisted");
            }
        }

        if let Some(screen) = self.saved_recipes_observer() {
            screen.recipe_was_unsaved(recipe);
        }
        for screen in self.live_list_screens() {
            screen.update_save_state(recipe, false);
        }
    }

    fn saved_recipes_observer(&self) -> Option<Arc<dyn SavedRecipesObserver>> {
        lock(&self.saved_recipes_screen)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Upgrades the registered screens, dropping any that no longer exist.
    ///
    /// Notifications are sent after the lock is released so observers can
    /// call back into the hub.
    fn live_list_screens(&self) -> Vec<Arc<dyn RecipeListObserver>> {
        let mut screens = lock(&self.list_screens);
        screens.retain(|s| s.strong_count() > 0);
        screens.iter().filter_map(Weak::upgrade).collect()
    }
}

fn same_screen(a: &Weak<dyn RecipeListObserver>, b: &Weak<dyn RecipeListObserver>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
