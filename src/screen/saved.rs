use crate::hub::{lock, SaveNotificationHub, SavedRecipesObserver};
use crate::model::{RecipeIdentifier, RecipeListItem};
use crate::navigation::{NavigationState, SavedRecipesLocation};
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Default)]
struct SavedState {
    items: Vec<RecipeListItem>,
    newly_added: Vec<RecipeIdentifier>,
}

/// The saved-recipes tab.
///
/// Recipes saved while the tab is off screen are remembered as newly added.
/// They are highlighted the next time the tab appears and counted in the
/// tab badge until the tab disappears again.
pub struct SavedRecipesScreen {
    hub: Arc<SaveNotificationHub>,
    state: Mutex<SavedState>,
}

impl SavedRecipesScreen {
    /// Creates the screen from the hub's saved recipes and makes it the
    /// hub's saved-recipes observer.
    pub fn new(hub: Arc<SaveNotificationHub>) -> Arc<Self> {
        let screen = Arc::new(SavedRecipesScreen {
            state: Mutex::new(SavedState {
                items: distinct(hub.saved_recipes()),
                newly_added: Vec::new(),
            }),
            hub: Arc::clone(&hub),
        });
        hub.set_saved_recipes_screen(Arc::downgrade(&screen) as Weak<dyn SavedRecipesObserver>);
        screen
    }

    pub fn items(&self) -> Vec<RecipeListItem> {
        lock(&self.state).items.clone()
    }

    /// Reloads the list from the hub. Newly added tracking is kept.
    pub fn reload(&self) {
        let saved = distinct(self.hub.saved_recipes());
        let mut state = lock(&self.state);
        let reloaded: Vec<_> = saved
            .into_iter()
            .map(|mut item| {
                item.newly_added = state
                    .items
                    .iter()
                    .any(|shown| shown.identifier == item.identifier && shown.newly_added);
                item
            })
            .collect();
        state.items = reloaded;
        let SavedState { items, newly_added } = &mut *state;
        newly_added.retain(|id| items.iter().any(|item| &item.identifier == id));
    }

    /// Number of recipes saved since the tab was last shown.
    pub fn badge_count(&self) -> usize {
        lock(&self.state).newly_added.len()
    }

    /// Highlights recipes saved since the tab was last shown. Called when the
    /// tab appears.
    pub fn mark_new_recipes(&self) {
        self.set_newly_added_flags(true);
    }

    /// Removes the highlights and resets the badge. Called when the tab
    /// disappears.
    pub fn unmark_new_recipes(&self) {
        self.set_newly_added_flags(false);
        lock(&self.state).newly_added.clear();
    }

    fn set_newly_added_flags(&self, flag: bool) {
        let mut state = lock(&self.state);
        let SavedState { items, newly_added } = &mut *state;
        for item in items.iter_mut() {
            if newly_added.contains(&item.identifier) {
                item.newly_added = flag;
            }
        }
    }

    pub fn navigation_for_view(&self) -> NavigationState {
        NavigationState::SavedRecipes(SavedRecipesLocation::All)
    }

    pub fn navigation_for_selected_recipe(&self, identifier: &str) -> NavigationState {
        NavigationState::SavedRecipes(SavedRecipesLocation::Recipe {
            identifier: identifier.to_string(),
        })
    }
}

impl SavedRecipesObserver for SavedRecipesScreen {
    fn recipe_was_saved(&self, recipe: &RecipeListItem) {
        let mut state = lock(&self.state);
        if !state.items.contains(recipe) {
            let mut item = recipe.clone();
            item.newly_added = false;
            state.items.push(item);
        }
        if !state.newly_added.contains(&recipe.identifier) {
            state.newly_added.push(recipe.identifier.clone());
        }
    }

    fn recipe_was_unsaved(&self, recipe: &RecipeListItem) {
        let mut state = lock(&self.state);
        state.items.retain(|item| item != recipe);
        state.newly_added.retain(|id| id != &recipe.identifier);
    }
}

/// Drops repeated saves of the same recipe, keeping the first.
fn distinct(recipes: Vec<RecipeListItem>) -> Vec<RecipeListItem> {
    let mut seen = Vec::with_capacity(recipes.len());
    recipes
        .into_iter()
        .filter(|recipe| {
            if seen.contains(&recipe.identifier) {
                return false;
            }
            seen.push(recipe.identifier.clone());
            true
        })
        .collect()
}
