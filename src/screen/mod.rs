//! Screen-side models.
//!
//! These hold what a screen displays and the requests it has in flight. The
//! host UI renders from them and forwards user actions to them; they talk to
//! the [`SaveNotificationHub`] for saved state and to the
//! [`RecipeApiClient`] for remote data.
//!
//! Each screen owns one [`RequestSlot`] per kind of request, so at most one
//! request of a kind is live per screen. Results from superseded requests,
//! or requests outliving their screen, are dropped.

mod detail;
mod saved;
mod task;

pub use detail::RecipeDetailScreen;
pub use saved::SavedRecipesScreen;
pub use task::{RequestSlot, RequestTicket};

use crate::api::{ApiError, RecipeApiClient};
use crate::hub::{lock, RecipeListObserver, SaveNotificationHub};
use crate::model::{Ingredient, RecipeCategory, RecipeIdentifier, RecipeListItem};
use crate::navigation::{CategoriesLocation, IngredientsLocation, NavigationState, SearchLocation};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// What a [`RecipeListScreen`] lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeListSource {
    Search,
    Category(RecipeCategory),
    Ingredient(Ingredient),
}

/// A list fetch that has been started but not yet applied.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    ticket: RequestTicket,
    query: String,
}

impl PendingFetch {
    /// Search term, category or ingredient being fetched.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_current(&self) -> bool {
        self.ticket.is_current()
    }
}

#[derive(Debug, Default)]
struct ListState {
    items: Vec<RecipeListItem>,
    saved: HashMap<RecipeIdentifier, bool>,
    search_term: String,
    last_searched_term: String,
}

/// A remotely fetched list of recipes: search results, or the recipes for a
/// category or ingredient.
pub struct RecipeListScreen {
    source: RecipeListSource,
    hub: Arc<SaveNotificationHub>,
    fetch: RequestSlot,
    state: Mutex<ListState>,
}

impl RecipeListScreen {
    /// Creates the screen and registers it with the hub.
    pub fn new(source: RecipeListSource, hub: Arc<SaveNotificationHub>) -> Arc<Self> {
        let screen = Arc::new(RecipeListScreen {
            source,
            hub: Arc::clone(&hub),
            fetch: RequestSlot::new(),
            state: Mutex::new(ListState::default()),
        });
        hub.register_list_screen(Arc::downgrade(&screen) as Weak<dyn RecipeListObserver>);
        screen
    }

    pub fn source(&self) -> &RecipeListSource {
        &self.source
    }

    pub fn items(&self) -> Vec<RecipeListItem> {
        lock(&self.state).items.clone()
    }

    /// Saved indicator currently shown for `recipe`.
    pub fn is_saved(&self, recipe: &RecipeListItem) -> bool {
        lock(&self.state)
            .saved
            .get(&recipe.identifier)
            .copied()
            .unwrap_or(false)
    }

    /// Sets the search field without running a search.
    pub fn set_search_term(&self, term: &str) {
        lock(&self.state).search_term = term.to_string();
    }

    pub fn search_term(&self) -> String {
        lock(&self.state).search_term.clone()
    }

    pub fn last_searched_term(&self) -> String {
        lock(&self.state).last_searched_term.clone()
    }

    /// Starts a fetch, superseding any fetch in flight.
    ///
    /// A search only starts when the term is non-empty and differs from the
    /// last searched term; otherwise `None` is returned.
    pub fn begin_fetch(&self) -> Option<PendingFetch> {
        let query = match &self.source {
            RecipeListSource::Search => {
                let state = lock(&self.state);
                if state.search_term.is_empty() || state.search_term == state.last_searched_term {
                    return None;
                }
                state.search_term.clone()
            }
            RecipeListSource::Category(category) => category.clone(),
            RecipeListSource::Ingredient(ingredient) => ingredient.clone(),
        };
        tracing::debug!(source = ?self.source, %query, "starting list fetch");
        Some(PendingFetch {
            ticket: self.fetch.begin(),
            query,
        })
    }

    /// Applies the result of `fetch` if it is still current.
    ///
    /// A failed fetch empties the list. Returns `false` when the result was
    /// stale and dropped.
    pub fn complete_fetch(
        &self,
        fetch: PendingFetch,
        result: Result<Vec<RecipeListItem>, ApiError>,
    ) -> bool {
        let mut state = lock(&self.state);
        if !fetch.is_current() {
            tracing::debug!(query = %fetch.query, "dropping stale list result");
            return false;
        }

        let items = result.unwrap_or_else(|e| {
            tracing::warn!(query = %fetch.query, error = %e, "list fetch failed");
            Vec::new()
        });
        state.saved = items
            .iter()
            .map(|item| (item.identifier.clone(), self.hub.is_saved(item)))
            .collect();
        state.items = items;
        if self.source == RecipeListSource::Search {
            state.last_searched_term = fetch.query;
        }
        true
    }

    /// Fetches and applies the list, blocking on the request.
    ///
    /// Returns `false` if nothing was fetched or the result was superseded.
    pub fn load(&self, client: &RecipeApiClient) -> bool {
        let Some(fetch) = self.begin_fetch() else {
            return false;
        };
        let result = match &self.source {
            RecipeListSource::Search => client.search(fetch.query()),
            RecipeListSource::Category(_) => client.recipes_for_category(fetch.query()),
            RecipeListSource::Ingredient(_) => client.recipes_for_ingredient(fetch.query()),
        };
        self.complete_fetch(fetch, result)
    }

    /// Saves `recipe` if it is not saved, otherwise unsaves it.
    pub fn toggle_saved(&self, recipe: &RecipeListItem) {
        if self.hub.is_saved(recipe) {
            self.hub.unsave(recipe);
        } else {
            self.hub.save(recipe.clone());
        }
    }

    /// Navigation recorded while this screen is visible.
    pub fn navigation_for_view(&self) -> NavigationState {
        match &self.source {
            RecipeListSource::Search => {
                let term = self.last_searched_term();
                if term.is_empty() {
                    NavigationState::Search(SearchLocation::None)
                } else {
                    NavigationState::Search(SearchLocation::Term { term })
                }
            }
            RecipeListSource::Category(category) => {
                NavigationState::Categories(CategoriesLocation::Category {
                    category: category.clone(),
                })
            }
            RecipeListSource::Ingredient(ingredient) => {
                NavigationState::Ingredients(IngredientsLocation::Ingredient {
                    ingredient: ingredient.clone(),
                })
            }
        }
    }

    /// Navigation recorded when the user opens a recipe from this list.
    pub fn navigation_for_selected_recipe(&self, identifier: &str) -> NavigationState {
        let identifier = identifier.to_string();
        match &self.source {
            RecipeListSource::Search => NavigationState::Search(SearchLocation::Recipe {
                term: self.last_searched_term(),
                identifier,
            }),
            RecipeListSource::Category(category) => {
                NavigationState::Categories(CategoriesLocation::Recipe {
                    category: category.clone(),
                    identifier,
                })
            }
            RecipeListSource::Ingredient(ingredient) => {
                NavigationState::Ingredients(IngredientsLocation::Recipe {
                    ingredient: ingredient.clone(),
                    identifier,
                })
            }
        }
    }

    /// Cancels in-flight requests and stops hub notifications.
    pub fn teardown(self: &Arc<Self>) {
        self.fetch.cancel();
        self.hub
            .deregister_list_screen(&(Arc::downgrade(self) as Weak<dyn RecipeListObserver>));
    }
}

impl RecipeListObserver for RecipeListScreen {
    fn update_save_state(&self, recipe: &RecipeListItem, saved: bool) {
        lock(&self.state)
            .saved
            .insert(recipe.identifier.clone(), saved);
    }
}

impl Drop for RecipeListScreen {
    fn drop(&mut self) {
        self.fetch.cancel();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::StubTransport;
    use crate::store::SavedRecipeStore;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;
    use url::Url;

    pub(crate) const BASE: &str = "https://www.themealdb.com/api/json/v1/1/";

    pub(crate) fn item(id: &str) -> RecipeListItem {
        RecipeListItem::new(
            id,
            format!("Recipe {id}"),
            Url::parse(&format!("https://www.themealdb.com/images/{id}.jpg")).unwrap(),
        )
    }

    pub(crate) fn hub(dir: &TempDir) -> Arc<SaveNotificationHub> {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("saved-recipes.data")).unwrap();
        Arc::new(SaveNotificationHub::new(SavedRecipeStore::load(path)))
    }

    pub(crate) fn client(stub: &Arc<StubTransport>) -> RecipeApiClient {
        RecipeApiClient::new(Url::parse(BASE).unwrap(), stub.clone())
    }

    fn list_json(ids: &[&str]) -> String {
        let meals: Vec<_> = ids
            .iter()
            .map(|id| serde_json::to_value(item(id)).unwrap())
            .collect();
        serde_json::json!({ "meals": meals }).to_string()
    }

    #[test]
    fn test_second_fetch_wins_over_late_first() {
        let temp_dir = TempDir::new().unwrap();
        let screen = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), hub(&temp_dir));

        let first = screen.begin_fetch().unwrap();
        let second = screen.begin_fetch().unwrap();

        assert!(screen.complete_fetch(second, Ok(vec![item("2")])));
        assert!(!screen.complete_fetch(first, Ok(vec![item("1")])));

        assert_eq!(screen.items(), vec![item("2")]);
    }

    #[test]
    fn test_late_first_before_second_completes_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let screen = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), hub(&temp_dir));

        let first = screen.begin_fetch().unwrap();
        let second = screen.begin_fetch().unwrap();

        assert!(!screen.complete_fetch(first, Ok(vec![item("1")])));
        assert!(screen.items().is_empty());
        assert!(screen.complete_fetch(second, Ok(vec![item("2")])));
        assert_eq!(screen.items(), vec![item("2")]);
    }

    #[test]
    fn test_failed_fetch_empties_list() {
        let temp_dir = TempDir::new().unwrap();
        let screen = RecipeListScreen::new(RecipeListSource::Ingredient("Chicken".into()), hub(&temp_dir));

        let fetch = screen.begin_fetch().unwrap();
        screen.complete_fetch(fetch, Ok(vec![item("1")]));
        let fetch = screen.begin_fetch().unwrap();
        screen.complete_fetch(fetch, Err(ApiError::RequestFailed("boom".into())));

        assert!(screen.items().is_empty());
    }

    #[test]
    fn test_teardown_drops_in_flight_result() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let screen = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), Arc::clone(&hub));

        let fetch = screen.begin_fetch().unwrap();
        screen.teardown();

        assert!(!fetch.is_current());
        assert!(!screen.complete_fetch(fetch, Ok(vec![item("1")])));
        assert_eq!(hub.list_screen_count(), 0);
    }

    #[test]
    fn test_dropping_screen_cancels_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let screen = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), hub(&temp_dir));
        let weak = Arc::downgrade(&screen);
        let fetch = screen.begin_fetch().unwrap();

        let worker = std::thread::spawn(move || fetch);
        drop(screen);
        let fetch = worker.join().unwrap();

        assert!(!fetch.is_current());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_search_only_runs_for_new_terms() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubTransport::new());
        stub.respond(&format!("{BASE}search.php?s=chicken"), &list_json(&["52795", "52956"]));
        let client = client(&stub);
        let screen = RecipeListScreen::new(RecipeListSource::Search, hub(&temp_dir));

        assert!(!screen.load(&client), "empty term does not search");

        screen.set_search_term("chicken");
        assert!(screen.load(&client));
        assert_eq!(screen.items().len(), 2);
        assert_eq!(screen.last_searched_term(), "chicken");

        assert!(!screen.load(&client), "same term does not search again");
        assert_eq!(stub.requested().len(), 1);
    }

    #[test]
    fn test_set_search_term_does_not_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubTransport::new());
        let screen = RecipeListScreen::new(RecipeListSource::Search, hub(&temp_dir));

        screen.set_search_term("chicken");

        assert_eq!(screen.search_term(), "chicken");
        assert!(stub.requested().is_empty());
        assert_eq!(
            screen.navigation_for_view(),
            NavigationState::Search(SearchLocation::None)
        );
    }

    #[test]
    fn test_search_no_results_is_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubTransport::new());
        stub.respond(&format!("{BASE}search.php?s=abcdef"), r#"{"meals": null}"#);
        let screen = RecipeListScreen::new(RecipeListSource::Search, hub(&temp_dir));

        screen.set_search_term("abcdef");
        assert!(screen.load(&client(&stub)));
        assert!(screen.items().is_empty());
        assert_eq!(
            screen.navigation_for_view(),
            NavigationState::Search(SearchLocation::Term {
                term: "abcdef".into()
            })
        );
    }

    #[test]
    fn test_category_load_marks_saved_items() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        hub.save(item("2"));
        let stub = Arc::new(StubTransport::new());
        stub.respond(&format!("{BASE}filter.php?c=Beef"), &list_json(&["1", "2"]));
        let screen = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), Arc::clone(&hub));

        assert!(screen.load(&client(&stub)));
        assert!(!screen.is_saved(&item("1")));
        assert!(screen.is_saved(&item("2")));
    }

    #[test]
    fn test_saved_indicator_follows_hub() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let a = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), Arc::clone(&hub));
        let b = RecipeListScreen::new(RecipeListSource::Search, Arc::clone(&hub));

        a.toggle_saved(&item("1"));
        assert!(a.is_saved(&item("1")));
        assert!(b.is_saved(&item("1")));

        b.toggle_saved(&item("1"));
        assert!(!a.is_saved(&item("1")));
        assert!(!b.is_saved(&item("1")));
    }

    #[test]
    fn test_navigation_for_lists() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let category = RecipeListScreen::new(RecipeListSource::Category("Beef".into()), Arc::clone(&hub));
        let ingredient = RecipeListScreen::new(RecipeListSource::Ingredient("Chicken".into()), Arc::clone(&hub));

        assert_eq!(
            category.navigation_for_view(),
            NavigationState::Categories(CategoriesLocation::Category {
                category: "Beef".into()
            })
        );
        assert_eq!(
            category.navigation_for_selected_recipe("52874"),
            NavigationState::Categories(CategoriesLocation::Recipe {
                category: "Beef".into(),
                identifier: "52874".into()
            })
        );
        assert_eq!(
            ingredient.navigation_for_selected_recipe("52940"),
            NavigationState::Ingredients(IngredientsLocation::Recipe {
                ingredient: "Chicken".into(),
                identifier: "52940".into()
            })
        );
    }
}
