//! UniFFI bindings for the iOS and Android shells.
//!
//! This module provides FFI-safe types and functions for use with UniFFI.
//! Core types are converted to flat records and enums. The shell drives the
//! app through a [`RecipeApp`] object, which hands out one screen object per
//! list or detail screen so each screen keeps its own request slots.

use crate::api::{ApiError, RecipeApiClient};
use crate::config::{AppConfig, ConfigError};
use crate::hub::{lock, RecipeListObserver, SaveNotificationHub};
use crate::model::{IngredientMeasurement, RecipeDetail, RecipeListItem};
use crate::navigation::{
    restoration_steps, CategoriesLocation, IngredientsLocation, NavigationRecorder,
    NavigationState, RestorationError, RestorationStep, SavedRecipesLocation, Screen,
    SearchLocation,
};
use crate::screen::{
    PendingFetch, RecipeDetailScreen, RecipeListScreen, RecipeListSource, SavedRecipesScreen,
};
use crate::store::{SavedRecipeStore, StoreError};
use std::sync::{Arc, Mutex, Weak};
use url::Url;

/// FFI-safe error type that wraps all possible errors.
#[derive(Debug, uniffi::Error, thiserror::Error)]
pub enum RecipeAppError {
    #[error("Recipe not found: {message}")]
    RecipeNotFound { message: String },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Image error: {message}")]
    ImageError { message: String },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },

    #[error("Config error: {message}")]
    ConfigError { message: String },

    #[error("Restoration error: {message}")]
    RestorationError { message: String },

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },
}

impl From<ApiError> for RecipeAppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::RecipeNotFound(identifier) => RecipeAppError::RecipeNotFound {
                message: identifier,
            },
            ApiError::RequestFailed(message) => RecipeAppError::RequestFailed { message },
            ApiError::Transport(e) => RecipeAppError::NetworkError {
                message: e.to_string(),
            },
            ApiError::ImageDecodeFailed(message) => RecipeAppError::ImageError { message },
        }
    }
}

impl From<StoreError> for RecipeAppError {
    fn from(e: StoreError) -> Self {
        RecipeAppError::PersistenceError {
            message: e.to_string(),
        }
    }
}

impl From<ConfigError> for RecipeAppError {
    fn from(e: ConfigError) -> Self {
        RecipeAppError::ConfigError {
            message: e.to_string(),
        }
    }
}

impl From<RestorationError> for RecipeAppError {
    fn from(e: RestorationError) -> Self {
        RecipeAppError::RestorationError {
            message: e.to_string(),
        }
    }
}

impl From<url::ParseError> for RecipeAppError {
    fn from(e: url::ParseError) -> Self {
        RecipeAppError::InvalidUrl {
            message: e.to_string(),
        }
    }
}

/// FFI-safe representation of a recipe in a list.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiRecipeListItem {
    pub identifier: String,
    pub name: String,
    pub image_url: String,
    /// True while the saved-recipes tab highlights the recipe as new
    pub newly_added: bool,
}

impl From<&RecipeListItem> for FfiRecipeListItem {
    fn from(item: &RecipeListItem) -> Self {
        FfiRecipeListItem {
            identifier: item.identifier.clone(),
            name: item.name.clone(),
            image_url: item.image_url.to_string(),
            newly_added: item.newly_added,
        }
    }
}

impl TryFrom<FfiRecipeListItem> for RecipeListItem {
    type Error = RecipeAppError;

    fn try_from(item: FfiRecipeListItem) -> Result<Self, Self::Error> {
        let mut recipe = RecipeListItem::new(item.identifier, item.name, Url::parse(&item.image_url)?);
        recipe.newly_added = item.newly_added;
        Ok(recipe)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiIngredientMeasurement {
    pub ingredient: String,
    pub measurement: String,
}

impl From<&IngredientMeasurement> for FfiIngredientMeasurement {
    fn from(m: &IngredientMeasurement) -> Self {
        FfiIngredientMeasurement {
            ingredient: m.ingredient.clone(),
            measurement: m.measurement.clone(),
        }
    }
}

/// FFI-safe representation of a recipe's full details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecipeDetail {
    pub identifier: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub instructions: String,
    /// Thumbnail URL if the recipe has a valid one
    pub image_url: Option<String>,
    /// YouTube URL if the recipe has a valid one
    pub video_url: Option<String>,
    pub tags: Vec<String>,
    /// Ingredients in the order the recipe lists them
    pub ingredients: Vec<FfiIngredientMeasurement>,
}

impl From<&RecipeDetail> for FfiRecipeDetail {
    fn from(d: &RecipeDetail) -> Self {
        FfiRecipeDetail {
            identifier: d.identifier.clone(),
            name: d.name.clone(),
            category: d.category.clone(),
            region: d.region.clone(),
            instructions: d.instructions.clone(),
            image_url: d.image_url.as_ref().map(Url::to_string),
            video_url: d.video_url.as_ref().map(Url::to_string),
            tags: d.tags.clone(),
            ingredients: d.ingredients.iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe mirror of [`NavigationState`], one variant per location.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiNavigation {
    SavedRecipes,
    SavedRecipe { identifier: String },
    Search,
    SearchTerm { term: String },
    SearchRecipe { term: String, identifier: String },
    Categories,
    Category { category: String },
    CategoryRecipe { category: String, identifier: String },
    Ingredients,
    Ingredient { ingredient: String },
    IngredientRecipe { ingredient: String, identifier: String },
}

impl From<&NavigationState> for FfiNavigation {
    fn from(state: &NavigationState) -> Self {
        match state.clone() {
            NavigationState::SavedRecipes(SavedRecipesLocation::All) => FfiNavigation::SavedRecipes,
            NavigationState::SavedRecipes(SavedRecipesLocation::Recipe { identifier }) => {
                FfiNavigation::SavedRecipe { identifier }
            }
            NavigationState::Search(SearchLocation::None) => FfiNavigation::Search,
            NavigationState::Search(SearchLocation::Term { term }) => FfiNavigation::SearchTerm { term },
            NavigationState::Search(SearchLocation::Recipe { term, identifier }) => {
                FfiNavigation::SearchRecipe { term, identifier }
            }
            NavigationState::Categories(CategoriesLocation::All) => FfiNavigation::Categories,
            NavigationState::Categories(CategoriesLocation::Category { category }) => {
                FfiNavigation::Category { category }
            }
            NavigationState::Categories(CategoriesLocation::Recipe {
                category,
                identifier,
            }) => FfiNavigation::CategoryRecipe {
                category,
                identifier,
            },
            NavigationState::Ingredients(IngredientsLocation::All) => FfiNavigation::Ingredients,
            NavigationState::Ingredients(IngredientsLocation::Ingredient { ingredient }) => {
                FfiNavigation::Ingredient { ingredient }
            }
            NavigationState::Ingredients(IngredientsLocation::Recipe {
                ingredient,
                identifier,
            }) => FfiNavigation::IngredientRecipe {
                ingredient,
                identifier,
            },
        }
    }
}

impl From<FfiNavigation> for NavigationState {
    fn from(navigation: FfiNavigation) -> Self {
        match navigation {
            FfiNavigation::SavedRecipes => NavigationState::SavedRecipes(SavedRecipesLocation::All),
            FfiNavigation::SavedRecipe { identifier } => {
                NavigationState::SavedRecipes(SavedRecipesLocation::Recipe { identifier })
            }
            FfiNavigation::Search => NavigationState::Search(SearchLocation::None),
            FfiNavigation::SearchTerm { term } => NavigationState::Search(SearchLocation::Term { term }),
            FfiNavigation::SearchRecipe { term, identifier } => {
                NavigationState::Search(SearchLocation::Recipe { term, identifier })
            }
            FfiNavigation::Categories => NavigationState::Categories(CategoriesLocation::All),
            FfiNavigation::Category { category } => {
                NavigationState::Categories(CategoriesLocation::Category { category })
            }
            FfiNavigation::CategoryRecipe {
                category,
                identifier,
            } => NavigationState::Categories(CategoriesLocation::Recipe {
                category,
                identifier,
            }),
            FfiNavigation::Ingredients => NavigationState::Ingredients(IngredientsLocation::All),
            FfiNavigation::Ingredient { ingredient } => {
                NavigationState::Ingredients(IngredientsLocation::Ingredient { ingredient })
            }
            FfiNavigation::IngredientRecipe {
                ingredient,
                identifier,
            } => NavigationState::Ingredients(IngredientsLocation::Recipe {
                ingredient,
                identifier,
            }),
        }
    }
}

/// One step the shell performs to rebuild its screens at launch.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRestorationStep {
    /// Select the tab at `index` (0 saved, 1 search, 2 categories, 3 ingredients)
    SelectTab { index: u32 },
    /// Fill in the search field without searching
    SetSearchTerm { term: String },
    PushRecipesForCategory { category: String },
    PushRecipesForIngredient { ingredient: String },
    PushRecipeDetail { identifier: String },
}

impl From<RestorationStep> for FfiRestorationStep {
    fn from(step: RestorationStep) -> Self {
        match step {
            RestorationStep::SelectTab(tab) => FfiRestorationStep::SelectTab {
                index: tab.index() as u32,
            },
            RestorationStep::SetSearchTerm(term) => FfiRestorationStep::SetSearchTerm { term },
            RestorationStep::Push(Screen::RecipesForCategory(category)) => {
                FfiRestorationStep::PushRecipesForCategory { category }
            }
            RestorationStep::Push(Screen::RecipesForIngredient(ingredient)) => {
                FfiRestorationStep::PushRecipesForIngredient { ingredient }
            }
            RestorationStep::Push(Screen::RecipeDetail(identifier)) => {
                FfiRestorationStep::PushRecipeDetail { identifier }
            }
        }
    }
}

/// Implemented by the shell to hear about saves and unsaves made anywhere in
/// the app.
///
/// Callbacks may read saved state from the app but must not save or unsave.
#[uniffi::export(with_foreign)]
pub trait SaveStateListener: Send + Sync {
    fn save_state_changed(&self, recipe: FfiRecipeListItem, saved: bool);
}

struct ListenerAdapter {
    listener: Arc<dyn SaveStateListener>,
}

impl RecipeListObserver for ListenerAdapter {
    fn update_save_state(&self, recipe: &RecipeListItem, saved: bool) {
        self.listener.save_state_changed(recipe.into(), saved);
    }
}

/// The app core as seen by the shell.
///
/// Owns the API client, the save-notification hub with its saved-recipe
/// store, the saved-recipes tab and the navigation recorder.
#[derive(uniffi::Object)]
pub struct RecipeApp {
    client: RecipeApiClient,
    hub: Arc<SaveNotificationHub>,
    saved_screen: Arc<SavedRecipesScreen>,
    recorder: Mutex<NavigationRecorder>,
    listeners: Mutex<Vec<Arc<ListenerAdapter>>>,
}

#[uniffi::export]
impl RecipeApp {
    /// Creates the app from a YAML config document.
    ///
    /// An empty document uses the defaults.
    #[uniffi::constructor]
    pub fn new(config_yaml: String) -> Result<Arc<Self>, RecipeAppError> {
        let config = AppConfig::from_yaml_str(&config_yaml)?;
        let client = RecipeApiClient::from_config(&config)?;
        Ok(RecipeApp::with_client(&config, client))
    }

    // Remote

    pub fn search(&self, term: String) -> Result<Vec<FfiRecipeListItem>, RecipeAppError> {
        Ok(list_items(&self.client.search(&term)?))
    }

    pub fn recipes_for_category(
        &self,
        category: String,
    ) -> Result<Vec<FfiRecipeListItem>, RecipeAppError> {
        Ok(list_items(&self.client.recipes_for_category(&category)?))
    }

    pub fn recipes_for_ingredient(
        &self,
        ingredient: String,
    ) -> Result<Vec<FfiRecipeListItem>, RecipeAppError> {
        Ok(list_items(&self.client.recipes_for_ingredient(&ingredient)?))
    }

    pub fn recipe_detail(&self, identifier: String) -> Result<FfiRecipeDetail, RecipeAppError> {
        Ok(FfiRecipeDetail::from(&self.client.recipe_detail(&identifier)?))
    }

    pub fn categories(&self) -> Result<Vec<String>, RecipeAppError> {
        Ok(self.client.categories()?)
    }

    pub fn ingredients(&self) -> Result<Vec<String>, RecipeAppError> {
        Ok(self.client.ingredients()?)
    }

    /// Downloads the image at `url` and returns its bytes.
    ///
    /// The bytes are only checked for an image signature, so the platform
    /// decoder may still fail on them.
    pub fn image(&self, url: String) -> Result<Vec<u8>, RecipeAppError> {
        let url = Url::parse(&url)?;
        Ok(self.client.image(&url)?.bytes)
    }

    // Saved recipes

    pub fn is_saved(&self, recipe: FfiRecipeListItem) -> Result<bool, RecipeAppError> {
        Ok(self.hub.is_saved(&RecipeListItem::try_from(recipe)?))
    }

    pub fn save(&self, recipe: FfiRecipeListItem) -> Result<(), RecipeAppError> {
        self.hub.save(RecipeListItem::try_from(recipe)?);
        Ok(())
    }

    pub fn unsave(&self, recipe: FfiRecipeListItem) -> Result<(), RecipeAppError> {
        self.hub.unsave(&RecipeListItem::try_from(recipe)?);
        Ok(())
    }

    /// The saved-recipes tab's list, with newly added highlights.
    pub fn saved_recipes(&self) -> Vec<FfiRecipeListItem> {
        list_items(&self.saved_screen.items())
    }

    /// Badge count for the saved-recipes tab. Zero means no badge.
    pub fn saved_badge_count(&self) -> u32 {
        self.saved_screen.badge_count() as u32
    }

    pub fn saved_recipes_did_appear(&self) {
        self.saved_screen.mark_new_recipes();
    }

    pub fn saved_recipes_did_disappear(&self) {
        self.saved_screen.unmark_new_recipes();
    }

    /// Registers `listener` for save and unsave events. The app keeps the
    /// listener alive until [`clear_save_state_listeners`](Self::clear_save_state_listeners).
    pub fn add_save_state_listener(&self, listener: Arc<dyn SaveStateListener>) {
        let adapter = Arc::new(ListenerAdapter { listener });
        self.hub
            .register_list_screen(Arc::downgrade(&adapter) as Weak<dyn RecipeListObserver>);
        lock(&self.listeners).push(adapter);
    }

    pub fn clear_save_state_listeners(&self) {
        for adapter in lock(&self.listeners).drain(..) {
            self.hub
                .deregister_list_screen(&(Arc::downgrade(&adapter) as Weak<dyn RecipeListObserver>));
        }
    }

    // Screens

    /// Model for the search tab's results list.
    pub fn search_screen(&self) -> Arc<FfiRecipeListScreen> {
        self.list_screen(RecipeListSource::Search)
    }

    pub fn category_screen(&self, category: String) -> Arc<FfiRecipeListScreen> {
        self.list_screen(RecipeListSource::Category(category))
    }

    pub fn ingredient_screen(&self, ingredient: String) -> Arc<FfiRecipeListScreen> {
        self.list_screen(RecipeListSource::Ingredient(ingredient))
    }

    pub fn detail_screen(&self, identifier: String) -> Arc<FfiRecipeDetailScreen> {
        Arc::new(FfiRecipeDetailScreen {
            screen: RecipeDetailScreen::new(identifier, Arc::clone(&self.hub)),
            client: self.client.clone(),
        })
    }

    // Navigation

    pub fn navigation(&self) -> FfiNavigation {
        FfiNavigation::from(&lock(&self.recorder).current())
    }

    /// Records the current navigation. A failed write is logged and the
    /// navigation is still used for the rest of the session.
    pub fn set_navigation(&self, navigation: FfiNavigation) {
        let state = NavigationState::from(navigation);
        if let Err(e) = lock(&self.recorder).set(&state) {
            tracing::warn!(error = %e, "navigation not persisted");
        }
    }

    /// Tab bar index for the current navigation.
    pub fn tab_index(&self) -> u32 {
        lock(&self.recorder).current().tab_index() as u32
    }

    /// Steps that rebuild the screens for the current navigation.
    pub fn restoration_steps(&self) -> Vec<FfiRestorationStep> {
        restoration_steps(&lock(&self.recorder).current())
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

impl RecipeApp {
    /// Builds the app around an existing client, loading persisted state
    /// from the configured data directory.
    pub fn with_client(config: &AppConfig, client: RecipeApiClient) -> Arc<Self> {
        let store = SavedRecipeStore::load(config.saved_recipes_path());
        let hub = Arc::new(SaveNotificationHub::new(store));
        let saved_screen = SavedRecipesScreen::new(Arc::clone(&hub));
        let recorder = NavigationRecorder::load(config.activity_path());
        tracing::info!(base_url = %client.base_url(), data_dir = %config.data_dir, "recipe app ready");

        Arc::new(RecipeApp {
            client,
            hub,
            saved_screen,
            recorder: Mutex::new(recorder),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn hub(&self) -> &Arc<SaveNotificationHub> {
        &self.hub
    }

    fn list_screen(&self, source: RecipeListSource) -> Arc<FfiRecipeListScreen> {
        Arc::new(FfiRecipeListScreen {
            screen: RecipeListScreen::new(source, Arc::clone(&self.hub)),
            client: self.client.clone(),
        })
    }

    pub fn client(&self) -> &RecipeApiClient {
        &self.client
    }
}

/// A list fetch handed to the shell by [`FfiRecipeListScreen::begin_fetch`].
#[derive(uniffi::Object)]
pub struct FfiListFetch {
    fetch: PendingFetch,
}

#[uniffi::export]
impl FfiListFetch {
    /// Search term, category or ingredient to fetch.
    pub fn query(&self) -> String {
        self.fetch.query().to_string()
    }

    /// False once a newer fetch has started or the screen was torn down.
    pub fn is_current(&self) -> bool {
        self.fetch.is_current()
    }
}

/// Search results, or the recipes for a category or ingredient.
///
/// Dropping the object, or calling [`teardown`](Self::teardown), cancels its
/// fetch and stops save notifications.
#[derive(uniffi::Object)]
pub struct FfiRecipeListScreen {
    screen: Arc<RecipeListScreen>,
    client: RecipeApiClient,
}

#[uniffi::export]
impl FfiRecipeListScreen {
    pub fn set_search_term(&self, term: String) {
        self.screen.set_search_term(&term);
    }

    pub fn search_term(&self) -> String {
        self.screen.search_term()
    }

    pub fn last_searched_term(&self) -> String {
        self.screen.last_searched_term()
    }

    /// Fetches the list with the app's client, blocking on the request.
    ///
    /// Returns false when no fetch was needed or the result was superseded.
    pub fn load(&self) -> bool {
        self.screen.load(&self.client)
    }

    /// Starts a fetch the shell performs itself. Any fetch in flight is
    /// superseded. Returns `None` when a search is not needed.
    pub fn begin_fetch(&self) -> Option<Arc<FfiListFetch>> {
        self.screen
            .begin_fetch()
            .map(|fetch| Arc::new(FfiListFetch { fetch }))
    }

    /// Applies fetched recipes. Returns false if `fetch` is stale.
    pub fn complete_fetch(
        &self,
        fetch: Arc<FfiListFetch>,
        items: Vec<FfiRecipeListItem>,
    ) -> Result<bool, RecipeAppError> {
        let items = items
            .into_iter()
            .map(RecipeListItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.screen.complete_fetch(fetch.fetch.clone(), Ok(items)))
    }

    /// Reports a failed fetch, which empties the list if `fetch` is current.
    pub fn fail_fetch(&self, fetch: Arc<FfiListFetch>, message: String) -> bool {
        self.screen
            .complete_fetch(fetch.fetch.clone(), Err(ApiError::RequestFailed(message)))
    }

    pub fn items(&self) -> Vec<FfiRecipeListItem> {
        list_items(&self.screen.items())
    }

    pub fn is_saved(&self, recipe: FfiRecipeListItem) -> Result<bool, RecipeAppError> {
        Ok(self.screen.is_saved(&RecipeListItem::try_from(recipe)?))
    }

    pub fn toggle_saved(&self, recipe: FfiRecipeListItem) -> Result<(), RecipeAppError> {
        self.screen.toggle_saved(&RecipeListItem::try_from(recipe)?);
        Ok(())
    }

    pub fn navigation_for_view(&self) -> FfiNavigation {
        FfiNavigation::from(&self.screen.navigation_for_view())
    }

    pub fn navigation_for_selected_recipe(&self, identifier: String) -> FfiNavigation {
        FfiNavigation::from(&self.screen.navigation_for_selected_recipe(&identifier))
    }

    pub fn teardown(&self) {
        self.screen.teardown();
    }
}

/// One recipe's details and image, with a save toggle.
#[derive(uniffi::Object)]
pub struct FfiRecipeDetailScreen {
    screen: Arc<RecipeDetailScreen>,
    client: RecipeApiClient,
}

#[uniffi::export]
impl FfiRecipeDetailScreen {
    /// Fetches the detail and then its image, blocking on both.
    pub fn load(&self) {
        self.screen.load(&self.client);
    }

    pub fn detail(&self) -> Option<FfiRecipeDetail> {
        self.screen.detail().as_ref().map(FfiRecipeDetail::from)
    }

    /// Image bytes, checked only for an image signature.
    pub fn image(&self) -> Option<Vec<u8>> {
        self.screen.image().map(|image| image.bytes)
    }

    pub fn is_saved(&self) -> bool {
        self.screen.is_saved()
    }

    /// Returns the new saved state, or `None` before a detail has loaded.
    pub fn toggle_saved(&self) -> Option<bool> {
        self.screen.toggle_saved()
    }

    pub fn teardown(&self) {
        self.screen.teardown();
    }
}

fn list_items(items: &[RecipeListItem]) -> Vec<FfiRecipeListItem> {
    items.iter().map(Into::into).collect()
}

// ============================================================================
// Exported FFI Functions
// ============================================================================

/// Encodes a navigation state into its persisted JSON form.
#[uniffi::export]
pub fn encode_navigation(navigation: FfiNavigation) -> Result<Vec<u8>, RecipeAppError> {
    Ok(NavigationState::from(navigation).encode()?)
}

/// Decodes a persisted navigation state. Anything undecodable yields the
/// saved-recipes tab.
#[uniffi::export]
pub fn decode_navigation(data: Vec<u8>) -> FfiNavigation {
    FfiNavigation::from(&NavigationState::decode(&data))
}

/// Returns the library version.
#[uniffi::export]
pub fn library_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
