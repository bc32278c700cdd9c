use super::task::{RequestSlot, RequestTicket};
use crate::api::{ApiError, FetchedImage, RecipeApiClient};
use crate::hub::{lock, RecipeListObserver, SaveNotificationHub};
use crate::model::{RecipeDetail, RecipeIdentifier, RecipeListItem};
use std::sync::{Arc, Mutex, Weak};
use url::Url;

#[derive(Debug, Default)]
struct DetailState {
    detail: Option<RecipeDetail>,
    image: Option<FetchedImage>,
    saved: bool,
}

/// Full details of one recipe, with its image and a save toggle.
///
/// The detail and the image are separate requests with separate slots. The
/// image request is started once the detail has arrived, since its URL comes
/// from the detail.
pub struct RecipeDetailScreen {
    identifier: RecipeIdentifier,
    hub: Arc<SaveNotificationHub>,
    detail_fetch: RequestSlot,
    image_fetch: RequestSlot,
    state: Mutex<DetailState>,
}

impl RecipeDetailScreen {
    /// Creates the screen and registers it with the hub so its save toggle
    /// follows saves made elsewhere.
    pub fn new(identifier: impl Into<RecipeIdentifier>, hub: Arc<SaveNotificationHub>) -> Arc<Self> {
        let screen = Arc::new(RecipeDetailScreen {
            identifier: identifier.into(),
            hub: Arc::clone(&hub),
            detail_fetch: RequestSlot::new(),
            image_fetch: RequestSlot::new(),
            state: Mutex::new(DetailState::default()),
        });
        hub.register_list_screen(Arc::downgrade(&screen) as Weak<dyn RecipeListObserver>);
        screen
    }

    pub fn identifier(&self) -> &RecipeIdentifier {
        &self.identifier
    }

    pub fn detail(&self) -> Option<RecipeDetail> {
        lock(&self.state).detail.clone()
    }

    pub fn image(&self) -> Option<FetchedImage> {
        lock(&self.state).image.clone()
    }

    /// Whether the save toggle currently shows the recipe as saved.
    pub fn is_saved(&self) -> bool {
        lock(&self.state).saved
    }

    /// Starts a detail fetch, superseding any in flight.
    pub fn begin_detail_fetch(&self) -> RequestTicket {
        tracing::debug!(identifier = %self.identifier, "starting detail fetch");
        self.detail_fetch.begin()
    }

    /// Applies a fetched detail if `ticket` is still current.
    ///
    /// A failed fetch is logged and clears the detail, its image and the
    /// save toggle, so the screen never shows a recipe it failed to load.
    pub fn complete_detail(
        &self,
        ticket: &RequestTicket,
        result: Result<RecipeDetail, ApiError>,
    ) -> bool {
        let mut state = lock(&self.state);
        if !ticket.is_current() {
            tracing::debug!(identifier = %self.identifier, "dropping stale detail");
            return false;
        }
        match result {
            Ok(detail) => {
                state.saved = detail
                    .list_item()
                    .is_some_and(|item| self.hub.is_saved(&item));
                state.detail = Some(detail);
                true
            }
            Err(e) => {
                tracing::warn!(identifier = %self.identifier, error = %e, "detail fetch failed");
                state.detail = None;
                state.image = None;
                state.saved = false;
                false
            }
        }
    }

    /// Starts an image fetch for the loaded detail.
    ///
    /// Returns `None` if no detail has been loaded or it has no image.
    pub fn begin_image_fetch(&self) -> Option<(RequestTicket, Url)> {
        let url = lock(&self.state)
            .detail
            .as_ref()
            .and_then(|detail| detail.image_url.clone())?;
        Some((self.image_fetch.begin(), url))
    }

    /// Applies a fetched image if `ticket` is still current.
    pub fn complete_image(
        &self,
        ticket: &RequestTicket,
        result: Result<FetchedImage, ApiError>,
    ) -> bool {
        let mut state = lock(&self.state);
        if !ticket.is_current() {
            return false;
        }
        match result {
            Ok(image) => {
                state.image = Some(image);
                true
            }
            Err(e) => {
                tracing::warn!(identifier = %self.identifier, error = %e, "image fetch failed");
                false
            }
        }
    }

    /// Fetches the detail and then its image, blocking on both requests.
    pub fn load(&self, client: &RecipeApiClient) {
        let ticket = self.begin_detail_fetch();
        let result = client.recipe_detail(&self.identifier);
        if !self.complete_detail(&ticket, result) {
            return;
        }
        if let Some((ticket, url)) = self.begin_image_fetch() {
            let result = client.image(&url);
            self.complete_image(&ticket, result);
        }
    }

    /// Saves the recipe if it is unsaved, otherwise unsaves it.
    ///
    /// Returns the new saved state, or `None` if no detail with an image has
    /// been loaded yet and there is nothing to save.
    pub fn toggle_saved(&self) -> Option<bool> {
        let item = lock(&self.state).detail.as_ref()?.list_item()?;
        if self.is_saved() {
            self.hub.unsave(&item);
            Some(false)
        } else {
            self.hub.save(item);
            Some(true)
        }
    }

    /// Cancels both requests and stops hub notifications.
    pub fn teardown(self: &Arc<Self>) {
        self.detail_fetch.cancel();
        self.image_fetch.cancel();
        self.hub
            .deregister_list_screen(&(Arc::downgrade(self) as Weak<dyn RecipeListObserver>));
    }
}

impl RecipeListObserver for RecipeDetailScreen {
    fn update_save_state(&self, recipe: &RecipeListItem, saved: bool) {
        if recipe.identifier == self.identifier {
            lock(&self.state).saved = saved;
        }
    }
}

impl Drop for RecipeDetailScreen {
    fn drop(&mut self) {
        self.detail_fetch.cancel();
        self.image_fetch.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HttpResponse, StubTransport};
    use crate::model::recipe_detail_fixture;
    use crate::screen::tests::{client, hub, item, BASE};
    use crate::screen::{RecipeListScreen, RecipeListSource};
    use tempfile::TempDir;

    const TERIYAKI_IMAGE: &str = "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn teriyaki() -> RecipeDetail {
        serde_json::from_str(recipe_detail_fixture()).unwrap()
    }

    #[test]
    fn test_load_fetches_detail_then_image() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            &format!("{BASE}lookup.php?i=52772"),
            &format!(r#"{{"meals": [{}]}}"#, recipe_detail_fixture()),
        );
        stub.respond_with(TERIYAKI_IMAGE, Ok(HttpResponse::ok(JPEG)));
        let screen = RecipeDetailScreen::new("52772", hub(&temp_dir));

        screen.load(&client(&stub));

        assert_eq!(screen.detail().unwrap().name, "Teriyaki Chicken Casserole");
        assert!(screen.image().is_some());
        assert_eq!(
            stub.requested(),
            vec![format!("{BASE}lookup.php?i=52772"), TERIYAKI_IMAGE.to_string()]
        );
    }

    #[test]
    fn test_missing_recipe_skips_image() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubTransport::new());
        stub.respond(&format!("{BASE}lookup.php?i=1"), r#"{"meals": null}"#);
        let screen = RecipeDetailScreen::new("1", hub(&temp_dir));

        screen.load(&client(&stub));

        assert!(screen.detail().is_none());
        assert_eq!(stub.requested().len(), 1);
    }

    #[test]
    fn test_stale_detail_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let screen = RecipeDetailScreen::new("52772", hub(&temp_dir));

        let first = screen.begin_detail_fetch();
        let second = screen.begin_detail_fetch();

        assert!(!screen.complete_detail(&first, Ok(teriyaki())));
        assert!(screen.detail().is_none());
        assert!(screen.complete_detail(&second, Ok(teriyaki())));
    }

    #[test]
    fn test_failed_refetch_clears_previous_detail() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        hub.save(teriyaki().list_item().unwrap());
        let screen = RecipeDetailScreen::new("52772", hub);
        let ticket = screen.begin_detail_fetch();
        assert!(screen.complete_detail(&ticket, Ok(teriyaki())));
        let (ticket, _) = screen.begin_image_fetch().unwrap();
        assert!(screen.complete_image(&ticket, Ok(FetchedImage::from_bytes(JPEG.to_vec()).unwrap())));
        assert!(screen.is_saved());

        let ticket = screen.begin_detail_fetch();
        assert!(!screen.complete_detail(&ticket, Err(ApiError::RecipeNotFound("52772".into()))));

        assert!(screen.detail().is_none());
        assert!(screen.image().is_none());
        assert!(!screen.is_saved());
        assert_eq!(screen.toggle_saved(), None);
    }

    #[test]
    fn test_teardown_cancels_image() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let screen = RecipeDetailScreen::new("52772", Arc::clone(&hub));
        let ticket = screen.begin_detail_fetch();
        screen.complete_detail(&ticket, Ok(teriyaki()));
        let (ticket, url) = screen.begin_image_fetch().unwrap();
        assert_eq!(url.as_str(), TERIYAKI_IMAGE);

        screen.teardown();

        assert!(!screen.complete_image(&ticket, Err(ApiError::ImageDecodeFailed("late".into()))));
        assert_eq!(hub.list_screen_count(), 0);
    }

    #[test]
    fn test_toggle_saved_reaches_list_screens() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let list = RecipeListScreen::new(RecipeListSource::Category("Chicken".into()), Arc::clone(&hub));
        let screen = RecipeDetailScreen::new("52772", Arc::clone(&hub));
        assert_eq!(screen.toggle_saved(), None);

        let ticket = screen.begin_detail_fetch();
        screen.complete_detail(&ticket, Ok(teriyaki()));
        let recipe = teriyaki().list_item().unwrap();

        assert_eq!(screen.toggle_saved(), Some(true));
        assert!(hub.is_saved(&recipe));
        assert!(list.is_saved(&recipe));

        assert_eq!(screen.toggle_saved(), Some(false));
        assert!(!hub.is_saved(&recipe));
        assert!(!list.is_saved(&recipe));
    }

    #[test]
    fn test_save_elsewhere_updates_toggle() {
        let temp_dir = TempDir::new().unwrap();
        let hub = hub(&temp_dir);
        let screen = RecipeDetailScreen::new("52772", Arc::clone(&hub));
        let ticket = screen.begin_detail_fetch();
        screen.complete_detail(&ticket, Ok(teriyaki()));
        assert!(!screen.is_saved());

        hub.save(teriyaki().list_item().unwrap());
        assert!(screen.is_saved());

        hub.save(item("other"));
        assert!(screen.is_saved());
    }
}
