//! Client for the remote recipe API (TheMealDB).
//!
//! Every endpoint answers with a `{"meals": ...}` envelope, but the API is
//! inconsistent about what "nothing found" looks like. The client absorbs
//! that here so callers only see typed results:
//!
//! | request              | `meals: null`            | `meals` key missing |
//! |----------------------|--------------------------|---------------------|
//! | detail / item by id  | [`ApiError::RecipeNotFound`] | [`ApiError::RequestFailed`] |
//! | search / filter      | empty list               | [`ApiError::RequestFailed`] |
//! | category / ingredient list | [`ApiError::RequestFailed`] | [`ApiError::RequestFailed`] |

mod image;
mod transport;

pub use image::{FetchedImage, ImageFormat};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

#[cfg(test)]
pub(crate) use transport::stub::StubTransport;

use crate::config::AppConfig;
use crate::model::{Ingredient, RecipeCategory, RecipeDetail, RecipeIdentifier, RecipeListItem};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors surfaced by the API client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeIdentifier),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Image could not be decoded: {0}")]
    ImageDecodeFailed(String),
}

/// The request shapes understood by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRequest<'a> {
    /// `lookup.php?i=<id>`
    Lookup(&'a str),
    /// `search.php?s=<term>`
    Search(&'a str),
    /// `filter.php?c=<category>`
    FilterByCategory(&'a str),
    /// `filter.php?i=<ingredient>`
    FilterByIngredient(&'a str),
    /// `list.php?c=list`
    ListCategories,
    /// `list.php?i=list`
    ListIngredients,
}

impl ApiRequest<'_> {
    pub fn sub_path(&self) -> &'static str {
        match self {
            ApiRequest::Lookup(_) => "lookup.php",
            ApiRequest::Search(_) => "search.php",
            ApiRequest::FilterByCategory(_) | ApiRequest::FilterByIngredient(_) => "filter.php",
            ApiRequest::ListCategories | ApiRequest::ListIngredients => "list.php",
        }
    }

    pub fn query(&self) -> (&'static str, &str) {
        match self {
            ApiRequest::Lookup(id) => ("i", id),
            ApiRequest::Search(term) => ("s", term),
            ApiRequest::FilterByCategory(category) => ("c", category),
            ApiRequest::FilterByIngredient(ingredient) => ("i", ingredient),
            ApiRequest::ListCategories => ("c", "list"),
            ApiRequest::ListIngredients => ("i", "list"),
        }
    }

    /// Resolves the request against the API base URL.
    pub fn url(&self, base_url: &Url) -> Result<Url, ApiError> {
        let mut url = base_url
            .join(self.sub_path())
            .map_err(|e| ApiError::RequestFailed(format!("invalid request url: {e}")))?;
        let (key, value) = self.query();
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }
}

#[derive(Deserialize)]
struct CategoryEntry {
    #[serde(rename = "strCategory")]
    category: RecipeCategory,
}

#[derive(Deserialize)]
struct IngredientEntry {
    #[serde(rename = "strIngredient")]
    ingredient: Ingredient,
}

/// Typed client over an [`HttpTransport`].
#[derive(Clone)]
pub struct RecipeApiClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
}

impl RecipeApiClient {
    /// Creates a client for `base_url`.
    ///
    /// The base URL is treated as a directory, so a missing trailing slash
    /// is added before sub-paths are joined onto it.
    pub fn new(mut base_url: Url, transport: Arc<dyn HttpTransport>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        RecipeApiClient {
            base_url,
            transport,
        }
    }

    /// Creates a client backed by [`ReqwestTransport`] using the configured
    /// base URL and timeout.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let transport =
            ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(config.api_base_url.clone(), Arc::new(transport)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches full detail for a recipe.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RecipeNotFound`] if the API answers `meals: null`
    /// - [`ApiError::RequestFailed`] if the envelope or recipe is malformed
    /// - [`ApiError::Transport`] on network failure or non-200 status
    pub fn recipe_detail(&self, identifier: &str) -> Result<RecipeDetail, ApiError> {
        let meals = self.fetch_meals::<RecipeDetail>(ApiRequest::Lookup(identifier))?;
        first_or_not_found(meals, identifier)
    }

    /// Fetches a single recipe as a list item, with the same not-found rules
    /// as [`recipe_detail`](Self::recipe_detail).
    pub fn recipe_list_item(&self, identifier: &str) -> Result<RecipeListItem, ApiError> {
        let meals = self.fetch_meals::<RecipeListItem>(ApiRequest::Lookup(identifier))?;
        first_or_not_found(meals, identifier)
    }

    /// Searches recipes by name. No matches yields an empty list.
    pub fn search(&self, term: &str) -> Result<Vec<RecipeListItem>, ApiError> {
        self.fetch_list(ApiRequest::Search(term))
    }

    /// Lists recipes filed under `category`. No matches yields an empty list.
    pub fn recipes_for_category(&self, category: &str) -> Result<Vec<RecipeListItem>, ApiError> {
        self.fetch_list(ApiRequest::FilterByCategory(category))
    }

    /// Lists recipes using `ingredient`. No matches yields an empty list.
    pub fn recipes_for_ingredient(
        &self,
        ingredient: &str,
    ) -> Result<Vec<RecipeListItem>, ApiError> {
        self.fetch_list(ApiRequest::FilterByIngredient(ingredient))
    }

    /// Lists every recipe category known to the API.
    pub fn categories(&self) -> Result<Vec<RecipeCategory>, ApiError> {
        let entries = self
            .fetch_meals::<CategoryEntry>(ApiRequest::ListCategories)?
            .ok_or_else(|| ApiError::RequestFailed("category list is null".to_string()))?;
        Ok(entries.into_iter().map(|e| e.category).collect())
    }

    /// Lists every ingredient known to the API.
    pub fn ingredients(&self) -> Result<Vec<Ingredient>, ApiError> {
        let entries = self
            .fetch_meals::<IngredientEntry>(ApiRequest::ListIngredients)?
            .ok_or_else(|| ApiError::RequestFailed("ingredient list is null".to_string()))?;
        Ok(entries.into_iter().map(|e| e.ingredient).collect())
    }

    /// Downloads an image and checks that the body starts with a recognised
    /// image signature. The body is not decoded.
    pub fn image(&self, url: &Url) -> Result<FetchedImage, ApiError> {
        let body = self.send(url)?;
        FetchedImage::from_bytes(body).ok_or_else(|| {
            tracing::warn!(%url, "image body is not a recognised image");
            ApiError::ImageDecodeFailed(url.to_string())
        })
    }

    fn fetch_list(&self, request: ApiRequest<'_>) -> Result<Vec<RecipeListItem>, ApiError> {
        Ok(self.fetch_meals(request)?.unwrap_or_default())
    }

    /// Sends `request` and decodes the `meals` envelope.
    ///
    /// `Ok(None)` means the key was present with a null value.
    fn fetch_meals<T: DeserializeOwned>(
        &self,
        request: ApiRequest<'_>,
    ) -> Result<Option<Vec<T>>, ApiError> {
        let url = request.url(&self.base_url)?;
        let body = self.send(&url)?;
        decode_meals(&body)
    }

    fn send(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        let response = self.transport.get(url)?;
        if response.status != 200 {
            tracing::warn!(%url, status = response.status, "request returned non-200 status");
            return Err(TransportError::Status(response.status).into());
        }
        Ok(response.body)
    }
}

fn first_or_not_found<T>(meals: Option<Vec<T>>, identifier: &str) -> Result<T, ApiError> {
    meals
        .and_then(|meals| meals.into_iter().next())
        .ok_or_else(|| ApiError::RecipeNotFound(identifier.to_string()))
}

/// Decodes a `{"meals": [...] | null}` envelope.
fn decode_meals<T: DeserializeOwned>(body: &[u8]) -> Result<Option<Vec<T>>, ApiError> {
    let mut envelope: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::RequestFailed(format!("response is not JSON: {e}")))?;

    let meals = envelope
        .as_object_mut()
        .and_then(|fields| fields.remove("meals"))
        .ok_or_else(|| ApiError::RequestFailed("response has no `meals` key".to_string()))?;

    if meals.is_null() {
        return Ok(None);
    }

    serde_json::from_value(meals)
        .map(Some)
        .map_err(|e| ApiError::RequestFailed(format!("unexpected `meals` shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::recipe_detail_fixture;
    use indoc::indoc;

    const BASE: &str = "https://www.themealdb.com/api/json/v1/1/";

    fn client(stub: Arc<StubTransport>) -> RecipeApiClient {
        RecipeApiClient::new(Url::parse(BASE).unwrap(), stub)
    }

    fn endpoint(path_and_query: &str) -> String {
        format!("{BASE}{path_and_query}")
    }

    const TWO_RESULTS: &str = indoc! {r#"
        {
            "meals": [
                {
                    "strMeal": "Chicken Handi",
                    "strMealThumb": "https://www.themealdb.com/images/media/meals/wyxwsp1486979827.jpg",
                    "idMeal": "52795"
                },
                {
                    "strMeal": "Chicken Congee",
                    "strMealThumb": "https://www.themealdb.com/images/media/meals/1529446352.jpg",
                    "idMeal": "52956"
                }
            ]
        }"#};

    #[test]
    fn test_request_urls() {
        let base = Url::parse(BASE).unwrap();
        let cases = [
            (ApiRequest::Lookup("52772"), "lookup.php?i=52772"),
            (ApiRequest::Search("chicken"), "search.php?s=chicken"),
            (ApiRequest::FilterByCategory("Seafood"), "filter.php?c=Seafood"),
            (ApiRequest::FilterByIngredient("chicken_breast"), "filter.php?i=chicken_breast"),
            (ApiRequest::ListCategories, "list.php?c=list"),
            (ApiRequest::ListIngredients, "list.php?i=list"),
        ];
        for (request, expected) in cases {
            assert_eq!(request.url(&base).unwrap().as_str(), endpoint(expected));
        }
    }

    #[test]
    fn test_request_url_escapes_terms() {
        let base = Url::parse(BASE).unwrap();
        let url = ApiRequest::Search("mac & cheese").url(&base).unwrap();
        assert_eq!(url.as_str(), endpoint("search.php?s=mac+%26+cheese"));
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let stub = Arc::new(StubTransport::new());
        let client = RecipeApiClient::new(
            Url::parse("https://www.themealdb.com/api/json/v1/1").unwrap(),
            stub,
        );
        assert_eq!(client.base_url().as_str(), BASE);
    }

    #[test]
    fn test_recipe_detail_found() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            &endpoint("lookup.php?i=52772"),
            &format!(r#"{{"meals": [{}]}}"#, recipe_detail_fixture()),
        );

        let recipe = client(stub).recipe_detail("52772").unwrap();
        assert_eq!(recipe.identifier, "52772");
        assert_eq!(recipe.tags, vec!["Meat", "Casserole"]);
        assert_eq!(recipe.ingredients.len(), 9);
    }

    #[test]
    fn test_recipe_detail_null_is_not_found() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("lookup.php?i=-1"), r#"{"meals": null}"#);

        let err = client(stub).recipe_detail("-1").unwrap_err();
        assert_eq!(err, ApiError::RecipeNotFound("-1".to_string()));
    }

    #[test]
    fn test_recipe_detail_missing_key_is_request_failed() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("lookup.php?i=52772"), r#"{"drinks": []}"#);

        let err = client(stub).recipe_detail("52772").unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }

    #[test]
    fn test_recipe_detail_malformed_recipe_is_request_failed() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("lookup.php?i=1"), r#"{"meals": [{"strMeal": "No id"}]}"#);

        let err = client(stub).recipe_detail("1").unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }

    #[test]
    fn test_recipe_list_item_by_id() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            &endpoint("lookup.php?i=52816"),
            indoc! {r#"
                {"meals": [{
                    "idMeal": "52816",
                    "strMeal": "Roasted Eggplant With Tahini, Pine Nuts, and Lentils",
                    "strMealThumb": "https://www.themealdb.com/images/media/meals/ysqrus1487425681.jpg",
                    "strCategory": "Vegetarian"
                }]}"#},
        );
        stub.respond(&endpoint("lookup.php?i=-1"), r#"{"meals": null}"#);

        let client = client(stub);
        let item = client.recipe_list_item("52816").unwrap();
        assert_eq!(item.name, "Roasted Eggplant With Tahini, Pine Nuts, and Lentils");
        assert!(matches!(
            client.recipe_list_item("-1"),
            Err(ApiError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_search_results_keep_server_order() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("search.php?s=chicken"), TWO_RESULTS);

        let results = client(stub).search("chicken").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Chicken Handi");
        assert_eq!(results[1].name, "Chicken Congee");
    }

    #[test]
    fn test_search_null_is_empty_list() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("search.php?s=abcdef"), r#"{"meals": null}"#);

        let results = client(stub).search("abcdef").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_missing_key_is_request_failed() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("search.php?s=abcdef"), r#"{}"#);

        let err = client(stub).search("abcdef").unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }

    #[test]
    fn test_filters_treat_null_as_empty() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("filter.php?c=Seafood"), TWO_RESULTS);
        stub.respond(&endpoint("filter.php?c=Nothing"), r#"{"meals": null}"#);
        stub.respond(&endpoint("filter.php?i=chicken"), TWO_RESULTS);
        stub.respond(&endpoint("filter.php?i=unobtainium"), r#"{"meals": null}"#);

        let client = client(stub);
        assert_eq!(client.recipes_for_category("Seafood").unwrap().len(), 2);
        assert!(client.recipes_for_category("Nothing").unwrap().is_empty());
        assert_eq!(client.recipes_for_ingredient("chicken").unwrap().len(), 2);
        assert!(client.recipes_for_ingredient("unobtainium").unwrap().is_empty());
    }

    #[test]
    fn test_category_and_ingredient_lists() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            &endpoint("list.php?c=list"),
            r#"{"meals": [{"strCategory": "Beef"}, {"strCategory": "Breakfast"}]}"#,
        );
        stub.respond(
            &endpoint("list.php?i=list"),
            r#"{"meals": [{"idIngredient": "1", "strIngredient": "Chicken", "strDescription": null}]}"#,
        );

        let client = client(stub);
        assert_eq!(client.categories().unwrap(), vec!["Beef", "Breakfast"]);
        assert_eq!(client.ingredients().unwrap(), vec!["Chicken"]);
    }

    #[test]
    fn test_non_200_is_transport_error() {
        let stub = Arc::new(StubTransport::new());
        stub.respond_with(&endpoint("search.php?s=chicken"), Ok(HttpResponse::with_status(500)));
        stub.respond_with(
            &endpoint("search.php?s=offline"),
            Err(TransportError::Network("connection refused".to_string())),
        );

        let client = client(stub);
        assert_eq!(
            client.search("chicken").unwrap_err(),
            ApiError::Transport(TransportError::Status(500))
        );
        assert!(matches!(
            client.search("offline"),
            Err(ApiError::Transport(TransportError::Network(_)))
        ));
    }

    #[test]
    fn test_non_json_body_is_request_failed() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(&endpoint("search.php?s=chicken"), "<html>oops</html>");

        let err = client(stub).search("chicken").unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }

    #[test]
    fn test_image_fetch() {
        let stub = Arc::new(StubTransport::new());
        let good = "https://www.themealdb.com/images/good.jpg";
        let bad = "https://www.themealdb.com/images/bad.jpg";
        let missing = "https://www.themealdb.com/images/missing.jpg";
        stub.respond_with(good, Ok(HttpResponse::ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00])));
        stub.respond(bad, "not an image");

        let client = client(stub);
        let image = client.image(&Url::parse(good).unwrap()).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);

        assert_eq!(
            client.image(&Url::parse(bad).unwrap()).unwrap_err(),
            ApiError::ImageDecodeFailed(bad.to_string())
        );
        assert_eq!(
            client.image(&Url::parse(missing).unwrap()).unwrap_err(),
            ApiError::Transport(TransportError::Status(404))
        );
    }
}
