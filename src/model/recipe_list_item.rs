use super::RecipeIdentifier;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use url::Url;

/// Lightweight recipe summary shown in every recipe list.
///
/// The serialized form uses the remote API keys (`idMeal`, `strMeal`,
/// `strMealThumb`), so the same type decodes search/filter responses and the
/// persisted saved-recipes file.
///
/// `newly_added` is display state for the saved-recipes screen. It is never
/// serialized and plays no part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeListItem {
    #[serde(rename = "idMeal")]
    pub identifier: RecipeIdentifier,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb")]
    pub image_url: Url,
    #[serde(skip)]
    pub newly_added: bool,
}

impl RecipeListItem {
    pub fn new(identifier: impl Into<RecipeIdentifier>, name: impl Into<String>, image_url: Url) -> Self {
        RecipeListItem {
            identifier: identifier.into(),
            name: name.into(),
            image_url,
            newly_added: false,
        }
    }
}

impl PartialEq for RecipeListItem {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for RecipeListItem {}

impl Hash for RecipeListItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}
