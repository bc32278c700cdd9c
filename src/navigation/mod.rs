//! Navigation state model.
//!
//! [`NavigationState`] describes where the user is in the app's four tabs,
//! down to the recipe they are looking at. It is persisted in an activity
//! record (see [`NavigationRecorder`]) and replayed at launch through the
//! restoration protocol in [`restore`].
//!
//! The encoded form is JSON with explicit discriminants: `section` selects
//! the tab and `location.screen` selects the drill-down depth.
//!
//! ```json
//! {"section":"categories","location":{"screen":"recipe","category":"Beef","identifier":"52772"}}
//! ```

mod activity;
mod restore;

pub use activity::{ActivityRecord, NavigationRecorder, ACTIVITY_TYPE};
pub use restore::{restoration_steps, restore, RestorationStep, Screen, ScreenController, ScreenStack};

use crate::model::{Ingredient, RecipeCategory, RecipeIdentifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestorationError {
    #[error("Failed to encode navigation state: {0}")]
    EncodeFailed(String),

    #[error("Failed to decode navigation state: {0}")]
    DecodeFailed(String),
}

/// The app's top-level tabs, in tab bar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    SavedRecipes,
    Search,
    Categories,
    Ingredients,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::SavedRecipes, Tab::Search, Tab::Categories, Tab::Ingredients];

    /// Position of the tab in the tab bar.
    pub fn index(self) -> usize {
        match self {
            Tab::SavedRecipes => 0,
            Tab::Search => 1,
            Tab::Categories => 2,
            Tab::Ingredients => 3,
        }
    }
}

/// Where the user currently is in the app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "section", content = "location", rename_all = "snake_case")]
pub enum NavigationState {
    SavedRecipes(SavedRecipesLocation),
    Search(SearchLocation),
    Categories(CategoriesLocation),
    Ingredients(IngredientsLocation),
}

/// Location within the saved recipes tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum SavedRecipesLocation {
    All,
    Recipe { identifier: RecipeIdentifier },
}

/// Location within the search tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum SearchLocation {
    /// No search term entered yet
    None,
    Term { term: String },
    Recipe { term: String, identifier: RecipeIdentifier },
}

/// Location within the categories tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum CategoriesLocation {
    All,
    Category { category: RecipeCategory },
    Recipe { category: RecipeCategory, identifier: RecipeIdentifier },
}

/// Location within the ingredients tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum IngredientsLocation {
    All,
    Ingredient { ingredient: Ingredient },
    Recipe { ingredient: Ingredient, identifier: RecipeIdentifier },
}

impl Default for NavigationState {
    /// All saved recipes.
    fn default() -> Self {
        NavigationState::SavedRecipes(SavedRecipesLocation::All)
    }
}

impl NavigationState {
    pub fn tab(&self) -> Tab {
        match self {
            NavigationState::SavedRecipes(_) => Tab::SavedRecipes,
            NavigationState::Search(_) => Tab::Search,
            NavigationState::Categories(_) => Tab::Categories,
            NavigationState::Ingredients(_) => Tab::Ingredients,
        }
    }

    pub fn tab_index(&self) -> usize {
        self.tab().index()
    }

    /// Identifier of the recipe shown at the top of the stack, if any.
    pub fn recipe_identifier(&self) -> Option<&RecipeIdentifier> {
        match self {
            NavigationState::SavedRecipes(SavedRecipesLocation::Recipe { identifier })
            | NavigationState::Search(SearchLocation::Recipe { identifier, .. })
            | NavigationState::Categories(CategoriesLocation::Recipe { identifier, .. })
            | NavigationState::Ingredients(IngredientsLocation::Recipe { identifier, .. }) => {
                Some(identifier)
            }
            _ => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, RestorationError> {
        serde_json::to_vec(self).map_err(|e| RestorationError::EncodeFailed(e.to_string()))
    }

    pub fn try_decode(data: &[u8]) -> Result<Self, RestorationError> {
        serde_json::from_slice(data).map_err(|e| RestorationError::DecodeFailed(e.to_string()))
    }

    /// Decodes a persisted state, falling back to the default state when the
    /// data is unreadable. Restoration is best-effort and never fails.
    pub fn decode(data: &[u8]) -> Self {
        Self::try_decode(data).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "restoring default navigation");
            NavigationState::default()
        })
    }
}
