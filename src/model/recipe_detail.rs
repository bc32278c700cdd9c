use super::{Ingredient, Measurement, RecipeCategory, RecipeIdentifier, RecipeListItem};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};
use thiserror::Error;
use url::Url;

/// Number of positional `strIngredientN` / `strMeasureN` pairs a meal carries.
pub const INGREDIENT_FIELD_COUNT: usize = 20;

/// An ingredient together with its measurement, as listed in a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngredientMeasurement {
    pub ingredient: Ingredient,
    pub measurement: Measurement,
}

impl IngredientMeasurement {
    pub fn new(ingredient: impl Into<Ingredient>, measurement: impl Into<Measurement>) -> Self {
        IngredientMeasurement {
            ingredient: ingredient.into(),
            measurement: measurement.into(),
        }
    }
}

/// Full recipe record returned by a by-id lookup.
///
/// Decoding is done by hand from the raw meal object because the remote API
/// spreads ingredients over twenty numbered key pairs and is loose about
/// URLs and tags:
/// - `strMealThumb` / `strYoutube` that are empty or unparseable decode to `None`
/// - `strTags` is a comma-separated string; absent or null means no tags
/// - ingredient pairs with an absent or empty ingredient are skipped
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct RecipeDetail {
    pub identifier: RecipeIdentifier,
    pub name: String,
    pub category: RecipeCategory,
    pub region: String,
    pub instructions: String,
    pub image_url: Option<Url>,
    pub video_url: Option<Url>,
    pub tags: Vec<String>,
    pub ingredients: Vec<IngredientMeasurement>,
}

/// Errors raised when a meal object cannot be turned into a [`RecipeDetail`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeDecodeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl RecipeDetail {
    /// Builds the list item used to save or unsave this recipe.
    ///
    /// Returns `None` when the recipe has no usable image URL, since list
    /// items always carry a thumbnail.
    pub fn list_item(&self) -> Option<RecipeListItem> {
        let image_url = self.image_url.clone()?;
        Some(RecipeListItem::new(
            self.identifier.clone(),
            self.name.clone(),
            image_url,
        ))
    }
}

impl TryFrom<Map<String, Value>> for RecipeDetail {
    type Error = RecipeDecodeError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let meal = MealFields::new(&fields);

        Ok(RecipeDetail {
            identifier: meal.required("idMeal")?,
            name: meal.required("strMeal")?,
            category: meal.required("strCategory")?,
            region: meal.required("strArea")?,
            instructions: meal.required("strInstructions")?,
            image_url: meal.url("strMealThumb"),
            video_url: meal.url("strYoutube"),
            tags: meal.tags("strTags"),
            ingredients: meal.ingredients(),
        })
    }
}

impl PartialEq for RecipeDetail {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for RecipeDetail {}

impl Hash for RecipeDetail {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Key-value accessor over a raw meal object.
struct MealFields<'a> {
    data: &'a Map<String, Value>,
}

impl<'a> MealFields<'a> {
    fn new(data: &'a Map<String, Value>) -> Self {
        MealFields { data }
    }

    /// Returns the string at `key`, treating null and non-string values as absent.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    fn required(&self, key: &'static str) -> Result<String, RecipeDecodeError> {
        self.get(key)
            .map(str::to_string)
            .ok_or(RecipeDecodeError::MissingField(key))
    }

    fn url(&self, key: &str) -> Option<Url> {
        let raw = self.get(key)?.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(field = key, value = raw, error = %e, "ignoring malformed url");
                None
            }
        }
    }

    fn tags(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|tag_str| {
                tag_str
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn ingredients(&self) -> Vec<IngredientMeasurement> {
        (1..=INGREDIENT_FIELD_COUNT)
            .filter_map(|n| {
                let ingredient = self
                    .get(&format!("strIngredient{n}"))
                    .filter(|s| !s.is_empty())?;
                let measurement = self.get(&format!("strMeasure{n}")).unwrap_or_default();
                Some(IngredientMeasurement::new(ingredient, measurement))
            })
            .collect()
    }
}
