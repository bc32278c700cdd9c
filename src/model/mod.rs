//! Data model shared by the API client, the saved-recipe store and the
//! navigation model.
//!
//! Recipes are keyed by [`RecipeIdentifier`] everywhere. Both
//! [`RecipeListItem`] and [`RecipeDetail`] compare and hash by identifier
//! only, so the same recipe fetched twice (or saved with stale display data)
//! is still the same recipe.

mod recipe_detail;
mod recipe_list_item;

pub use recipe_detail::{IngredientMeasurement, RecipeDecodeError, RecipeDetail, INGREDIENT_FIELD_COUNT};
pub use recipe_list_item::RecipeListItem;

/// Identifier of a recipe in the remote database (`idMeal`).
pub type RecipeIdentifier = String;

/// Category name used as a filter key (`strCategory`).
pub type RecipeCategory = String;

/// Ingredient name used as a filter key (`strIngredient`).
pub type Ingredient = String;

/// Free-form measurement paired with an ingredient (`strMeasure`).
pub type Measurement = String;

#[cfg(test)]
pub(crate) fn recipe_detail_fixture() -> &'static str {
    recipe_detail::tests::TERIYAKI_JSON
}
