use super::{
    CategoriesLocation, IngredientsLocation, NavigationState, SavedRecipesLocation,
    SearchLocation, Tab,
};
use crate::model::{Ingredient, RecipeCategory, RecipeIdentifier};

/// A screen pushed on top of a tab's root screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Screen {
    RecipesForCategory(RecipeCategory),
    RecipesForIngredient(Ingredient),
    RecipeDetail(RecipeIdentifier),
}

/// One step of rebuilding the screen stack for a [`NavigationState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RestorationStep {
    SelectTab(Tab),
    /// Fill in the search field without running the search
    SetSearchTerm(String),
    Push(Screen),
}

/// Host-side screen navigation driven by [`restore`].
pub trait ScreenController {
    fn select_tab(&mut self, tab: Tab);

    /// Sets the search tab's term. Must not issue a network search.
    fn set_search_term(&mut self, term: &str);

    /// Pushes `screen` onto the selected tab's navigation stack.
    fn push(&mut self, screen: Screen);
}

/// Computes the ordered steps that rebuild the screen stack for `state`.
///
/// The tab is always selected first. Drill-down screens follow in forward
/// order, so a recipe detail is always the last push and ends up on top.
pub fn restoration_steps(state: &NavigationState) -> Vec<RestorationStep> {
    let mut steps = vec![RestorationStep::SelectTab(state.tab())];

    match state {
        NavigationState::SavedRecipes(location) => match location {
            SavedRecipesLocation::All => {}
            SavedRecipesLocation::Recipe { identifier } => {
                steps.push(RestorationStep::Push(Screen::RecipeDetail(identifier.clone())));
            }
        },
        NavigationState::Search(location) => match location {
            SearchLocation::None => {}
            SearchLocation::Term { term } => {
                steps.push(RestorationStep::SetSearchTerm(term.clone()));
            }
            SearchLocation::Recipe { term, identifier } => {
                // The term must be in place before the detail is pushed so the
                // detail has its search results to go back to.
                steps.push(RestorationStep::SetSearchTerm(term.clone()));
                steps.push(RestorationStep::Push(Screen::RecipeDetail(identifier.clone())));
            }
        },
        NavigationState::Categories(location) => match location {
            CategoriesLocation::All => {}
            CategoriesLocation::Category { category } => {
                steps.push(RestorationStep::Push(Screen::RecipesForCategory(category.clone())));
            }
            CategoriesLocation::Recipe {
                category,
                identifier,
            } => {
                steps.push(RestorationStep::Push(Screen::RecipesForCategory(category.clone())));
                steps.push(RestorationStep::Push(Screen::RecipeDetail(identifier.clone())));
            }
        },
        NavigationState::Ingredients(location) => match location {
            IngredientsLocation::All => {}
            IngredientsLocation::Ingredient { ingredient } => {
                steps.push(RestorationStep::Push(Screen::RecipesForIngredient(
                    ingredient.clone(),
                )));
            }
            IngredientsLocation::Recipe {
                ingredient,
                identifier,
            } => {
                steps.push(RestorationStep::Push(Screen::RecipesForIngredient(
                    ingredient.clone(),
                )));
                steps.push(RestorationStep::Push(Screen::RecipeDetail(identifier.clone())));
            }
        },
    }

    steps
}

/// Replays `state` onto `controller`.
pub fn restore(state: &NavigationState, controller: &mut impl ScreenController) {
    tracing::info!(?state, "restoring navigation");
    for step in restoration_steps(state) {
        match step {
            RestorationStep::SelectTab(tab) => controller.select_tab(tab),
            RestorationStep::SetSearchTerm(term) => controller.set_search_term(&term),
            RestorationStep::Push(screen) => controller.push(screen),
        }
    }
}

/// In-memory screen stacks, one per tab.
///
/// Useful for hosts that rebuild their UI from a plain description, and as
/// the reference [`ScreenController`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenStack {
    selected: Option<Tab>,
    search_term: Option<String>,
    stacks: [Vec<Screen>; 4],
}

impl ScreenStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the stacks for `state` from scratch.
    pub fn restored(state: &NavigationState) -> Self {
        let mut stack = Self::new();
        restore(state, &mut stack);
        stack
    }

    pub fn selected_tab(&self) -> Option<Tab> {
        self.selected
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    /// Screens pushed above the root of `tab`, bottom first.
    pub fn screens(&self, tab: Tab) -> &[Screen] {
        &self.stacks[tab.index()]
    }

    /// Topmost pushed screen of the selected tab.
    pub fn top(&self) -> Option<&Screen> {
        self.selected.and_then(|tab| self.stacks[tab.index()].last())
    }

    pub fn pop(&mut self) -> Option<Screen> {
        let tab = self.selected?;
        self.stacks[tab.index()].pop()
    }
}

impl ScreenController for ScreenStack {
    fn select_tab(&mut self, tab: Tab) {
        self.selected = Some(tab);
    }

    fn set_search_term(&mut self, term: &str) {
        self.search_term = Some(term.to_string());
    }

    fn push(&mut self, screen: Screen) {
        // Pushing before a tab is selected lands on the default tab
        let tab = *self.selected.get_or_insert(Tab::SavedRecipes);
        self.stacks[tab.index()].push(screen);
    }
}
