uniffi::setup_scaffolding!();

pub mod api;
pub mod config;
pub mod ffi;
pub mod hub;
pub mod model;
pub mod navigation;
pub mod screen;
pub mod store;

pub use api::{ApiError, RecipeApiClient};
pub use config::AppConfig;
pub use hub::SaveNotificationHub;
pub use model::*;
pub use navigation::{NavigationRecorder, NavigationState};
pub use store::SavedRecipeStore;
