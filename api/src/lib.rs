//! # Pantry API
//!
//! The endpoint registry of the food API and the Rust types of its requests
//! and responses.
//!
//! | name | method | URL |
//! |------|--------|-----|
//! | `searchIngredient` | GET | `/food/ingredients/search` |
//! | `getIngredientInfo` | GET | `/food/ingredients/:id/information` |
//! | `searchRecipes` | GET | `/recipes/complexSearch` |
//! | `getRecipeInfo` | GET | `/recipes/:id/information` |
//! | `analyzeRecipe` | POST | `/recipes/analyze` |
//!
//! ```
//! let registry = pantry_api::registry().unwrap();
//! let endpoint = registry.lookup("getIngredientInfo").unwrap();
//! assert_eq!(endpoint.url_template(), "/food/ingredients/:id/information");
//! ```

use pantry_core::registry::{ApiRegistry, EndpointDefinition, RegistryError};
use std::sync::LazyLock;

pub mod ingredient;
pub mod recipe;

pub use ingredient::{
    GetIngredientInfo, IngredientId, IngredientInfo, IngredientInfoQuery, SearchIngredient,
    SearchIngredientQuery, SearchIngredientResponse,
};
pub use pantry_core::classify::ErrorEnvelope;
pub use recipe::{
    AnalyzeRecipe, AnalyzeRecipePayload, AnalyzedRecipe, GetRecipeInfo, RecipeId, RecipeInfo,
    RecipeInfoQuery, SearchRecipes, SearchRecipesQuery, SearchRecipesResponse,
};

static REGISTRY: LazyLock<Result<ApiRegistry, RegistryError>> = LazyLock::new(build_registry);

/// Every endpoint definition of the API.
#[must_use]
pub fn definitions() -> Vec<EndpointDefinition> {
    vec![
        ingredient::search_ingredient(),
        ingredient::get_ingredient_info(),
        recipe::search_recipes(),
        recipe::get_recipe_info(),
        recipe::analyze_recipe(),
    ]
}

/// Build a fresh registry from [`definitions`].
///
/// # Errors
///
/// Returns [`RegistryError`] if a definition is inconsistent.
pub fn build_registry() -> Result<ApiRegistry, RegistryError> {
    Ok(ApiRegistry::builder().register_all(definitions())?.build())
}

/// The process-wide registry, built on first use.
///
/// # Errors
///
/// Returns the [`RegistryError`] raised while building it.
pub fn registry() -> Result<&'static ApiRegistry, RegistryError> {
    REGISTRY.as_ref().map_err(Clone::clone)
}
