//! Recipe endpoints.

use pantry_core::registry::{Endpoint, EndpointDefinition, HttpMethod};
use pantry_core::schema::Schema;
use serde::{Deserialize, Serialize};

/// Registered name of the recipe search.
pub const SEARCH_RECIPES: &str = "searchRecipes";

/// Registered name of the recipe details lookup.
pub const GET_RECIPE_INFO: &str = "getRecipeInfo";

/// Registered name of the recipe analysis.
pub const ANALYZE_RECIPE: &str = "analyzeRecipe";

/// Query of `searchRecipes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SearchRecipesQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl SearchRecipesQuery {
    /// Search for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RecipeSummary {
    pub id: u64,
    pub title: String,
    pub image: Option<String>,
}

/// Response of `searchRecipes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SearchRecipesResponse {
    pub results: Vec<RecipeSummary>,
    pub offset: u32,
    pub number: u32,
    pub total_results: u32,
}

/// Path parameters of `getRecipeInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeId {
    /// Recipe id
    pub id: u64,
}

/// Query of `getRecipeInfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInfoQuery {
    /// Include nutrition facts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_nutrition: Option<bool>,
}

/// An ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RecipeIngredient {
    pub id: Option<u64>,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Response of `getRecipeInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RecipeInfo {
    pub id: u64,
    pub title: String,
    pub servings: u32,
    pub ready_in_minutes: u32,
    pub source_url: Option<String>,
    pub image: Option<String>,
    pub extended_ingredients: Vec<RecipeIngredient>,
    pub instructions: Option<String>,
}

/// Payload of `analyzeRecipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AnalyzeRecipePayload {
    pub title: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

/// Response of `analyzeRecipe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AnalyzedRecipe {
    pub title: String,
    pub servings: u32,
    pub extended_ingredients: Vec<RecipeIngredient>,
}

/// Typed `searchRecipes`.
#[derive(Debug, Clone, Copy)]
pub struct SearchRecipes;

impl Endpoint for SearchRecipes {
    const NAME: &'static str = SEARCH_RECIPES;
    type PathParams = ();
    type Query = SearchRecipesQuery;
    type Payload = ();
    type Response = SearchRecipesResponse;
}

/// Typed `getRecipeInfo`.
#[derive(Debug, Clone, Copy)]
pub struct GetRecipeInfo;

impl Endpoint for GetRecipeInfo {
    const NAME: &'static str = GET_RECIPE_INFO;
    type PathParams = RecipeId;
    type Query = Option<RecipeInfoQuery>;
    type Payload = ();
    type Response = RecipeInfo;
}

/// Typed `analyzeRecipe`.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeRecipe;

impl Endpoint for AnalyzeRecipe {
    const NAME: &'static str = ANALYZE_RECIPE;
    type PathParams = ();
    type Query = ();
    type Payload = AnalyzeRecipePayload;
    type Response = AnalyzedRecipe;
}

fn ingredient_line() -> Schema {
    Schema::object([
        ("id", Schema::integer().optional()),
        ("name", Schema::string()),
        ("amount", Schema::number()),
        ("unit", Schema::string()),
    ])
}

/// Definition of `searchRecipes`.
#[must_use]
pub fn search_recipes() -> EndpointDefinition {
    EndpointDefinition::new(
        SEARCH_RECIPES,
        HttpMethod::Get,
        "/recipes/complexSearch",
        Schema::object([
            (
                "results",
                Schema::array(Schema::object([
                    ("id", Schema::integer()),
                    ("title", Schema::string()),
                    ("image", Schema::string().optional()),
                ])),
            ),
            ("offset", Schema::integer()),
            ("number", Schema::integer()),
            ("totalResults", Schema::integer()),
        ]),
    )
    .with_query(Schema::object([
        ("query", Schema::string()),
        ("cuisine", Schema::string().optional()),
        ("diet", Schema::string().optional()),
        ("offset", Schema::integer().optional()),
        ("number", Schema::integer().optional()),
    ]))
}

/// Definition of `getRecipeInfo`.
#[must_use]
pub fn get_recipe_info() -> EndpointDefinition {
    EndpointDefinition::new(
        GET_RECIPE_INFO,
        HttpMethod::Get,
        "/recipes/:id/information",
        Schema::object([
            ("id", Schema::integer()),
            ("title", Schema::string()),
            ("servings", Schema::integer()),
            ("readyInMinutes", Schema::integer()),
            ("sourceUrl", Schema::string().optional()),
            ("image", Schema::string().optional()),
            ("extendedIngredients", Schema::array(ingredient_line())),
            ("instructions", Schema::string().optional()),
        ]),
    )
    .with_path_params(Schema::object([("id", Schema::integer())]))
    .with_query(Schema::object([("includeNutrition", Schema::boolean().optional())]).optional())
}

/// Definition of `analyzeRecipe`.
#[must_use]
pub fn analyze_recipe() -> EndpointDefinition {
    EndpointDefinition::new(
        ANALYZE_RECIPE,
        HttpMethod::Post,
        "/recipes/analyze",
        Schema::object([
            ("title", Schema::string()),
            ("servings", Schema::integer()),
            ("extendedIngredients", Schema::array(ingredient_line())),
        ]),
    )
    .with_payload(Schema::object([
        ("title", Schema::string()),
        ("servings", Schema::integer()),
        ("ingredients", Schema::array(Schema::string())),
        ("instructions", Schema::string()),
    ]))
}
