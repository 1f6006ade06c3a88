//! Ingredient endpoints.
//!
//! - `searchIngredient`: GET `/food/ingredients/search`
//! - `getIngredientInfo`: GET `/food/ingredients/:id/information`

use pantry_core::registry::{Endpoint, EndpointDefinition, HttpMethod};
use pantry_core::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registered name of the ingredient search.
pub const SEARCH_INGREDIENT: &str = "searchIngredient";

/// Registered name of the ingredient details lookup.
pub const GET_INGREDIENT_INFO: &str = "getIngredientInfo";

/// Query of `searchIngredient`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SearchIngredientQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_children: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_protein_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_protein_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_fat_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fat_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_carbs_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_carbs_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_information: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intolerances: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl SearchIngredientQuery {
    /// Search for `query` with every filter unset.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Limit the number of results.
    #[must_use]
    pub const fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSummary {
    /// Ingredient id
    pub id: u64,
    /// Name
    pub name: String,
    /// Image file name
    pub image: String,
}

/// Response of `searchIngredient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIngredientResponse {
    /// Hits
    pub results: Vec<IngredientSummary>,
    /// Offset of the first hit
    pub offset: u32,
    /// Hits returned
    pub number: u32,
    /// Total hits
    pub total_results: u32,
}

/// Path parameters of `getIngredientInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientId {
    /// Ingredient id
    pub id: u64,
}

/// Query of `getIngredientInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientInfoQuery {
    /// Amount the nutrition refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Unit of `amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Estimated cost of an amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedCost {
    /// Cost
    pub value: f64,
    /// Currency unit
    pub unit: String,
}

/// One nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub percent_of_daily_needs: f64,
}

/// One nutritional property (glycemic index, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NutritionProperty {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Share of calories per macronutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CaloricBreakdown {
    pub percent_protein: f64,
    pub percent_fat: f64,
    pub percent_carbs: f64,
}

/// Weight of one serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct WeightPerServing {
    pub amount: f64,
    pub unit: String,
}

/// Nutrition facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Nutrition {
    pub nutrients: Vec<Nutrient>,
    pub properties: Vec<NutritionProperty>,
    pub caloric_breakdown: CaloricBreakdown,
    pub weight_per_serving: WeightPerServing,
}

/// Response of `getIngredientInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct IngredientInfo {
    pub id: u64,
    pub original: String,
    pub original_name: String,
    pub name: String,
    pub name_clean: Option<String>,
    pub amount: f64,
    pub unit: String,
    pub unit_short: String,
    pub unit_long: String,
    pub possible_units: Vec<String>,
    pub estimated_cost: EstimatedCost,
    pub consistency: String,
    pub shopping_list_units: Vec<String>,
    pub aisle: String,
    pub image: String,
    pub meta: Vec<Value>,
    pub nutrition: Nutrition,
    pub category_path: Vec<String>,
}

/// Typed `searchIngredient`.
#[derive(Debug, Clone, Copy)]
pub struct SearchIngredient;

impl Endpoint for SearchIngredient {
    const NAME: &'static str = SEARCH_INGREDIENT;
    type PathParams = ();
    type Query = SearchIngredientQuery;
    type Payload = ();
    type Response = SearchIngredientResponse;
}

/// Typed `getIngredientInfo`.
#[derive(Debug, Clone, Copy)]
pub struct GetIngredientInfo;

impl Endpoint for GetIngredientInfo {
    const NAME: &'static str = GET_INGREDIENT_INFO;
    type PathParams = IngredientId;
    type Query = Option<IngredientInfoQuery>;
    type Payload = ();
    type Response = IngredientInfo;
}

/// Definition of `searchIngredient`.
#[must_use]
pub fn search_ingredient() -> EndpointDefinition {
    let optional_number = || Schema::number().optional();

    EndpointDefinition::new(
        SEARCH_INGREDIENT,
        HttpMethod::Get,
        "/food/ingredients/search",
        Schema::object([
            (
                "results",
                Schema::array(Schema::object([
                    ("id", Schema::integer()),
                    ("name", Schema::string()),
                    ("image", Schema::string()),
                ])),
            ),
            ("offset", Schema::integer()),
            ("number", Schema::integer()),
            ("totalResults", Schema::integer()),
        ]),
    )
    .with_query(Schema::object([
        ("query", Schema::string()),
        ("addChildren", Schema::boolean().optional()),
        ("minProteinPercent", optional_number()),
        ("maxProteinPercent", optional_number()),
        ("minFatPercent", optional_number()),
        ("maxFatPercent", optional_number()),
        ("minCarbsPercent", optional_number()),
        ("maxCarbsPercent", optional_number()),
        ("metaInformation", Schema::boolean().optional()),
        ("intolerances", Schema::string().optional()),
        ("sort", Schema::string().optional()),
        ("sortDirection", Schema::string().optional()),
        ("language", Schema::string().optional()),
        ("offset", Schema::integer().optional()),
        ("number", Schema::integer().optional()),
    ]))
}

/// Definition of `getIngredientInfo`.
#[must_use]
pub fn get_ingredient_info() -> EndpointDefinition {
    let amount_unit = |extra: Option<(&'static str, Schema)>| {
        let mut fields = vec![("name", Schema::string()), ("amount", Schema::number()), ("unit", Schema::string())];
        fields.extend(extra);
        Schema::object(fields)
    };

    let nutrition = Schema::object([
        (
            "nutrients",
            Schema::array(amount_unit(Some(("percentOfDailyNeeds", Schema::number())))),
        ),
        ("properties", Schema::array(amount_unit(None))),
        (
            "caloricBreakdown",
            Schema::object([
                ("percentProtein", Schema::number()),
                ("percentFat", Schema::number()),
                ("percentCarbs", Schema::number()),
            ]),
        ),
        (
            "weightPerServing",
            Schema::object([("amount", Schema::number()), ("unit", Schema::string())]),
        ),
    ]);

    EndpointDefinition::new(
        GET_INGREDIENT_INFO,
        HttpMethod::Get,
        "/food/ingredients/:id/information",
        Schema::object([
            ("id", Schema::integer()),
            ("original", Schema::string()),
            ("originalName", Schema::string()),
            ("name", Schema::string()),
            ("nameClean", Schema::string().optional()),
            ("amount", Schema::number()),
            ("unit", Schema::string()),
            ("unitShort", Schema::string()),
            ("unitLong", Schema::string()),
            ("possibleUnits", Schema::array(Schema::string())),
            (
                "estimatedCost",
                Schema::object([("value", Schema::number()), ("unit", Schema::string())]),
            ),
            ("consistency", Schema::string()),
            ("shoppingListUnits", Schema::array(Schema::string())),
            ("aisle", Schema::string()),
            ("image", Schema::string()),
            ("meta", Schema::array(Schema::any())),
            ("nutrition", nutrition),
            ("categoryPath", Schema::array(Schema::string())),
        ]),
    )
    .with_path_params(Schema::object([("id", Schema::integer())]))
    .with_query(
        Schema::object([
            ("amount", Schema::number().optional()),
            ("unit", Schema::string().optional()),
        ])
        .optional(),
    )
}
