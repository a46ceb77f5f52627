use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

// --- Stored Rows ---

/// RecipeRow
///
/// Raw `recipes` row. Rows written before the `documentId` column existed carry `NULL`
/// there; conversion into [`Recipe`] fills the gap.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    #[sqlx(rename = "documentId")]
    pub document_id: Option<String>,
    #[sqlx(rename = "titre")]
    pub title: String,
    #[sqlx(rename = "temps_de_preparation")]
    pub prep_time: i64,
    #[sqlx(rename = "difficulte")]
    pub difficulty: i64,
    pub budget: i64,
    pub description: String,
}

/// IngredientRow
///
/// Raw `ingredients` row; the stored column is still called `nom`.
#[derive(Debug, Clone, FromRow)]
pub struct IngredientRow {
    pub id: i64,
    #[sqlx(rename = "documentId")]
    pub document_id: Option<String>,
    #[sqlx(rename = "nom")]
    pub name: String,
}

pub fn recipe_document_id(id: i64) -> String {
    format!("recipe_{id}")
}

pub fn ingredient_document_id(id: i64) -> String {
    format!("ingredient_{id}")
}

// --- Domain Entities ---

/// Recipe
///
/// A recipe with a guaranteed `documentId`. Serializes flat, with the attribute names
/// existing clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Recipe {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "temps_de_preparation")]
    pub prep_time: i64,
    #[serde(rename = "difficulte")]
    pub difficulty: i64,
    pub budget: i64,
    pub description: String,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        let document_id = row
            .document_id
            .unwrap_or_else(|| recipe_document_id(row.id));
        Self {
            id: row.id,
            document_id,
            title: row.title,
            prep_time: row.prep_time,
            difficulty: row.difficulty,
            budget: row.budget,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Ingredient {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub name: String,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        let document_id = row
            .document_id
            .unwrap_or_else(|| ingredient_document_id(row.id));
        Self {
            id: row.id,
            document_id,
            name: row.name,
        }
    }
}

/// LinkedIngredient
///
/// An ingredient as seen through one recipe: the ingredient plus the id of the join row
/// that ties them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LinkedIngredient {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub name: String,
    pub recipe_ingredient_id: i64,
}

/// Join row of the `recipe_ingredients` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RecipeIngredient {
    pub id: i64,
    #[serde(rename = "recette_id")]
    #[sqlx(rename = "recette_id")]
    pub recipe_id: i64,
    pub ingredient_id: i64,
}

/// User
///
/// Account record owned by the access gate. The password hash never leaves the server.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

// --- Write Models (validated, repository-facing) ---

/// A recipe that passed presence checks and is ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub prep_time: i64,
    pub difficulty: i64,
    pub budget: i64,
    pub description: String,
}

/// Partial recipe update. `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub prep_time: Option<i64>,
    pub difficulty: Option<i64>,
    pub budget: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngredientChanges {
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// --- Request Payloads ---

/// DataBody
///
/// Strapi-style request wrapper: every resource write is sent as `{ "data": { ... } }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataBody<T> {
    pub data: Option<T>,
}

impl<T> DataBody<T> {
    pub fn into_data(self) -> Result<T, ApiError> {
        self.data
            .ok_or_else(|| ApiError::Validation("Request must include data object".to_string()))
    }
}

/// RecipePayload
///
/// Body of recipe create and update. Every field is optional on the wire; create checks
/// presence, update merges whatever is present over the stored row.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct RecipePayload {
    #[serde(rename = "titre", alias = "title", default)]
    pub title: Option<String>,
    #[serde(rename = "temps_de_preparation", alias = "prepTime", default)]
    pub prep_time: Option<i64>,
    #[serde(rename = "difficulte", alias = "difficulty", default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RecipePayload {
    /// Presence checks for create: a non-empty title and the three numeric fields.
    /// The description may be left out and is stored empty.
    pub fn into_new_recipe(self) -> Result<NewRecipe, ApiError> {
        match (self.title, self.prep_time, self.difficulty, self.budget) {
            (Some(title), Some(prep_time), Some(difficulty), Some(budget))
                if !title.trim().is_empty() =>
            {
                Ok(NewRecipe {
                    title,
                    prep_time,
                    difficulty,
                    budget,
                    description: self.description.unwrap_or_default(),
                })
            }
            _ => Err(ApiError::Validation(
                "Missing required fields: titre, temps_de_preparation, difficulte, budget"
                    .to_string(),
            )),
        }
    }

    pub fn into_changes(self) -> RecipeChanges {
        RecipeChanges {
            title: self.title,
            prep_time: self.prep_time,
            difficulty: self.difficulty,
            budget: self.budget,
            description: self.description,
        }
    }
}

/// IngredientPayload
///
/// Body of ingredient create and update. The name arrives as `name`, or under the legacy
/// `nom` key from older clients; `name` wins when both are sent.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct IngredientPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
}

impl IngredientPayload {
    pub fn resolved_name(self) -> Option<String> {
        self.name.or(self.nom)
    }

    pub fn into_new_ingredient(self) -> Result<NewIngredient, ApiError> {
        match self.resolved_name() {
            Some(name) if !name.trim().is_empty() => Ok(NewIngredient { name }),
            _ => Err(ApiError::Validation("Missing required field: name".to_string())),
        }
    }

    pub fn into_changes(self) -> IngredientChanges {
        IngredientChanges {
            name: self.resolved_name(),
        }
    }
}

/// LinkIngredientsRequest
///
/// Batch link body. `ingredientIds` is kept as raw JSON so a non-array value can be
/// answered with a precise 400 instead of a generic extractor rejection.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct LinkIngredientsRequest {
    #[serde(rename = "ingredientIds", default)]
    pub ingredient_ids: serde_json::Value,
}

impl LinkIngredientsRequest {
    pub fn ids(&self) -> Result<Vec<i64>, ApiError> {
        let not_array = || ApiError::Validation("ingredientIds must be an array".to_string());
        self.ingredient_ids
            .as_array()
            .ok_or_else(not_array)?
            .iter()
            .map(|value| value.as_i64().ok_or_else(not_array))
            .collect()
    }
}

/// Body answered after linking one ingredient to a recipe.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct LinkResponse {
    pub id: i64,
    pub recette_id: i64,
    pub ingredient_id: i64,
    pub message: String,
}

/// Body answered after a batch link.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct LinkManyResponse {
    pub message: String,
    pub recette_id: i64,
    pub added_ingredient_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Either `username` or `email` identifies the account.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// --- Query Parameters ---

const DEFAULT_PAGE_SIZE: u32 = 25;
/// Upper bound on `pageSize`; larger requests are clamped down to it.
pub const MAX_PAGE_SIZE: u32 = 100;

/// RecipeListQuery
///
/// Query string of `GET /api/recipes`, using Strapi's bracketed key names.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    #[serde(alias = "pagination[page]")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", alias = "pagination[pageSize]")]
    pub page_size: Option<u32>,
    /// `*` or `ingredients` embeds the linked ingredients.
    pub populate: Option<String>,
    /// Exact budget match.
    #[serde(rename = "filters[budget][$eq]")]
    pub budget_eq: Option<i64>,
}

/// IngredientListQuery
///
/// Query string of `GET /api/ingredients`.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    #[serde(alias = "pagination[page]")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", alias = "pagination[pageSize]")]
    pub page_size: Option<u32>,
    /// `*` or `recipes` embeds the linked recipes.
    pub populate: Option<String>,
    /// Exact name match.
    #[serde(rename = "filters[name][$eq]")]
    pub name_eq: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PopulateQuery {
    pub populate: Option<String>,
}

/// True when `populate` asks for everything or for the named relation.
pub fn wants_relation(populate: Option<&str>, relation: &str) -> bool {
    matches!(populate, Some(value) if value == "*" || value == relation)
}

/// PageRequest
///
/// A normalized page window: both numbers are at least 1 and `page_size` is at most
/// [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.page_size))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub budget_eq: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    pub name_eq: Option<String>,
}

/// One page of rows plus the pre-pagination count of rows matching the filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
