//! Strapi-style response shaping.
//!
//! Single resources are answered as `{ "data": entry }` and lists as
//! `{ "data": [entry], "meta": { "pagination": { .. } } }`, where an entry is
//! `{ id, documentId, attributes }`. Relations requested through `populate` are embedded
//! inside `attributes` as `{ "data": [..] }`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{Ingredient, PageRequest, Recipe};

// --- Attribute Sets ---

/// Recipe attributes without relations. Entries flatten these next to their populated
/// relation, so both shapes share one field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeFields {
    pub titre: String,
    pub temps_de_preparation: i64,
    pub difficulte: i64,
    pub budget: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientFields {
    pub name: String,
}

impl From<&Recipe> for RecipeFields {
    fn from(recipe: &Recipe) -> Self {
        Self {
            titre: recipe.title.clone(),
            temps_de_preparation: recipe.prep_time,
            difficulte: recipe.difficulty,
            budget: recipe.budget,
            description: recipe.description.clone(),
        }
    }
}

impl From<&Ingredient> for IngredientFields {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
        }
    }
}

// --- Embedded Relations ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientSummary {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub attributes: IngredientFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeSummary {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub attributes: RecipeFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientRelation {
    pub data: Vec<IngredientSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeRelation {
    pub data: Vec<RecipeSummary>,
}

// --- Entries ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeAttributes {
    #[serde(flatten)]
    #[ts(flatten)]
    pub fields: RecipeFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub ingredients: Option<IngredientRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientAttributes {
    #[serde(flatten)]
    #[ts(flatten)]
    pub fields: IngredientFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub recipes: Option<RecipeRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeEntry {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub attributes: RecipeAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientEntry {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub attributes: IngredientAttributes,
}

impl RecipeEntry {
    /// Shapes one recipe. `ingredients` is `Some` only when the caller asked for them,
    /// which keeps an unpopulated response free of the `ingredients` key.
    pub fn new(recipe: Recipe, ingredients: Option<Vec<Ingredient>>) -> Self {
        let ingredients = ingredients.map(|list| IngredientRelation {
            data: list.iter().map(IngredientSummary::from).collect(),
        });
        let fields = RecipeFields::from(&recipe);
        Self {
            id: recipe.id,
            document_id: recipe.document_id,
            attributes: RecipeAttributes {
                fields,
                ingredients,
            },
        }
    }
}

impl IngredientEntry {
    pub fn new(ingredient: Ingredient, recipes: Option<Vec<Recipe>>) -> Self {
        let recipes = recipes.map(|list| RecipeRelation {
            data: list.iter().map(RecipeSummary::from).collect(),
        });
        let fields = IngredientFields::from(&ingredient);
        Self {
            id: ingredient.id,
            document_id: ingredient.document_id,
            attributes: IngredientAttributes { fields, recipes },
        }
    }
}

impl From<&Ingredient> for IngredientSummary {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id,
            document_id: ingredient.document_id.clone(),
            attributes: ingredient.into(),
        }
    }
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            document_id: recipe.document_id.clone(),
            attributes: recipe.into(),
        }
    }
}

// --- Pagination ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "pageCount")]
    pub page_count: i64,
    pub total: i64,
}

impl Pagination {
    /// `pageCount` is `ceil(total / pageSize)`; zero when nothing matches.
    pub fn new(request: PageRequest, total: i64) -> Self {
        let page_size = i64::from(request.page_size);
        Self {
            page: request.page,
            page_size: request.page_size,
            page_count: (total + page_size - 1) / page_size,
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ListMeta {
    pub pagination: Pagination,
}

// --- Top-level Bodies ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeList {
    pub data: Vec<RecipeEntry>,
    pub meta: ListMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientList {
    pub data: Vec<IngredientEntry>,
    pub meta: ListMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecipeData {
    pub data: RecipeEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientData {
    pub data: IngredientEntry,
}

impl RecipeList {
    /// Builds a list body. `ingredients` carries the populated relation per recipe id, or
    /// `None` when population was not requested.
    pub fn new(
        recipes: Vec<Recipe>,
        mut ingredients: Option<HashMap<i64, Vec<Ingredient>>>,
        request: PageRequest,
        total: i64,
    ) -> Self {
        let data = recipes
            .into_iter()
            .map(|recipe| {
                let linked = ingredients
                    .as_mut()
                    .map(|by_recipe| by_recipe.remove(&recipe.id).unwrap_or_default());
                RecipeEntry::new(recipe, linked)
            })
            .collect();
        Self {
            data,
            meta: ListMeta {
                pagination: Pagination::new(request, total),
            },
        }
    }
}

impl IngredientList {
    pub fn new(
        ingredients: Vec<Ingredient>,
        mut recipes: Option<HashMap<i64, Vec<Recipe>>>,
        request: PageRequest,
        total: i64,
    ) -> Self {
        let data = ingredients
            .into_iter()
            .map(|ingredient| {
                let linked = recipes
                    .as_mut()
                    .map(|by_ingredient| by_ingredient.remove(&ingredient.id).unwrap_or_default());
                IngredientEntry::new(ingredient, linked)
            })
            .collect();
        Self {
            data,
            meta: ListMeta {
                pagination: Pagination::new(request, total),
            },
        }
    }
}
