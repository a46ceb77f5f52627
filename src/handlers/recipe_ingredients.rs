use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{ApiError, StoreError},
    models::{LinkIngredientsRequest, LinkManyResponse, LinkResponse, LinkedIngredient, Recipe},
    repository::RecipeIngredientRepository,
};

/// Unique violations become the "already associated" 400; everything else stays a 500.
fn conflict_or_store(err: StoreError, message: &str) -> ApiError {
    if err.is_unique_violation() {
        ApiError::AlreadyExists(message.to_string())
    } else {
        ApiError::Store(err)
    }
}

/// list_recipe_ingredients
///
/// [Authenticated Route] Ingredients linked to a recipe, each with the id of its join row.
#[utoipa::path(
    get,
    path = "/api/recipe-ingredients/recipe/{recipe_id}/ingredients",
    params(("recipe_id" = i64, Path, description = "Recipe id")),
    responses((status = 200, description = "Linked ingredients", body = [LinkedIngredient]))
)]
pub async fn list_recipe_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> Result<Json<Vec<LinkedIngredient>>, ApiError> {
    Ok(Json(state.repo.ingredients_of_recipe(recipe_id).await?))
}

/// list_ingredient_recipes
///
/// [Authenticated Route] Recipes using an ingredient, with the full recipe attribute set.
#[utoipa::path(
    get,
    path = "/api/recipe-ingredients/ingredient/{ingredient_id}/recipes",
    params(("ingredient_id" = i64, Path, description = "Ingredient id")),
    responses((status = 200, description = "Linked recipes", body = [Recipe]))
)]
pub async fn list_ingredient_recipes(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.repo.recipes_of_ingredient(ingredient_id).await?))
}

/// link_ingredient
///
/// [Authenticated Route] Links one ingredient to a recipe. A pair can only be linked once.
#[utoipa::path(
    post,
    path = "/api/recipe-ingredients/recipe/{recipe_id}/ingredient/{ingredient_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe id"),
        ("ingredient_id" = i64, Path, description = "Ingredient id")
    ),
    responses(
        (status = 201, description = "Linked", body = LinkResponse),
        (status = 400, description = "Already associated")
    )
)]
pub async fn link_ingredient(
    State(state): State<AppState>,
    Path((recipe_id, ingredient_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let link = state
        .repo
        .link(recipe_id, ingredient_id)
        .await
        .map_err(|err| {
            conflict_or_store(err, "This ingredient is already associated with this recipe")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse {
            id: link.id,
            recette_id: link.recipe_id,
            ingredient_id: link.ingredient_id,
            message: "Ingredient added to recipe successfully".to_string(),
        }),
    ))
}

/// link_ingredients
///
/// [Authenticated Route] Links several ingredients at once.
///
/// The inserts run concurrently and are not transactional: when one of them fails, the
/// others may already be committed.
#[utoipa::path(
    post,
    path = "/api/recipe-ingredients/recipe/{recipe_id}/ingredients",
    params(("recipe_id" = i64, Path, description = "Recipe id")),
    request_body = LinkIngredientsRequest,
    responses(
        (status = 201, description = "Linked", body = LinkManyResponse),
        (status = 400, description = "ingredientIds is not an array, or a pair is already associated")
    )
)]
pub async fn link_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(body): Json<LinkIngredientsRequest>,
) -> Result<(StatusCode, Json<LinkManyResponse>), ApiError> {
    let ingredient_ids = body.ids()?;

    state
        .repo
        .link_many(recipe_id, &ingredient_ids)
        .await
        .map_err(|err| {
            conflict_or_store(
                err,
                "One or more ingredients are already associated with this recipe",
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(LinkManyResponse {
            message: format!(
                "{} ingredients added to recipe successfully",
                ingredient_ids.len()
            ),
            recette_id: recipe_id,
            added_ingredient_ids: ingredient_ids,
        }),
    ))
}

/// unlink_ingredient
///
/// [Authenticated Route] Removes one link. Removing a link that does not exist succeeds.
#[utoipa::path(
    delete,
    path = "/api/recipe-ingredients/recipe/{recipe_id}/ingredient/{ingredient_id}",
    params(
        ("recipe_id" = i64, Path, description = "Recipe id"),
        ("ingredient_id" = i64, Path, description = "Ingredient id")
    ),
    responses((status = 204, description = "Unlinked"))
)]
pub async fn unlink_ingredient(
    State(state): State<AppState>,
    Path((recipe_id, ingredient_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let removed = state.repo.unlink(recipe_id, ingredient_id).await?;
    tracing::debug!(recipe_id, ingredient_id, removed, "ingredient unlinked");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/recipe-ingredients/recipe/{recipe_id}/ingredients",
    params(("recipe_id" = i64, Path, description = "Recipe id")),
    responses((status = 204, description = "All links removed"))
)]
pub async fn unlink_all_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = state.repo.unlink_all(recipe_id).await?;
    tracing::debug!(recipe_id, removed, "all ingredients unlinked");
    Ok(StatusCode::NO_CONTENT)
}
