use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    envelope::{RecipeData, RecipeEntry, RecipeList},
    error::ApiError,
    models::{
        DataBody, PageRequest, PopulateQuery, RecipeFilter, RecipeListQuery, RecipePayload,
        wants_relation,
    },
    repository::RecipeRepository,
};

const RELATION: &str = "ingredients";

fn not_found() -> ApiError {
    ApiError::NotFound("Recipe not found".to_string())
}

/// list_recipes
///
/// [Authenticated Route] Paginated recipe listing, optionally filtered on an exact budget
/// and optionally embedding each recipe's ingredients.
#[utoipa::path(
    get,
    path = "/api/recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "One page of recipes", body = RecipeList),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<RecipeList>, ApiError> {
    let request = PageRequest::new(query.page, query.page_size);
    let filter = RecipeFilter {
        budget_eq: query.budget_eq,
    };

    let page = state.repo.list_recipes(request, filter).await?;

    let ingredients = if wants_relation(query.populate.as_deref(), RELATION) {
        let ids: Vec<i64> = page.items.iter().map(|recipe| recipe.id).collect();
        Some(state.repo.ingredients_by_recipe(&ids).await?)
    } else {
        None
    };

    Ok(Json(RecipeList::new(page.items, ingredients, request, page.total)))
}

/// get_recipe
///
/// [Authenticated Route] Fetches one recipe by numeric id or by `documentId`.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId"), PopulateQuery),
    responses(
        (status = 200, description = "Found", body = RecipeData),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PopulateQuery>,
) -> Result<Json<RecipeData>, ApiError> {
    let recipe = state.repo.find_recipe(&id).await?.ok_or_else(not_found)?;

    let ingredients = if wants_relation(query.populate.as_deref(), RELATION) {
        let mut linked = state.repo.ingredients_by_recipe(&[recipe.id]).await?;
        Some(linked.remove(&recipe.id).unwrap_or_default())
    } else {
        None
    };

    Ok(Json(RecipeData {
        data: RecipeEntry::new(recipe, ingredients),
    }))
}

/// create_recipe
///
/// [Authenticated Route] Creates a recipe. The title and the three numeric fields are
/// required; the `documentId` is derived from the new id.
#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipePayload,
    responses(
        (status = 201, description = "Created", body = RecipeData),
        (status = 400, description = "Missing data object or required fields")
    )
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(body): Json<DataBody<RecipePayload>>,
) -> Result<(StatusCode, Json<RecipeData>), ApiError> {
    let recipe = body.into_data()?.into_new_recipe()?;
    let created = state.repo.create_recipe(recipe).await?;

    tracing::info!(id = created.id, document_id = %created.document_id, "recipe created");

    Ok((
        StatusCode::CREATED,
        Json(RecipeData {
            data: RecipeEntry::new(created, None),
        }),
    ))
}

/// update_recipe
///
/// [Authenticated Route] Partial update: fields absent from the payload keep their
/// stored value.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId")),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Updated", body = RecipeData),
        (status = 400, description = "Missing data object"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DataBody<RecipePayload>>,
) -> Result<Json<RecipeData>, ApiError> {
    let changes = body.into_data()?.into_changes();
    let updated = state
        .repo
        .update_recipe(&id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(RecipeData {
        data: RecipeEntry::new(updated, None),
    }))
}

/// delete_recipe
///
/// [Authenticated Route] Deletes a recipe and, through the foreign-key cascade, every
/// ingredient link it had.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_recipe(&id).await? {
        tracing::info!(%id, "recipe deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
