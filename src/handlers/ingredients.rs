use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    envelope::{IngredientData, IngredientEntry, IngredientList},
    error::ApiError,
    models::{
        DataBody, IngredientFilter, IngredientListQuery, IngredientPayload, PageRequest,
        PopulateQuery, wants_relation,
    },
    repository::IngredientRepository,
};

const RELATION: &str = "recipes";

fn not_found() -> ApiError {
    ApiError::NotFound("Ingredient not found".to_string())
}

/// list_ingredients
///
/// [Authenticated Route] Paginated ingredient listing; `populate=recipes` embeds the
/// recipes each ingredient belongs to.
#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(IngredientListQuery),
    responses((status = 200, description = "One page of ingredients", body = IngredientList))
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<IngredientList>, ApiError> {
    let request = PageRequest::new(query.page, query.page_size);
    let filter = IngredientFilter {
        name_eq: query.name_eq,
    };

    let page = state.repo.list_ingredients(request, filter).await?;

    let recipes = if wants_relation(query.populate.as_deref(), RELATION) {
        let ids: Vec<i64> = page.items.iter().map(|ingredient| ingredient.id).collect();
        Some(state.repo.recipes_by_ingredient(&ids).await?)
    } else {
        None
    };

    Ok(Json(IngredientList::new(page.items, recipes, request, page.total)))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId"), PopulateQuery),
    responses(
        (status = 200, description = "Found", body = IngredientData),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PopulateQuery>,
) -> Result<Json<IngredientData>, ApiError> {
    let ingredient = state
        .repo
        .find_ingredient(&id)
        .await?
        .ok_or_else(not_found)?;

    let recipes = if wants_relation(query.populate.as_deref(), RELATION) {
        let mut linked = state.repo.recipes_by_ingredient(&[ingredient.id]).await?;
        Some(linked.remove(&ingredient.id).unwrap_or_default())
    } else {
        None
    };

    Ok(Json(IngredientData {
        data: IngredientEntry::new(ingredient, recipes),
    }))
}

/// create_ingredient
///
/// [Authenticated Route] Creates an ingredient from `name`, or from the legacy `nom` key
/// when `name` is absent.
#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = IngredientPayload,
    responses(
        (status = 201, description = "Created", body = IngredientData),
        (status = 400, description = "Missing data object or name")
    )
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(body): Json<DataBody<IngredientPayload>>,
) -> Result<(StatusCode, Json<IngredientData>), ApiError> {
    let ingredient = body.into_data()?.into_new_ingredient()?;
    let created = state.repo.create_ingredient(ingredient).await?;

    tracing::info!(id = created.id, document_id = %created.document_id, "ingredient created");

    Ok((
        StatusCode::CREATED,
        Json(IngredientData {
            data: IngredientEntry::new(created, None),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId")),
    request_body = IngredientPayload,
    responses(
        (status = 200, description = "Updated", body = IngredientData),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DataBody<IngredientPayload>>,
) -> Result<Json<IngredientData>, ApiError> {
    let changes = body.into_data()?.into_changes();
    let updated = state
        .repo
        .update_ingredient(&id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(IngredientData {
        data: IngredientEntry::new(updated, None),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    params(("id" = String, Path, description = "Numeric id or documentId")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_ingredient(&id).await? {
        tracing::info!(%id, "ingredient deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
