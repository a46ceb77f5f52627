use crate::{
    AppState,
    handlers::{ingredients, recipe_ingredients, recipes},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every resource route. The whole router is wrapped by the bearer-token `route_layer`
/// in `create_router`, so a request without a valid token never reaches these handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Recipes ---
        // GET /api/recipes?page=&pageSize=&populate=&filters[budget][$eq]=
        // POST /api/recipes  body: { data: { titre, temps_de_preparation, ... } }
        .route(
            "/api/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        // GET/PUT/DELETE /api/recipes/{id}
        // `id` is either the numeric id or the documentId.
        .route(
            "/api/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        // --- Ingredients ---
        .route(
            "/api/ingredients",
            get(ingredients::list_ingredients).post(ingredients::create_ingredient),
        )
        .route(
            "/api/ingredients/{id}",
            get(ingredients::get_ingredient)
                .put(ingredients::update_ingredient)
                .delete(ingredients::delete_ingredient),
        )
        // --- Recipe <-> Ingredient links (numeric ids only) ---
        .route(
            "/api/recipe-ingredients/recipe/{recipe_id}/ingredients",
            get(recipe_ingredients::list_recipe_ingredients)
                .post(recipe_ingredients::link_ingredients)
                .delete(recipe_ingredients::unlink_all_ingredients),
        )
        .route(
            "/api/recipe-ingredients/ingredient/{ingredient_id}/recipes",
            get(recipe_ingredients::list_ingredient_recipes),
        )
        // POST links a single pair (400 when already linked); DELETE is idempotent.
        .route(
            "/api/recipe-ingredients/recipe/{recipe_id}/ingredient/{ingredient_id}",
            post(recipe_ingredients::link_ingredient).delete(recipe_ingredients::unlink_ingredient),
        )
}

