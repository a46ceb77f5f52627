/// Handler Module Index
///
/// One module per resource. Resource handlers assume the bearer check already ran in the
/// router's `route_layer`; only the `auth` handlers are reachable anonymously.
pub mod auth;
pub mod ingredients;
pub mod recipe_ingredients;
pub mod recipes;
