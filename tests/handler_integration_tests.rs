use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recipe_api::{
    AppConfig, AppState, StoreError, auth,
    error::StoreResult,
    handlers,
    models::{
        DataBody, Ingredient, IngredientChanges, IngredientFilter, IngredientPayload,
        LinkIngredientsRequest, LinkedIngredient, LoginRequest, NewIngredient, NewRecipe, NewUser,
        Page, PageRequest, PopulateQuery, Recipe, RecipeChanges, RecipeFilter, RecipeIngredient,
        RecipeListQuery, RecipePayload, RegisterRequest, User,
    },
    repository::{
        IngredientRepository, RecipeIngredientRepository, RecipeRepository, UserRepository,
    },
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::test;

// --- MOCK REPOSITORY IMPLEMENTATION ---

/// How the mock answers link inserts.
#[derive(Clone, Copy, Default)]
enum LinkOutcome {
    #[default]
    Linked,
    Duplicate,
    Broken,
}

impl LinkOutcome {
    fn result<T>(self, value: T) -> StoreResult<T> {
        match self {
            LinkOutcome::Linked => Ok(value),
            LinkOutcome::Duplicate => Err(StoreError::UniqueViolation(sqlx::Error::RowNotFound)),
            LinkOutcome::Broken => Err(StoreError::Database(sqlx::Error::PoolTimedOut)),
        }
    }
}

// Central control point for handler tests: canned outputs plus captured inputs.
#[derive(Default)]
struct MockRepoControl {
    recipes_to_return: Vec<Recipe>,
    ingredients_to_return: Vec<Ingredient>,
    total_to_return: i64,
    link_outcome: LinkOutcome,
    delete_result: bool,
    user_to_return: Option<User>,
    user_conflict: bool,

    last_page: Mutex<Option<PageRequest>>,
    last_recipe_filter: Mutex<Option<RecipeFilter>>,
    created_recipe: Mutex<Option<NewRecipe>>,
    created_ingredient: Mutex<Option<NewIngredient>>,
    linked_ids: Mutex<Vec<i64>>,
    last_login: Mutex<Option<String>>,
}

fn sample_recipe() -> Recipe {
    Recipe {
        id: 3,
        document_id: "recipe_3".to_string(),
        title: "Ratatouille".to_string(),
        prep_time: 45,
        difficulty: 2,
        budget: 15,
        description: "Summer vegetables".to_string(),
    }
}

fn sample_ingredient() -> Ingredient {
    Ingredient {
        id: 9,
        document_id: "ingredient_9".to_string(),
        name: "Zucchini".to_string(),
    }
}

#[async_trait]
impl RecipeRepository for MockRepoControl {
    async fn list_recipes(
        &self,
        page: PageRequest,
        filter: RecipeFilter,
    ) -> StoreResult<Page<Recipe>> {
        *self.last_page.lock().unwrap() = Some(page);
        *self.last_recipe_filter.lock().unwrap() = Some(filter);
        Ok(Page {
            items: self.recipes_to_return.clone(),
            total: self.total_to_return,
        })
    }
    async fn find_recipe(&self, key: &str) -> StoreResult<Option<Recipe>> {
        Ok(self
            .recipes_to_return
            .iter()
            .find(|recipe| recipe.id.to_string() == key || recipe.document_id == key)
            .cloned())
    }
    async fn create_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        *self.created_recipe.lock().unwrap() = Some(recipe.clone());
        Ok(Recipe {
            id: 1,
            document_id: "recipe_1".to_string(),
            title: recipe.title,
            prep_time: recipe.prep_time,
            difficulty: recipe.difficulty,
            budget: recipe.budget,
            description: recipe.description,
        })
    }
    async fn update_recipe(
        &self,
        key: &str,
        changes: RecipeChanges,
    ) -> StoreResult<Option<Recipe>> {
        Ok(self.find_recipe(key).await?.map(|recipe| Recipe {
            budget: changes.budget.unwrap_or(recipe.budget),
            ..recipe
        }))
    }
    async fn delete_recipe(&self, _key: &str) -> StoreResult<bool> {
        Ok(self.delete_result)
    }
    async fn ingredients_by_recipe(
        &self,
        recipe_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Ingredient>>> {
        Ok(recipe_ids
            .iter()
            .map(|id| (*id, self.ingredients_to_return.clone()))
            .collect())
    }
}

#[async_trait]
impl IngredientRepository for MockRepoControl {
    async fn list_ingredients(
        &self,
        page: PageRequest,
        _filter: IngredientFilter,
    ) -> StoreResult<Page<Ingredient>> {
        *self.last_page.lock().unwrap() = Some(page);
        Ok(Page {
            items: self.ingredients_to_return.clone(),
            total: self.total_to_return,
        })
    }
    async fn find_ingredient(&self, key: &str) -> StoreResult<Option<Ingredient>> {
        Ok(self
            .ingredients_to_return
            .iter()
            .find(|ingredient| ingredient.id.to_string() == key || ingredient.document_id == key)
            .cloned())
    }
    async fn create_ingredient(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        *self.created_ingredient.lock().unwrap() = Some(ingredient.clone());
        Ok(Ingredient {
            id: 1,
            document_id: "ingredient_1".to_string(),
            name: ingredient.name,
        })
    }
    async fn update_ingredient(
        &self,
        key: &str,
        changes: IngredientChanges,
    ) -> StoreResult<Option<Ingredient>> {
        Ok(self.find_ingredient(key).await?.map(|ingredient| Ingredient {
            name: changes.name.unwrap_or(ingredient.name.clone()),
            ..ingredient
        }))
    }
    async fn delete_ingredient(&self, _key: &str) -> StoreResult<bool> {
        Ok(self.delete_result)
    }
    async fn recipes_by_ingredient(
        &self,
        ingredient_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Recipe>>> {
        Ok(ingredient_ids
            .iter()
            .map(|id| (*id, self.recipes_to_return.clone()))
            .collect())
    }
}

#[async_trait]
impl RecipeIngredientRepository for MockRepoControl {
    async fn ingredients_of_recipe(&self, _recipe_id: i64) -> StoreResult<Vec<LinkedIngredient>> {
        Ok(self
            .ingredients_to_return
            .iter()
            .map(|ingredient| LinkedIngredient {
                id: ingredient.id,
                document_id: ingredient.document_id.clone(),
                name: ingredient.name.clone(),
                recipe_ingredient_id: 100 + ingredient.id,
            })
            .collect())
    }
    async fn recipes_of_ingredient(&self, _ingredient_id: i64) -> StoreResult<Vec<Recipe>> {
        Ok(self.recipes_to_return.clone())
    }
    async fn link(&self, recipe_id: i64, ingredient_id: i64) -> StoreResult<RecipeIngredient> {
        self.link_outcome.result(RecipeIngredient {
            id: 50,
            recipe_id,
            ingredient_id,
        })
    }
    async fn link_many(&self, _recipe_id: i64, ingredient_ids: &[i64]) -> StoreResult<()> {
        self.linked_ids.lock().unwrap().extend_from_slice(ingredient_ids);
        self.link_outcome.result(())
    }
    async fn unlink(&self, _recipe_id: i64, _ingredient_id: i64) -> StoreResult<u64> {
        Ok(0)
    }
    async fn unlink_all(&self, _recipe_id: i64) -> StoreResult<u64> {
        Ok(2)
    }
}

#[async_trait]
impl UserRepository for MockRepoControl {
    async fn find_user(&self, _id: i64) -> StoreResult<Option<User>> {
        Ok(self.user_to_return.clone())
    }
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        *self.last_login.lock().unwrap() = Some(login.to_string());
        Ok(self.user_to_return.clone())
    }
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        if self.user_conflict {
            return Err(StoreError::UniqueViolation(sqlx::Error::RowNotFound));
        }
        Ok(User {
            id: 1,
            username: user.username,
            email: user.email,
            password: user.password_hash,
            ..Default::default()
        })
    }
}

// --- Helpers ---

fn state_with(mock: Arc<MockRepoControl>) -> AppState {
    AppState::new(mock, AppConfig::default())
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn into_parts<T: IntoResponse>(result: T) -> (StatusCode, Value) {
    let response = result.into_response();
    let status = response.status();
    (status, body_json(response).await)
}

fn recipe_body(payload: RecipePayload) -> Json<DataBody<RecipePayload>> {
    Json(DataBody {
        data: Some(payload),
    })
}

// --- Recipe Handlers ---

#[test]
async fn test_get_recipe_not_found() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let result = handlers::recipes::get_recipe(
        State(state),
        Path("recipe_404".to_string()),
        Query(PopulateQuery::default()),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Recipe not found" }));
}

#[test]
async fn test_get_recipe_with_and_without_populate() {
    let mock = Arc::new(MockRepoControl {
        recipes_to_return: vec![sample_recipe()],
        ingredients_to_return: vec![sample_ingredient()],
        ..Default::default()
    });

    let plain = handlers::recipes::get_recipe(
        State(state_with(mock.clone())),
        Path("recipe_3".to_string()),
        Query(PopulateQuery::default()),
    )
    .await;
    let (status, body) = into_parts(plain).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["documentId"], "recipe_3");
    assert_eq!(body["data"]["attributes"]["titre"], "Ratatouille");
    assert!(body["data"]["attributes"].get("ingredients").is_none());

    let populated = handlers::recipes::get_recipe(
        State(state_with(mock)),
        Path("3".to_string()),
        Query(PopulateQuery {
            populate: Some("*".to_string()),
        }),
    )
    .await;
    let (_, body) = into_parts(populated).await;
    let linked = &body["data"]["attributes"]["ingredients"]["data"];
    assert_eq!(linked[0]["documentId"], "ingredient_9");
    assert_eq!(linked[0]["attributes"]["name"], "Zucchini");
}

#[test]
async fn test_list_recipes_builds_meta_and_passes_filter() {
    let mock = Arc::new(MockRepoControl {
        recipes_to_return: vec![sample_recipe()],
        total_to_return: 3,
        ..Default::default()
    });

    let result = handlers::recipes::list_recipes(
        State(state_with(mock.clone())),
        Query(RecipeListQuery {
            page: Some(2),
            page_size: Some(1),
            budget_eq: Some(15),
            ..Default::default()
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["meta"]["pagination"],
        json!({ "page": 2, "pageSize": 1, "pageCount": 3, "total": 3 })
    );
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    assert_eq!(
        *mock.last_page.lock().unwrap(),
        Some(PageRequest { page: 2, page_size: 1 })
    );
    assert_eq!(
        mock.last_recipe_filter.lock().unwrap().as_ref().unwrap().budget_eq,
        Some(15)
    );
}

#[test]
async fn test_list_recipes_clamps_page_zero() {
    let mock = Arc::new(MockRepoControl::default());

    let result = handlers::recipes::list_recipes(
        State(state_with(mock.clone())),
        Query(RecipeListQuery {
            page: Some(0),
            page_size: Some(0),
            ..Default::default()
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["pagination"]["page"], 1);
    assert_eq!(body["meta"]["pagination"]["pageSize"], 1);
    assert_eq!(body["meta"]["pagination"]["pageCount"], 0);
}

#[test]
async fn test_create_recipe_requires_data_object() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let result =
        handlers::recipes::create_recipe(State(state), Json(DataBody { data: None })).await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request must include data object");
}

#[test]
async fn test_create_recipe_requires_fields() {
    let mock = Arc::new(MockRepoControl::default());

    let payload = RecipePayload {
        title: Some("No numbers".to_string()),
        ..Default::default()
    };
    let result =
        handlers::recipes::create_recipe(State(state_with(mock.clone())), recipe_body(payload))
            .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));
    // Nothing reached the store.
    assert!(mock.created_recipe.lock().unwrap().is_none());
}

#[test]
async fn test_create_recipe_success() {
    let mock = Arc::new(MockRepoControl::default());

    let payload = RecipePayload {
        title: Some("Quiche".to_string()),
        prep_time: Some(40),
        difficulty: Some(3),
        budget: Some(12),
        description: None,
    };
    let result =
        handlers::recipes::create_recipe(State(state_with(mock.clone())), recipe_body(payload))
            .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["documentId"], "recipe_1");
    assert_eq!(body["data"]["attributes"]["temps_de_preparation"], 40);
    assert_eq!(body["data"]["attributes"]["description"], "");

    let stored = mock.created_recipe.lock().unwrap().clone().unwrap();
    assert_eq!(stored.title, "Quiche");
}

#[test]
async fn test_update_recipe_merges_changes() {
    let mock = Arc::new(MockRepoControl {
        recipes_to_return: vec![sample_recipe()],
        ..Default::default()
    });

    let payload = RecipePayload {
        budget: Some(99),
        ..Default::default()
    };
    let result = handlers::recipes::update_recipe(
        State(state_with(mock)),
        Path("recipe_3".to_string()),
        recipe_body(payload),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attributes"]["budget"], 99);
    assert_eq!(body["data"]["attributes"]["titre"], "Ratatouille");
}

#[test]
async fn test_update_unknown_recipe_is_not_found() {
    let result = handlers::recipes::update_recipe(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Path("77".to_string()),
        recipe_body(RecipePayload::default()),
    )
    .await;

    let (status, _) = into_parts(result).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
async fn test_delete_recipe_status_codes() {
    let deleted = handlers::recipes::delete_recipe(
        State(state_with(Arc::new(MockRepoControl {
            delete_result: true,
            ..Default::default()
        }))),
        Path("3".to_string()),
    )
    .await;
    assert_eq!(deleted.unwrap(), StatusCode::NO_CONTENT);

    let missing = handlers::recipes::delete_recipe(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Path("3".to_string()),
    )
    .await;
    let (status, body) = into_parts(missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipe not found");
}

// --- Ingredient Handlers ---

#[test]
async fn test_create_ingredient_accepts_legacy_nom() {
    let mock = Arc::new(MockRepoControl::default());

    let payload = IngredientPayload {
        name: None,
        nom: Some("Farine".to_string()),
    };
    let result = handlers::ingredients::create_ingredient(
        State(state_with(mock.clone())),
        Json(DataBody {
            data: Some(payload),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["attributes"]["name"], "Farine");
    assert_eq!(
        mock.created_ingredient.lock().unwrap().clone().unwrap().name,
        "Farine"
    );
}

#[test]
async fn test_create_ingredient_requires_name() {
    let result = handlers::ingredients::create_ingredient(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Json(DataBody {
            data: Some(IngredientPayload::default()),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: name");
}

#[test]
async fn test_get_ingredient_populates_recipes() {
    let mock = Arc::new(MockRepoControl {
        recipes_to_return: vec![sample_recipe()],
        ingredients_to_return: vec![sample_ingredient()],
        ..Default::default()
    });

    let result = handlers::ingredients::get_ingredient(
        State(state_with(mock)),
        Path("ingredient_9".to_string()),
        Query(PopulateQuery {
            populate: Some("recipes".to_string()),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    let recipes = &body["data"]["attributes"]["recipes"]["data"];
    assert_eq!(recipes[0]["attributes"]["titre"], "Ratatouille");
}

#[test]
async fn test_delete_ingredient_not_found() {
    let result = handlers::ingredients::delete_ingredient(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Path("ingredient_1".to_string()),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Ingredient not found");
}

// --- Link Handlers ---

#[test]
async fn test_link_ingredient_created() {
    let result = handlers::recipe_ingredients::link_ingredient(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Path((3, 9)),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({
            "id": 50,
            "recette_id": 3,
            "ingredient_id": 9,
            "message": "Ingredient added to recipe successfully"
        })
    );
}

#[test]
async fn test_link_ingredient_duplicate_is_bad_request() {
    let result = handlers::recipe_ingredients::link_ingredient(
        State(state_with(Arc::new(MockRepoControl {
            link_outcome: LinkOutcome::Duplicate,
            ..Default::default()
        }))),
        Path((3, 9)),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "This ingredient is already associated with this recipe"
    );
}

#[test]
async fn test_link_ingredient_store_failure_is_internal() {
    let result = handlers::recipe_ingredients::link_ingredient(
        State(state_with(Arc::new(MockRepoControl {
            link_outcome: LinkOutcome::Broken,
            ..Default::default()
        }))),
        Path((3, 9)),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[test]
async fn test_link_ingredients_rejects_non_array() {
    let mock = Arc::new(MockRepoControl::default());

    let result = handlers::recipe_ingredients::link_ingredients(
        State(state_with(mock.clone())),
        Path(3),
        Json(LinkIngredientsRequest {
            ingredient_ids: json!("1,2"),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ingredientIds must be an array");
    assert!(mock.linked_ids.lock().unwrap().is_empty());
}

#[test]
async fn test_link_ingredients_success_and_conflict() {
    let mock = Arc::new(MockRepoControl::default());
    let result = handlers::recipe_ingredients::link_ingredients(
        State(state_with(mock.clone())),
        Path(3),
        Json(LinkIngredientsRequest {
            ingredient_ids: json!([4, 5]),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "2 ingredients added to recipe successfully");
    assert_eq!(body["recette_id"], 3);
    assert_eq!(body["added_ingredient_ids"], json!([4, 5]));
    assert_eq!(*mock.linked_ids.lock().unwrap(), vec![4, 5]);

    let conflict = handlers::recipe_ingredients::link_ingredients(
        State(state_with(Arc::new(MockRepoControl {
            link_outcome: LinkOutcome::Duplicate,
            ..Default::default()
        }))),
        Path(3),
        Json(LinkIngredientsRequest {
            ingredient_ids: json!([4]),
        }),
    )
    .await;
    let (status, body) = into_parts(conflict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "One or more ingredients are already associated with this recipe"
    );
}

#[test]
async fn test_list_recipe_ingredients_carries_join_id() {
    let mock = Arc::new(MockRepoControl {
        ingredients_to_return: vec![sample_ingredient()],
        ..Default::default()
    });

    let result =
        handlers::recipe_ingredients::list_recipe_ingredients(State(state_with(mock)), Path(3))
            .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Zucchini");
    assert_eq!(body[0]["recipe_ingredient_id"], 109);
}

#[test]
async fn test_unlink_handlers_return_no_content() {
    let state = state_with(Arc::new(MockRepoControl::default()));

    let single =
        handlers::recipe_ingredients::unlink_ingredient(State(state.clone()), Path((3, 9))).await;
    assert_eq!(single.unwrap(), StatusCode::NO_CONTENT);

    let all = handlers::recipe_ingredients::unlink_all_ingredients(State(state), Path(3)).await;
    assert_eq!(all.unwrap(), StatusCode::NO_CONTENT);
}

// --- Account Handlers ---

#[test]
async fn test_register_user_hides_password() {
    let result = handlers::auth::register_user(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Json(RegisterRequest {
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            password: "secret".to_string(),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "chef");
    assert!(body.get("password").is_none());
}

#[test]
async fn test_register_user_conflict() {
    let result = handlers::auth::register_user(
        State(state_with(Arc::new(MockRepoControl {
            user_conflict: true,
            ..Default::default()
        }))),
        Json(RegisterRequest {
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            password: "secret".to_string(),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username or email already exists");
}

#[test]
async fn test_login_unknown_user_is_unauthorized() {
    let result = handlers::auth::login_user(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Json(LoginRequest {
            username: Some("ghost".to_string()),
            email: None,
            password: "whatever".to_string(),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[test]
async fn test_login_blank_username_falls_back_to_email() {
    let mock = Arc::new(MockRepoControl {
        user_to_return: Some(User {
            id: 1,
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            password: auth::hash_password("secret").unwrap(),
            ..Default::default()
        }),
        ..Default::default()
    });

    let result = handlers::auth::login_user(
        State(state_with(mock.clone())),
        Json(LoginRequest {
            username: Some("  ".to_string()),
            email: Some("chef@example.com".to_string()),
            password: "secret".to_string(),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(
        mock.last_login.lock().unwrap().as_deref(),
        Some("chef@example.com")
    );
}

#[test]
async fn test_login_without_any_identifier_is_rejected() {
    let result = handlers::auth::login_user(
        State(state_with(Arc::new(MockRepoControl::default()))),
        Json(LoginRequest {
            username: Some(String::new()),
            email: Some(" ".to_string()),
            password: "secret".to_string(),
        }),
    )
    .await;

    let (status, body) = into_parts(result).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing username or email");
}
