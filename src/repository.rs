use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures_util::future::join_all;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::StoreResult,
    models::{
        Ingredient, IngredientChanges, IngredientFilter, IngredientRow, LinkedIngredient,
        NewIngredient, NewRecipe, NewUser, Page, PageRequest, Recipe, RecipeChanges, RecipeFilter,
        RecipeIngredient, RecipeRow, User, ingredient_document_id, recipe_document_id,
    },
};

/// RecipeRepository
///
/// Persistence contract for recipes. Identifier lookups accept either the numeric id or the
/// `documentId`; the numeric match is always tried first.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn list_recipes(&self, page: PageRequest, filter: RecipeFilter)
    -> StoreResult<Page<Recipe>>;
    async fn find_recipe(&self, key: &str) -> StoreResult<Option<Recipe>>;
    async fn create_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe>;
    /// Merges `changes` over the stored row. `None` when the key matches nothing.
    async fn update_recipe(&self, key: &str, changes: RecipeChanges)
    -> StoreResult<Option<Recipe>>;
    /// `false` when the key matches nothing.
    async fn delete_recipe(&self, key: &str) -> StoreResult<bool>;
    /// Ingredients linked to each of the given recipes, keyed by recipe id.
    async fn ingredients_by_recipe(
        &self,
        recipe_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Ingredient>>>;
}

/// IngredientRepository
///
/// Same shape as [`RecipeRepository`], for ingredients.
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    async fn list_ingredients(
        &self,
        page: PageRequest,
        filter: IngredientFilter,
    ) -> StoreResult<Page<Ingredient>>;
    async fn find_ingredient(&self, key: &str) -> StoreResult<Option<Ingredient>>;
    async fn create_ingredient(&self, ingredient: NewIngredient) -> StoreResult<Ingredient>;
    async fn update_ingredient(
        &self,
        key: &str,
        changes: IngredientChanges,
    ) -> StoreResult<Option<Ingredient>>;
    async fn delete_ingredient(&self, key: &str) -> StoreResult<bool>;
    async fn recipes_by_ingredient(
        &self,
        ingredient_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Recipe>>>;
}

/// RecipeIngredientRepository
///
/// The many-to-many link between recipes and ingredients, keyed by numeric ids only.
#[async_trait]
pub trait RecipeIngredientRepository: Send + Sync {
    async fn ingredients_of_recipe(&self, recipe_id: i64) -> StoreResult<Vec<LinkedIngredient>>;
    async fn recipes_of_ingredient(&self, ingredient_id: i64) -> StoreResult<Vec<Recipe>>;
    /// Fails with `StoreError::UniqueViolation` when the pair is already linked.
    async fn link(&self, recipe_id: i64, ingredient_id: i64) -> StoreResult<RecipeIngredient>;
    /// Inserts every pair as an independent statement, concurrently and outside any
    /// transaction. Inserts that succeed stay committed even if another one fails; the
    /// first failure is returned.
    async fn link_many(&self, recipe_id: i64, ingredient_ids: &[i64]) -> StoreResult<()>;
    /// Number of join rows removed; zero is not an error.
    async fn unlink(&self, recipe_id: i64, ingredient_id: i64) -> StoreResult<u64>;
    async fn unlink_all(&self, recipe_id: i64) -> StoreResult<u64>;
}

/// UserRepository
///
/// Account lookups backing the access gate.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    /// Matches either the username or the email.
    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;
    /// Fails with `StoreError::UniqueViolation` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

/// Repository
///
/// Everything a handler can reach. Implemented automatically for any type providing all
/// four resource traits.
pub trait Repository:
    RecipeRepository + IngredientRepository + RecipeIngredientRepository + UserRepository
{
}

impl<T> Repository for T where
    T: RecipeRepository + IngredientRepository + RecipeIngredientRepository + UserRepository
{
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The SQLite-backed implementation of every repository trait. Holds the only handle to
/// the connection pool.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const RECIPE_COLUMNS: &str =
    "id, documentId, titre, temps_de_preparation, difficulte, budget, description";
const INGREDIENT_COLUMNS: &str = "id, documentId, nom";

// Matches a stored documentId, or the derived one of a row that has none yet.
// Both placeholders take the lookup key.
const RECIPE_DOCUMENT_MATCH: &str =
    "(documentId = ? OR (documentId IS NULL AND 'recipe_' || id = ?))";
const INGREDIENT_DOCUMENT_MATCH: &str =
    "(documentId = ? OR (documentId IS NULL AND 'ingredient_' || id = ?))";

/// Row of an ingredient joined through `recipe_ingredients`, tagged with the owning side.
#[derive(FromRow)]
struct JoinedIngredientRow {
    owner_id: i64,
    #[sqlx(flatten)]
    ingredient: IngredientRow,
}

#[derive(FromRow)]
struct JoinedRecipeRow {
    owner_id: i64,
    #[sqlx(flatten)]
    recipe: RecipeRow,
}

#[derive(FromRow)]
struct LinkedIngredientRow {
    recipe_ingredient_id: i64,
    #[sqlx(flatten)]
    ingredient: IngredientRow,
}

fn numeric_key(key: &str) -> Option<i64> {
    key.parse().ok()
}

#[async_trait]
impl RecipeRepository for SqliteRepository {
    /// list_recipes
    ///
    /// Counts the filtered set, then reads one page of it ordered by id.
    async fn list_recipes(
        &self,
        page: PageRequest,
        filter: RecipeFilter,
    ) -> StoreResult<Page<Recipe>> {
        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM recipes");
        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes"));

        if let Some(budget) = filter.budget_eq {
            count.push(" WHERE budget = ").push_bind(budget);
            select.push(" WHERE budget = ").push_bind(budget);
        }

        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<RecipeRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items: rows.into_iter().map(Recipe::from).collect(),
            total,
        })
    }

    async fn find_recipe(&self, key: &str) -> StoreResult<Option<Recipe>> {
        if let Some(id) = numeric_key(key) {
            let row: Option<RecipeRow> =
                sqlx::query_as(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            if let Some(row) = row {
                return Ok(Some(row.into()));
            }
        }

        let row: Option<RecipeRow> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE {RECIPE_DOCUMENT_MATCH}"
        ))
        .bind(key)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    /// create_recipe
    ///
    /// Inserts the row, then persists the `documentId` derived from the generated id.
    /// The two statements are not wrapped in a transaction.
    async fn create_recipe(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        let id = sqlx::query(
            r#"
            INSERT INTO recipes (titre, temps_de_preparation, difficulte, budget, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe.title)
        .bind(recipe.prep_time)
        .bind(recipe.difficulty)
        .bind(recipe.budget)
        .bind(&recipe.description)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let document_id = recipe_document_id(id);
        sqlx::query("UPDATE recipes SET documentId = ? WHERE id = ?")
            .bind(&document_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id, %document_id, "recipe created");

        Ok(Recipe {
            id,
            document_id,
            title: recipe.title,
            prep_time: recipe.prep_time,
            difficulty: recipe.difficulty,
            budget: recipe.budget,
            description: recipe.description,
        })
    }

    /// update_recipe
    ///
    /// Uses `COALESCE` so that only the provided fields change. A row still lacking a
    /// `documentId` gets its derived one persisted on the way through.
    async fn update_recipe(
        &self,
        key: &str,
        changes: RecipeChanges,
    ) -> StoreResult<Option<Recipe>> {
        let Some(current) = self.find_recipe(key).await? else {
            return Ok(None);
        };

        let row: Option<RecipeRow> = sqlx::query_as(&format!(
            r#"
            UPDATE recipes
            SET titre = COALESCE(?, titre),
                temps_de_preparation = COALESCE(?, temps_de_preparation),
                difficulte = COALESCE(?, difficulte),
                budget = COALESCE(?, budget),
                description = COALESCE(?, description),
                documentId = COALESCE(documentId, ?)
            WHERE id = ?
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(changes.title)
        .bind(changes.prep_time)
        .bind(changes.difficulty)
        .bind(changes.budget)
        .bind(changes.description)
        .bind(&current.document_id)
        .bind(current.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    async fn delete_recipe(&self, key: &str) -> StoreResult<bool> {
        if let Some(id) = numeric_key(key) {
            let removed = sqlx::query("DELETE FROM recipes WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            if removed > 0 {
                return Ok(true);
            }
        }

        let removed = sqlx::query(&format!("DELETE FROM recipes WHERE {RECIPE_DOCUMENT_MATCH}"))
            .bind(key)
            .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed > 0)
    }

    /// ingredients_by_recipe
    ///
    /// One `IN (...)` query for the whole page instead of one query per recipe.
    async fn ingredients_by_recipe(
        &self,
        recipe_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Ingredient>>> {
        let mut grouped: HashMap<i64, Vec<Ingredient>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT ri.recette_id AS owner_id, i.id, i.documentId, i.nom
            FROM ingredients i
            INNER JOIN recipe_ingredients ri ON i.id = ri.ingredient_id
            WHERE ri.recette_id IN (
            "#,
        );
        let mut ids = builder.separated(", ");
        for id in recipe_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY ri.recette_id, i.id");

        let rows: Vec<JoinedIngredientRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        for row in rows {
            grouped
                .entry(row.owner_id)
                .or_default()
                .push(row.ingredient.into());
        }

        Ok(grouped)
    }
}

#[async_trait]
impl IngredientRepository for SqliteRepository {
    async fn list_ingredients(
        &self,
        page: PageRequest,
        filter: IngredientFilter,
    ) -> StoreResult<Page<Ingredient>> {
        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM ingredients");
        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients"));

        if let Some(name) = filter.name_eq {
            count.push(" WHERE nom = ").push_bind(name.clone());
            select.push(" WHERE nom = ").push_bind(name);
        }

        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows: Vec<IngredientRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items: rows.into_iter().map(Ingredient::from).collect(),
            total,
        })
    }

    async fn find_ingredient(&self, key: &str) -> StoreResult<Option<Ingredient>> {
        if let Some(id) = numeric_key(key) {
            let row: Option<IngredientRow> = sqlx::query_as(&format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = ?"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(row) = row {
                return Ok(Some(row.into()));
            }
        }

        let row: Option<IngredientRow> = sqlx::query_as(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE {INGREDIENT_DOCUMENT_MATCH}"
        ))
        .bind(key)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Ingredient::from))
    }

    async fn create_ingredient(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let id = sqlx::query("INSERT INTO ingredients (nom) VALUES (?)")
            .bind(&ingredient.name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        let document_id = ingredient_document_id(id);
        sqlx::query("UPDATE ingredients SET documentId = ? WHERE id = ?")
            .bind(&document_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id, %document_id, "ingredient created");

        Ok(Ingredient {
            id,
            document_id,
            name: ingredient.name,
        })
    }

    async fn update_ingredient(
        &self,
        key: &str,
        changes: IngredientChanges,
    ) -> StoreResult<Option<Ingredient>> {
        let Some(current) = self.find_ingredient(key).await? else {
            return Ok(None);
        };

        let row: Option<IngredientRow> = sqlx::query_as(&format!(
            r#"
            UPDATE ingredients
            SET nom = COALESCE(?, nom),
                documentId = COALESCE(documentId, ?)
            WHERE id = ?
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(changes.name)
        .bind(&current.document_id)
        .bind(current.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Ingredient::from))
    }

    async fn delete_ingredient(&self, key: &str) -> StoreResult<bool> {
        if let Some(id) = numeric_key(key) {
            let removed = sqlx::query("DELETE FROM ingredients WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            if removed > 0 {
                return Ok(true);
            }
        }

        let removed = sqlx::query(&format!(
            "DELETE FROM ingredients WHERE {INGREDIENT_DOCUMENT_MATCH}"
        ))
        .bind(key)
        .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed > 0)
    }

    async fn recipes_by_ingredient(
        &self,
        ingredient_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<Recipe>>> {
        let mut grouped: HashMap<i64, Vec<Recipe>> = HashMap::new();
        if ingredient_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT ri.ingredient_id AS owner_id, r.id, r.documentId, r.titre,
                   r.temps_de_preparation, r.difficulte, r.budget, r.description
            FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recette_id
            WHERE ri.ingredient_id IN (
            "#,
        );
        let mut ids = builder.separated(", ");
        for id in ingredient_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY ri.ingredient_id, r.id");

        let rows: Vec<JoinedRecipeRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        for row in rows {
            grouped
                .entry(row.owner_id)
                .or_default()
                .push(row.recipe.into());
        }

        Ok(grouped)
    }
}

#[async_trait]
impl RecipeIngredientRepository for SqliteRepository {
    async fn ingredients_of_recipe(&self, recipe_id: i64) -> StoreResult<Vec<LinkedIngredient>> {
        let rows: Vec<LinkedIngredientRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.documentId, i.nom, ri.id AS recipe_ingredient_id
            FROM ingredients i
            INNER JOIN recipe_ingredients ri ON i.id = ri.ingredient_id
            WHERE ri.recette_id = ?
            ORDER BY i.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let ingredient = Ingredient::from(row.ingredient);
                LinkedIngredient {
                    id: ingredient.id,
                    document_id: ingredient.document_id,
                    name: ingredient.name,
                    recipe_ingredient_id: row.recipe_ingredient_id,
                }
            })
            .collect())
    }

    async fn recipes_of_ingredient(&self, ingredient_id: i64) -> StoreResult<Vec<Recipe>> {
        let rows: Vec<RecipeRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.documentId, r.titre, r.temps_de_preparation, r.difficulte,
                   r.budget, r.description
            FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recette_id
            WHERE ri.ingredient_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn link(&self, recipe_id: i64, ingredient_id: i64) -> StoreResult<RecipeIngredient> {
        let id = sqlx::query(
            "INSERT INTO recipe_ingredients (recette_id, ingredient_id) VALUES (?, ?)",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(RecipeIngredient {
            id,
            recipe_id,
            ingredient_id,
        })
    }

    async fn link_many(&self, recipe_id: i64, ingredient_ids: &[i64]) -> StoreResult<()> {
        let inserts = ingredient_ids
            .iter()
            .map(|ingredient_id| self.link(recipe_id, *ingredient_id));

        let outcomes = join_all(inserts).await;
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        if failed > 0 {
            tracing::warn!(
                recipe_id,
                attempted = ingredient_ids.len(),
                failed,
                "batch link partially applied"
            );
        }

        outcomes.into_iter().try_for_each(|outcome| outcome.map(drop))
    }

    async fn unlink(&self, recipe_id: i64, ingredient_id: i64) -> StoreResult<u64> {
        let removed = sqlx::query(
            "DELETE FROM recipe_ingredients WHERE recette_id = ? AND ingredient_id = ?",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(removed)
    }

    async fn unlink_all(&self, recipe_id: i64) -> StoreResult<u64> {
        let removed = sqlx::query("DELETE FROM recipe_ingredients WHERE recette_id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed)
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, created_at
            FROM users
            WHERE username = ? OR email = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES (?, ?, ?)
            RETURNING id, username, email, password, created_at
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
