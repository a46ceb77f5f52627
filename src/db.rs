use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

use crate::config::AppConfig;

/// connect
///
/// Opens the SQLite pool described by the configuration, creating the database file when
/// it does not exist yet. Foreign keys are switched on for every connection so join rows
/// follow their recipe or ingredient on delete.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(config.database_max_connections.max(1))
        .connect_with(options)
        .await
}

const CREATE_TABLES: [(&str, &str); 4] = [
    (
        "recipes",
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            titre TEXT NOT NULL,
            temps_de_preparation INTEGER NOT NULL,
            difficulte INTEGER NOT NULL,
            budget INTEGER NOT NULL,
            description TEXT NOT NULL,
            documentId TEXT
        )
        "#,
    ),
    (
        "ingredients",
        r#"
        CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nom TEXT NOT NULL,
            documentId TEXT
        )
        "#,
    ),
    (
        "recipe_ingredients",
        r#"
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recette_id INTEGER NOT NULL,
            ingredient_id INTEGER NOT NULL,
            FOREIGN KEY (recette_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY (ingredient_id) REFERENCES ingredients(id) ON DELETE CASCADE,
            UNIQUE(recette_id, ingredient_id)
        )
        "#,
    ),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
];

// Tables that carry a Strapi-style documentId.
const DOCUMENT_TABLES: [&str; 2] = ["recipes", "ingredients"];

/// bootstrap
///
/// Creates the four tables when absent, then adds the `documentId` column to resource
/// tables created before it existed. An already-present column is left alone.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (table, ddl) in CREATE_TABLES {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table, "table ensured");
    }

    for table in DOCUMENT_TABLES {
        ensure_document_id_column(pool, table).await?;
    }

    Ok(())
}

async fn ensure_document_id_column(pool: &SqlitePool, table: &str) -> Result<(), sqlx::Error> {
    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(pool)
        .await?;

    let present = columns.iter().any(|name| name == "documentId");
    if !present {
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN documentId TEXT"))
            .execute(pool)
            .await?;
        tracing::info!(table, "added documentId column");
    }

    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_document_id ON {table}(documentId)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
