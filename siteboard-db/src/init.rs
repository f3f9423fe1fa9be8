// Siteboard - a small site-catalogue CRUD API built with Rust
// Copyright (C) 2025 Siteboard Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the database, creating the file if needed and applying the schema.
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    // Create database file if it doesn't exist
    if database_url.starts_with("sqlite:") {
        let path = database_url.trim_start_matches("sqlite:");
        if !path.starts_with(":memory:") {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    apply_schema(&pool).await?;

    Ok(pool)
}

/// Apply the schema. Idempotent, safe to run at every startup.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sitename TEXT NOT NULL,
            sitetitle TEXT NOT NULL,
            siteaddress TEXT NOT NULL,
            sitedescription TEXT NOT NULL,
            images TEXT NOT NULL DEFAULT '',
            videos TEXT NOT NULL,
            category TEXT NOT NULL,
            createdat TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create sites table")?;

    tracing::debug!("Database schema is up to date");

    Ok(())
}
