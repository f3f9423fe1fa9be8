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
use chrono::{DateTime, Utc};
use siteboard_core::{Site, SiteSummary};
use sqlx::SqlitePool;

pub struct SiteRepository {
    pool: SqlitePool,
}

impl SiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all sites. The `videos` column is not selected.
    pub async fn list(&self) -> Result<Vec<SiteSummary>> {
        let rows = sqlx::query_as::<
            _,
            (i64, String, String, String, String, String, String, String),
        >(
            r#"
            SELECT id, sitename, sitetitle, siteaddress, sitedescription,
                   COALESCE(images, ''), category, createdat
            FROM sites
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sites")?;

        rows.into_iter()
            .map(
                |(id, name, title, address, description, images, category, created_at)| {
                    Ok(SiteSummary {
                        id,
                        name,
                        title,
                        address,
                        description,
                        images,
                        category,
                        created_at: parse_datetime(&created_at)?,
                    })
                },
            )
            .collect()
    }

    pub async fn create(&self, site: &Site) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sites (sitename, sitetitle, siteaddress, sitedescription,
                               images, videos, category, createdat)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&site.name)
        .bind(&site.title)
        .bind(&site.address)
        .bind(&site.description)
        .bind(&site.images)
        .bind(&site.videos)
        .bind(&site.category)
        .bind(site.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create site")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Site>> {
        let result = sqlx::query_as::<
            _,
            (
                i64,
                String,
                String,
                String,
                String,
                String,
                String,
                String,
                String,
            ),
        >(
            r#"
            SELECT id, sitename, sitetitle, siteaddress, sitedescription,
                   images, videos, category, createdat
            FROM sites
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find site by id")?;

        match result {
            Some((
                id,
                name,
                title,
                address,
                description,
                images,
                videos,
                category,
                created_at,
            )) => Ok(Some(Site {
                id: Some(id),
                name,
                title,
                address,
                description,
                images,
                videos,
                category,
                created_at: parse_datetime(&created_at)?,
            })),
            None => Ok(None),
        }
    }

    /// Overwrite all scalar fields of a site in a single statement.
    ///
    /// When `new_images` is `None` the stored image list is kept as-is via
    /// `COALESCE`, so the keep-existing path needs no prior read and cannot
    /// race a concurrent writer. Returns false when no row has this id.
    pub async fn update(&self, id: i64, site: &Site, new_images: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sites
            SET sitename = ?, sitetitle = ?, siteaddress = ?, sitedescription = ?,
                images = COALESCE(?, images), videos = ?, category = ?
            WHERE id = ?
            "#,
        )
        .bind(&site.name)
        .bind(&site.title)
        .bind(&site.address)
        .bind(&site.description)
        .bind(new_images)
        .bind(&site.videos)
        .bind(&site.category)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update site")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a site row. Returns false when no row has this id.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sites WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete site")?;

        Ok(result.rows_affected() > 0)
    }
}

/// SQLite stores datetime as "YYYY-MM-DD HH:MM:SS" (its own default) or as
/// RFC3339 when bound from chrono.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if value.contains('T') {
        Ok(DateTime::parse_from_rfc3339(value)
            .context("Failed to parse datetime as RFC3339")?
            .with_timezone(&Utc))
    } else {
        Ok(
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .context("Failed to parse datetime as SQLite format")?
                .and_utc(),
        )
    }
}
