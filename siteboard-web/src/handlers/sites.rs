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

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use siteboard_core::{models::site::join_images, Site};
use siteboard_db::SiteRepository;

use crate::{
    config::Config,
    error::AppError,
    state::AppState,
    uploads::{
        generate_upload_filename, is_allowed_image_type, save_upload, validate_upload_filename,
    },
};

/// Multipart form for create/update: the scalar site fields plus any number
/// of `images` file parts, which are written to disk as they stream in.
#[derive(Debug, Default)]
struct SiteForm {
    name: String,
    title: String,
    address: String,
    description: String,
    videos: String,
    category: String,
    stored_images: Vec<String>,
}

impl SiteForm {
    fn into_site(self) -> Result<(Site, Vec<String>), AppError> {
        let site = Site::new(
            self.name,
            self.title,
            self.address,
            self.description,
            self.videos,
            self.category,
        );
        site.is_valid().map_err(AppError::bad_request)?;
        Ok((site, self.stored_images))
    }
}

/// Read the multipart form, validating and persisting each uploaded image
/// before its write. Earlier writes are not rolled back when a later part
/// is rejected.
async fn read_site_form(mut multipart: Multipart, config: &Config) -> Result<SiteForm, AppError> {
    let mut form = SiteForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::bad_request("Malformed multipart request").with_details(e.to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "sitename" => form.name = field_text(field).await?,
            "sitetitle" => form.title = field_text(field).await?,
            "siteaddress" => form.address = field_text(field).await?,
            "sitedescription" => form.description = field_text(field).await?,
            "videos" => form.videos = field_text(field).await?,
            "category" => form.category = field_text(field).await?,
            "images" => {
                // Browsers submit an empty filename for an empty file input
                let original = match field.file_name() {
                    Some(f) if !f.is_empty() => f.to_string(),
                    _ => continue,
                };

                let content_type = field.content_type().unwrap_or("").to_string();
                if !is_allowed_image_type(&content_type) {
                    return Err(AppError::bad_request(
                        "Invalid file type: only JPEG, PNG and GIF images are allowed",
                    ));
                }

                validate_upload_filename(&original)
                    .map_err(|e| AppError::bad_request(e.to_string()))?;

                let data = field.bytes().await.map_err(|e| {
                    AppError::bad_request("Failed to read uploaded file")
                        .with_details(e.to_string())
                })?;

                if data.len() > config.max_upload_size {
                    return Err(AppError::bad_request("Uploaded image is too large"));
                }

                let filename = generate_upload_filename(&original);
                save_upload(&data, std::path::Path::new(&config.uploads_dir), &filename)?;
                form.stored_images.push(filename);
            }
            _ => {} // Ignore unknown fields
        }
    }

    Ok(form)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(|e| {
        AppError::bad_request("Malformed multipart field").with_details(e.to_string())
    })
}

pub async fn list_sites(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sites = SiteRepository::new(state.db.clone()).list().await?;

    Ok(Json(json!({ "sites": sites })))
}

pub async fn create_site(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_site_form(multipart, &state.config).await?;

    if form.stored_images.is_empty() {
        return Err(AppError::bad_request("No images uploaded"));
    }

    let (mut site, stored_images) = form.into_site()?;
    site.set_images(&stored_images);

    let id = SiteRepository::new(state.db.clone()).create(&site).await?;
    tracing::info!(id, "Site created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Site created successfully", "id": id })),
    ))
}

pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let site = SiteRepository::new(state.db.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Site not found"))?;

    Ok(Json(json!({ "site": site })))
}

pub async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_site_form(multipart, &state.config).await?;
    let (site, stored_images) = form.into_site()?;

    // None keeps the stored image list in a single statement, so there is
    // no read-then-write window against concurrent writers.
    let new_images = if stored_images.is_empty() {
        None
    } else {
        Some(join_images(&stored_images))
    };

    let updated = SiteRepository::new(state.db.clone())
        .update(id, &site, new_images.as_deref())
        .await?;

    if !updated {
        return Err(AppError::not_found("Site not found"));
    }

    tracing::info!(id, "Site updated");

    Ok(Json(json!({ "message": "Site updated successfully" })))
}

pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let repo = SiteRepository::new(state.db.clone());

    let site = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Site not found"))?;

    // The row is the source of truth: delete it first, then clean up files
    // best-effort. A failed cleanup leaves an orphan file, never a lost row.
    repo.delete(id).await?;

    let uploads_dir = std::path::Path::new(&state.config.uploads_dir);
    for filename in site.image_list() {
        match crate::uploads::remove_upload(uploads_dir, &filename) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(filename = %filename, "Stored image already missing during delete")
            }
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "Failed to remove stored image")
            }
        }
    }

    tracing::info!(id, "Site deleted");

    Ok(Json(json!({ "message": "Site deleted successfully" })))
}
