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

use crate::{handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;
    let uploads_dir = state.config.uploads_dir.clone();

    Router::new()
        .route("/", get(index))
        .route(
            "/api/sites",
            get(handlers::list_sites).post(handlers::create_site),
        )
        .route(
            "/api/sites/{id}",
            get(handlers::get_site)
                .put(handlers::update_site)
                .delete(handlers::delete_site),
        )
        // Uploaded images, served statically
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Siteboard API is running"
}
