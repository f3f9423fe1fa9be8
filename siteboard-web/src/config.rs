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
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub uploads_dir: String,
    pub max_upload_size: usize,
    pub public_url: String,
    pub token_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Default uploads directory
        let default_uploads_dir = env::var("HOME")
            .map(|home| PathBuf::from(home).join(".siteboard").join("uploads"))
            .unwrap_or_else(|_| PathBuf::from("/var/siteboard/uploads"))
            .to_string_lossy()
            .to_string();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("Invalid PORT")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:siteboard.db".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or(default_uploads_dir),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "10485760".to_string()) // 10MB default
                .parse()
                .unwrap_or(10_485_760),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            token_secret: env::var("TOKEN_SECRET")
                .unwrap_or_else(|_| "siteboard-dev-secret".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL under which a stored upload is served. Handlers return
    /// raw filenames; building full URLs is left to callers.
    pub fn upload_url(&self, filename: &str) -> String {
        format!("{}/uploads/{}", self.public_url.trim_end_matches('/'), filename)
    }
}
