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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delimiter used to join image filenames into the stored `images` column.
/// Filenames are server-generated and never contain it.
pub const IMAGE_DELIMITER: char = ',';

/// A catalogued site with its descriptive metadata and uploaded media.
///
/// Wire and column names keep the historical `sitename`/`createdat` form;
/// `images` is the comma-joined list of stored filenames (empty string for
/// no images).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: Option<i64>,
    #[serde(rename = "sitename")]
    pub name: String,
    #[serde(rename = "sitetitle")]
    pub title: String,
    #[serde(rename = "siteaddress")]
    pub address: String,
    #[serde(rename = "sitedescription")]
    pub description: String,
    pub images: String,
    pub videos: String,
    pub category: String,
    #[serde(rename = "createdat")]
    pub created_at: DateTime<Utc>,
}

/// Listing view of a site: everything except `videos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSummary {
    pub id: i64,
    #[serde(rename = "sitename")]
    pub name: String,
    #[serde(rename = "sitetitle")]
    pub title: String,
    #[serde(rename = "siteaddress")]
    pub address: String,
    #[serde(rename = "sitedescription")]
    pub description: String,
    pub images: String,
    pub category: String,
    #[serde(rename = "createdat")]
    pub created_at: DateTime<Utc>,
}

impl Site {
    pub fn new(
        name: String,
        title: String,
        address: String,
        description: String,
        videos: String,
        category: String,
    ) -> Self {
        Self {
            id: None,
            name,
            title,
            address,
            description,
            images: String::new(),
            videos,
            category,
            created_at: Utc::now(),
        }
    }

    /// Split the stored `images` string back into individual filenames.
    /// An empty string is the empty list.
    pub fn image_list(&self) -> Vec<String> {
        split_images(&self.images)
    }

    /// Replace the image list with server-generated filenames.
    pub fn set_images(&mut self, filenames: &[String]) {
        self.images = join_images(filenames);
    }

    pub fn validate_name(&self) -> Result<(), String> {
        validate_short_text("Site name", &self.name)
    }

    pub fn validate_title(&self) -> Result<(), String> {
        validate_short_text("Site title", &self.title)
    }

    pub fn validate_address(&self) -> Result<(), String> {
        validate_short_text("Site address", &self.address)
    }

    pub fn validate_description(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("Site description cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn validate_videos(&self) -> Result<(), String> {
        if self.videos.trim().is_empty() {
            return Err("Videos cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn validate_category(&self) -> Result<(), String> {
        validate_short_text("Category", &self.category)
    }

    pub fn is_valid(&self) -> Result<(), String> {
        self.validate_name()?;
        self.validate_title()?;
        self.validate_address()?;
        self.validate_description()?;
        self.validate_videos()?;
        self.validate_category()?;
        Ok(())
    }
}

/// Join filenames into the stored representation.
pub fn join_images(filenames: &[String]) -> String {
    filenames.join(&IMAGE_DELIMITER.to_string())
}

/// Split a stored `images` value into filenames, dropping empty segments.
pub fn split_images(images: &str) -> Vec<String> {
    images
        .split(IMAGE_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn validate_short_text(what: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} cannot be empty", what));
    }

    if value.len() > 255 {
        return Err(format!("{} cannot exceed 255 characters", what));
    }

    if value.trim().is_empty() {
        return Err(format!("{} cannot be only whitespace", what));
    }

    Ok(())
}
