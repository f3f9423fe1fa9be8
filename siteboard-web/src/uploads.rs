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

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Declared MIME types accepted for image uploads.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

pub fn is_allowed_image_type(mime: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime)
}

/// Validate that an uploaded filename is safe to embed in a stored name.
/// Uploaded names end up in generated filenames, so path separators and
/// NUL bytes must never get through.
pub fn validate_upload_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(anyhow!("Filename cannot be empty"));
    }

    if filename.len() > 255 {
        return Err(anyhow!("Filename too long"));
    }

    if filename.contains('\0') || filename.contains('/') || filename.contains('\\') {
        return Err(anyhow!("Filename contains invalid characters"));
    }

    // The stored images column is comma-joined
    if filename.contains(',') {
        return Err(anyhow!("Filename contains invalid characters"));
    }

    Ok(())
}

/// Generate a stored filename as `{unix-millis}-{original}`.
pub fn generate_upload_filename(original_name: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), original_name)
}

/// Save uploaded data to disk, returning the full path
pub fn save_upload(data: &[u8], upload_dir: &Path, filename: &str) -> Result<PathBuf> {
    let file_path = upload_dir.join(filename);

    let mut file = fs::File::create(&file_path)
        .with_context(|| format!("Failed to create file: {:?}", file_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write file: {:?}", file_path))?;

    Ok(file_path)
}

/// Remove a stored upload. A file that is already gone is not an error;
/// returns whether a file was actually removed.
pub fn remove_upload(upload_dir: &Path, filename: &str) -> Result<bool> {
    let file_path = upload_dir.join(filename);

    match fs::remove_file(&file_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {:?}", file_path)),
    }
}
