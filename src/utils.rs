// src/utils.rs
use uuid::Uuid;

use crate::error::{JobBoardError, Result};

/// Normalize a company name for use inside a storage object name
pub fn normalize_object_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Object name for an uploaded company logo: `logo-{uuid}-{name}`
pub fn logo_file_name(company_name: &str) -> String {
    format!(
        "logo-{}-{}",
        Uuid::new_v4(),
        normalize_object_name(company_name)
    )
}

/// Public URL of an object in a public bucket
pub fn public_object_url(storage_url: &str, bucket: &str, file_name: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        storage_url.trim_end_matches('/'),
        bucket,
        file_name
    )
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate file extension against allowed types
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<()> {
    let ext = get_file_extension(filename).ok_or_else(|| {
        JobBoardError::Validation(format!("File has no extension: {}", filename))
    })?;

    if !allowed.contains(&ext.as_str()) {
        return Err(JobBoardError::Validation(format!(
            "Unsupported file extension: {}. Allowed: {:?}",
            ext, allowed
        )));
    }

    Ok(())
}

/// Content type for an image file name
pub fn image_content_type(filename: &str) -> &'static str {
    match get_file_extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
