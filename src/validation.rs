use crate::error::{AppError, AppResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for a resolved upstream resource path.
///
/// Upstream dataset paths are short (`fileapi/v1/opendataapi/<dataset>`);
/// anything near this limit indicates a malformed or abusive request.
pub const MAX_PATH_LENGTH: usize = 512;

/// Validate a resolved upstream resource path before forwarding.
///
/// Rules:
/// - Must be non-empty and at most 512 characters
/// - Must not contain control characters
/// - Must not contain `..` segments (path traversal)
/// - Must not embed a scheme (`://`) or start with `/` - the path is always
///   joined onto the fixed upstream origin, never a full URL
pub fn validate_upstream_path(path: &str) -> AppResult<()> {
    if path.is_empty() {
        return Err(AppError::InvalidPath("path cannot be empty".to_string()));
    }

    if path.len() > MAX_PATH_LENGTH {
        return Err(AppError::InvalidPath(format!(
            "path cannot exceed {MAX_PATH_LENGTH} characters"
        )));
    }

    if let Some(pos) = path.chars().position(|c| c.is_control()) {
        return Err(AppError::InvalidPath(format!(
            "path contains a control character at position {pos}"
        )));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(AppError::InvalidPath(
            "path cannot contain '..' segments".to_string(),
        ));
    }

    if path.contains("://") {
        return Err(AppError::InvalidPath(
            "path cannot be an absolute URL".to_string(),
        ));
    }

    if path.starts_with('/') {
        return Err(AppError::InvalidPath(
            "path must be relative to the upstream origin".to_string(),
        ));
    }

    Ok(())
}
