//! Extension based content-type detection.

/// Tag name carrying the content type of an uploaded file.
pub const CONTENT_TYPE_TAG: &str = "Content-Type";

/// Content type for a file name, matching what a browser reports.
///
/// Returns an empty string when the extension is not recognised.
pub fn content_type_for(name: &str) -> &'static str {
    mime_guess::from_path(name).first_raw().unwrap_or("")
}
