//! Document and collection paths.
//!
//! Paths are relative to the database root and alternate collection and document
//! ids: `users` is a collection, `users/alice` a document, `users/alice/posts`
//! a subcollection. Segments must be non-empty and cannot contain `/`.

use super::FirestoreError;
use once_cell::sync::Lazy;
use regex::Regex;

// Even number of segments.
static DOCUMENT_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/]+/[^/]+(/[^/]+/[^/]+)*$").expect("valid document path pattern"));

// Odd number of segments.
static COLLECTION_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/]+(/[^/]+/[^/]+)*$").expect("valid collection path pattern"));

pub fn is_document_path(path: &str) -> bool {
    DOCUMENT_PATH.is_match(path)
}

pub fn is_collection_path(path: &str) -> bool {
    COLLECTION_PATH.is_match(path)
}

pub fn validate_document_path(path: &str) -> Result<(), FirestoreError> {
    if is_document_path(path) {
        Ok(())
    } else {
        Err(FirestoreError::InvalidPath(format!(
            "{:?} is not a document path",
            path
        )))
    }
}

pub fn validate_collection_path(path: &str) -> Result<(), FirestoreError> {
    if is_collection_path(path) {
        Ok(())
    } else {
        Err(FirestoreError::InvalidPath(format!(
            "{:?} is not a collection path",
            path
        )))
    }
}

/// The id of the document or collection a path points at.
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, id)| id)
}

/// Everything before the last segment, or `None` for a top-level collection.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

pub(crate) fn join(parent: &str, child: &str) -> String {
    format!("{}/{}", parent, child)
}
