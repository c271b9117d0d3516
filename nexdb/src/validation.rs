//! Input validation shared by the services.

use nexdb_core::error::{DatabaseError, DatabaseResult};

/// Checks that `name` is usable as a collection name.
///
/// A collection name is one or more lowercase ASCII letters.
///
/// # Errors
///
/// - [`DatabaseError::CollectionNameEmpty`] when `name` is empty or only whitespace.
/// - [`DatabaseError::CollectionNameInvalid`] when it contains anything but `a`-`z`.
pub fn validate_collection_name(name: &str) -> DatabaseResult<()> {
    if name.trim().is_empty() {
        return Err(DatabaseError::CollectionNameEmpty);
    }

    if !name.bytes().all(|byte| byte.is_ascii_lowercase()) {
        return Err(DatabaseError::CollectionNameInvalid(name.to_string()));
    }

    Ok(())
}
