use std::path::{Component, Path};

use crate::TransferError;

/// Validates that a remote entry name is safe to use as a single local path
/// component.
///
/// Names come from the server and are joined onto a local directory, so
/// anything that could escape it is rejected:
/// - Empty names, `.` and `..`
/// - Absolute paths and Windows prefixes
/// - Names containing a path separator
pub fn validate_entry_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(TransferError::InvalidName(format!(
            "path separator not allowed: {name}"
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) | (Some(Component::CurDir), _) => Err(
            TransferError::InvalidName(format!("relative component not allowed: {name}")),
        ),
        _ => Err(TransferError::InvalidName(format!(
            "not a plain file name: {name}"
        ))),
    }
}
