use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Derives the on-disk name for an uploaded file.
///
/// The name is `<current-millis>-<random 0..1e9>` with the original
/// extension appended, so concurrent uploads of the same name land in
/// distinct blobs with overwhelming probability. No collision check is
/// made and the function never fails.
#[must_use]
pub fn stored_name(original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let token: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{millis}-{token}{}", extension(original_name))
}

/// Extension of the original name including the dot, empty when absent.
fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
