use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static STORAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,119}$").expect("storage filename pattern compiles")
});

/// Names accepted on the media routes: a single path segment, no traversal.
pub fn is_storage_filename(name: &str) -> bool {
    STORAGE_NAME.is_match(name) && !name.contains("..")
}

/// Opaque, collision-free name for a stored file.
pub fn new_storage_filename(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), ext.to_ascii_lowercase())
}

/// Original names are display-only; keep the last path segment and strip control characters.
pub fn display_filename(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);
    let cleaned: String = last.chars().filter(|c| !c.is_control()).take(255).collect();
    if cleaned.trim().is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
