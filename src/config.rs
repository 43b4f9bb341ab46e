//! Runtime configuration
//!
//! Settings come from the environment. The only one today is the database
//! location.

use std::path::{Path, PathBuf};

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "NUTRICLINIC_DATABASE_PATH";

const DATABASE_FILE: &str = "nutriclinic.db";

/// Get the database path from environment or use default
pub fn get_database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(&exe_dir)
        })
}

/// `<project>/data/nutriclinic.db`, where a binary under target/debug or
/// target/release resolves to the project root
pub fn default_database_path(exe_dir: &Path) -> PathBuf {
    let mut path = exe_dir.to_path_buf();

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push(DATABASE_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_leaves_target_dir() {
        let path = default_database_path(Path::new("/srv/nutriclinic/target/release"));
        assert_eq!(path, PathBuf::from("/srv/nutriclinic/data/nutriclinic.db"));

        let path = default_database_path(Path::new("/opt/bin"));
        assert_eq!(path, PathBuf::from("/opt/bin/data/nutriclinic.db"));
    }
}
