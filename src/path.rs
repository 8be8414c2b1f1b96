use crate::error::LoadError;
use std::path::PathBuf;

/// Directory used when no path segment is given
pub const DEFAULT_DIR: &str = ".";

/// File name used when no file segment is given
pub const DEFAULT_FILE: &str = ".env";

/// Resolve up to two path segments (directory, file name) into a config file path
///
/// No segments resolve to `./.env`, one to `<dir>/.env`, two to `<dir>/<file>`.
/// A directory that already ends with `/` is not given a second separator.
pub fn resolve_path<S: AsRef<str>>(args: &[S]) -> Result<PathBuf, LoadError> {
    let (dir, file) = match args {
        [] => (DEFAULT_DIR, DEFAULT_FILE),
        [dir] => (dir.as_ref(), DEFAULT_FILE),
        [dir, file] => (dir.as_ref(), file.as_ref()),
        _ => return Err(LoadError::InvalidArguments { count: args.len() }),
    };

    let path = if dir.ends_with('/') {
        format!("{}{}", dir, file)
    } else {
        format!("{}/{}", dir, file)
    };

    tracing::debug!(path = %path, "resolved config path");
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let none: [&str; 0] = [];
        assert_eq!(resolve_path(&none).unwrap(), PathBuf::from("./.env"));
    }

    #[test]
    fn test_directory_only() {
        assert_eq!(resolve_path(&["/a/b"]).unwrap(), PathBuf::from("/a/b/.env"));
    }

    #[test]
    fn test_directory_with_trailing_separator() {
        let path = resolve_path(&["/a/b/"]).unwrap();
        assert_eq!(path.to_str(), Some("/a/b/.env"));
    }

    #[test]
    fn test_directory_and_file() {
        assert_eq!(
            resolve_path(&["/a/b", "custom"]).unwrap(),
            PathBuf::from("/a/b/custom")
        );
    }

    #[test]
    fn test_owned_segments() {
        let args = vec!["config".to_string(), "app.env".to_string()];
        assert_eq!(
            resolve_path(&args).unwrap(),
            PathBuf::from("config/app.env")
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let result = resolve_path(&["x", "y", "z"]);
        assert!(matches!(
            result,
            Err(LoadError::InvalidArguments { count: 3 })
        ));
    }
}
