use crate::environment::EnvMap;
use crate::error::LoadError;
use std::path::Path;

/// Parse a `.env`-style file into a case-insensitive [`EnvMap`]
///
/// Parsing is done by `dotenvy`, so comments, quoting, `export` prefixes and
/// `${VAR}` substitution follow its rules. The file's variables are not exported
/// into the process environment.
pub fn read_env_file(path: &Path) -> Result<EnvMap, LoadError> {
    let file_error = |source| LoadError::File {
        path: path.to_path_buf(),
        source,
    };

    let mut map = EnvMap::case_insensitive();
    for item in dotenvy::from_path_iter(path).map_err(file_error)? {
        let (key, value) = item.map_err(file_error)?;
        map.insert(key, value);
    }

    tracing::debug!(path = %path.display(), count = map.len(), "read config file");
    Ok(map)
}
