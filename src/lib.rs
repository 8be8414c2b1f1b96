//! Load typed configuration structs from a `.env` file or the process environment.
//!
//! ```no_run
//! use env_loadr::EnvConfig;
//!
//! #[derive(Debug, Default, EnvConfig)]
//! struct Config {
//!     #[env("PORT", validate(required, min = 1, max = 65535))]
//!     port: i32,
//!     #[env("DEBUG")]
//!     debug: bool,
//! }
//!
//! let mut config = Config::default();
//! env_loadr::load_or_exit(&mut config, &[]);
//! ```

pub mod environment;
pub mod error;
pub mod field;
pub mod file;
pub mod loader;
pub mod mapper;
pub mod path;
pub mod report;
pub mod validate;

// Re-export main types
pub use environment::{environ, EnvMap};
pub use error::LoadError;
pub use field::{FieldKind, FieldSpec, Schema, Value, ValueError};
pub use loader::{Loader, Source};
pub use mapper::map_fields;
pub use path::resolve_path;
pub use report::{Reporter, TracingReporter};
pub use validate::{FieldViolation, Rule, TagValidator, ValidationError, Validator};

// Re-export macro
pub use env_loadr_macros::EnvConfig;

/// A struct whose fields can be populated from environment entries
///
/// Usually implemented with `#[derive(EnvConfig)]`.
pub trait EnvConfig: Sized {
    /// Field descriptors in declaration order
    fn schema() -> Schema<Self>;

    /// Start from `Self::default()` and load it from the given path segments
    fn load_with_defaults(path: &[&str]) -> Result<Self, LoadError>
    where
        Self: Default,
    {
        let mut config = Self::default();
        load(&mut config, path)?;
        Ok(config)
    }
}

/// Populate `target` from `<dir>/<file>` (default `./.env`) or, if that file does not
/// exist, from the process environment, then validate it
pub fn load<T: EnvConfig>(target: &mut T, path: &[&str]) -> Result<Source, LoadError> {
    Loader::new().path(path).load(target)
}

/// Like [`load`], but logs any error and exits the process with status 1
pub fn load_or_exit<T: EnvConfig>(target: &mut T, path: &[&str]) -> Source {
    Loader::new().path(path).load_or_exit(target)
}
