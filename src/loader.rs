use crate::environment::{environ, EnvMap};
use crate::error::LoadError;
use crate::file::read_env_file;
use crate::mapper::map_fields;
use crate::path::resolve_path;
use crate::report::{Reporter, TracingReporter};
use crate::validate::{TagValidator, Validator};
use crate::EnvConfig;
use std::{fmt, fs, io, path::PathBuf, process};

/// Where the configuration values came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The config file at this path existed and was read
    File(PathBuf),
    /// No config file was found; the environment was used instead
    Environment,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Environment => write!(f, "environment"),
        }
    }
}

/// Loads a configuration struct from a `.env` file, falling back to the environment
///
/// # Example
/// ```no_run
/// use env_loadr::{EnvConfig, Loader};
///
/// #[derive(Debug, Default, EnvConfig)]
/// struct Config {
///     #[env("PORT", validate(min = 1))]
///     port: i32,
/// }
///
/// let mut config = Config::default();
/// let source = Loader::new().path(&["config"]).load(&mut config).unwrap();
/// println!("loaded from {}", source);
/// ```
pub struct Loader<T> {
    args: Vec<String>,
    env: Option<EnvMap>,
    validators: Vec<Box<dyn Validator<T>>>,
    reporter: Box<dyn Reporter>,
}

impl<T: EnvConfig> Loader<T> {
    /// Create a loader for `./.env` that reads the process environment as fallback
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            env: None,
            validators: Vec::new(),
            reporter: Box::new(TracingReporter),
        }
    }

    /// Set the directory and optional file name segments of the config path
    ///
    /// More than two segments is reported as an error when loading.
    pub fn path<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.args = args.iter().map(|a| a.as_ref().to_string()).collect();
        self
    }

    /// Use `env` instead of the process environment when no config file exists
    pub fn env(mut self, env: EnvMap) -> Self {
        self.env = Some(env);
        self
    }

    /// Run `validator` after the declared field rules pass
    pub fn validator(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Replace the sink used by `load_reported` and `load_or_exit`
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Populate `target` and validate it
    ///
    /// If the resolved config file exists it is the only source; otherwise the
    /// environment is. Fields without a matching key keep their current values.
    pub fn load(&self, target: &mut T) -> Result<Source, LoadError> {
        let path = resolve_path(&self.args)?;
        let schema = T::schema();

        let (source, assigned) = match fs::metadata(&path) {
            Ok(_) => {
                let env = read_env_file(&path)?;
                let assigned = map_fields(&env, target, &schema)?;
                (Source::File(path), assigned)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using environment");
                let assigned = match &self.env {
                    Some(env) => map_fields(env, target, &schema)?,
                    None => map_fields(&environ(), target, &schema)?,
                };
                (Source::Environment, assigned)
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        TagValidator::check(&schema, target)?;
        for validator in &self.validators {
            validator.validate(target)?;
        }

        tracing::info!(source = %source, fields = assigned, "configuration loaded");
        Ok(source)
    }

    /// Like [`Loader::load`], but passes any error to the reporter before returning it
    pub fn load_reported(&self, target: &mut T) -> Result<Source, LoadError> {
        self.load(target).inspect_err(|e| self.reporter.report(e))
    }

    /// Like [`Loader::load`], but reports any error and exits the process with status 1
    pub fn load_or_exit(&self, target: &mut T) -> Source {
        match self.load_reported(target) {
            Ok(source) => source,
            Err(_) => process::exit(1),
        }
    }
}

impl<T: EnvConfig> Default for Loader<T> {
    fn default() -> Self {
        Self::new()
    }
}
