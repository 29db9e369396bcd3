use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("IO error at '{}': {source}.", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed manifest, conflicting patterns, empty manifest, bad mode strings.
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Failed to parse YAML. Original error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON. Original error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to render. Original error: {0}")]
    MinijinjaError(#[from] minijinja::Error),

    /// Raised only in strict mode.
    #[error("Missing values in '{name}' for keys: {}.", keys.join(", "))]
    MissingValueError { name: String, keys: Vec<String> },

    #[error("Cannot process the path '{}': {message}.", path.display())]
    PathError { path: PathBuf, message: String },

    #[error("Prompt failed: {0}.")]
    PromptError(#[from] dialoguer::Error),
}

impl Error {
    /// Attaches the offending path to an IO error.
    pub fn io_at<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::IoAt { path, source }
    }

    pub fn path<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Error {
        Error::PathError { path: path.into(), message: message.into() }
    }
}

/// Convenience type alias for Results with the crate's Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(crate::constants::exit_codes::FAILURE);
}
