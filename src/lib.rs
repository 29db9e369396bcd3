/// Handles argument parsing.
pub mod cli;

/// Constants used throughout tome.
pub mod constants;

/// Options shared by one run.
pub mod context;

/// Defines custom error types.
pub mod error;

/// Extension traits for standard library types.
pub mod ext;

/// Glob classification of paths.
pub mod pattern;

/// Overwrite confirmation.
pub mod prompt;

/// Template parsing and rendering functionality.
pub mod renderer;

/// Planning and applying per-entry operations.
pub mod template;

/// Scoped rendering configuration and `.tome.yaml` manifests.
pub mod tome;

/// Layered template values.
pub mod values;

/// Recursive traversal of the source tree.
pub mod walker;
