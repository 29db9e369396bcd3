//! Constants used throughout tome

/// Reserved manifest file name, recognised in any directory of the source tree
pub const MANIFEST_FILE: &str = ".tome.yaml";

/// Key under which the active tome is exposed to templates
pub const TOME_CONTEXT_KEY: &str = "__tome__";

/// STDOUT indicator for the `--out` argument in single-file mode
pub const STDOUT_INDICATOR: &str = "-";

/// Exit codes
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
