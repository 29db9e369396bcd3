//! Entry rendering
//!
//! - `processor`: plans what happens to one entry of a tome's subtree
//! - `operation`: the planned operations and their outcomes
//! - `writer`: applies operations, honouring dry-run, force and overwrite prompts

pub mod operation;
pub mod processor;
pub mod writer;

pub use operation::{Outcome, TemplateOperation};
pub use processor::TemplateProcessor;
pub use writer::OperationWriter;
