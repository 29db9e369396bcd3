/// Options shared by every step of one run.
///
/// Passed explicitly to the walker and the writer; nothing reads run options
/// from global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    strict: bool,
    force: bool,
    dry_run: bool,
}

impl RunContext {
    pub fn new(strict: bool, force: bool, dry_run: bool) -> Self {
        Self { strict, force, dry_run }
    }

    /// Unset template variables are fatal.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Existing outputs are replaced without asking.
    pub fn force(&self) -> bool {
        self.force
    }

    /// Nothing is written; operations are only reported.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
