use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    cli::Args,
    constants::STDOUT_INDICATOR,
    context::RunContext,
    error::{Error, Result},
    prompt::DialoguerPrompt,
    renderer::MiniJinjaRenderer,
    template::{OperationWriter, TemplateOperation},
    tome::{parse_file_mode, Tome},
    values::Values,
    walker::Walker,
};

/// Main CLI runner: builds the root tome from the arguments and renders.
pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    pub fn run(self) -> Result<()> {
        let context = RunContext::new(self.args.strict, self.args.force, self.args.dry_run);
        let engine = MiniJinjaRenderer::with_strict(context.strict());
        let prompt = DialoguerPrompt;
        let walker = Walker::new(&engine, OperationWriter::new(context, &prompt));

        let input = std::path::absolute(&self.args.input).map_err(Error::io_at(&self.args.input))?;
        let metadata = fs::metadata(&input).map_err(Error::io_at(&input))?;

        if metadata.is_dir() {
            self.render_tree(&walker, &input)
        } else {
            self.render_single_file(&walker, &input, context)
        }
    }

    /// Values from the value files, then the `--set` overrides.
    fn load_values(&self) -> Result<Values> {
        let mut values = Values::from_files(&self.args.values)?;
        values.apply_overrides(&self.args.set)?;
        log::debug!("Values: {}", serde_json::to_string(&values)?);
        Ok(values)
    }

    fn root_tome(&self, source: &Path, target: PathBuf) -> Result<Tome> {
        let mode = self.args.mode.as_deref().map(parse_file_mode).transpose()?;
        Tome::builder(source, target)
            .mode(mode)
            .strip(self.args.strip.clone())
            .include(self.args.include.clone())
            .exclude(self.args.exclude.clone())
            .copy(self.args.copy.clone())
            .temp(self.args.temp.clone())
            .values(self.load_values()?)
            .build()
    }

    fn render_tree(&self, walker: &Walker, input: &Path) -> Result<()> {
        let out = match self.args.out.as_deref() {
            Some(out) if out != Path::new(STDOUT_INDICATOR) => out,
            _ => {
                return Err(Error::ConfigError(
                    "an output directory (--out) is required when the input is a directory"
                        .into(),
                ))
            }
        };
        let target = std::path::absolute(out).map_err(Error::io_at(out))?;

        let tome = self.root_tome(input, target.clone())?;
        let summary = walker.walk(&tome, input)?;

        println!(
            "Rendered {} and copied {} entries into {} ({} skipped).",
            summary.rendered,
            summary.copied,
            target.display(),
            summary.skipped
        );
        Ok(())
    }

    fn render_single_file(
        &self,
        walker: &Walker,
        input: &Path,
        context: RunContext,
    ) -> Result<()> {
        let source = input.parent().unwrap_or(input);
        let out = match self.args.out.as_deref() {
            Some(out) if out != Path::new(STDOUT_INDICATOR) => out,
            _ => {
                let tome = self.root_tome(source, PathBuf::from(STDOUT_INDICATOR))?;
                return walker.render_file(&tome, input, &mut std::io::stdout().lock());
            }
        };

        let tome = self.root_tome(source, out.to_path_buf())?;
        let mut rendered = Vec::new();
        walker.render_file(&tome, input, &mut rendered)?;

        let operation = TemplateOperation::Write {
            target: out.to_path_buf(),
            content: String::from_utf8_lossy(&rendered).into_owned(),
            mode: tome.mode(),
            target_exists: fs::symlink_metadata(out).is_ok(),
        };
        let prompt = DialoguerPrompt;
        OperationWriter::new(context, &prompt).apply(&operation)?;
        Ok(())
    }
}

/// Main entry point for CLI execution
pub fn run(args: Args) -> Result<()> {
    let runner = Runner::new(args);
    runner.run()
}
