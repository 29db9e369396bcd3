use std::sync::Arc;

use indexmap::IndexSet;
use log::warn;
use minijinja::{AutoEscape, Environment, ErrorKind};

use super::{
    filters,
    functions::{self, IncludeSource},
    interface::TemplateRenderer,
    references::{self, MissingKey},
};
use crate::error::{Error, Result};

const DEFAULT_TEMPLATE_NAME: &str = "template";

/// MiniJinja-based template rendering engine.
///
/// Output is never escaped and trailing newlines are kept. Undefined values
/// render as empty; in strict mode any unset top-level variable fails the
/// render before it starts.
#[derive(Clone)]
pub struct MiniJinjaRenderer {
    /// Environment with filters and functions registered, shared by all renders
    env: Environment<'static>,
    strict: bool,
}

impl MiniJinjaRenderer {
    /// Creates a lenient renderer.
    pub fn new() -> Self {
        Self::with_strict(false)
    }

    pub fn with_strict(strict: bool) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        filters::register(&mut env);
        functions::register(&mut env);

        Self { env, strict }
    }

    /// Logs every unset variable; in strict mode fails on the first template
    /// that has any.
    fn check_missing_keys(
        &self,
        template: &str,
        context: &serde_json::Value,
        name: &str,
    ) -> Result<()> {
        let missing = self.missing_keys(template, context, Some(name))?;
        if missing.is_empty() {
            return Ok(());
        }

        for key in &missing {
            warn!("{name}:{key}");
        }

        if self.strict {
            let keys: IndexSet<String> = missing.into_iter().map(|key| key.name).collect();
            return Err(Error::MissingValueError {
                name: name.to_string(),
                keys: keys.into_iter().collect(),
            });
        }
        Ok(())
    }

    /// Binds `include_file` for one render. Relative locations resolve
    /// against `anchor`, and the included text sees the same context.
    fn bind_include(
        &self,
        env: &mut Environment<'static>,
        context: &serde_json::Value,
        anchor: &str,
    ) {
        let renderer = self.clone();
        let context = Arc::new(context.clone());
        let anchor = anchor.to_string();

        env.add_function("include_file", move |location: String| {
            let source = IncludeSource::resolve(&anchor, &location)?;
            let text = source.fetch()?;
            renderer.render(&text, &context, Some(&source.name())).map_err(|e| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("cannot render include '{location}'"),
                )
                .with_source(e)
            })
        });
    }

    fn render_internal(
        &self,
        template: &str,
        context: &serde_json::Value,
        template_name: Option<&str>,
    ) -> Result<String> {
        let name = template_name.unwrap_or(DEFAULT_TEMPLATE_NAME);
        self.check_missing_keys(template, context, name)?;

        let mut env = self.env.clone();
        self.bind_include(&mut env, context, name);
        Ok(env.render_named_str(name, template, context)?)
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(
        &self,
        template: &str,
        context: &serde_json::Value,
        template_name: Option<&str>,
    ) -> Result<String> {
        self.render_internal(template, context, template_name)
    }

    fn missing_keys(
        &self,
        template: &str,
        context: &serde_json::Value,
        template_name: Option<&str>,
    ) -> Result<Vec<MissingKey>> {
        references::find_missing_keys(
            &self.env,
            template,
            context,
            template_name.unwrap_or(DEFAULT_TEMPLATE_NAME),
        )
    }
}
