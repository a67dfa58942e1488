//! Template substitution for sitegen.
//! Page bodies, front matter and converted HTML are all rendered through
//! the same [`TemplateRenderer`] seam, backed by MiniJinja.
use crate::error::Result;
use minijinja::Environment;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer that keeps trailing newlines, since whole pages
    /// pass through it.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// Undefined lookups render as empty strings.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if the template does not parse or render
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.env.render_str(template, context)?)
    }
}

/// Renders every string inside `value`, recursing through arrays and objects.
///
/// Non-string scalars are returned as-is.
pub fn render_value(
    value: &serde_json::Value,
    context: &serde_json::Value,
    engine: &dyn TemplateRenderer,
) -> Result<serde_json::Value> {
    match value {
        serde_json::Value::String(s) => Ok(serde_json::Value::String(engine.render(s, context)?)),
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(|item| render_value(item, context, engine))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array),
        serde_json::Value::Object(obj) => {
            let mut processed = serde_json::Map::new();
            for (k, v) in obj {
                processed.insert(k.clone(), render_value(v, context, engine)?);
            }
            Ok(serde_json::Value::Object(processed))
        }
        _ => Ok(value.clone()),
    }
}
