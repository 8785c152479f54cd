//! Email rendering with Handlebars.
//!
//! Each notification type may have its own HTML body named after the type
//! (`welcome`, `password_reset`, ...). Types without one use `default`. All
//! bodies share the `layout` partial.

mod builtin;

use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::error::{NotificationError, NotificationResult};
use crate::models::NotificationType;

pub const DEFAULT_TEMPLATE: &str = "default";
const TEXT_TEMPLATE: &str = "__text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.handlebars.get_templates().keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TemplateEngine").field("templates", &names).finish()
    }
}

impl TemplateEngine {
    /// Engine with the built-in templates only.
    pub fn new() -> NotificationResult<Self> {
        Ok(Self {
            handlebars: Arc::new(Self::builtin_registry()?),
        })
    }

    /// Built-ins plus every `*.html` file in `dir`. A file named like a
    /// built-in (`welcome.html`, `default.html`, `layout.html`) replaces it.
    pub fn with_directory(dir: impl AsRef<Path>) -> NotificationResult<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::builtin_registry()?;
        let mut loaded = 0usize;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            if name == builtin::LAYOUT_PARTIAL {
                registry.register_partial(&name, source)?;
            } else {
                registry.register_template_string(&name, source)?;
            }
            loaded += 1;
        }

        tracing::info!(dir = %dir.display(), loaded, "Loaded email templates from directory");
        Ok(Self {
            handlebars: Arc::new(registry),
        })
    }

    fn builtin_registry() -> NotificationResult<Handlebars<'static>> {
        let mut registry = Handlebars::new();
        registry.register_partial(builtin::LAYOUT_PARTIAL, builtin::LAYOUT)?;
        for (name, source) in builtin::HTML_TEMPLATES {
            registry.register_template_string(name, *source)?;
        }
        registry.register_template_string(TEXT_TEMPLATE, builtin::TEXT)?;
        // The text body must not HTML-escape anything.
        registry.register_escape_fn(handlebars::no_escape);
        Ok(registry)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Name of the HTML body used for `ty`.
    pub fn template_for(&self, ty: Option<NotificationType>) -> &'static str {
        match ty {
            Some(ty) if self.has_template(ty.as_str()) => ty.as_str(),
            _ => DEFAULT_TEMPLATE,
        }
    }

    pub fn render(&self, ty: Option<NotificationType>, vars: &Map<String, Value>) -> NotificationResult<RenderedEmail> {
        let name = self.template_for(ty);
        let escaped = escape_values(vars);

        let html = self.handlebars.render(name, &escaped)?;
        let text = self.handlebars.render(TEXT_TEMPLATE, vars)?;

        if html.trim().is_empty() {
            return Err(NotificationError::TemplateError(format!("Template '{}' rendered empty", name)));
        }
        Ok(RenderedEmail { html, text })
    }
}

/// HTML-escape every string, at any depth, except the top-level `content`,
/// which callers pass as markup. Templates print values with `{{...}}`;
/// escaping happens here so the plain-text body can share the registry.
fn escape_values(vars: &Map<String, Value>) -> Map<String, Value> {
    vars.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(_) if key == "content" => value.clone(),
                other => escape_value(other),
            };
            (key.clone(), value)
        })
        .collect()
}

fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(handlebars::html_escape(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), escape_value(v))).collect()),
        other => other.clone(),
    }
}
