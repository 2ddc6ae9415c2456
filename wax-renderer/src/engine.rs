//! Tera backend — [`TeraEngine`] and the [`Helper`] / [`Decorator`] wrappers.
//!
//! # Mapping onto Tera
//!
//! | wax concept | Tera construct                                   |
//! |-------------|--------------------------------------------------|
//! | template    | raw template under a content-addressed name      |
//! | partial     | raw template under its partial name (`include`)  |
//! | helper      | function: `{{ shout(text="hi") }}`               |
//! | decorator   | filter: `{% filter boxed %}…{% endfilter %}`     |
//! | render data | `_data.global`, `_data.local`, …                 |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tera::{Tera, Value};

use wax_core::{CompileOptions, Engine, Namespace, RenderOptions};

use crate::error::RenderError;

/// Variable private render data is exposed under.
pub const DATA_VARIABLE: &str = "_data";

const ANONYMOUS_PREFIX: &str = "__wax/";
/// Tera autoescapes templates whose name ends with one of its autoescape suffixes.
const ESCAPING_SUFFIX: &str = ".html";

// ---------------------------------------------------------------------------
// Helper / Decorator
// ---------------------------------------------------------------------------

type HelperFn = dyn Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync;
type DecoratorFn = dyn Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync;

/// A function callable from template expressions with named arguments.
#[derive(Clone)]
pub struct Helper(Arc<HelperFn>);

impl Helper {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        Helper(Arc::new(f))
    }
}

impl tera::Function for Helper {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        (self.0)(args)
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Helper(..)")
    }
}

/// A function that rewrites a value or a whole rendered block.
#[derive(Clone)]
pub struct Decorator(Arc<DecoratorFn>);

impl Decorator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        Decorator(Arc::new(f))
    }
}

impl tera::Filter for Decorator {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        (self.0)(value, args)
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decorator(..)")
    }
}

// ---------------------------------------------------------------------------
// TeraTemplate
// ---------------------------------------------------------------------------

/// Handle to a template compiled into a [`TeraEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeraTemplate {
    name: String,
    source: Arc<str>,
}

impl TeraTemplate {
    /// Name the template is registered under inside Tera.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// TeraEngine
// ---------------------------------------------------------------------------

/// Tera-backed [`Engine`].
///
/// Compiled templates are stored under `__wax/<digest>` so compiling the same
/// text twice reuses one entry; the `.html` suffix is appended when escaping
/// is on. Each entry counts the compiles holding it and is dropped from Tera
/// once [`Engine::release`] brings the count to zero.
///
/// Helper and decorator names are registered as Tera identifiers: every
/// character outside `[A-Za-z0-9_]` becomes `_`, so the helper generated for
/// `helpers/text/shout.rs` (`text-shout`) is called as `text_shout(...)`.
#[derive(Default)]
pub struct TeraEngine {
    tera: Tera,
    compiled: HashMap<String, usize>,
}

impl TeraEngine {
    pub fn new() -> Self {
        TeraEngine::default()
    }

    /// Direct access for registrations wax does not model (testers, globals).
    pub fn tera_mut(&mut self) -> &mut Tera {
        &mut self.tera
    }

    fn anonymous_name(source: &str, options: &CompileOptions) -> String {
        let digest = hex::encode(Sha256::digest(source.as_bytes()));
        let mut name = format!("{ANONYMOUS_PREFIX}{}", &digest[..16]);
        if options.escapes() {
            name.push_str(ESCAPING_SUFFIX);
        }
        name
    }

    /// Number of templates (compiled and partial) Tera currently holds for wax.
    pub fn template_count(&self) -> usize {
        self.compiled.len()
    }
}

/// Map a registration name onto a Tera identifier.
///
/// Fails when nothing usable is left, or the name would start with a digit.
pub fn tera_identifier(name: &str) -> Result<String, RenderError> {
    let ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match ident.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(ident),
        _ => Err(RenderError::InvalidName(name.to_string())),
    }
}

impl Engine for TeraEngine {
    type Template = TeraTemplate;
    type Helper = Helper;
    type Decorator = Decorator;
    type Error = RenderError;

    fn compile(
        &mut self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<TeraTemplate, RenderError> {
        let name = TeraEngine::anonymous_name(source, options);
        match self.compiled.get_mut(&name) {
            Some(holders) => *holders += 1,
            None => {
                self.tera.add_raw_template(&name, source)?;
                self.compiled.insert(name.clone(), 1);
            }
        }
        Ok(TeraTemplate {
            name,
            source: Arc::from(source),
        })
    }

    fn register_partials(&mut self, partials: Namespace<TeraTemplate>) -> Result<(), RenderError> {
        self.tera.add_raw_templates(
            partials
                .iter()
                .map(|(name, template)| (name.as_str(), template.source())),
        )?;
        for name in partials.into_keys() {
            self.compiled.entry(name).or_insert(1);
        }
        Ok(())
    }

    fn register_helpers(&mut self, helpers: Namespace<Helper>) -> Result<(), RenderError> {
        for (name, helper) in helpers {
            let ident = tera_identifier(&name)?;
            if ident != name {
                tracing::debug!(%name, %ident, "helper registered under Tera identifier");
            }
            self.tera.register_function(&ident, helper);
        }
        Ok(())
    }

    fn register_decorators(&mut self, decorators: Namespace<Decorator>) -> Result<(), RenderError> {
        for (name, decorator) in decorators {
            let ident = tera_identifier(&name)?;
            if ident != name {
                tracing::debug!(%name, %ident, "decorator registered under Tera identifier");
            }
            self.tera.register_filter(&ident, decorator);
        }
        Ok(())
    }

    fn release(&mut self, template: &TeraTemplate) {
        let Some(holders) = self.compiled.get_mut(&template.name) else {
            return;
        };
        *holders -= 1;
        if *holders == 0 {
            self.compiled.remove(&template.name);
            self.tera.templates.remove(&template.name);
            tracing::trace!(name = %template.name, "dropped compiled template");
        }
    }

    fn render(
        &self,
        template: &TeraTemplate,
        data: &Value,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        if !self.compiled.contains_key(&template.name) {
            return Err(RenderError::UnknownTemplate(template.name.clone()));
        }
        let mut value = match data {
            Value::Object(_) => data.clone(),
            _ => Value::Object(Default::default()),
        };
        if let (Value::Object(map), Some(private)) = (&mut value, &options.data) {
            map.insert(DATA_VARIABLE.to_string(), Value::Object(private.clone()));
        }
        let ctx = tera::Context::from_value(value)?;
        Ok(self.tera.render(&template.name, &ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_source_compiles_to_same_name() {
        let mut engine = TeraEngine::new();
        let a = engine.compile("hi {{ x }}", &CompileOptions::default()).unwrap();
        let b = engine.compile("hi {{ x }}", &CompileOptions::default()).unwrap();
        assert_eq!(a.name(), b.name());
        assert!(a.name().starts_with("__wax/"));
        assert!(a.name().ends_with(".html"));
    }

    #[test]
    fn no_escape_changes_name_and_output() {
        let mut engine = TeraEngine::new();
        let raw = CompileOptions {
            no_escape: Some(true),
            ..Default::default()
        };
        let escaped = engine.compile("{{ x }}", &CompileOptions::default()).unwrap();
        let unescaped = engine.compile("{{ x }}", &raw).unwrap();
        assert_ne!(escaped.name(), unescaped.name());

        let data = json!({ "x": "<b>" });
        let opts = RenderOptions::default();
        assert_eq!(engine.render(&escaped, &data, &opts).unwrap(), "&lt;b&gt;");
        assert_eq!(engine.render(&unescaped, &data, &opts).unwrap(), "<b>");
    }

    #[test]
    fn compile_error_surfaces_as_tera_error() {
        let mut engine = TeraEngine::new();
        let err = engine.compile("{% if %}", &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::Tera(_)), "got: {err}");
    }

    #[test]
    fn helpers_decorators_and_partials_are_reachable() {
        let mut engine = TeraEngine::new();
        engine
            .register_helpers(Namespace::from([(
                "shout".to_string(),
                Helper::new(|args| {
                    let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
                    Ok(Value::String(text.to_uppercase()))
                }),
            )]))
            .unwrap();
        engine
            .register_decorators(Namespace::from([(
                "boxed".to_string(),
                Decorator::new(|value, _| Ok(Value::String(format!("[{}]", value.as_str().unwrap_or_default())))),
            )]))
            .unwrap();
        let partial = engine.compile("<{{ who }}>", &CompileOptions::default()).unwrap();
        engine
            .register_partials(Namespace::from([("who".to_string(), partial)]))
            .unwrap();

        let raw = CompileOptions {
            no_escape: Some(true),
            ..Default::default()
        };
        let page = engine
            .compile(
                r#"{{ shout(text="hi") }} {% filter boxed %}{% include "who" %}{% endfilter %}"#,
                &raw,
            )
            .unwrap();
        let out = engine
            .render(&page, &json!({ "who": "wax" }), &RenderOptions::default())
            .unwrap();
        assert_eq!(out, "HI [<wax>]");
    }

    #[test]
    fn private_data_is_exposed_under_reserved_variable() {
        let mut engine = TeraEngine::new();
        let page = engine
            .compile("{{ _data.global.site }}", &CompileOptions::default())
            .unwrap();
        let opts = RenderOptions::default().with_data("global", json!({ "site": "S" }));
        assert_eq!(engine.render(&page, &json!({}), &opts).unwrap(), "S");
    }

    #[test]
    fn release_drops_template_once_unheld() {
        let mut engine = TeraEngine::new();
        let first = engine.compile("v {{ x }}", &CompileOptions::default()).unwrap();
        let second = engine.compile("v {{ x }}", &CompileOptions::default()).unwrap();
        assert_eq!(engine.template_count(), 1);

        engine.release(&first);
        let data = json!({ "x": 1 });
        let opts = RenderOptions::default();
        assert_eq!(engine.render(&second, &data, &opts).unwrap(), "v 1");

        engine.release(&second);
        assert_eq!(engine.template_count(), 0);
        let err = engine.render(&second, &data, &opts).unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(_)));
    }

    #[test]
    fn names_map_onto_tera_identifiers() {
        assert_eq!(tera_identifier("text-shout").unwrap(), "text_shout");
        assert_eq!(tera_identifier("a b/c").unwrap(), "a_b_c");
        assert_eq!(tera_identifier("_x9").unwrap(), "_x9");
        assert!(matches!(tera_identifier("9lives"), Err(RenderError::InvalidName(_))));
        assert!(matches!(tera_identifier(""), Err(RenderError::InvalidName(_))));
    }

    #[test]
    fn hyphenated_helper_is_callable_with_underscores() {
        let mut engine = TeraEngine::new();
        engine
            .register_helpers(Namespace::from([(
                "text-shout".to_string(),
                Helper::new(|_| Ok(json!("LOUD"))),
            )]))
            .unwrap();
        let page = engine.compile("{{ text_shout() }}", &CompileOptions::default()).unwrap();
        let out = engine.render(&page, &json!({}), &RenderOptions::default()).unwrap();
        assert_eq!(out, "LOUD");
    }

    #[test]
    fn unusable_helper_name_is_an_error() {
        let mut engine = TeraEngine::new();
        let err = engine
            .register_helpers(Namespace::from([("2fast".to_string(), Helper::new(|_| Ok(json!(1))))]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidName(name) if name == "2fast"));
    }

    #[test]
    fn foreign_template_is_rejected() {
        let mut other = TeraEngine::new();
        let tpl = other.compile("x", &CompileOptions::default()).unwrap();
        let engine = TeraEngine::new();
        let err = engine
            .render(&tpl, &json!({}), &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(_)));
    }
}
