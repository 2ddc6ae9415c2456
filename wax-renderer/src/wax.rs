//! [`Wax`] — registration builder and compile/render facade.

use std::path::Path;

use serde_json::Value;

use wax_core::glob;
use wax_core::{
    Category, CompileOptions, DataLoader, Engine, Loader, Namespace, Overrides, Reducer,
    RenderOptions, Resolver, Source, WaxConfig, WaxError,
};

use crate::cache::TemplateCache;
use crate::context::compose;
use crate::engine::TeraEngine;

// ---------------------------------------------------------------------------
// Call options / template inputs
// ---------------------------------------------------------------------------

/// Per-call configuration for `helpers_with`, `decorators_with` and `data_with`.
pub struct CallOptions<E, T> {
    pub overrides: Overrides,
    /// Replaces the facade's fold step (or the default one) for this call.
    pub reducer: Option<Reducer<E, T>>,
}

impl<E, T> Default for CallOptions<E, T> {
    fn default() -> Self {
        CallOptions {
            overrides: Overrides::default(),
            reducer: None,
        }
    }
}

impl<E, T> CallOptions<E, T> {
    pub fn new() -> Self {
        CallOptions::default()
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn reducer(mut self, reducer: Reducer<E, T>) -> Self {
        self.reducer = Some(reducer);
        self
    }
}

/// Template text, or a template the engine already compiled.
pub enum TemplateInput<T> {
    Source(String),
    Compiled(T),
}

impl<T> From<&str> for TemplateInput<T> {
    fn from(source: &str) -> Self {
        TemplateInput::Source(source.to_string())
    }
}

impl<T> From<String> for TemplateInput<T> {
    fn from(source: String) -> Self {
        TemplateInput::Source(source)
    }
}

/// A compiled template plus the render options it was compiled with.
#[derive(Debug, Clone)]
pub struct Compiled<T> {
    template: T,
    template_options: RenderOptions,
}

impl<T> Compiled<T> {
    pub fn template(&self) -> &T {
        &self.template
    }
}

// ---------------------------------------------------------------------------
// Wax
// ---------------------------------------------------------------------------

/// Registers partials, helpers, decorators and shared data into an engine,
/// then compiles templates that render against the shared data.
///
/// Registration methods return `&mut Self` so calls chain:
///
/// ```rust,no_run
/// use serde_json::json;
/// use wax_core::WaxConfig;
/// use wax_renderer::Wax;
///
/// # fn main() -> Result<(), wax_core::WaxError> {
/// let mut wax = Wax::tera(WaxConfig::at("site"));
/// wax.partials(["partials/**/*.tera"])?
///     .data("data/**/*.{json,yaml}")?;
/// let page = wax.compile("{% include \"header\" %}{{ title }}")?;
/// println!("{}", wax.render(&page, &json!({ "title": "Home" }))?);
/// # Ok(())
/// # }
/// ```
pub struct Wax<E: Engine> {
    engine: E,
    config: WaxConfig,
    context: Namespace<Value>,
    cache: TemplateCache<Compiled<E::Template>>,
    helper_loader: Option<Box<dyn Loader<E, E::Helper>>>,
    decorator_loader: Option<Box<dyn Loader<E, E::Decorator>>>,
    data_loader: Box<dyn Loader<E, Value>>,
    helper_reducer: Option<Reducer<E, E::Helper>>,
    decorator_reducer: Option<Reducer<E, E::Decorator>>,
    data_reducer: Option<Reducer<E, Value>>,
}

impl Wax<TeraEngine> {
    /// A facade over a fresh [`TeraEngine`].
    pub fn tera(config: WaxConfig) -> Self {
        Wax::new(TeraEngine::new(), config)
    }
}

impl<E: Engine + 'static> Wax<E> {
    pub fn new(engine: E, config: WaxConfig) -> Self {
        Wax {
            engine,
            config,
            context: Namespace::new(),
            cache: TemplateCache::default(),
            helper_loader: None,
            decorator_loader: None,
            data_loader: Box::new(DataLoader),
            helper_reducer: None,
            decorator_reducer: None,
            data_reducer: None,
        }
    }

    /// Loader for helper glob sources. Without one, helper globs are an error.
    pub fn with_helper_loader(mut self, loader: impl Loader<E, E::Helper> + 'static) -> Self {
        self.helper_loader = Some(Box::new(loader));
        self
    }

    /// Loader for decorator glob sources.
    pub fn with_decorator_loader(mut self, loader: impl Loader<E, E::Decorator> + 'static) -> Self {
        self.decorator_loader = Some(Box::new(loader));
        self
    }

    /// Replace [`DataLoader`] for data glob sources.
    pub fn with_data_loader(mut self, loader: impl Loader<E, Value> + 'static) -> Self {
        self.data_loader = Box::new(loader);
        self
    }

    /// Fold step used by every helper glob unless a call passes its own.
    pub fn with_helper_reducer(mut self, reducer: Reducer<E, E::Helper>) -> Self {
        self.helper_reducer = Some(reducer);
        self
    }

    pub fn with_decorator_reducer(mut self, reducer: Reducer<E, E::Decorator>) -> Self {
        self.decorator_reducer = Some(reducer);
        self
    }

    pub fn with_data_reducer(mut self, reducer: Reducer<E, Value>) -> Self {
        self.data_reducer = Some(reducer);
        self
    }

    pub fn config(&self) -> &WaxConfig {
        &self.config
    }

    /// The shared context merged into every render.
    pub fn context(&self) -> &Namespace<Value> {
        &self.context
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Compile every matching template file and register them as partials.
    ///
    /// Partials are named by their file name up to the first `.`
    /// (`nav.main.hbs` → `nav`) unless `parse_partial_name` is configured.
    pub fn partials<I, S>(&mut self, patterns: I) -> Result<&mut Self, WaxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partials_with(patterns, &Overrides::default())
    }

    pub fn partials_with<I, S>(&mut self, patterns: I, overrides: &Overrides) -> Result<&mut Self, WaxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = self.config.with(overrides);
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut partials = Namespace::new();
        for found in glob::expand(&patterns, &config.cwd)? {
            if !config.accepts_extension(&found.path) {
                tracing::debug!(path = %found.path.display(), "skipping partial with unlisted extension");
                continue;
            }
            let text = std::fs::read_to_string(&found.path).map_err(|e| WaxError::Io {
                path: found.path.clone(),
                source: e,
            })?;
            let template = self
                .engine
                .compile(&text, &config.compile_options)
                .map_err(WaxError::engine)?;
            let name = match &config.parse_partial_name {
                Some(keygen) => keygen.generate(&found.path, &found.base)?,
                None => partial_stem(&found.path),
            };
            tracing::debug!(%name, path = %found.path.display(), "partial");
            partials.insert(name, template);
        }

        self.engine
            .register_partials(partials)
            .map_err(WaxError::engine)?;
        Ok(self)
    }

    /// Resolve `source` and register the result as helpers.
    pub fn helpers(&mut self, source: impl Into<Source<E, E::Helper>>) -> Result<&mut Self, WaxError> {
        self.helpers_with(source, CallOptions::default())
    }

    pub fn helpers_with(
        &mut self,
        source: impl Into<Source<E, E::Helper>>,
        options: CallOptions<E, E::Helper>,
    ) -> Result<&mut Self, WaxError> {
        let config = self.config.with(&options.overrides);
        let reducer = options.reducer.as_ref().or(self.helper_reducer.as_ref());
        let mut resolver = Resolver::new(&config, Category::Helpers).reducer(reducer);
        if let Some(loader) = &self.helper_loader {
            resolver = resolver.loader(loader.as_ref());
        }
        let helpers = resolver.resolve(&mut self.engine, source.into())?;
        tracing::debug!(count = helpers.len(), "registering helpers");
        self.engine
            .register_helpers(helpers)
            .map_err(WaxError::engine)?;
        Ok(self)
    }

    /// Resolve `source` and register the result as decorators.
    pub fn decorators(
        &mut self,
        source: impl Into<Source<E, E::Decorator>>,
    ) -> Result<&mut Self, WaxError> {
        self.decorators_with(source, CallOptions::default())
    }

    pub fn decorators_with(
        &mut self,
        source: impl Into<Source<E, E::Decorator>>,
        options: CallOptions<E, E::Decorator>,
    ) -> Result<&mut Self, WaxError> {
        let config = self.config.with(&options.overrides);
        let reducer = options.reducer.as_ref().or(self.decorator_reducer.as_ref());
        let mut resolver = Resolver::new(&config, Category::Decorators).reducer(reducer);
        if let Some(loader) = &self.decorator_loader {
            resolver = resolver.loader(loader.as_ref());
        }
        let decorators = resolver.resolve(&mut self.engine, source.into())?;
        tracing::debug!(count = decorators.len(), "registering decorators");
        self.engine
            .register_decorators(decorators)
            .map_err(WaxError::engine)?;
        Ok(self)
    }

    /// Resolve `source` and merge the result into the shared context.
    pub fn data(&mut self, source: impl Into<Source<E, Value>>) -> Result<&mut Self, WaxError> {
        self.data_with(source, CallOptions::default())
    }

    pub fn data_with(
        &mut self,
        source: impl Into<Source<E, Value>>,
        options: CallOptions<E, Value>,
    ) -> Result<&mut Self, WaxError> {
        let config = self.config.with(&options.overrides);
        let values = Resolver::new(&config, Category::Data)
            .loader(self.data_loader.as_ref())
            .reducer(options.reducer.as_ref().or(self.data_reducer.as_ref()))
            .resolve(&mut self.engine, source.into())?;
        tracing::debug!(count = values.len(), "merging data into shared context");
        self.context.extend(values);
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Compile / render
    // -----------------------------------------------------------------------

    /// Compile `template` with the configured compile options.
    pub fn compile(
        &mut self,
        template: impl Into<TemplateInput<E::Template>>,
    ) -> Result<Compiled<E::Template>, WaxError> {
        self.compile_with(template, &CompileOptions::default())
    }

    /// Compile with `options` layered over the configured compile options.
    pub fn compile_with(
        &mut self,
        template: impl Into<TemplateInput<E::Template>>,
        options: &CompileOptions,
    ) -> Result<Compiled<E::Template>, WaxError> {
        compile_template(&mut self.engine, &self.config, template.into(), options)
    }

    /// Render against the current shared context.
    pub fn render(&self, compiled: &Compiled<E::Template>, data: &Value) -> Result<String, WaxError> {
        self.render_with(compiled, data, &RenderOptions::default())
    }

    /// Render with `options` layered over the template's render options.
    pub fn render_with(
        &self,
        compiled: &Compiled<E::Template>,
        data: &Value,
        options: &RenderOptions,
    ) -> Result<String, WaxError> {
        render_template(&self.engine, &self.context, compiled, data, options)
    }

    /// Read, compile and render the template file at `path`.
    ///
    /// Relative paths resolve against `cwd`. The compiled template is cached
    /// under `path` exactly as given; with `bust_cache` on it is recompiled
    /// on every call and the previous compile is released from the engine.
    pub fn render_file(&mut self, path: impl AsRef<Path>, data: &Value) -> Result<String, WaxError> {
        let key = path.as_ref();
        let file = self.config.resolve_path(key);
        let engine = &mut self.engine;
        let config = &self.config;
        let (compiled, replaced) = self.cache.fetch(key, config.bust_cache, || {
            let text = std::fs::read_to_string(&file).map_err(|e| WaxError::Io {
                path: file.clone(),
                source: e,
            })?;
            tracing::debug!(path = %file.display(), "compiling template file");
            compile_template(engine, config, TemplateInput::Source(text), &CompileOptions::default())
        })?;
        if let Some(stale) = replaced {
            self.engine.release(stale.template());
        }
        render_template(&self.engine, &self.context, compiled, data, &RenderOptions::default())
    }
}

fn compile_template<E: Engine>(
    engine: &mut E,
    config: &WaxConfig,
    input: TemplateInput<E::Template>,
    options: &CompileOptions,
) -> Result<Compiled<E::Template>, WaxError> {
    let template = match input {
        TemplateInput::Compiled(template) => template,
        TemplateInput::Source(text) => {
            let merged = config.compile_options.overlay(options);
            engine.compile(&text, &merged).map_err(WaxError::engine)?
        }
    };
    Ok(Compiled {
        template,
        template_options: config.template_options.clone(),
    })
}

fn render_template<E: Engine>(
    engine: &E,
    context: &Namespace<Value>,
    compiled: &Compiled<E::Template>,
    data: &Value,
    options: &RenderOptions,
) -> Result<String, WaxError> {
    let merged = compiled.template_options.overlay(options);
    let (data, merged) = compose(context, data, &merged);
    engine
        .render(&compiled.template, &data, &merged)
        .map_err(WaxError::engine)
}

/// File name up to its first `.`.
fn partial_stem(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file,
    }
}
