//! Value resolver — turns any [`Source`] into a flat [`Namespace`].

use crate::config::WaxConfig;
use crate::error::WaxError;
use crate::glob;
use crate::loader::Loader;
use crate::module::{FileRecord, Module, Namespace, Source};
use crate::reduce::{reduce, Category, ReduceContext, Reducer};

/// One resolution pass for a single category.
pub struct Resolver<'a, E, T> {
    cx: ReduceContext<'a>,
    loader: Option<&'a dyn Loader<E, T>>,
    reducer: Option<&'a Reducer<E, T>>,
}

impl<'a, E, T> Resolver<'a, E, T> {
    pub fn new(config: &'a WaxConfig, category: Category) -> Self {
        Resolver {
            cx: ReduceContext::new(config, category),
            loader: None,
            reducer: None,
        }
    }

    /// Loader used for glob sources.
    pub fn loader(mut self, loader: &'a dyn Loader<E, T>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Replace the default fold step for glob sources.
    pub fn reducer(mut self, reducer: Option<&'a Reducer<E, T>>) -> Self {
        self.reducer = reducer;
        self
    }

    /// Resolve `source`.
    ///
    /// Factories are invoked once; a `None` result means they registered on
    /// the engine themselves and contributes nothing. In-memory modules are
    /// reduced as one synthetic record. Glob sources are expanded against the
    /// configured `cwd`, loaded, and folded in expansion order.
    pub fn resolve(&self, engine: &mut E, source: Source<E, T>) -> Result<Namespace<T>, WaxError> {
        match source {
            Source::Empty => Ok(Namespace::new()),
            Source::Factory(factory) => Ok(factory(engine, self.cx.config).unwrap_or_default()),
            Source::Module(Module::Value(_)) => {
                tracing::debug!(
                    category = self.cx.category.as_str(),
                    "in-memory leaf value has no path to name it by; ignoring"
                );
                Ok(Namespace::new())
            }
            Source::Module(module) => reduce(
                Namespace::new(),
                FileRecord::synthetic(module),
                engine,
                &self.cx,
            ),
            Source::Patterns(patterns) => self.resolve_patterns(engine, &patterns),
        }
    }

    fn resolve_patterns(&self, engine: &mut E, patterns: &[String]) -> Result<Namespace<T>, WaxError> {
        if patterns.is_empty() {
            return Ok(Namespace::new());
        }
        let loader = self.loader.ok_or(WaxError::NoLoader {
            category: self.cx.category.as_str(),
        })?;

        let files = glob::expand(patterns, &self.cx.config.cwd)?;
        files.into_iter().try_fold(Namespace::new(), |acc, found| {
            let module = loader.load(&found.path)?;
            tracing::debug!(
                category = self.cx.category.as_str(),
                path = %found.path.display(),
                "loaded"
            );
            let record = FileRecord::new(found.path, found.base, module);
            match self.reducer {
                Some(custom) => custom(acc, record, &mut *engine, &self.cx),
                None => reduce(acc, record, &mut *engine, &self.cx),
            }
        })
    }
}
