//! Registration reducer — folds file records into one flat namespace.

use std::sync::Arc;

use crate::config::WaxConfig;
use crate::error::WaxError;
use crate::keygen::KeyGen;
use crate::module::{FileRecord, Module, Namespace};

/// What a registration pass is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Partials,
    Helpers,
    Decorators,
    Data,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Partials => "partial",
            Category::Helpers => "helper",
            Category::Decorators => "decorator",
            Category::Data => "data",
        }
    }

    /// The key generator `config` assigns to this category.
    pub fn keygen<'a>(&self, config: &'a WaxConfig) -> Option<&'a KeyGen> {
        match self {
            Category::Partials => config.parse_partial_name.as_ref(),
            Category::Helpers => config.parse_helper_name.as_ref(),
            Category::Decorators => config.parse_decorator_name.as_ref(),
            Category::Data => config.parse_data_name.as_ref(),
        }
    }
}

/// Read-only state shared by every fold step of one pass.
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext<'a> {
    pub config: &'a WaxConfig,
    pub category: Category,
    pub keygen: Option<&'a KeyGen>,
}

impl<'a> ReduceContext<'a> {
    pub fn new(config: &'a WaxConfig, category: Category) -> Self {
        ReduceContext {
            config,
            category,
            keygen: category.keygen(config),
        }
    }
}

/// A replacement fold step for glob resolution.
pub type Reducer<E, T> = Arc<
    dyn Fn(Namespace<T>, FileRecord<E, T>, &mut E, &ReduceContext<'_>) -> Result<Namespace<T>, WaxError>,
>;

/// Fold one record into `acc`.
///
/// - `Empty` leaves `acc` as is.
/// - `Register` runs the hook; a returned namespace is merged, `None` is not.
/// - `Namespace` is merged key by key, later keys overwriting earlier ones.
/// - `Value` is stored under the name the category's key generator derives
///   from the record's path. Without a key generator the value is dropped.
pub fn reduce<E, T>(
    mut acc: Namespace<T>,
    record: FileRecord<E, T>,
    engine: &mut E,
    cx: &ReduceContext<'_>,
) -> Result<Namespace<T>, WaxError> {
    let FileRecord { path, base, module } = record;
    match module {
        Module::Empty => {}
        Module::Register(hook) => match hook(engine, cx.config) {
            Some(ns) => merge(&mut acc, ns, cx),
            None => tracing::debug!(
                category = cx.category.as_str(),
                path = %path.display(),
                "register hook returned nothing; assuming self-registration"
            ),
        },
        Module::Namespace(ns) => merge(&mut acc, ns, cx),
        Module::Value(value) => match cx.keygen {
            Some(keygen) => {
                let name = keygen.generate(&path, &base)?;
                insert(&mut acc, name, value, cx);
            }
            None => tracing::debug!(
                category = cx.category.as_str(),
                path = %path.display(),
                "no key generator for category; skipping leaf value"
            ),
        },
    }
    Ok(acc)
}

fn merge<T>(acc: &mut Namespace<T>, ns: Namespace<T>, cx: &ReduceContext<'_>) {
    for (name, value) in ns {
        insert(acc, name, value, cx);
    }
}

fn insert<T>(acc: &mut Namespace<T>, name: String, value: T, cx: &ReduceContext<'_>) {
    if acc.contains_key(&name) {
        tracing::debug!(category = cx.category.as_str(), %name, "overwriting earlier registration");
    }
    acc.insert(name, value);
}
