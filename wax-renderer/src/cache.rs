//! Compiled-template memoization keyed by the path a caller asked for.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path → compiled template table with a bust switch instead of eviction.
#[derive(Debug)]
pub struct TemplateCache<V> {
    entries: HashMap<PathBuf, V>,
}

impl<V> Default for TemplateCache<V> {
    fn default() -> Self {
        TemplateCache {
            entries: HashMap::new(),
        }
    }
}

impl<V> TemplateCache<V> {
    /// Return the cached value for `key`, running `load` on a miss.
    ///
    /// With `bust` set the entry is always reloaded; the entry it replaced is
    /// handed back so the caller can release it.
    pub fn fetch<F, Err>(&mut self, key: &Path, bust: bool, load: F) -> Result<(&V, Option<V>), Err>
    where
        F: FnOnce() -> Result<V, Err>,
    {
        let mut replaced = None;
        if bust || !self.entries.contains_key(key) {
            let value = load()?;
            replaced = self.entries.insert(key.to_path_buf(), value);
        } else {
            tracing::trace!(path = %key.display(), "template cache hit");
        }
        Ok((&self.entries[key], replaced))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_entry_unless_busting() {
        let mut cache = TemplateCache::default();
        let key = Path::new("page.tera");

        let (first, replaced) = cache.fetch(key, false, || Ok::<_, ()>(1)).unwrap();
        assert_eq!((*first, replaced), (1, None));
        let (second, _) = cache.fetch(key, false, || Ok::<_, ()>(2)).unwrap();
        assert_eq!(*second, 1);

        let (busted, replaced) = cache.fetch(key, true, || Ok::<_, ()>(3)).unwrap();
        assert_eq!((*busted, replaced), (3, Some(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_load_leaves_cache_untouched() {
        let mut cache: TemplateCache<i32> = TemplateCache::default();
        let err = cache.fetch(Path::new("x"), true, || Err("boom")).unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.is_empty());
    }
}
