use std::collections::HashMap;

use crate::types::UniformLocation;

/// Memoized parameter name → location lookups for one built program.
///
/// Misses are cached too: a name the program does not declare is queried and
/// reported once, then ignored until the next rebuild clears the cache.
#[derive(Debug, Default)]
pub(crate) struct ParameterCache {
    locations: HashMap<String, Option<UniformLocation>>,
}

impl ParameterCache {
    pub fn resolve<F>(&mut self, name: &str, query: F) -> Option<UniformLocation>
    where
        F: FnOnce(&str) -> Option<UniformLocation>,
    {
        if let Some(cached) = self.locations.get(name) {
            return *cached;
        }

        let location = query(name);
        self.locations.insert(name.to_string(), location);

        if location.is_none() {
            tracing::warn!(parameter = name, "parameter \"{name}\" not found in shader");
        }

        location
    }

    pub fn clear(&mut self) {
        self.locations.clear();
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }
}
