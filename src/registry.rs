use crate::{Filter, QueryError, RegistryError};
use hashbrown::HashMap;
use sift_syntax::Operator;
use tracing::debug;

/// The set of filters a query may reference.
///
/// Built once through [`Registry::builder`] and read-only afterwards, so a
/// single registry can serve concurrent compilations behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    filters: Vec<Filter>,
    by_query_name: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// Adds a filter. Names and query names must be unique, and the query
    /// name has to be something the grammar can read back.
    pub fn register(mut self, filter: Filter) -> Result<Self, RegistryError> {
        let query_name = filter.query_name().to_string();
        if !sift_syntax::is_identifier(&query_name) || query_name.ends_with(".pk") {
            return Err(RegistryError::InvalidName(query_name));
        }
        // Freetext search compiles to `query_name:"text"` for every such filter.
        if filter.is_freetext() && !filter.operators().allows(Operator::Contains) {
            return Err(RegistryError::FreetextWithoutContains(
                filter.name().to_string(),
            ));
        }
        if self.registry.by_name.contains_key(filter.name()) {
            return Err(RegistryError::DuplicateName(filter.name().to_string()));
        }
        if self.registry.by_query_name.contains_key(&query_name) {
            return Err(RegistryError::DuplicateQueryName(query_name));
        }
        let index = self.registry.filters.len();
        self.registry.by_name.insert(filter.name().to_string(), index);
        self.registry.by_query_name.insert(query_name, index);
        self.registry.filters.push(filter);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        debug!(filters = self.registry.filters.len(), "filter registry built");
        self.registry
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Finds a filter by the name typed in a query, ignoring case.
    pub fn get(&self, query_name: &str) -> Option<&Filter> {
        let index = match self.by_query_name.get(query_name) {
            Some(index) => *index,
            None => *self.by_query_name.get(&query_name.to_lowercase())?,
        };
        self.filters.get(index)
    }

    /// Like [`Registry::get`], failing with the list of valid names.
    pub fn resolve(&self, query_name: &str) -> Result<&Filter, QueryError> {
        self.get(query_name)
            .ok_or_else(|| QueryError::UnknownFilter {
                name: query_name.to_string(),
                available: self.names(),
            })
    }

    /// Finds a filter by its registered name, exactly.
    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.by_name.get(name).and_then(|index| self.filters.get(*index))
    }

    /// Query names of every filter, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_query_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Filters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn freetext_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|filter| filter.is_freetext())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
