use std::collections::HashMap;

use log::debug;

use crate::error::CoderResult;
use crate::layout::{BorshLayout, Layout, Resolver};
use crate::schema::Schema;

/// Type name → layout, built once from a schema and never mutated.
///
/// Construction resolves every account type up front. A schema that names a
/// type it does not define fails here, not at the first encode.
#[derive(Debug, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<String, Box<dyn Layout>>,
    /// Registration order, for deterministic iteration.
    order: Vec<String>,
}

impl LayoutRegistry {
    /// Build layouts for every account type in `schema`.
    ///
    /// An empty account list yields an empty registry, which is valid.
    pub fn build(schema: &Schema) -> CoderResult<Self> {
        let mut resolver = Resolver::new(schema);
        let mut roots = Vec::with_capacity(schema.accounts.len());
        for def in &schema.accounts {
            roots.push((def.name.as_str(), resolver.resolve(&def.name)?));
        }
        let table = resolver.finish()?;

        let mut registry = Self::default();
        for (name, root) in roots {
            registry.insert(name, Box::new(BorshLayout::new(name, root, table.clone())));
        }
        debug!("built {} account layouts", registry.len());
        Ok(registry)
    }

    /// Register a hand-written layout alongside (or instead of) schema
    /// ones. A later insert under the same name replaces the earlier one.
    pub fn insert(&mut self, name: &str, layout: Box<dyn Layout>) {
        if self.layouts.insert(name.to_owned(), layout).is_none() {
            self.order.push(name.to_owned());
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_layout(mut self, name: &str, layout: Box<dyn Layout>) -> Self {
        self.insert(name, layout);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&dyn Layout> {
        self.layouts.get(name).map(|l| l.as_ref())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Registered names in registration (schema) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
