//! Plugin discovery.
//!
//! The host never scans the filesystem itself. A [`PluginLoader`] produces
//! factories; [`StaticLoader`] is the in-process loader where plugins are
//! registered explicitly. Other loaders (directory scanning, dynamic
//! libraries) can be swapped in behind the same trait.

use crate::context::PluginContext;
use crate::error::PluginHostError;
use crate::plugin::{Plugin, PluginMetadata};
use std::fmt;
use std::rc::Rc;

type CreateFn = dyn Fn(PluginContext) -> Result<Box<dyn Plugin>, PluginHostError>;

/// Knows a plugin's metadata and how to instantiate it.
#[derive(Clone)]
pub struct PluginFactory {
    metadata: PluginMetadata,
    create: Rc<CreateFn>,
}

impl PluginFactory {
    pub fn new<F>(metadata: PluginMetadata, create: F) -> Self
    where
        F: Fn(PluginContext) -> Result<Box<dyn Plugin>, PluginHostError> + 'static,
    {
        Self {
            metadata,
            create: Rc::new(create),
        }
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub(crate) fn instantiate(
        &self,
        ctx: PluginContext,
    ) -> Result<Box<dyn Plugin>, PluginHostError> {
        (self.create)(ctx)
    }
}

impl fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFactory")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Source of plugin factories.
pub trait PluginLoader {
    /// Returns every plugin currently available. May be called again on refresh.
    fn discover(&mut self) -> Vec<PluginFactory>;
}

/// Loader backed by an explicit, in-process registration list.
#[derive(Debug, Default, Clone)]
pub struct StaticLoader {
    factories: Vec<PluginFactory>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory. A later registration with the same id replaces the earlier one.
    pub fn register(&mut self, factory: PluginFactory) -> &mut Self {
        self.factories.retain(|f| f.id() != factory.id());
        self.factories.push(factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl PluginLoader for StaticLoader {
    fn discover(&mut self) -> Vec<PluginFactory> {
        self.factories.clone()
    }
}
