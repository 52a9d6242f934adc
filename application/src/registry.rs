//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to [`Tool`] implementations. It is an
//! ordinary constructible value, so independent registries (per session, per
//! test) can coexist.
//!
//! # Usage
//!
//! ```ignore
//! use toolgate_application::ToolRegistry;
//!
//! let registry = ToolRegistry::new()
//!     .with(ShellTool::new())
//!     .with(ReadFileTool::new());
//!
//! // Schemas for the next ChatRequest
//! let tools = registry.definitions();
//!
//! // Dispatch (execution happens outside the lock)
//! let tool = registry.get(&call.name)?;
//! let output = tool.execute(&ctx, call.input.clone(), sandbox, &policy).await;
//! ```
//!
//! # Locking
//!
//! A single `RwLock` guards the mapping. Lookups and listing take the read
//! side, register/unregister the write side. Each guard is held only for the
//! map operation itself; a tool's definition is computed before the write
//! lock is taken and tools run after the read guard is released.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use toolgate_domain::ToolDefinition;

use crate::ports::tool::{Tool, ToolError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool not found: {0}")]
    NotFound(String),
}

impl From<RegistryError> for ToolError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => ToolError::NotFound(name),
        }
    }
}

/// A registered tool with its definition captured at registration time.
#[derive(Clone)]
struct Entry {
    definition: ToolDefinition,
    tool: Arc<dyn Tool>,
}

/// Concurrent name → tool mapping
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Entry>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with<T: Tool + 'static>(self, tool: T) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Register a tool under its definition name.
    ///
    /// Overwrites any tool already registered under that name and returns
    /// the replaced one.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let definition = tool.definition();
        let name = definition.name.clone();
        let previous = self
            .write()
            .insert(name.clone(), Entry { definition, tool })
            .map(|e| e.tool);

        if previous.is_some() {
            tracing::debug!(tool = %name, "Replaced registered tool");
        } else {
            tracing::debug!(tool = %name, "Registered tool");
        }
        previous
    }

    /// Register a concrete tool value.
    pub fn register_tool<T: Tool + 'static>(&self, tool: T) -> Option<Arc<dyn Tool>> {
        self.register(Arc::new(tool))
    }

    /// Remove a tool. Returns the removed tool, if any.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let removed = self.write().remove(name).map(|e| e.tool);
        if removed.is_some() {
            tracing::debug!(tool = %name, "Unregistered tool");
        }
        removed
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, RegistryError> {
        self.read()
            .get(name)
            .map(|e| Arc::clone(&e.tool))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Snapshot of all definitions, sorted by name for stable output.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.read().values().map(|e| e.definition.clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer can only poison the lock after a complete
    // insert/remove, so the map is always consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
