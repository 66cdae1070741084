//! Disassembler backend adapters.
//!
//! Backends produce the static [`DisassemblyInfo`] for a module. Each
//! supported disassembler is one implementation of the
//! [`DisassemblyBackend`] capability trait; callers select a variant by
//! name through the [`BackendRegistry`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::DisassemblyInfo;

pub mod backends;

/// Error type for disassembly backends.
#[derive(Debug, Error)]
pub enum DisassemblyError {
    #[error("Module not found at {0}")]
    MissingModule(PathBuf),

    #[error("Backend not found: {0}")]
    MissingBackend(String),

    #[error("Disassembly backend error: {0}")]
    Backend(String),

    /// The backend ran but produced no basic blocks for the module.
    #[error("No disassembly information found for {0}")]
    NoDisassembly(String),
}

/// Trait implemented by disassembler backends (e.g., capstone, radare2).
pub trait DisassemblyBackend: Send + Sync {
    /// Disassemble the module and extract its basic blocks and address
    /// bounds.
    fn disassemble(&self, module_path: &Path) -> Result<DisassemblyInfo, DisassemblyError>;
    fn name(&self) -> &'static str;
}

/// Registry for disassembler backends; callers select by name.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DisassemblyBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register<B: DisassemblyBackend + 'static>(&mut self, backend: B) -> &mut Self {
        self.backends.insert(backend.name().to_string(), Box::new(backend));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn DisassemblyBackend> {
        self.backends.get(name).map(|b| &**b)
    }

    /// Return a sorted list of registered backend names for error
    /// messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with every backend compiled into this build.
pub fn default_backend_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    #[cfg(feature = "capstone-backend")]
    {
        registry.register(backends::CapstoneBackend);
    }
    #[cfg(feature = "radare2-backend")]
    {
        registry.register(backends::Radare2Backend);
    }
    registry
}
