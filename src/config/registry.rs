// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::traits::Workload;

/// Builds a fresh workload instance.
pub type WorkloadConstructor = Arc<dyn Fn() -> Box<dyn Workload> + Send + Sync>;

/// Maps workload names to constructors.
///
/// Names iterate in sorted order, which is the order `list_workloads`
/// reports. Every selection builds a new instance; instances are never
/// reused across selections.
#[derive(Clone, Default)]
pub struct WorkloadRegistry {
    constructors: BTreeMap<String, WorkloadConstructor>,
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Workload> + Send + Sync + 'static,
    {
        self.register(name, constructor);
        self
    }

    /// Register `constructor` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Workload> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Workload>> {
        self.constructors.get(name).map(|constructor| constructor())
    }

    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Keep only the named workloads. Unknown names are ignored.
    pub fn retain_only(&mut self, allowed: &[String]) {
        self.constructors
            .retain(|name, _| allowed.iter().any(|allowed| allowed == name));
    }
}

impl fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadRegistry")
            .field("workloads", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}
