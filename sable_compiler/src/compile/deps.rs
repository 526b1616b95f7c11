//! Call dependencies between functions, layered so callees come first.
use std::collections::HashMap;

use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("function '{0}' depends on itself")]
    SelfDependency(String),
    #[error("function '{0}' closes a dependency cycle")]
    Cyclic(String),
    #[error("function '{0}' is already in the graph")]
    AlreadyPlaced(String),
}

/// The set of functions called by one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDependencies<'a> {
    name: &'a str,
    dependencies: Vec<&'a str>,
}

impl<'a> FunctionDependencies<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            dependencies: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn dependencies(&self) -> &[&'a str] {
        &self.dependencies
    }

    /// Record a called function.
    ///
    /// Returns `Ok(false)` when it was already recorded.
    pub fn push(&mut self, dependency: &'a str) -> Result<bool, DependencyError> {
        if dependency == self.name {
            return Err(DependencyError::SelfDependency(self.name.to_string()));
        }
        if self.dependencies.contains(&dependency) {
            return Ok(false);
        }

        self.dependencies.push(dependency);
        Ok(true)
    }

    #[inline]
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| *dep == name)
    }
}

/// Functions grouped into layers.
///
/// Every function sits in a strictly higher layer than each of its placed
/// dependencies. Dependencies may be pushed after their dependents, the
/// dependents are moved up when that happens.
#[derive(Debug, Default)]
pub struct FunctionDependencyGraph<'a> {
    /// Functions in insertion order.
    entries: Vec<FunctionDependencies<'a>>,
    /// Layer of each entry.
    layer: Vec<usize>,
    index: HashMap<&'a str, usize>,
}

impl<'a> FunctionDependencyGraph<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a function into the graph.
    ///
    /// The graph is left unchanged when an error is returned.
    pub fn push(&mut self, function: FunctionDependencies<'a>) -> Result<usize, DependencyError> {
        let name = function.name;

        if self.index.contains_key(name) {
            return Err(DependencyError::AlreadyPlaced(name.to_string()));
        }
        if function.depends_on(name) {
            return Err(DependencyError::SelfDependency(name.to_string()));
        }
        if self.reaches(&function.dependencies, name) {
            return Err(DependencyError::Cyclic(name.to_string()));
        }

        let layer = function
            .dependencies
            .iter()
            .filter_map(|dep| self.layer_of(dep))
            .map(|layer| layer + 1)
            .max()
            .unwrap_or(0);

        let id = self.entries.len();
        self.entries.push(function);
        self.layer.push(layer);
        self.index.insert(name, id);
        debug!("function '{}' placed in layer {}", name, layer);

        self.relax(id);
        Ok(self.layer[id])
    }

    /// Indicates whether `target` can be reached by following placed
    /// functions from the given dependencies.
    fn reaches(&self, start: &[&'a str], target: &str) -> bool {
        let mut visited = vec![false; self.entries.len()];
        let mut stack = start.to_vec();

        while let Some(name) = stack.pop() {
            if name == target {
                return true;
            }
            if let Some(&id) = self.index.get(name) {
                if !visited[id] {
                    visited[id] = true;
                    stack.extend_from_slice(&self.entries[id].dependencies);
                }
            }
        }

        false
    }

    /// Move every dependent of `id` above it, transitively.
    fn relax(&mut self, id: usize) {
        let mut worklist = vec![id];

        while let Some(id) = worklist.pop() {
            let name = self.entries[id].name;
            let floor = self.layer[id] + 1;

            for other in 0..self.entries.len() {
                if self.entries[other].depends_on(name) && self.layer[other] < floor {
                    debug!(
                        "function '{}' moved from layer {} to {}",
                        self.entries[other].name, self.layer[other], floor
                    );
                    self.layer[other] = floor;
                    worklist.push(other);
                }
            }
        }
    }

    pub fn layer_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|id| self.layer[*id])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn layer_count(&self) -> usize {
        self.layer.iter().max().map(|max| max + 1).unwrap_or(0)
    }

    /// Functions grouped by layer, layer 0 first, each layer in
    /// insertion order.
    pub fn layers(&self) -> Vec<Vec<&FunctionDependencies<'a>>> {
        let mut layers = vec![Vec::new(); self.layer_count()];
        for (entry, layer) in self.entries.iter().zip(&self.layer) {
            layers[*layer].push(entry);
        }
        layers
    }

    /// Functions in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDependencies<'a>> {
        self.layers().into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
