// SPDX-License-Identifier: MIT

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::NodeDescriptor;
use super::unwarp::Unwarp;
use super::warp::Warp;
use super::Node;
use crate::common::error::{Result, WarpError};

/// Display name to node mapping handed to the host
#[derive(Clone)]
pub struct NodeRegistry {
    nodes: Arc<RwLock<HashMap<String, Arc<dyn Node>>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry with `Warp` and `Unwarp`
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(Warp));
        registry.register(Arc::new(Unwarp));
        registry
    }

    pub fn register(&self, node: Arc<dyn Node>) {
        let mut nodes = self.nodes.write();
        nodes.insert(node.name().to_string(), node);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        let nodes = self.nodes.read();
        nodes.get(name).cloned()
    }

    /// Like [`NodeRegistry::get`] but reports a missing node as an error
    pub fn require(&self, name: &str) -> Result<Arc<dyn Node>> {
        self.get(name).ok_or_else(|| WarpError::node_not_found(name))
    }

    /// Registered node names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors of every registered node, sorted by name
    pub fn descriptors(&self) -> Vec<NodeDescriptor> {
        let nodes = self.nodes.read();
        let mut descriptors: Vec<NodeDescriptor> =
            nodes.values().map(|n| n.descriptor().clone()).collect();
        descriptors.sort_by_key(|d| d.name);
        descriptors
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
