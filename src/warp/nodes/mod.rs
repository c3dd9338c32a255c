// SPDX-License-Identifier: MIT

//! Host-facing nodes
//!
//! `Warp` packs values into a bundle, `Unwarp` reads them back out. Both
//! take the store explicitly so tests can run against isolated stores.

pub mod descriptor;
pub mod registry;
pub mod unwarp;
pub mod warp;

pub use descriptor::{InputSocket, NodeDescriptor, OutputSocket, CATEGORY};
pub use registry::NodeRegistry;
pub use unwarp::{Unwarp, UnwarpOutputs};
pub use warp::{Warp, WarpInputs, WarpToken};

use crate::warp::bundle::{BundleStore, FieldMap};

/// Result of invoking a node
#[derive(Debug, Clone)]
pub enum NodeOutput {
    Token(WarpToken),
    Outputs(Box<UnwarpOutputs>),
}

/// A node the host can invoke by name
pub trait Node: Send + Sync {
    fn descriptor(&self) -> &NodeDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name
    }

    /// Run the node against `store` with an optional incoming token
    fn invoke(&self, store: &BundleStore, source: Option<&WarpToken>, inputs: FieldMap) -> NodeOutput;
}
