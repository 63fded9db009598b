//! The factory contract: one implementation per node type.

use crate::builder::Builder;
use crate::errors::{BuildError, BuildResult};
use crate::node::Node;

/// Pluggable policy object that produces and wires one node type.
///
/// Factories are registered on a [`Builder`] under a node-type name and are
/// stateless with respect to the engine; any configuration they carry is
/// their own. All operations are synchronous. Only `new_instance` is
/// expected to be overridden by every implementation; the remaining hooks
/// default to no-ops.
pub trait Factory<N: Node> {
    /// Construct a node for the given declared name and verbatim arguments.
    ///
    /// `Ok(None)` is the deliberate "no node produced" signal: the engine
    /// skips wiring, nested configuration and completion for that call.
    /// Invalid arguments should be reported with
    /// [`BuildError::NodeConstruction`].
    ///
    /// The default body errors with [`BuildError::AbstractOperation`],
    /// flagging an incomplete factory implementation.
    fn new_instance(
        &self,
        builder: &Builder<N>,
        name: &str,
        args: &[N::Value],
    ) -> BuildResult<Option<N>> {
        let _ = (builder, args);
        Err(BuildError::AbstractOperation(name.to_string()))
    }

    /// When `true`, the engine refuses to process a nested configuration
    /// step for nodes produced by this factory.
    fn is_leaf(&self) -> bool {
        false
    }

    /// A factory can return a builder to govern the direct children of its
    /// nodes, composing a distinct vocabulary for that region of the tree.
    fn child_builder(&self, parent: &Builder<N>) -> Option<Builder<N>> {
        let _ = parent;
        None
    }

    /// Called once per node, after creation, to record child-side
    /// bookkeeping such as a back-reference from child to parent.
    fn set_parent(&self, builder: &Builder<N>, parent: &N, child: &N) {
        let _ = (builder, parent, child);
    }

    /// Called once per node, symmetric to `set_parent`, to let the parent's
    /// factory attach the child (e.g. push into a children list).
    fn set_child(&self, builder: &Builder<N>, parent: &N, child: &N) {
        let _ = (builder, parent, child);
    }

    /// Called once a node and all of its nested children have finished
    /// processing.
    fn on_node_completed(&self, builder: &Builder<N>, parent: Option<&N>, node: &N) {
        let _ = (builder, parent, node);
    }
}
