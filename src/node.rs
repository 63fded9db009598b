//! The opaque node contract.
//!
//! The engine never inspects node shape; it only clones handles, forwards
//! them to factory hooks, and threads them through context frames. Node
//! types are therefore expected to be cheap to clone, typically an
//! `Rc<RefCell<T>>` wrapper.

/// A value produced by a [`Factory`](crate::Factory) and assembled into a
/// tree by user-supplied wiring hooks.
///
/// `Value` is the argument/property payload type forwarded verbatim between
/// the call site and the factories.
///
/// The three dynamic-access methods back the property and method names a
/// builder may expose alongside its factories. They all default to no-ops,
/// so a node type that exposes neither implements the trait with an empty
/// body:
///
/// ```ignore
/// impl Node for MyHandle {
///     type Value = String;
/// }
/// ```
pub trait Node: Clone {
    type Value: Clone;

    /// Read a named property of this node.
    fn property(&self, name: &str) -> Option<Self::Value> {
        let _ = name;
        None
    }

    /// Write a named property of this node. Unknown names are ignored.
    fn set_property(&self, name: &str, value: Self::Value) {
        let _ = (name, value);
    }

    /// Invoke a named method on this node with the given arguments.
    fn invoke(&self, name: &str, args: &[Self::Value]) -> Option<Self::Value> {
        let _ = (name, args);
        None
    }
}
