//! Build events and their bubbling contract.
//!
//! Every builder can emit named events; emission notifies local subscribers
//! first, then the parent builder's, recursively. Delivery is synchronous
//! and ordered, so a top-level build observes activity inside nested
//! custom-vocabulary sub-builders.

use crate::node::Node;

/// Discriminant used as the subscription key for [`BuildEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PreInstantiate,
    PostInstantiate,
    BeforeConfigureNode,
    AfterConfigureNode,
    NodeCompleted,
    SetParent,
    SetChild,
    RegisterFactory,
    Register,
    Error,
}

/// A notification emitted by the builder engine during a build.
pub enum BuildEvent<N: Node> {
    /// About to call `new_instance` for `name`.
    PreInstantiate { name: String, args: Vec<N::Value> },
    /// A node was produced for `name`.
    PostInstantiate { name: String, node: N },
    /// A nested configuration callback is about to run.
    BeforeConfigureNode { node: N },
    /// A nested configuration callback finished.
    AfterConfigureNode { node: N },
    /// A node and all of its nested children finished processing.
    NodeCompleted { parent: Option<N>, node: N },
    /// The child-side wiring hook ran.
    SetParent { parent: N, child: N },
    /// The parent-side wiring hook ran.
    SetChild { parent: N, child: N },
    /// A factory was registered.
    RegisterFactory { name: String },
    /// A builder was constructed.
    Register { name: Option<String> },
    /// A non-fatal error, e.g. a symbol collision at install time.
    Error { message: String },
}

impl<N: Node> BuildEvent<N> {
    pub fn kind(&self) -> EventKind {
        match self {
            BuildEvent::PreInstantiate { .. } => EventKind::PreInstantiate,
            BuildEvent::PostInstantiate { .. } => EventKind::PostInstantiate,
            BuildEvent::BeforeConfigureNode { .. } => EventKind::BeforeConfigureNode,
            BuildEvent::AfterConfigureNode { .. } => EventKind::AfterConfigureNode,
            BuildEvent::NodeCompleted { .. } => EventKind::NodeCompleted,
            BuildEvent::SetParent { .. } => EventKind::SetParent,
            BuildEvent::SetChild { .. } => EventKind::SetChild,
            BuildEvent::RegisterFactory { .. } => EventKind::RegisterFactory,
            BuildEvent::Register { .. } => EventKind::Register,
            BuildEvent::Error { .. } => EventKind::Error,
        }
    }
}
