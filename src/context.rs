use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::builder::Builder;
use crate::errors::{BuildError, BuildResult};
use crate::factory::Factory;
use crate::node::Node;

/// The node/factory active at one nesting level.
pub(crate) struct CurrentSlot<N: Node> {
    pub node: Option<N>,
    pub factory: Option<Rc<dyn Factory<N>>>,
    pub name: Option<String>,
    pub builder: Option<Builder<N>>,
    pub uses_custom_builder: bool,
}

/// Which builder governs grandchildren spawned directly under `current`.
pub(crate) struct ChildSlot<N: Node> {
    pub builder: Option<Builder<N>>,
    pub uses_custom_builder: bool,
}

/// The enclosing level's identity, wired against by nested dispatches.
pub(crate) struct ParentSlot<N: Node> {
    pub factory: Option<Rc<dyn Factory<N>>>,
    pub node: Option<N>,
    pub name: Option<String>,
    pub builder: Option<Builder<N>>,
}

/// One frame per active nesting level. The top of the stack is always the
/// innermost in-progress node.
pub(crate) struct Frame<N: Node> {
    pub current: CurrentSlot<N>,
    pub child: ChildSlot<N>,
    pub parent: ParentSlot<N>,
}

impl<N: Node> Default for CurrentSlot<N> {
    fn default() -> Self {
        Self {
            node: None,
            factory: None,
            name: None,
            builder: None,
            uses_custom_builder: false,
        }
    }
}

impl<N: Node> Default for ChildSlot<N> {
    fn default() -> Self {
        Self {
            builder: None,
            uses_custom_builder: false,
        }
    }
}

impl<N: Node> Default for ParentSlot<N> {
    fn default() -> Self {
        Self {
            factory: None,
            node: None,
            name: None,
            builder: None,
        }
    }
}

impl<N: Node> Default for Frame<N> {
    fn default() -> Self {
        Self {
            current: CurrentSlot::default(),
            child: ChildSlot::default(),
            parent: ParentSlot::default(),
        }
    }
}

/// The stack of build contexts, shared by handle across a chain of
/// builders so that "current node" is consistent for the whole active
/// build. Cloning yields another handle onto the same frames.
pub(crate) struct ContextStack<N: Node> {
    frames: Rc<RefCell<Vec<Frame<N>>>>,
}

impl<N: Node> Clone for ContextStack<N> {
    fn clone(&self) -> Self {
        Self {
            frames: Rc::clone(&self.frames),
        }
    }
}

impl<N: Node> Default for ContextStack<N> {
    fn default() -> Self {
        Self {
            frames: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<N: Node> ContextStack<N> {
    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn push(&self, frame: Frame<N>) {
        self.frames.borrow_mut().push(frame);
        trace!(depth = self.depth(), "context pushed");
    }

    pub fn push_default(&self) {
        self.push(Frame::default());
    }

    pub fn pop(&self) -> BuildResult<Frame<N>> {
        let frame = self
            .frames
            .borrow_mut()
            .pop()
            .ok_or(BuildError::ContextUnderflow)?;
        trace!(depth = self.depth(), "context popped");
        Ok(frame)
    }

    /// Discard frames above `depth`. Used on build-scope exit so the
    /// stack-empty-outside-builds invariant holds even after a propagated
    /// error.
    pub fn truncate(&self, depth: usize) {
        self.frames.borrow_mut().truncate(depth);
    }

    /// Run `f` against the top frame, or return `None` when the stack is
    /// empty. The borrow is confined to this call; `f` must not re-enter
    /// the stack.
    pub fn with_top<R>(&self, f: impl FnOnce(&mut Frame<N>) -> R) -> Option<R> {
        self.frames.borrow_mut().last_mut().map(f)
    }
}
