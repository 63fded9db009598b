//! The builder engine: node dispatch, parent/child wiring, nested
//! configuration, and the build entry points.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::context::{ChildSlot, ContextStack, CurrentSlot, Frame, ParentSlot};
use crate::errors::{BuildError, BuildResult};
use crate::events::{BuildEvent, EventKind};
use crate::factory::Factory;
use crate::node::Node;
use crate::scope::{Binding, ConfigureFn, Namespace, SymbolGuard};

type Handler<N> = Rc<dyn Fn(&BuildEvent<N>)>;

/// An object-tree builder engine.
///
/// A builder owns a name-to-factory registry and orchestrates node
/// creation, nesting, parent/child wiring and event emission. Builders are
/// cheaply clonable handles; clones share all state.
///
/// Builders form a tree mirroring the nesting of custom child builders: a
/// builder created with [`Builder::child_of`] shares its ancestor's context
/// stack and namespace, so the "current node" is consistent across the
/// whole active build even as different registries take turns resolving
/// names.
pub struct Builder<N: Node> {
    inner: Rc<BuilderInner<N>>,
}

struct BuilderInner<N: Node> {
    name: Option<String>,
    parent: Option<Builder<N>>,
    stack: ContextStack<N>,
    namespace: Namespace<N>,
    factories: RefCell<HashMap<String, Rc<dyn Factory<N>>>>,
    property_names: RefCell<Vec<String>>,
    method_names: RefCell<Vec<String>>,
    symbols_installed: Cell<bool>,
    saved_bindings: RefCell<HashMap<String, Vec<Binding<N>>>>,
    subscribers: RefCell<HashMap<EventKind, Vec<Handler<N>>>>,
}

impl<N: Node> Clone for Builder<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: Node> Default for Builder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Builder<N> {
    /// A root builder with a private context stack and namespace.
    pub fn new() -> Self {
        Self::construct(None, None, None)
    }

    /// A root builder carrying a diagnostic name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::construct(Some(name.into()), None, None)
    }

    /// A root builder installing its symbols into the given namespace
    /// instead of a fresh one.
    pub fn with_namespace(namespace: &Namespace<N>) -> Self {
        Self::construct(None, None, Some(namespace.clone()))
    }

    /// A child builder sharing `parent`'s context stack and namespace.
    /// Events emitted here bubble up through `parent`.
    pub fn child_of(parent: &Builder<N>) -> Self {
        Self::construct(None, Some(parent.clone()), None)
    }

    /// [`Builder::child_of`] with a diagnostic name.
    pub fn named_child_of(name: impl Into<String>, parent: &Builder<N>) -> Self {
        Self::construct(Some(name.into()), Some(parent.clone()), None)
    }

    fn construct(
        name: Option<String>,
        parent: Option<Builder<N>>,
        namespace: Option<Namespace<N>>,
    ) -> Self {
        let stack = parent
            .as_ref()
            .map(|p| p.inner.stack.clone())
            .unwrap_or_default();
        let namespace = namespace
            .or_else(|| parent.as_ref().map(|p| p.inner.namespace.clone()))
            .unwrap_or_default();
        let builder = Self {
            inner: Rc::new(BuilderInner {
                name: name.clone(),
                parent,
                stack,
                namespace,
                factories: RefCell::new(HashMap::new()),
                property_names: RefCell::new(Vec::new()),
                method_names: RefCell::new(Vec::new()),
                symbols_installed: Cell::new(false),
                saved_bindings: RefCell::new(HashMap::new()),
                subscribers: RefCell::new(HashMap::new()),
            }),
        };
        builder.emit(BuildEvent::Register { name });
        builder
    }

    /// This builder's diagnostic name, if any.
    pub fn name(&self) -> Option<String> {
        self.inner.name.clone()
    }

    pub fn parent(&self) -> Option<Builder<N>> {
        self.inner.parent.clone()
    }

    /// A handle onto the namespace this builder installs symbols into.
    pub fn namespace(&self) -> Namespace<N> {
        self.inner.namespace.clone()
    }

    /// The node currently being configured, if a build is in progress.
    pub fn current_node(&self) -> Option<N> {
        self.inner
            .stack
            .with_top(|frame| frame.current.node.clone())
            .flatten()
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.inner.factories.borrow().contains_key(name)
    }

    pub fn property_names(&self) -> Vec<String> {
        self.inner.property_names.borrow().clone()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.inner.method_names.borrow().clone()
    }

    /// Register a factory for a node-type name. If this builder's symbols
    /// are currently installed, the new name is exposed immediately.
    pub fn register_factory(&self, name: impl Into<String>, factory: impl Factory<N> + 'static) {
        let name = name.into();
        self.inner
            .factories
            .borrow_mut()
            .insert(name.clone(), Rc::new(factory));
        self.emit(BuildEvent::RegisterFactory { name: name.clone() });
        if self.inner.symbols_installed.get() {
            self.expose_factory(&name);
        }
    }

    /// Declare property names exposed as accessors on the current node.
    pub fn register_property_names<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.inner.property_names.borrow_mut().push(name.clone());
            if self.inner.symbols_installed.get() {
                self.expose_property(&name);
            }
        }
    }

    /// Declare method names forwarded to the current node.
    pub fn register_method_names<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.inner.method_names.borrow_mut().push(name.clone());
            if self.inner.symbols_installed.get() {
                self.expose_method(&name);
            }
        }
    }

    /// Subscribe to build events of the given kind. Events bubble: a
    /// handler registered here also observes events emitted by child
    /// builders.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&BuildEvent<N>) + 'static) {
        self.inner
            .subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Rc::new(handler));
    }

    pub(crate) fn emit(&self, event: BuildEvent<N>) {
        self.notify(&event);
    }

    fn notify(&self, event: &BuildEvent<N>) {
        let handlers: Vec<Handler<N>> = self
            .inner
            .subscribers
            .borrow()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(event);
        }
        if let Some(parent) = &self.inner.parent {
            parent.notify(event);
        }
    }

    /// Execute `f` with this builder's symbols installed in the shared
    /// namespace, returning whatever `f` returns.
    ///
    /// Installation is scoped: prior bindings are restored and the context
    /// stack returns to its entry depth on every exit path, error included.
    #[instrument(level = "debug", skip_all, fields(builder = ?self.inner.name))]
    pub fn build<F, R>(&self, f: F) -> BuildResult<R>
    where
        F: FnOnce(&Namespace<N>) -> BuildResult<R>,
    {
        let _guard = SymbolGuard::for_build(self);
        f(&self.namespace())
    }

    /// Run a build program supplied as a callable together with verbatim
    /// arguments, wrapped in the same install/uninstall discipline as
    /// [`Builder::build`].
    #[instrument(level = "debug", skip_all, fields(builder = ?self.inner.name))]
    pub fn build_program<P, R>(&self, program: P, args: &[N::Value]) -> BuildResult<R>
    where
        P: FnOnce(&Namespace<N>, &[N::Value]) -> BuildResult<R>,
    {
        let _guard = SymbolGuard::for_build(self);
        program(&self.namespace(), args)
    }

    /// The single entry point invoked once per declared node: create the
    /// node, wire it to the enclosing node, run the nested configuration
    /// callback if one is supplied, and fire completion.
    ///
    /// Returns `Ok(None)` when the factory deliberately produced no node.
    #[instrument(level = "debug", skip_all, fields(name = %name))]
    pub fn dispatch(
        &self,
        name: &str,
        args: &[N::Value],
        configure: Option<&ConfigureFn<'_, N>>,
    ) -> BuildResult<Option<N>> {
        let is_root = self.inner.stack.is_empty();
        if is_root {
            self.inner.stack.push_default();
        }
        let result = self.dispatch_in_context(name, args, configure);
        if is_root {
            self.inner.stack.truncate(0);
        }
        result
    }

    fn dispatch_in_context(
        &self,
        name: &str,
        args: &[N::Value],
        configure: Option<&ConfigureFn<'_, N>>,
    ) -> BuildResult<Option<N>> {
        let Some((node, factory)) = self.create_node(name, args)? else {
            return Ok(None);
        };

        let enclosing = self
            .inner
            .stack
            .with_top(|frame| frame.current.node.clone())
            .flatten();
        if let Some(parent) = &enclosing {
            self.wire(parent, &node);
        }

        if let Some(configure) = configure {
            if factory.is_leaf() {
                return Err(BuildError::NestingNotSupported(name.to_string()));
            }
            self.configure_nested(&node, enclosing.as_ref(), &factory, configure)?;
        }

        let child_builder = self
            .inner
            .stack
            .with_top(|frame| frame.child.builder.clone())
            .flatten()
            .unwrap_or_else(|| self.clone());
        factory.on_node_completed(&child_builder, enclosing.as_ref(), &node);
        self.emit(BuildEvent::NodeCompleted {
            parent: enclosing,
            node: node.clone(),
        });

        Ok(Some(node))
    }

    /// Resolve the factory (this builder's own registry only), record the
    /// child-governing builder in the top frame, and instantiate the node.
    fn create_node(
        &self,
        name: &str,
        args: &[N::Value],
    ) -> BuildResult<Option<(N, Rc<dyn Factory<N>>)>> {
        debug!("create node: {name}");

        let factory = self
            .inner
            .factories
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownNodeType(name.to_string()))?;

        self.inner.stack.with_top(|frame| {
            frame.child.builder = Some(self.clone());
            frame.child.uses_custom_builder = false;
        });
        if let Some(custom) = factory.child_builder(self) {
            self.inner.stack.with_top(move |frame| {
                frame.child.builder = Some(custom);
                frame.child.uses_custom_builder = true;
            });
        }
        self.inner.stack.with_top(|frame| {
            frame.current.factory = Some(Rc::clone(&factory));
            frame.current.name = Some(name.to_string());
        });

        self.emit(BuildEvent::PreInstantiate {
            name: name.to_string(),
            args: args.to_vec(),
        });

        let Some(node) = factory.new_instance(self, name, args)? else {
            trace!("factory returned no node for {name}");
            return Ok(None);
        };

        self.emit(BuildEvent::PostInstantiate {
            name: name.to_string(),
            node: node.clone(),
        });
        Ok(Some((node, factory)))
    }

    /// The wiring protocol: `set_parent` on the child's factory, then
    /// `set_child` on the enclosing node's own factory, in that order.
    fn wire(&self, parent: &N, child: &N) {
        let Some((factory, child_builder, current_builder, parent_factory)) =
            self.inner.stack.with_top(|frame| {
                (
                    frame.current.factory.clone(),
                    frame.child.builder.clone(),
                    frame.current.builder.clone(),
                    frame.parent.factory.clone(),
                )
            })
        else {
            return;
        };
        let Some(factory) = factory else {
            return;
        };

        let child_builder = child_builder.unwrap_or_else(|| self.clone());
        factory.set_parent(&child_builder, parent, child);
        self.emit(BuildEvent::SetParent {
            parent: parent.clone(),
            child: child.clone(),
        });

        if let Some(parent_factory) = parent_factory {
            let builder = current_builder.unwrap_or_else(|| self.clone());
            parent_factory.set_child(&builder, parent, child);
            self.emit(BuildEvent::SetChild {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
    }

    /// Push the nested frame, expose the custom child builder's vocabulary
    /// for the span of the callback, and run it.
    fn configure_nested(
        &self,
        node: &N,
        enclosing: Option<&N>,
        factory: &Rc<dyn Factory<N>>,
        configure: &ConfigureFn<'_, N>,
    ) -> BuildResult<()> {
        let (current_name, current_builder, child_builder, uses_custom) = self
            .inner
            .stack
            .with_top(|frame| {
                (
                    frame.current.name.clone(),
                    frame.current.builder.clone(),
                    frame.child.builder.clone(),
                    frame.child.uses_custom_builder,
                )
            })
            .ok_or(BuildError::ContextUnderflow)?;

        let governing = child_builder.clone().unwrap_or_else(|| self.clone());

        self.inner.stack.push(Frame {
            current: CurrentSlot {
                node: Some(node.clone()),
                factory: None,
                name: None,
                builder: child_builder,
                uses_custom_builder: uses_custom,
            },
            child: ChildSlot::default(),
            parent: ParentSlot {
                factory: Some(Rc::clone(factory)),
                node: enclosing.cloned(),
                name: current_name,
                builder: current_builder,
            },
        });

        let outcome = {
            let _guard = uses_custom.then(|| SymbolGuard::install(&governing));
            self.run_configure(node, configure)
        };
        outcome?;

        self.inner.stack.pop()?;
        Ok(())
    }

    fn run_configure(&self, node: &N, configure: &ConfigureFn<'_, N>) -> BuildResult<()> {
        self.emit(BuildEvent::BeforeConfigureNode { node: node.clone() });
        configure(node)?;
        self.emit(BuildEvent::AfterConfigureNode { node: node.clone() });
        Ok(())
    }

    // Internal accessors for the symbol exposure layer.

    pub(crate) fn symbols_installed(&self) -> bool {
        self.inner.symbols_installed.get()
    }

    pub(crate) fn set_symbols_installed(&self, installed: bool) {
        self.inner.symbols_installed.set(installed);
    }

    pub(crate) fn sorted_factory_names(&self) -> Vec<String> {
        self.inner
            .factories
            .borrow()
            .keys()
            .cloned()
            .sorted()
            .collect()
    }

    pub(crate) fn push_saved(&self, name: &str, binding: Binding<N>) {
        self.inner
            .saved_bindings
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(binding);
    }

    pub(crate) fn pop_saved(&self, name: &str) -> Option<Binding<N>> {
        self.inner
            .saved_bindings
            .borrow_mut()
            .get_mut(name)
            .and_then(Vec::pop)
    }

    pub(crate) fn context_depth(&self) -> usize {
        self.inner.stack.depth()
    }

    pub(crate) fn context_truncate(&self, depth: usize) {
        self.inner.stack.truncate(depth);
    }
}
