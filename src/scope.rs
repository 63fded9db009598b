//! Scoped symbol exposure: the shared namespace, its bindings, and the
//! install/save/restore discipline that makes builds nestable and
//! re-entrant without clobbering pre-existing bindings.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::builder::Builder;
use crate::errors::{BuildError, BuildResult};
use crate::events::BuildEvent;
use crate::node::Node;

/// Signature of a nested configuration callback: receives the newly
/// created node, returns `Ok(())` or propagates a build error.
pub type ConfigureFn<'a, N> = dyn Fn(&N) -> BuildResult<()> + 'a;

/// A name-scoped symbol installed by a builder for the span of a build.
///
/// Each binding records the builder that installed it, so invocation
/// resolves against the correct factory registry and the shared
/// "current node" context.
#[derive(Clone)]
pub(crate) enum Binding<N: Node> {
    Factory { builder: Builder<N>, name: String },
    Property { builder: Builder<N>, name: String },
    Method { builder: Builder<N>, name: String },
}

/// The shared symbol table a build closure calls into.
///
/// Builders install one callable per registered factory name (plus
/// property accessors and method thunks) for the duration of a build, and
/// restore whatever was bound before on every exit path. The table plays
/// the role an ambient global scope plays in dynamic languages, made
/// explicit and injectable.
///
/// Cloning yields another handle onto the same table. Builders created
/// with [`Builder::child_of`] share their parent's namespace; a root
/// builder accepts a private one via [`Builder::with_namespace`].
pub struct Namespace<N: Node> {
    bindings: Rc<RefCell<HashMap<String, Binding<N>>>>,
}

impl<N: Node> Clone for Namespace<N> {
    fn clone(&self) -> Self {
        Self {
            bindings: Rc::clone(&self.bindings),
        }
    }
}

impl<N: Node> Default for Namespace<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> Namespace<N> {
    pub fn new() -> Self {
        Self {
            bindings: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Invoke the factory callable bound to `name`.
    ///
    /// `configure` is the explicit trailing configuration callback; pass
    /// `None` for a childless node declaration.
    pub fn call(
        &self,
        name: &str,
        args: &[N::Value],
        configure: Option<&ConfigureFn<'_, N>>,
    ) -> BuildResult<Option<N>> {
        match self.lookup(name) {
            Some(Binding::Factory { builder, name }) => builder.dispatch(&name, args, configure),
            Some(_) => Err(BuildError::NotCallable(name.to_string())),
            None => Err(BuildError::UnknownNodeType(name.to_string())),
        }
    }

    /// Read the property bound to `name` on the node currently being
    /// configured.
    pub fn get(&self, name: &str) -> BuildResult<Option<N::Value>> {
        match self.lookup(name) {
            Some(Binding::Property { builder, name }) => {
                let node = builder.current_node().ok_or(BuildError::NoActiveNode)?;
                Ok(node.property(&name))
            }
            Some(_) => Err(BuildError::NotAProperty(name.to_string())),
            None => Err(BuildError::UnboundSymbol(name.to_string())),
        }
    }

    /// Write the property bound to `name` on the node currently being
    /// configured.
    pub fn set(&self, name: &str, value: N::Value) -> BuildResult<()> {
        match self.lookup(name) {
            Some(Binding::Property { builder, name }) => {
                let node = builder.current_node().ok_or(BuildError::NoActiveNode)?;
                node.set_property(&name, value);
                Ok(())
            }
            Some(_) => Err(BuildError::NotAProperty(name.to_string())),
            None => Err(BuildError::UnboundSymbol(name.to_string())),
        }
    }

    /// Invoke the method bound to `name` on the node currently being
    /// configured, forwarding `args` verbatim.
    pub fn invoke(&self, name: &str, args: &[N::Value]) -> BuildResult<Option<N::Value>> {
        match self.lookup(name) {
            Some(Binding::Method { builder, name }) => {
                let node = builder.current_node().ok_or(BuildError::NoActiveNode)?;
                Ok(node.invoke(&name, args))
            }
            Some(_) => Err(BuildError::NotAMethod(name.to_string())),
            None => Err(BuildError::UnboundSymbol(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<Binding<N>> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Bind `name`, returning whatever binding it displaced.
    pub(crate) fn bind(&self, name: &str, binding: Binding<N>) -> Option<Binding<N>> {
        self.bindings.borrow_mut().insert(name.to_string(), binding)
    }

    pub(crate) fn restore(&self, name: &str, binding: Binding<N>) {
        self.bindings.borrow_mut().insert(name.to_string(), binding);
    }

    pub(crate) fn unbind(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }
}

impl<N: Node> Builder<N> {
    /// Install this builder's symbols into the shared namespace. Idempotent.
    ///
    /// Existing bindings are pushed onto per-name save stacks, so nested
    /// and re-entrant builds restore exactly what was visible before.
    pub(crate) fn install_symbols(&self) {
        if self.symbols_installed() {
            return;
        }
        trace!(builder = ?self.name(), "installing symbols");
        for name in self.sorted_factory_names() {
            self.expose_factory(&name);
        }
        for name in self.property_names() {
            self.expose_property(&name);
        }
        for name in self.method_names() {
            self.expose_method(&name);
        }
        self.set_symbols_installed(true);
    }

    /// Remove this builder's symbols, restoring saved bindings. Idempotent.
    pub(crate) fn uninstall_symbols(&self) {
        if !self.symbols_installed() {
            return;
        }
        trace!(builder = ?self.name(), "uninstalling symbols");
        let mut names = self.sorted_factory_names();
        names.extend(self.property_names());
        names.extend(self.method_names());
        for name in names {
            match self.pop_saved(&name) {
                Some(previous) => self.namespace().restore(&name, previous),
                None => self.namespace().unbind(&name),
            }
        }
        self.set_symbols_installed(false);
    }

    pub(crate) fn expose_factory(&self, name: &str) {
        let binding = Binding::Factory {
            builder: self.clone(),
            name: name.to_string(),
        };
        if let Some(previous) = self.namespace().bind(name, binding) {
            self.push_saved(name, previous);
        }
    }

    pub(crate) fn expose_property(&self, name: &str) {
        self.expose_accessor(
            name,
            Binding::Property {
                builder: self.clone(),
                name: name.to_string(),
            },
        );
    }

    pub(crate) fn expose_method(&self, name: &str) {
        self.expose_accessor(
            name,
            Binding::Method {
                builder: self.clone(),
                name: name.to_string(),
            },
        );
    }

    /// Property and method names are declared by the builder author, so a
    /// pre-existing binding is worth a warning; it is still saved and
    /// shadowed like any other.
    fn expose_accessor(&self, name: &str, binding: Binding<N>) {
        if self.namespace().contains(name) {
            self.emit(BuildEvent::Error {
                message: BuildError::SymbolCollision(name.to_string()).to_string(),
            });
        }
        if let Some(previous) = self.namespace().bind(name, binding) {
            self.push_saved(name, previous);
        }
    }
}

/// Scoped acquisition of a builder's symbol exposure: uninstalls on drop,
/// on every exit path. Build entry points additionally restore the context
/// stack to its entry depth.
pub(crate) struct SymbolGuard<N: Node> {
    builder: Builder<N>,
    restore_depth: Option<usize>,
}

impl<N: Node> SymbolGuard<N> {
    /// Install symbols for a nested custom-builder region.
    pub(crate) fn install(builder: &Builder<N>) -> Self {
        builder.install_symbols();
        Self {
            builder: builder.clone(),
            restore_depth: None,
        }
    }

    /// Install symbols for a `build`/`build_program` entry point.
    pub(crate) fn for_build(builder: &Builder<N>) -> Self {
        let depth = builder.context_depth();
        builder.install_symbols();
        Self {
            builder: builder.clone(),
            restore_depth: Some(depth),
        }
    }
}

impl<N: Node> Drop for SymbolGuard<N> {
    fn drop(&mut self) {
        self.builder.uninstall_symbols();
        if let Some(depth) = self.restore_depth {
            self.builder.context_truncate(depth);
        }
    }
}
