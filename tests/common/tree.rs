//! A small tree vocabulary: `tree` nodes that nest, `tip` leaves.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rsdsl::{BuildError, BuildResult, Builder, Factory, Node};

#[derive(Debug, Default)]
pub struct Tree {
    pub name: String,
    pub description: Option<String>,
    pub children: Vec<TreeRef>,
    pub parent: Weak<RefCell<Tree>>,
    pub marks: Vec<String>,
}

/// Shared handle onto a tree node.
#[derive(Clone, Debug)]
pub struct TreeRef(Rc<RefCell<Tree>>);

impl TreeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Tree {
            name: name.into(),
            ..Tree::default()
        })))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn description(&self) -> Option<String> {
        self.0.borrow().description.clone()
    }

    pub fn children(&self) -> Vec<TreeRef> {
        self.0.borrow().children.clone()
    }

    pub fn marks(&self) -> Vec<String> {
        self.0.borrow().marks.clone()
    }

    pub fn parent(&self) -> Option<TreeRef> {
        self.0.borrow().parent.upgrade().map(TreeRef)
    }

    pub fn ptr_eq(&self, other: &TreeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn add_child(&self, child: &TreeRef) {
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(TreeRef::depth)
            .max()
            .unwrap_or(0)
    }
}

impl Node for TreeRef {
    type Value = String;

    fn property(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name()),
            "description" => self.description(),
            _ => None,
        }
    }

    fn set_property(&self, name: &str, value: String) {
        match name {
            "name" => self.0.borrow_mut().name = value,
            "description" => self.0.borrow_mut().description = Some(value),
            _ => {}
        }
    }

    fn invoke(&self, name: &str, args: &[String]) -> Option<String> {
        if name == "some_method" {
            self.0.borrow_mut().marks.extend(args.iter().cloned());
        }
        None
    }
}

fn labeled(name: &str, args: &[String]) -> BuildResult<TreeRef> {
    let label = args.first().cloned().ok_or_else(|| BuildError::NodeConstruction {
        name: name.to_string(),
        reason: "missing name argument".to_string(),
    })?;
    Ok(TreeRef::new(label))
}

pub struct TreeFactory;

impl Factory<TreeRef> for TreeFactory {
    fn new_instance(
        &self,
        _builder: &Builder<TreeRef>,
        name: &str,
        args: &[String],
    ) -> BuildResult<Option<TreeRef>> {
        Ok(Some(labeled(name, args)?))
    }

    fn set_child(&self, _builder: &Builder<TreeRef>, parent: &TreeRef, child: &TreeRef) {
        parent.add_child(child);
    }
}

pub struct TipFactory;

impl Factory<TreeRef> for TipFactory {
    fn is_leaf(&self) -> bool {
        true
    }

    fn new_instance(
        &self,
        _builder: &Builder<TreeRef>,
        name: &str,
        args: &[String],
    ) -> BuildResult<Option<TreeRef>> {
        Ok(Some(labeled(name, args)?))
    }
}

/// The assembled vocabulary: `tree`, `tip`, the `name`/`description`
/// properties and the `some_method` method.
pub fn tree_builder() -> Builder<TreeRef> {
    let builder = Builder::named("tree");
    builder.register_factory("tree", TreeFactory);
    builder.register_factory("tip", TipFactory);
    builder.register_property_names(["name", "description"]);
    builder.register_method_names(["some_method"]);
    builder
}
