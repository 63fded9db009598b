//! An HTML vocabulary with per-region sub-vocabularies: `html` exposes
//! `head`/`body`, `head` exposes metadata tags, `body` exposes block tags.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rsdsl::{BuildResult, Builder, Factory, Node};

/// Argument payload for element factories: attributes and text content.
#[derive(Clone, Debug)]
pub enum Arg {
    Text(String),
    Attr(String, String),
}

#[derive(Debug, Default)]
pub struct Element {
    pub tag: String,
    pub no_closing_tag: bool,
    pub attributes: Vec<(String, String)>,
    pub value: Option<String>,
    pub children: Vec<ElementRef>,
    pub parent: Weak<RefCell<Element>>,
}

#[derive(Clone, Debug)]
pub struct ElementRef(Rc<RefCell<Element>>);

impl ElementRef {
    fn new(tag: &str, no_closing_tag: bool, args: &[Arg]) -> Self {
        let mut attributes = Vec::new();
        let mut value = None;
        for arg in args {
            match arg {
                Arg::Attr(key, val) => attributes.push((key.clone(), val.clone())),
                Arg::Text(text) => value = Some(text.clone()),
            }
        }
        Self(Rc::new(RefCell::new(Element {
            tag: tag.to_string(),
            no_closing_tag,
            attributes,
            value,
            ..Element::default()
        })))
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.0.borrow().children.clone()
    }

    pub fn add_child(&self, child: &ElementRef) {
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    pub fn to_html(&self) -> String {
        let element = self.0.borrow();
        let mut parts = Vec::new();
        if element.tag == "html" {
            parts.push("<!DOCTYPE html>".to_string());
        }
        parts.push(format!("<{}", element.tag));
        for (key, val) in &element.attributes {
            parts.push(format!("{key}=\"{val}\""));
        }
        parts.push(">".to_string());

        if let Some(value) = &element.value {
            parts.push(value.clone());
        } else {
            for child in &element.children {
                parts.push(child.to_html());
            }
        }

        if !element.no_closing_tag {
            parts.push(format!("</{}>", element.tag));
        }
        parts.join(" ")
    }
}

impl Node for ElementRef {
    type Value = Arg;
}

/// Plain element with no sub-vocabulary.
pub struct ElementFactory {
    no_closing_tag: bool,
}

impl ElementFactory {
    pub fn new() -> Self {
        Self {
            no_closing_tag: false,
        }
    }

    /// Element without a closing tag, e.g. `meta` or `link`.
    pub fn void() -> Self {
        Self {
            no_closing_tag: true,
        }
    }
}

impl Factory<ElementRef> for ElementFactory {
    fn new_instance(
        &self,
        _builder: &Builder<ElementRef>,
        name: &str,
        args: &[Arg],
    ) -> BuildResult<Option<ElementRef>> {
        Ok(Some(ElementRef::new(name, self.no_closing_tag, args)))
    }

    fn set_child(&self, _builder: &Builder<ElementRef>, parent: &ElementRef, child: &ElementRef) {
        parent.add_child(child);
    }
}

pub struct HtmlFactory;

impl Factory<ElementRef> for HtmlFactory {
    fn new_instance(
        &self,
        _builder: &Builder<ElementRef>,
        name: &str,
        args: &[Arg],
    ) -> BuildResult<Option<ElementRef>> {
        Ok(Some(ElementRef::new(name, false, args)))
    }

    fn set_child(&self, _builder: &Builder<ElementRef>, parent: &ElementRef, child: &ElementRef) {
        parent.add_child(child);
    }

    fn child_builder(&self, parent: &Builder<ElementRef>) -> Option<Builder<ElementRef>> {
        Some(html_vocabulary(parent))
    }
}

pub struct HeadFactory;

impl Factory<ElementRef> for HeadFactory {
    fn new_instance(
        &self,
        _builder: &Builder<ElementRef>,
        name: &str,
        args: &[Arg],
    ) -> BuildResult<Option<ElementRef>> {
        Ok(Some(ElementRef::new(name, false, args)))
    }

    fn set_child(&self, _builder: &Builder<ElementRef>, parent: &ElementRef, child: &ElementRef) {
        parent.add_child(child);
    }

    fn child_builder(&self, parent: &Builder<ElementRef>) -> Option<Builder<ElementRef>> {
        Some(head_vocabulary(parent))
    }
}

pub struct BlockFactory;

impl Factory<ElementRef> for BlockFactory {
    fn new_instance(
        &self,
        _builder: &Builder<ElementRef>,
        name: &str,
        args: &[Arg],
    ) -> BuildResult<Option<ElementRef>> {
        Ok(Some(ElementRef::new(name, false, args)))
    }

    fn set_child(&self, _builder: &Builder<ElementRef>, parent: &ElementRef, child: &ElementRef) {
        parent.add_child(child);
    }

    fn child_builder(&self, parent: &Builder<ElementRef>) -> Option<Builder<ElementRef>> {
        Some(block_vocabulary(parent))
    }
}

fn html_vocabulary(parent: &Builder<ElementRef>) -> Builder<ElementRef> {
    let builder = Builder::named_child_of("html", parent);
    builder.register_factory("head", HeadFactory);
    builder.register_factory("body", BlockFactory);
    builder
}

fn head_vocabulary(parent: &Builder<ElementRef>) -> Builder<ElementRef> {
    let builder = Builder::named_child_of("head", parent);
    builder.register_factory("title", ElementFactory::new());
    builder.register_factory("link", ElementFactory::void());
    builder.register_factory("meta", ElementFactory::void());
    builder.register_factory("style", ElementFactory::new());
    builder
}

fn block_vocabulary(parent: &Builder<ElementRef>) -> Builder<ElementRef> {
    let builder = Builder::named_child_of("block", parent);
    builder.register_factory("p", ElementFactory::new());
    for level in 1..=6 {
        builder.register_factory(format!("h{level}"), ElementFactory::new());
    }
    builder.register_factory("div", BlockFactory);
    builder.register_factory("span", BlockFactory);
    builder
}

/// The top-level vocabulary: only `html` is visible at the root.
pub fn root_builder() -> Builder<ElementRef> {
    let builder = Builder::named("root");
    builder.register_factory("html", HtmlFactory);
    builder
}
