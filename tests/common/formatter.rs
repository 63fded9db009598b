//! Renderers over built trees: an s-expression form and a termtree-backed
//! ASCII form.

use termtree::Tree as AsciiTree;

use super::tree::TreeRef;

pub fn to_string_tree(node: &TreeRef) -> String {
    let mut parts = vec![format!("({}", node.name())];
    for child in node.children() {
        parts.push(to_string_tree(&child));
    }
    parts.push(")".to_string());
    parts.join(" ")
}

pub fn to_ascii_tree(node: &TreeRef) -> AsciiTree<String> {
    let leaves: Vec<AsciiTree<String>> = node.children().iter().map(to_ascii_tree).collect();
    AsciiTree::new(node.name()).with_leaves(leaves)
}
