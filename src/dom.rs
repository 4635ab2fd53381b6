use crate::error::{DomError, Error, ParseError, Result};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::Handle;
use markup5ever_rcdom::NodeData;
use markup5ever_rcdom::RcDom;
use std::fmt::Write;
use std::io;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
  "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
  pub node_type: DomNodeType,
  pub children: Vec<DomNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNodeType {
  Document {
    doctype: Option<String>,
  },
  Element {
    tag_name: String,
    namespace: String,
    attributes: Vec<(String, String)>,
  },
  Text {
    content: String,
  },
  Comment {
    content: String,
  },
}

fn parse_opts() -> ParseOpts {
  ParseOpts {
    tree_builder: TreeBuilderOpts {
      scripting_enabled: false,
      ..Default::default()
    },
    ..Default::default()
  }
}

fn parse_rcdom(html: &str) -> Result<RcDom> {
  let mut reader = io::Cursor::new(html.as_bytes());
  parse_document(RcDom::default(), parse_opts())
    .from_utf8()
    .read_from(&mut reader)
    .map_err(|e| {
      Error::Parse(ParseError::InvalidHtml {
        message: format!("Failed to parse HTML: {}", e),
      })
    })
}

/// Parse a complete HTML document.
pub fn parse_html(html: &str) -> Result<DomNode> {
  let dom = parse_rcdom(html)?;
  convert_handle_to_node(&dom.document).ok_or_else(|| {
    Error::Parse(ParseError::InvalidHtml {
      message: "document has no root node".to_string(),
    })
  })
}

/// Parse a markup fragment as the children of an element in `<body>`.
///
/// The explicit `<body>` start tag keeps the tree builder in the "in body" insertion mode, so
/// leading `<script>`, `<style>` and `<link>` elements stay part of the fragment in source order
/// instead of being hoisted into `<head>`.
pub fn parse_fragment(html: &str) -> Result<Vec<DomNode>> {
  let mut document = parse_html(&format!("<body>{html}"))?;
  let body = document
    .find_mut(&|node: &DomNode| node.is_tag("body"))
    .ok_or_else(|| {
      Error::Parse(ParseError::InvalidHtml {
        message: "fragment produced no body element".to_string(),
      })
    })?;
  Ok(std::mem::take(&mut body.children))
}

fn convert_handle_to_node(handle: &Handle) -> Option<DomNode> {
  let node_type = match &handle.data {
    NodeData::Document => {
      let doctype = handle.children.borrow().iter().find_map(|child| match &child.data {
        NodeData::Doctype { name, .. } => Some(name.to_string()),
        _ => None,
      });
      DomNodeType::Document { doctype }
    }
    NodeData::Element { name, attrs, .. } => {
      let namespace = if name.ns.as_ref() == HTML_NAMESPACE {
        String::new()
      } else {
        name.ns.to_string()
      };
      let attrs_ref = attrs.borrow();
      let mut attributes = Vec::with_capacity(attrs_ref.len());
      for attr in attrs_ref.iter() {
        attributes.push((attr.name.local.to_string(), attr.value.to_string()));
      }
      DomNodeType::Element {
        tag_name: name.local.to_string(),
        namespace,
        attributes,
      }
    }
    NodeData::Text { contents } => DomNodeType::Text {
      content: contents.borrow().to_string(),
    },
    NodeData::Comment { contents } => DomNodeType::Comment {
      content: contents.to_string(),
    },
    _ => return None,
  };

  let children = match &handle.data {
    NodeData::Element {
      name,
      template_contents,
      ..
    } if name.local.as_ref().eq_ignore_ascii_case("template") => {
      match &*template_contents.borrow() {
        Some(content) => convert_children(content),
        None => Vec::new(),
      }
    }
    NodeData::Element { .. } | NodeData::Document => convert_children(handle),
    _ => Vec::new(),
  };

  Some(DomNode {
    node_type,
    children,
  })
}

fn convert_children(handle: &Handle) -> Vec<DomNode> {
  handle
    .children
    .borrow()
    .iter()
    .filter_map(convert_handle_to_node)
    .collect()
}

impl DomNode {
  /// Create an HTML element with the given attributes and no children.
  pub fn element(tag_name: &str, attributes: Vec<(String, String)>) -> DomNode {
    DomNode {
      node_type: DomNodeType::Element {
        tag_name: tag_name.to_ascii_lowercase(),
        namespace: String::new(),
        attributes,
      },
      children: Vec::new(),
    }
  }

  pub fn text(content: impl Into<String>) -> DomNode {
    DomNode {
      node_type: DomNodeType::Text {
        content: content.into(),
      },
      children: Vec::new(),
    }
  }

  pub fn get_attribute_ref(&self, name: &str) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Element { attributes, .. } => attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str()),
      _ => None,
    }
  }

  pub fn get_attribute(&self, name: &str) -> Option<String> {
    self.get_attribute_ref(name).map(|v| v.to_string())
  }

  pub fn has_attribute(&self, name: &str) -> bool {
    self.get_attribute_ref(name).is_some()
  }

  /// Set an attribute, replacing an existing value in place or appending a new one.
  pub fn set_attribute(&mut self, name: &str, value: &str) {
    if let DomNodeType::Element { attributes, .. } = &mut self.node_type {
      if let Some((_, v)) = attributes
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
      {
        *v = value.to_string();
      } else {
        attributes.push((name.to_string(), value.to_string()));
      }
    }
  }

  pub fn tag_name(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Element { tag_name, .. } => Some(tag_name),
      _ => None,
    }
  }

  /// Case-insensitive tag comparison.
  pub fn is_tag(&self, tag: &str) -> bool {
    self
      .tag_name()
      .map(|name| name.eq_ignore_ascii_case(tag))
      .unwrap_or(false)
  }

  pub fn namespace(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Element { namespace, .. } => Some(namespace),
      _ => None,
    }
  }

  pub fn attributes_iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    let attrs: &[(String, String)] = match &self.node_type {
      DomNodeType::Element { attributes, .. } => attributes,
      _ => &[],
    };
    attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn is_element(&self) -> bool {
    matches!(self.node_type, DomNodeType::Element { .. })
  }

  pub fn is_text(&self) -> bool {
    matches!(self.node_type, DomNodeType::Text { .. })
  }

  pub fn text_content(&self) -> Option<&str> {
    match &self.node_type {
      DomNodeType::Text { content } => Some(content),
      _ => None,
    }
  }

  /// Concatenated text of all descendant text nodes (`Node.textContent`).
  pub fn descendant_text(&self) -> String {
    let mut out = String::new();
    self.walk_tree(&mut |node| {
      if let Some(text) = node.text_content() {
        out.push_str(text);
      }
    });
    out
  }

  /// Visit `self` and its descendants in document order. Template contents are not visited.
  pub fn walk_tree<'a, F>(&'a self, f: &mut F)
  where
    F: FnMut(&'a DomNode),
  {
    f(self);
    for child in self.tree_children() {
      child.walk_tree(f);
    }
  }

  pub fn walk_tree_mut<F>(&mut self, f: &mut F)
  where
    F: FnMut(&mut DomNode),
  {
    f(self);
    if self.is_template() {
      return;
    }
    for child in &mut self.children {
      child.walk_tree_mut(f);
    }
  }

  /// `<template>` children hold the inert template contents, not tree children.
  pub fn is_template(&self) -> bool {
    self.is_element() && self.is_tag("template")
  }

  fn tree_children(&self) -> &[DomNode] {
    if self.is_template() {
      &[]
    } else {
      &self.children
    }
  }

  /// Get element children (skip text nodes)
  pub fn element_children(&self) -> Vec<&DomNode> {
    self.children.iter().filter(|c| c.is_element()).collect()
  }

  /// Check if this element has a specific class
  pub fn has_class(&self, class: &str) -> bool {
    if let Some(class_attr) = self.get_attribute_ref("class") {
      class_attr.split_ascii_whitespace().any(|c| c == class)
    } else {
      false
    }
  }

  /// Add a class token if it is not already present (`classList.add`).
  pub fn add_class(&mut self, class: &str) {
    if !self.is_element() || self.has_class(class) {
      return;
    }
    let value = match self.get_attribute_ref("class") {
      Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
      _ => class.to_string(),
    };
    self.set_attribute("class", &value);
  }

  /// Remove every occurrence of a class token (`classList.remove`).
  ///
  /// Elements that never carried the token are left untouched, including their lack of a
  /// `class` attribute.
  pub fn remove_class(&mut self, class: &str) {
    if !self.has_class(class) {
      return;
    }
    let remaining = self
      .get_attribute_ref("class")
      .unwrap_or_default()
      .split_ascii_whitespace()
      .filter(|c| *c != class)
      .collect::<Vec<_>>()
      .join(" ");
    self.set_attribute("class", &remaining);
  }

  /// Check if this element has a specific ID
  pub fn has_id(&self, id: &str) -> bool {
    self.get_attribute_ref("id") == Some(id)
  }

  /// First node in document order (including `self`) matching `pred`.
  pub fn find<P>(&self, pred: &P) -> Option<&DomNode>
  where
    P: Fn(&DomNode) -> bool,
  {
    if pred(self) {
      return Some(self);
    }
    self.tree_children().iter().find_map(|child| child.find(pred))
  }

  pub fn find_mut<P>(&mut self, pred: &P) -> Option<&mut DomNode>
  where
    P: Fn(&DomNode) -> bool,
  {
    if pred(self) {
      return Some(self);
    }
    if self.is_template() {
      return None;
    }
    for child in &mut self.children {
      if let Some(found) = child.find_mut(pred) {
        return Some(found);
      }
    }
    None
  }

  /// `document.getElementById`.
  pub fn find_element_by_id(&self, id: &str) -> Option<&DomNode> {
    self.find(&|node: &DomNode| node.is_element() && node.has_id(id))
  }

  pub fn find_element_by_id_mut(&mut self, id: &str) -> Option<&mut DomNode> {
    self.find_mut(&|node: &DomNode| node.is_element() && node.has_id(id))
  }

  /// Index paths (relative to `self`) of every strict descendant matching `pred`, in document
  /// order. Template contents are skipped.
  pub fn descendant_paths<P>(&self, pred: &P) -> Vec<Vec<usize>>
  where
    P: Fn(&DomNode) -> bool,
  {
    fn collect<P: Fn(&DomNode) -> bool>(
      node: &DomNode,
      pred: &P,
      prefix: &mut Vec<usize>,
      out: &mut Vec<Vec<usize>>,
    ) {
      for (idx, child) in node.tree_children().iter().enumerate() {
        prefix.push(idx);
        if pred(child) {
          out.push(prefix.clone());
        }
        collect(child, pred, prefix, out);
        prefix.pop();
      }
    }

    let mut out = Vec::new();
    collect(self, pred, &mut Vec::new(), &mut out);
    out
  }

  pub fn node_at_path(&self, path: &[usize]) -> Option<&DomNode> {
    path
      .iter()
      .try_fold(self, |node, idx| node.children.get(*idx))
  }

  pub fn node_at_path_mut(&mut self, path: &[usize]) -> Option<&mut DomNode> {
    let mut node = self;
    for idx in path {
      node = node.children.get_mut(*idx)?;
    }
    Some(node)
  }

  /// Substitute the node at `path` with `replacement`, returning the old node
  /// (`parentNode.replaceChild`).
  pub fn replace_at_path(&mut self, path: &[usize], replacement: DomNode) -> Result<DomNode> {
    let stale = || {
      Error::Dom(DomError::StalePath {
        path: path.to_vec(),
      })
    };
    let (last, parent_path) = path.split_last().ok_or_else(stale)?;
    let parent = self.node_at_path_mut(parent_path).ok_or_else(stale)?;
    let slot = parent.children.get_mut(*last).ok_or_else(stale)?;
    Ok(std::mem::replace(slot, replacement))
  }

  /// Replace all children with the parsed `markup` (`element.innerHTML = markup`).
  ///
  /// Scripts inside the markup are inert afterwards.
  pub fn set_inner_html(&mut self, markup: &str) -> Result<()> {
    self.children = parse_fragment(markup)?;
    Ok(())
  }

  /// Serialize the children of this node.
  pub fn inner_html(&self) -> String {
    let mut out = String::new();
    for child in &self.children {
      serialize_node(child, false, &mut out);
    }
    out
  }

  /// Serialize this node and its subtree.
  pub fn to_html(&self) -> String {
    let mut out = String::new();
    serialize_node(self, false, &mut out);
    out
  }
}

fn serialize_node(node: &DomNode, raw_text: bool, out: &mut String) {
  match &node.node_type {
    DomNodeType::Document { doctype } => {
      if let Some(name) = doctype {
        let _ = writeln!(out, "<!DOCTYPE {}>", name);
      }
      for child in &node.children {
        serialize_node(child, false, out);
      }
    }
    DomNodeType::Element {
      tag_name,
      attributes,
      ..
    } => {
      out.push('<');
      out.push_str(tag_name);
      for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
      }
      out.push('>');
      let is_void = VOID_ELEMENTS
        .iter()
        .any(|void| tag_name.eq_ignore_ascii_case(void));
      if is_void {
        return;
      }
      let child_raw = RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| tag_name.eq_ignore_ascii_case(raw));
      for child in &node.children {
        serialize_node(child, child_raw, out);
      }
      out.push_str("</");
      out.push_str(tag_name);
      out.push('>');
    }
    DomNodeType::Text { content } => {
      if raw_text {
        out.push_str(content);
      } else {
        escape_into(content, false, out);
      }
    }
    DomNodeType::Comment { content } => {
      out.push_str("<!--");
      out.push_str(content);
      out.push_str("-->");
    }
  }
}

/// Escape text for HTML text content or double-quoted attribute values.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  escape_into(input, true, &mut out);
  out
}

fn escape_into(input: &str, attribute: bool, out: &mut String) {
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' if attribute => out.push_str("&quot;"),
      '\'' if attribute => out.push_str("&#39;"),
      '\u{a0}' => out.push_str("&nbsp;"),
      _ => out.push(ch),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn first_element<'a>(nodes: &'a [DomNode], tag: &str) -> &'a DomNode {
    nodes
      .iter()
      .find_map(|node| node.find(&|n: &DomNode| n.is_tag(tag)))
      .expect("element present")
  }

  #[test]
  fn fragment_keeps_leading_scripts() {
    let nodes = parse_fragment("<script>var a = 1;</script><nav id=\"n\"></nav>").unwrap();
    let tags: Vec<_> = nodes.iter().filter_map(|n| n.tag_name()).collect();
    assert_eq!(tags, vec!["script", "nav"]);
    assert_eq!(nodes[0].descendant_text(), "var a = 1;");
  }

  #[test]
  fn fragment_preserves_attribute_order() {
    let nodes = parse_fragment(r#"<script type="module" defer data-x="1" src="a.js"></script>"#)
      .unwrap();
    let script = first_element(&nodes, "script");
    let names: Vec<_> = script.attributes_iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["type", "defer", "data-x", "src"]);
  }

  #[test]
  fn parse_html_records_doctype() {
    let doc = parse_html("<!DOCTYPE html><html><body><p>hi</p></body></html>").unwrap();
    assert!(matches!(
      doc.node_type,
      DomNodeType::Document { doctype: Some(ref name) } if name == "html"
    ));
    assert!(doc.to_html().starts_with("<!DOCTYPE html>"));
  }

  #[test]
  fn set_inner_html_replaces_children() {
    let mut doc = parse_html("<body><div id=\"c\"><p>old</p></div></body>").unwrap();
    let container = doc.find_element_by_id_mut("c").unwrap();
    container.set_inner_html("<span>new</span>").unwrap();
    assert_eq!(container.inner_html(), "<span>new</span>");
  }

  #[test]
  fn serializer_escapes_text_but_not_scripts() {
    let nodes = parse_fragment("<p title='a\"b'>1 &lt; 2</p><script>if (a < b) {}</script>").unwrap();
    let html: String = nodes.iter().map(DomNode::to_html).collect();
    assert!(html.contains("<p title=\"a&quot;b\">1 &lt; 2</p>"));
    assert!(html.contains("<script>if (a < b) {}</script>"));
  }

  #[test]
  fn void_elements_have_no_end_tag() {
    let nodes = parse_fragment("<img src=\"x.png\"><br>").unwrap();
    let html: String = nodes.iter().map(DomNode::to_html).collect();
    assert_eq!(html, "<img src=\"x.png\"><br>");
  }

  #[test]
  fn class_helpers_toggle_tokens() {
    let mut node = DomNode::element("a", vec![("class".into(), "nav  link".into())]);
    node.add_class("active");
    assert_eq!(node.get_attribute_ref("class"), Some("nav  link active"));
    node.add_class("active");
    assert_eq!(node.get_attribute_ref("class"), Some("nav  link active"));
    node.remove_class("active");
    assert_eq!(node.get_attribute_ref("class"), Some("nav link"));

    let mut bare = DomNode::element("a", Vec::new());
    bare.remove_class("active");
    assert!(!bare.has_attribute("class"));
  }

  #[test]
  fn descendant_paths_are_in_document_order() {
    let mut root = DomNode::element("div", Vec::new());
    root.children = parse_fragment("<script>1</script><p><script>2</script></p><script>3</script>")
      .unwrap();
    let paths = root.descendant_paths(&|n: &DomNode| n.is_tag("script"));
    assert_eq!(paths, vec![vec![0], vec![1, 0], vec![2]]);
    let texts: Vec<_> = paths
      .iter()
      .map(|p| root.node_at_path(p).unwrap().descendant_text())
      .collect();
    assert_eq!(texts, vec!["1", "2", "3"]);
  }

  #[test]
  fn replace_at_path_returns_old_node() {
    let mut root = DomNode::element("div", Vec::new());
    root.children = vec![DomNode::text("a"), DomNode::text("b")];
    let old = root.replace_at_path(&[1], DomNode::text("c")).unwrap();
    assert_eq!(old.text_content(), Some("b"));
    assert_eq!(root.children[1].text_content(), Some("c"));
    assert!(root.replace_at_path(&[5], DomNode::text("d")).is_err());
    assert!(root.replace_at_path(&[], DomNode::text("d")).is_err());
  }

  #[test]
  fn traversal_skips_template_contents() {
    let mut root = DomNode::element("div", Vec::new());
    root.children =
      parse_fragment("<template><script>t()</script><a id=\"x\"></a></template><script>r()</script>")
        .unwrap();
    let paths = root.descendant_paths(&|n: &DomNode| n.is_tag("script"));
    assert_eq!(paths, vec![vec![1]]);
    assert!(root.find_element_by_id_mut("x").is_none());
    let mut visited = Vec::new();
    root.walk_tree(&mut |n| visited.extend(n.tag_name()));
    assert_eq!(visited, vec!["div", "template", "script"]);
    assert!(root.inner_html().contains("<template><script>t()</script>"));
  }
}
