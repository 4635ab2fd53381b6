//! Active navigation link marking

use crate::dom::DomNode;
use crate::error::{DomError, Error, Result};
use crate::location::PageLocation;

/// Class toggled on the anchor that points at the current page.
pub const ACTIVE_CLASS: &str = "active";

/// Where to look for navigation anchors.
pub enum LinkScope<'d> {
  /// The element with this id inside `document`.
  Id { document: &'d mut DomNode, id: &'d str },
  /// An element already in hand.
  Element(&'d mut DomNode),
}

/// Flags `a[href]` descendants whose last path segment equals the current page's file name.
#[derive(Debug, Clone, Copy)]
pub struct ActiveLinkMarker<'a> {
  location: &'a PageLocation,
}

impl<'a> ActiveLinkMarker<'a> {
  pub fn new(location: &'a PageLocation) -> Self {
    Self { location }
  }

  /// Mark links, logging and swallowing any failure. Returns the number of active anchors.
  pub fn mark(&self, scope: LinkScope<'_>) -> usize {
    match self.try_mark(scope) {
      Ok(count) => count,
      Err(err) => {
        tracing::warn!(error = %err, "active link marking failed");
        0
      }
    }
  }

  /// Mark links, reporting a missing container as [`DomError::ContainerMissing`].
  pub fn try_mark(&self, scope: LinkScope<'_>) -> Result<usize> {
    let container = match scope {
      LinkScope::Element(element) => element,
      LinkScope::Id { document, id } => document
        .find_element_by_id_mut(id)
        .ok_or_else(|| Error::Dom(DomError::ContainerMissing { id: id.to_string() }))?,
    };

    let current = self.location.file_name();
    let mut active = 0;
    for child in &mut container.children {
      child.walk_tree_mut(&mut |node| {
        if !node.is_tag("a") {
          return;
        }
        let Some(href) = node.get_attribute_ref("href") else {
          return;
        };
        if last_segment(href) == current {
          node.add_class(ACTIVE_CLASS);
          active += 1;
        } else {
          node.remove_class(ACTIVE_CLASS);
        }
      });
    }

    tracing::debug!(
      container = container.get_attribute_ref("id").or(container.tag_name()).unwrap_or_default(),
      current = %current,
      active,
      "marked active links"
    );
    Ok(active)
  }
}

fn last_segment(href: &str) -> &str {
  href.rsplit('/').next().unwrap_or(href)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::parse_html;

  fn nav_document() -> DomNode {
    parse_html(
      r#"<body><nav id="nav">
        <a href="/a/index.html" class="active">Home</a>
        <a href="/a/about.html">About</a>
        <a>No href</a>
      </nav></body>"#,
    )
    .unwrap()
  }

  fn anchors(document: &DomNode) -> Vec<&DomNode> {
    let mut out = Vec::new();
    document.walk_tree(&mut |node| {
      if node.is_tag("a") {
        out.push(node);
      }
    });
    out
  }

  #[test]
  fn marks_only_the_current_page() {
    let location = PageLocation::parse("https://example.com/a/about.html").unwrap();
    let mut document = nav_document();
    let count = ActiveLinkMarker::new(&location).mark(LinkScope::Id {
      document: &mut document,
      id: "nav",
    });

    assert_eq!(count, 1);
    let links = anchors(&document);
    assert!(!links[0].has_class(ACTIVE_CLASS));
    assert!(links[1].has_class(ACTIVE_CLASS));
    assert!(!links[2].has_attribute("class"));
  }

  #[test]
  fn root_path_matches_index() {
    let location = PageLocation::parse("https://example.com/a/").unwrap();
    let mut document = nav_document();
    let nav = document.find_element_by_id_mut("nav").unwrap();
    let count = ActiveLinkMarker::new(&location).mark(LinkScope::Element(nav));

    assert_eq!(count, 1);
    assert!(anchors(&document)[0].has_class(ACTIVE_CLASS));
  }

  #[test]
  fn missing_container_is_swallowed() {
    let location = PageLocation::parse("https://example.com/").unwrap();
    let mut document = nav_document();
    let marker = ActiveLinkMarker::new(&location);

    assert_eq!(
      marker.mark(LinkScope::Id {
        document: &mut document,
        id: "missing",
      }),
      0
    );
    assert!(marker
      .try_mark(LinkScope::Id {
        document: &mut document,
        id: "missing",
      })
      .is_err());
  }

  #[test]
  fn anchors_inside_templates_are_left_alone() {
    let location = PageLocation::parse("https://example.com/a/about.html").unwrap();
    let mut document = parse_html(
      r#"<body><nav id="nav"><template><a href="about.html">Tpl</a></template><a href="about.html">Live</a></nav></body>"#,
    )
    .unwrap();

    let count = ActiveLinkMarker::new(&location).mark(LinkScope::Id {
      document: &mut document,
      id: "nav",
    });

    assert_eq!(count, 1);
    let nav = document.find_element_by_id_mut("nav").unwrap();
    assert!(!nav.children[0].children[0].has_attribute("class"));
    assert!(nav.children[1].has_class(ACTIVE_CLASS));
  }

  #[test]
  fn last_segment_keeps_query_strings() {
    assert_eq!(last_segment("../pages/about.html"), "about.html");
    assert_eq!(last_segment("about.html?x=1"), "about.html?x=1");
    assert_eq!(last_segment("/docs/"), "");
  }
}
