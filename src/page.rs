use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::element::Element;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a").expect("Failed to parse anchor selector - this is a bug")
});

/// A parsed HTML document together with the URL it was loaded from.
///
/// Target rewrites are kept in an overlay keyed by anchor position, so the
/// parsed tree itself is never mutated.
pub struct Page {
    document: Html,
    url: Url,
    new_context: HashSet<usize>,
}

impl Page {
    pub fn parse(html: &str, page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;

        Ok(Self {
            document: Html::parse_document(html),
            url,
            new_context: HashSet::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All anchors in document order
    pub fn anchors(&self) -> Vec<PageElement<'_>> {
        self.document
            .select(&ANCHOR_SELECTOR)
            .enumerate()
            .map(|(index, element)| PageElement {
                element,
                anchor_index: Some(index),
                new_context: &self.new_context,
            })
            .collect()
    }

    /// First anchor matched by a CSS selector
    pub fn find_anchor(&self, css: &str) -> Result<PageElement<'_>> {
        let selector = Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))?;
        let target = self
            .document
            .select(&selector)
            .find(|el| el.value().name() == "a")
            .with_context(|| format!("No anchor matches {}", css))?;

        self.anchors()
            .into_iter()
            .find(|anchor| anchor.element == target)
            .with_context(|| format!("No anchor matches {}", css))
    }

    /// Opens the anchor at `index` in a new browsing context
    pub(crate) fn mark_new_context(&mut self, index: usize) {
        self.new_context.insert(index);
    }

    /// Anchors whose target was rewritten to `_blank`
    pub fn rewritten_anchors(&self) -> Vec<PageElement<'_>> {
        self.anchors().into_iter().filter(|a| a.opens_new_context()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageElement<'a> {
    element: ElementRef<'a>,
    anchor_index: Option<usize>,
    new_context: &'a HashSet<usize>,
}

impl<'a> PageElement<'a> {
    pub fn anchor_index(&self) -> Option<usize> {
        self.anchor_index
    }

    fn opens_new_context(&self) -> bool {
        self.anchor_index.is_some_and(|i| self.new_context.contains(&i))
    }

    fn wrap(&self, element: ElementRef<'a>) -> Self {
        Self {
            element,
            anchor_index: None,
            new_context: self.new_context,
        }
    }
}

impl<'a> Element for PageElement<'a> {
    fn tag_name(&self) -> &str {
        self.element.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        if name == "target" && self.opens_new_context() {
            return Some("_blank");
        }
        self.element.value().attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| self.wrap(parent))
    }

    fn text_content(&self) -> String {
        self.element.text().collect()
    }

    fn find_descendant(&self, predicate: &dyn Fn(&Self) -> bool) -> Option<Self> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(|el| self.wrap(el))
            .find(|el| predicate(el))
    }
}
