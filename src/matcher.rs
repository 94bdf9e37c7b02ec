use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::{ancestors_within_content, Element};
use crate::selector::ContainerSelector;

/// Named page region a link lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationLabel {
    Search,
    Header,
    #[serde(rename = "Comment Section")]
    CommentSection,
    Footer,
    Menu,
    Navigation,
    Sidebar,
    #[serde(rename = "Body Content")]
    BodyContent,
}

impl LocationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Header => "Header",
            Self::CommentSection => "Comment Section",
            Self::Footer => "Footer",
            Self::Menu => "Menu",
            Self::Navigation => "Navigation",
            Self::Sidebar => "Sidebar",
            Self::BodyContent => "Body Content",
        }
    }
}

impl fmt::Display for LocationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRule<L> {
    pub label: L,
    pub selectors: Vec<ContainerSelector>,
}

impl<L> ContainerRule<L> {
    pub fn new(label: L, selectors: Vec<ContainerSelector>) -> Self {
        Self { label, selectors }
    }

    fn matches<E: Element>(&self, element: &E) -> bool {
        self.selectors.iter().any(|selector| selector.matches(element))
    }
}

/// Location and ignore rules. Order of `location` is priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_location_rules")]
    pub location: Vec<ContainerRule<LocationLabel>>,
    #[serde(default = "default_ignore_selectors")]
    pub ignore: Vec<ContainerSelector>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            location: default_location_rules(),
            ignore: default_ignore_selectors(),
        }
    }
}

fn tag(name: &str) -> ContainerSelector {
    ContainerSelector::Tag(name.to_string())
}

fn id(value: &str) -> ContainerSelector {
    ContainerSelector::IdEquals(value.to_string())
}

fn class(value: &str) -> ContainerSelector {
    ContainerSelector::HasClass(value.to_string())
}

pub fn default_location_rules() -> Vec<ContainerRule<LocationLabel>> {
    use LocationLabel::*;

    vec![
        ContainerRule::new(Search, vec![id("search"), class("search")]),
        ContainerRule::new(Header, vec![tag("header"), id("header"), class("header")]),
        ContainerRule::new(CommentSection, vec![id("comment"), class("comment")]),
        ContainerRule::new(Footer, vec![tag("footer"), id("footer"), class("footer")]),
        ContainerRule::new(Menu, vec![id("menu"), class("menu")]),
        ContainerRule::new(Navigation, vec![tag("nav")]),
        ContainerRule::new(
            Sidebar,
            vec![id("sidebar"), class("sidebar"), id("widget"), class("widget")],
        ),
        ContainerRule::new(BodyContent, vec![tag("main"), tag("article"), class("main")]),
    ]
}

pub fn default_ignore_selectors() -> Vec<ContainerSelector> {
    let mut selectors = vec![tag("header"), tag("footer"), tag("nav")];
    for needle in ["header", "menu", "footer", "widget", "comment"] {
        selectors.push(ContainerSelector::IdContains(needle.to_string()));
    }
    for needle in ["header", "menu", "footer", "widget", "comment"] {
        selectors.push(ContainerSelector::ClassContains(needle.to_string()));
    }
    selectors.push(id("wpadminbar"));
    selectors
}

/// Label of the first rule matching `element` or one of its ancestors.
///
/// Nearer ancestors win over farther ones; at a single node, rules are tried
/// in declared order. Returns `default` when nothing below the body matches.
pub fn classify<E: Element, L: Clone>(element: E, rules: &[ContainerRule<L>], default: L) -> L {
    for node in ancestors_within_content(element) {
        if let Some(rule) = rules.iter().find(|rule| rule.matches(&node)) {
            return rule.label.clone();
        }
    }
    default
}

/// True if `element` or an ancestor below the body matches any selector
pub fn is_ignored<E: Element>(element: E, selectors: &[ContainerSelector]) -> bool {
    ancestors_within_content(element).any(|node| selectors.iter().any(|s| s.matches(&node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;

    fn location_of(html: &str) -> LocationLabel {
        let page = Page::parse(html, "https://example.com/").unwrap();
        let anchor = page.anchors().into_iter().next().unwrap();
        classify(anchor, &default_location_rules(), LocationLabel::BodyContent)
    }

    fn ignored(html: &str) -> bool {
        let page = Page::parse(html, "https://example.com/").unwrap();
        let anchor = page.anchors().into_iter().next().unwrap();
        is_ignored(anchor, &default_ignore_selectors())
    }

    #[test]
    fn test_classify_regions() {
        assert_eq!(location_of(r#"<nav><a href="/x">x</a></nav>"#), LocationLabel::Navigation);
        assert_eq!(location_of(r#"<footer><p><a href="/x">x</a></p></footer>"#), LocationLabel::Footer);
        assert_eq!(
            location_of(r#"<div id="comment"><a href="/x">x</a></div>"#),
            LocationLabel::CommentSection
        );
        assert_eq!(
            location_of(r#"<aside class="widget"><a href="/x">x</a></aside>"#),
            LocationLabel::Sidebar
        );
        assert_eq!(location_of(r#"<form class="search"><a href="/x">x</a></form>"#), LocationLabel::Search);
    }

    #[test]
    fn test_classify_defaults_to_body_content() {
        assert_eq!(location_of(r#"<div><p><a href="/x">x</a></p></div>"#), LocationLabel::BodyContent);
        assert_eq!(location_of(r#"<a href="/x">x</a>"#), LocationLabel::BodyContent);
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        // the footer is farther away than the menu
        let html = r#"<footer><ul class="menu"><li><a href="/x">x</a></li></ul></footer>"#;
        assert_eq!(location_of(html), LocationLabel::Menu);
    }

    #[test]
    fn test_rule_order_breaks_ties_at_same_node() {
        let html = r#"<div class="footer search"><a href="/x">x</a></div>"#;
        assert_eq!(location_of(html), LocationLabel::Search);

        let html = r#"<nav class="sidebar"><a href="/x">x</a></nav>"#;
        assert_eq!(location_of(html), LocationLabel::Navigation);
    }

    #[test]
    fn test_walk_excludes_body() {
        let page = Page::parse(
            r#"<html><body class="menu"><a href="/x">x</a></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let anchor = page.anchors().into_iter().next().unwrap();

        assert_eq!(
            classify(anchor, &default_location_rules(), LocationLabel::BodyContent),
            LocationLabel::BodyContent
        );
        assert!(!is_ignored(anchor, &default_ignore_selectors()));
    }

    #[test]
    fn test_classify_with_custom_labels() {
        let rules = vec![
            ContainerRule::new("promo", vec![class("promo")]),
            ContainerRule::new("list", vec![tag("ul")]),
        ];
        let page = Page::parse(
            r#"<ul class="promo"><li><a href="/x">x</a></li></ul>"#,
            "https://example.com/",
        )
        .unwrap();
        let anchor = page.anchors().into_iter().next().unwrap();

        assert_eq!(classify(anchor, &rules, "other"), "promo");
    }

    #[test]
    fn test_is_ignored() {
        assert!(ignored(r#"<footer><a href="/x">x</a></footer>"#));
        assert!(ignored(r#"<div id="sidebar-widget-3"><p><a href="/x">x</a></p></div>"#));
        assert!(ignored(r#"<ol class="commentlist"><li><a href="/x">x</a></li></ol>"#));
        assert!(ignored(r#"<div id="wpadminbar"><a href="/x">x</a></div>"#));
        assert!(ignored(r#"<a class="menu-item" href="/x">x</a>"#));

        assert!(!ignored(r#"<article><p><a href="/x">x</a></p></article>"#));
        assert!(!ignored(r#"<div id="main" class="content"><a href="/x">x</a></div>"#));
    }

    #[test]
    fn test_location_labels_serialize_as_display_names() {
        assert_eq!(
            serde_json::to_string(&LocationLabel::CommentSection).unwrap(),
            "\"Comment Section\""
        );
        assert_eq!(LocationLabel::BodyContent.to_string(), "Body Content");
        let label: LocationLabel = serde_json::from_str("\"Sidebar\"").unwrap();
        assert_eq!(label, LocationLabel::Sidebar);
    }
}
