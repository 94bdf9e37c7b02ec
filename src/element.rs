/// Minimal view of a DOM element used by the matchers and extractors.
///
/// Implementations only need to expose the tag name, attributes, the parent
/// element and text content; everything else is derived here.
pub trait Element: Sized {
    /// Lowercase local tag name (`a`, `nav`, `img`, ...)
    fn tag_name(&self) -> &str;

    fn attr(&self, name: &str) -> Option<&str>;

    /// Parent element, `None` at the top of the tree
    fn parent_element(&self) -> Option<Self>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self) -> String;

    /// First descendant (document order, excluding `self`) accepted by `predicate`
    fn find_descendant(&self, predicate: &dyn Fn(&Self) -> bool) -> Option<Self>;

    fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    fn class_attr(&self) -> Option<&str> {
        self.attr("class")
    }

    fn has_class(&self, class: &str) -> bool {
        self.class_attr()
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn is_tag(&self, name: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(name)
    }

    /// Ancestor walks stop before this element
    fn is_content_boundary(&self) -> bool {
        self.is_tag("body")
    }
}

/// Iterates `element` and its ancestors up to, but excluding, the content boundary.
pub fn ancestors_within_content<E: Element>(element: E) -> impl Iterator<Item = E> {
    std::iter::successors(Some(element), |el| el.parent_element())
        .take_while(|el| !el.is_content_boundary())
}
