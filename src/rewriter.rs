use std::sync::Arc;
use url::Url;

use crate::element::Element;
use crate::matcher::is_ignored;
use crate::page::Page;
use crate::settings::Settings;

/// Marks anchors to open in a new browsing context based on their origin
pub struct TabTargetRewriter {
    settings: Arc<Settings>,
    page_url: Url,
}

impl TabTargetRewriter {
    pub fn new(settings: Arc<Settings>, page_url: Url) -> Self {
        Self { settings, page_url }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.rewrites_targets()
    }

    /// Whether `anchor` should get `target="_blank"`
    pub fn wants_new_context<E: Element + Copy>(&self, anchor: &E) -> bool {
        if is_ignored(*anchor, &self.settings.rules.ignore) {
            return false;
        }

        let href = match anchor.attr("href") {
            Some(href) if !href.contains('#') => href,
            _ => return false,
        };
        if anchor.attr("target").is_some() {
            return false;
        }

        let Ok(url) = self.page_url.join(href) else {
            log::debug!("Skipping anchor with unresolvable href {}", href);
            return false;
        };

        let internal = url.host_str() == self.page_url.host_str();
        if internal {
            self.settings.open_internal_in_new_tab
        } else {
            self.settings.open_external_in_new_tab
        }
    }

    /// Rewrites every qualifying anchor on the page, returning how many were marked
    pub fn rewrite_all(&self, page: &mut Page) -> usize {
        let marked: Vec<usize> = page
            .anchors()
            .into_iter()
            .filter(|anchor| self.wants_new_context(anchor))
            .filter_map(|anchor| anchor.anchor_index())
            .collect();

        for &index in &marked {
            page.mark_new_context(index);
        }

        log::info!("Opened {} link(s) in a new context on {}", marked.len(), self.page_url);
        marked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r##"
        <html><body>
            <header><a href="https://example.com/">Home</a></header>
            <main>
                <a id="internal" href="/about">About</a>
                <a id="external" href="https://other.org/page">Other</a>
                <a id="fragment" href="/docs#install">Install</a>
                <a id="targeted" href="https://other.org/" target="_self">Self</a>
                <a id="bare">No href</a>
                <a id="port" href="https://example.com:8443/admin">Admin</a>
            </main>
        </body></html>
    "##;

    fn rewriter(internal: bool, external: bool) -> TabTargetRewriter {
        let settings = Settings {
            open_internal_in_new_tab: internal,
            open_external_in_new_tab: external,
            ..Settings::default()
        };
        TabTargetRewriter::new(Arc::new(settings), Url::parse("https://example.com/blog/").unwrap())
    }

    fn rewritten_ids(page: &Page) -> Vec<String> {
        page.rewritten_anchors()
            .iter()
            .filter_map(|a| a.id().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_rewrite_internal_and_external() {
        let mut page = Page::parse(HTML, "https://example.com/blog/").unwrap();

        let count = rewriter(true, true).rewrite_all(&mut page);

        assert_eq!(count, 3);
        assert_eq!(rewritten_ids(&page), vec!["internal", "external", "port"]);
        assert_eq!(page.find_anchor("#targeted").unwrap().attr("target"), Some("_self"));
    }

    #[test]
    fn test_rewrite_external_only() {
        let mut page = Page::parse(HTML, "https://example.com/blog/").unwrap();

        rewriter(false, true).rewrite_all(&mut page);

        assert_eq!(rewritten_ids(&page), vec!["external"]);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let rewriter = rewriter(true, true);
        let mut once = Page::parse(HTML, "https://example.com/blog/").unwrap();
        let mut twice = Page::parse(HTML, "https://example.com/blog/").unwrap();

        rewriter.rewrite_all(&mut once);
        rewriter.rewrite_all(&mut twice);
        let second_pass = rewriter.rewrite_all(&mut twice);

        assert_eq!(second_pass, 0);
        assert_eq!(rewritten_ids(&once), rewritten_ids(&twice));
    }

    #[test]
    fn test_is_enabled() {
        assert!(rewriter(true, false).is_enabled());
        assert!(!rewriter(false, false).is_enabled());

        let settings = Settings {
            open_links_with_js: false,
            ..Settings::default()
        };
        let rewriter = TabTargetRewriter::new(Arc::new(settings), Url::parse("https://example.com/").unwrap());
        assert!(!rewriter.is_enabled());
    }
}
