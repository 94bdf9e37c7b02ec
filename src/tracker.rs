use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

use crate::classifier::{ClickClassifier, ClickEvent, LinkEvent};
use crate::element::Element;
use crate::page::Page;
use crate::reporter::Reporter;
use crate::rewriter::TabTargetRewriter;
use crate::settings::Settings;

/// Wires the classifier, rewriter and reporter for one page
pub struct LinkTracker {
    classifier: ClickClassifier,
    rewriter: TabTargetRewriter,
    reporter: Reporter,
}

impl LinkTracker {
    pub fn new(settings: Arc<Settings>, page_url: &Url) -> Result<Self> {
        let reporter = Reporter::new(&settings, page_url)?;

        Ok(Self {
            classifier: ClickClassifier::new(settings.clone(), page_url.clone()),
            rewriter: TabTargetRewriter::new(settings, page_url.clone()),
            reporter,
        })
    }

    pub fn for_page(settings: Arc<Settings>, page: &Page) -> Result<Self> {
        Self::new(settings, page.url())
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// One-time initialization once the document is parsed
    pub fn on_document_ready(&self, page: &mut Page) -> usize {
        if self.rewriter.is_enabled() {
            self.rewriter.rewrite_all(page)
        } else {
            0
        }
    }

    /// Classifies the click without reporting it
    pub fn classify<E: Element + Copy>(&self, event: &ClickEvent<E>) -> Option<LinkEvent> {
        self.classifier.on_click(event)
    }

    /// Classifies the click and, if tracked, starts reporting it.
    ///
    /// The returned handle may be dropped; the send completes regardless.
    /// Tracked clicks spawn a task, so this must be called inside a tokio runtime.
    pub fn handle_click<E: Element + Copy>(&self, event: &ClickEvent<E>) -> Option<JoinHandle<Result<()>>> {
        let link_event = self.classifier.on_click(event)?;
        log::info!(
            "Link clicked: {} [{}] \"{}\"",
            link_event.url,
            link_event.location,
            link_event.anchor_text
        );
        Some(self.reporter.send(link_event))
    }
}
