use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::anchor_text::extract_text;
use crate::element::Element;
use crate::matcher::{classify, is_ignored, LocationLabel};
use crate::settings::Settings;

pub const LINK_CLICKED_ACTION: &str = "link_clicked";

/// One reported link click, in the collector's wire field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEvent {
    pub action: String,
    #[serde(rename = "link_url")]
    pub url: String,
    #[serde(rename = "link_anchor")]
    pub anchor_text: String,
    #[serde(rename = "link_location")]
    pub location: LocationLabel,
}

impl LinkEvent {
    pub fn link_clicked(url: String, anchor_text: String, location: LocationLabel) -> Self {
        Self {
            action: LINK_CLICKED_ACTION.to_string(),
            url,
            anchor_text,
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(u16),
}

impl MouseButton {
    /// Maps a DOM `MouseEvent.button` code
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }

    fn is_tracked(&self) -> bool {
        matches!(self, Self::Primary | Self::Auxiliary)
    }
}

/// Input channel the click arrived on; both are handled the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickChannel {
    Click,
    AuxClick,
}

#[derive(Debug, Clone)]
pub struct ClickEvent<E> {
    pub channel: ClickChannel,
    pub button: MouseButton,
    pub target: E,
}

impl<E> ClickEvent<E> {
    pub fn left(target: E) -> Self {
        Self {
            channel: ClickChannel::Click,
            button: MouseButton::Primary,
            target,
        }
    }

    pub fn middle(target: E) -> Self {
        Self {
            channel: ClickChannel::AuxClick,
            button: MouseButton::Auxiliary,
            target,
        }
    }
}

/// Decides whether a click is reported and builds its event
pub struct ClickClassifier {
    settings: Arc<Settings>,
    page_url: Url,
}

impl ClickClassifier {
    pub fn new(settings: Arc<Settings>, page_url: Url) -> Self {
        Self { settings, page_url }
    }

    pub fn on_click<E: Element + Copy>(&self, event: &ClickEvent<E>) -> Option<LinkEvent> {
        let link = event.target;

        if !event.button.is_tracked() {
            log::debug!("Ignoring {:?} on {:?} channel", event.button, event.channel);
            return None;
        }

        let href = match link.attr("href") {
            Some(href) if href != "#" => href,
            _ => return None,
        };
        let url = match self.page_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("Ignoring click on unresolvable href {}: {}", href, e);
                return None;
            }
        };

        if self.settings.disable_clicks {
            return None;
        }

        if !self.settings.track_all_element_clicks && is_ignored(link, &self.settings.rules.ignore) {
            log::debug!("Ignoring click inside ignored container: {}", url);
            return None;
        }

        Some(LinkEvent::link_clicked(
            url.to_string(),
            extract_text(&link, &self.settings.text),
            classify(link, &self.settings.rules.location, LocationLabel::BodyContent),
        ))
    }
}
