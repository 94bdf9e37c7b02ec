// Link Tracker Library
//
// Classifies link clicks by page region, labels them, reports them to a
// collector endpoint and optionally rewrites anchors to open in a new tab.

pub mod anchor_text;
pub mod api;
pub mod classifier;
pub mod element;
pub mod matcher;
pub mod page;
pub mod reporter;
pub mod rewriter;
pub mod selector;
pub mod settings;
pub mod tracker;

// Re-export main types for convenience
pub use anchor_text::extract_text;
pub use classifier::{ClickChannel, ClickClassifier, ClickEvent, LinkEvent, MouseButton};
pub use element::Element;
pub use matcher::{classify, is_ignored, ContainerRule, LocationLabel, RuleSet};
pub use page::{Page, PageElement};
pub use reporter::Reporter;
pub use rewriter::TabTargetRewriter;
pub use selector::ContainerSelector;
pub use settings::{Settings, TextFallbacks};
pub use tracker::LinkTracker;
