use crate::element::Element;
use crate::settings::TextFallbacks;

fn is_image_like<E: Element>(element: &E) -> bool {
    element.is_tag("img") || element.is_tag("svg")
}

/// Human-readable label for a link.
///
/// Visible text wins; otherwise the title of the first image-like child is
/// used, then the configured fallbacks.
pub fn extract_text<E: Element>(link: &E, fallbacks: &TextFallbacks) -> String {
    let text = link.text_content();
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    match link.find_descendant(&is_image_like::<E>) {
        Some(image) => match image.attr("title").filter(|t| !t.is_empty()) {
            Some(title) => format!("{}{}", fallbacks.image_text, title.trim()),
            None => fallbacks.image_no_text.clone(),
        },
        None => fallbacks.no_text.clone(),
    }
}
