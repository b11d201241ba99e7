//! Renderer Trait
//!
//! Abstract interface for the engine that turns a component's template value
//! into host content, allowing pluggable implementations.

use fos_dom::{DomError, ElementRef};

/// Makes a host element's visible content reflect a template value.
///
/// Implementations must tolerate repeated calls with the same host.
pub trait Renderer: 'static {
    /// Opaque value produced by a component's render function
    type Template: 'static;

    /// Failure reported by the engine
    type Error: std::error::Error;

    /// Render `template` into `host`
    fn render(&self, template: Self::Template, host: &ElementRef) -> Result<(), Self::Error>;
}

/// Renders a string as the host's only text content
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    type Template = String;
    type Error = DomError;

    fn render(&self, template: String, host: &ElementRef) -> Result<(), DomError> {
        host.set_text_content(&template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::Document;

    #[test]
    fn test_text_renderer_replaces_content() {
        let doc = Document::new();
        let host = doc.create_element("div");
        let renderer = TextRenderer;

        renderer.render("1".into(), &host).unwrap();
        renderer.render("2".into(), &host).unwrap();
        assert_eq!(host.text_content(), "2");
        assert_eq!(host.children().len(), 1);
    }

    #[test]
    fn test_text_renderer_fails_without_document() {
        let host = {
            let doc = Document::new();
            doc.create_element("div")
        };
        assert_eq!(
            TextRenderer.render("x".into(), &host),
            Err(DomError::NotFound(host.id()))
        );
    }
}
