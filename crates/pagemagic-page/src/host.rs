//! The surface a page session renders into.

/// Attribute marking the style element PageMagic manages.
pub const MANAGED_STYLE_ATTR: &str = "data-pagemagic";

/// A page document PageMagic can read and style.
pub trait StyleHost: Send + Sync {
    fn title(&self) -> String;

    /// Full serialized document.
    fn html(&self) -> String;

    /// Replace the managed style element with one holding `css`.
    fn render_style(&mut self, css: &str);

    /// Remove every managed style element. Returns how many were removed.
    fn remove_styles(&mut self) -> usize;

    /// Text of the managed style element, if present.
    fn managed_css(&self) -> Option<String>;
}
