//! The page side of PageMagic.
//!
//! A [`PageSession`] lives for one page load. It owns the ordered list of
//! CSS applied to the page, renders it into a single managed
//! `<style data-pagemagic="true">` element of a [`StyleHost`], and answers
//! the action-tagged requests sent by the popup. Sessions are reached
//! through a [`PageChannel`]; [`TabRegistry`] is the in-process one.

pub mod channel;
pub mod document;
pub mod host;
pub mod registry;
pub mod session;

pub use channel::{request, PageChannel};
pub use document::HtmlDocument;
pub use host::{StyleHost, MANAGED_STYLE_ATTR};
pub use registry::TabRegistry;
pub use session::PageSession;
