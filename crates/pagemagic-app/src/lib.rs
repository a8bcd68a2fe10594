//! PageMagic front end: the popup and settings controllers and the CLI
//! that drives them.

pub mod cli;
pub mod commands;
pub mod popup;
pub mod settings;
