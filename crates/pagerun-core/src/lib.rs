//! Page runtime generation (fetch, cache, assemble, write).
//!
//! Given a parsed page description, builds a single self-contained page
//! runtime script that reproduces the page's inline and external script
//! behavior in original order against a simulated window/document, and
//! persists each external script as a content-addressed cached module.

pub mod adjust;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod io;
pub mod runtime;
pub mod script;
