//! # Strix - Headless Browser Emulation
//!
//! A GUI-less browser for tests and scraping: it parses real-world HTML,
//! models the page as a mutable DOM, runs the page's JavaScript against
//! live host objects, and exposes high-level interaction (click, type,
//! submit) the way a user would perform it.
//!
//! ## Architecture
//!
//! The library is organized into the following core modules:
//!
//! - **engine**: Browser facade, versions, and the page lifecycle
//! - **parser**: Tolerant HTML parsing via the HTML5 algorithm
//! - **dom**: Arena-backed mutable document tree and XPath
//! - **style**: Display and visibility resolution from CSS
//! - **text**: Visible-text rendering and HTML serialization
//! - **query**: CSS selector matching
//! - **forms**: Successful-control collection and submission encoding
//! - **js**: Script execution and DOM host objects
//! - **events**: Event dispatch, bubbling, and default actions
//! - **driver**: WebDriver-style element lookup and interaction
//! - **utils**: Shared utilities and error types

pub mod dom;
pub mod driver;
pub mod engine;
pub mod events;
pub mod forms;
pub mod js;
pub mod parser;
pub mod query;
pub mod style;
pub mod text;
pub mod utils;

// Re-export main types for convenience
pub use driver::{By, Driver, ElementHandle};
pub use engine::{Browser, BrowserVersion, Page};
pub use utils::error::{Result, StrixError};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Strix";
