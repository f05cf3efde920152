//! Browser facade: versions and page loading

mod page;

pub use page::Page;

use crate::utils::Result;
use url::Url;

/// An emulated browser identity.
///
/// The version decides what `navigator.userAgent` and `navigator.appName`
/// report to scripts; the DOM and rendering behavior is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserVersion {
    pub name: String,
    pub user_agent: String,
    pub app_name: String,
}

impl BrowserVersion {
    pub fn chrome() -> Self {
        Self {
            name: "Chrome".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/122.0.0.0 Safari/537.36"
                .to_string(),
            app_name: "Netscape".to_string(),
        }
    }

    pub fn firefox() -> Self {
        Self {
            name: "Firefox".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0"
                .to_string(),
            app_name: "Netscape".to_string(),
        }
    }

    pub fn edge() -> Self {
        Self {
            name: "Edge".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0"
                .to_string(),
            app_name: "Netscape".to_string(),
        }
    }
}

impl Default for BrowserVersion {
    fn default() -> Self {
        Self::chrome()
    }
}

/// The headless browser. Cheap to construct; each loaded page is
/// independent.
#[derive(Debug, Clone, Default)]
pub struct Browser {
    version: BrowserVersion,
}

impl Browser {
    pub fn new(version: BrowserVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> &BrowserVersion {
        &self.version
    }

    /// Load an HTML string: parse, run inline scripts, fire
    /// `DOMContentLoaded`
    pub fn load_html(&self, html: &str) -> Result<Page> {
        Page::load(&self.version, html, None)
    }

    /// Load an HTML string with a page URL, used to resolve links, form
    /// actions, and `location`
    pub fn load_html_with_url(&self, html: &str, url: &str) -> Result<Page> {
        let url = Url::parse(url)?;
        Page::load(&self.version, html, Some(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_version() {
        let browser = Browser::default();
        assert_eq!(browser.version().name, "Chrome");
        assert!(browser.version().user_agent.contains("Chrome"));
    }

    #[test]
    fn test_version_reported_to_scripts() {
        let browser = Browser::new(BrowserVersion::firefox());
        let mut page = browser.load_html("<p>x</p>").unwrap();
        let ua = page.execute_script("navigator.userAgent").unwrap();
        assert!(ua.as_str().unwrap().contains("Firefox"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let browser = Browser::default();
        assert!(browser.load_html_with_url("<p>x</p>", "not a url").is_err());
    }
}
