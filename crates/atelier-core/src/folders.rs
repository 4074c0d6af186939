//! Destination folders for uploads, keyed by site page and section.
//!
//! Every page maps to a fixed folder. Pages with sections (only `portfolio`
//! today) carry their section in the variant, so a resolved `PageFolder`
//! always names a real folder.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors resolving a page/section pair to a folder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FolderError {
    #[error("Unknown page '{0}'")]
    UnknownPage(String),

    #[error("Unknown section '{section}' for page '{page}' (expected one of: {expected})")]
    UnknownSection {
        page: &'static str,
        section: String,
        expected: String,
    },

    #[error("Page '{page}' requires a section (one of: {expected})")]
    MissingSection {
        page: &'static str,
        expected: String,
    },
}

/// Sections of the portfolio page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortfolioSection {
    Weddings,
    Portraits,
    Landscapes,
    Events,
    Commercial,
}

impl PortfolioSection {
    pub const ALL: [PortfolioSection; 5] = [
        PortfolioSection::Weddings,
        PortfolioSection::Portraits,
        PortfolioSection::Landscapes,
        PortfolioSection::Events,
        PortfolioSection::Commercial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioSection::Weddings => "weddings",
            PortfolioSection::Portraits => "portraits",
            PortfolioSection::Landscapes => "landscapes",
            PortfolioSection::Events => "events",
            PortfolioSection::Commercial => "commercial",
        }
    }

    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for PortfolioSection {
    type Err = FolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FolderError::UnknownSection {
                page: "portfolio",
                section: s.to_string(),
                expected: Self::expected(),
            })
    }
}

/// Where an upload lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageFolder {
    Home,
    About,
    Journal,
    /// Uploads that did not name a page
    General,
    Portfolio(PortfolioSection),
}

impl PageFolder {
    /// Resolve the `page` and `section` form fields to a folder.
    ///
    /// An absent (or blank) page resolves to [`PageFolder::General`].
    /// Sections are ignored for pages that have none.
    pub fn resolve(page: Option<&str>, section: Option<&str>) -> Result<Self, FolderError> {
        let page = page.map(str::trim).filter(|p| !p.is_empty());
        let section = section.map(str::trim).filter(|s| !s.is_empty());

        let Some(page) = page else {
            return Ok(PageFolder::General);
        };

        let folder = match page.to_ascii_lowercase().as_str() {
            "home" => PageFolder::Home,
            "about" => PageFolder::About,
            "journal" => PageFolder::Journal,
            "general" => PageFolder::General,
            "portfolio" => {
                let section = section.ok_or_else(|| FolderError::MissingSection {
                    page: "portfolio",
                    expected: PortfolioSection::expected(),
                })?;
                return Ok(PageFolder::Portfolio(section.parse()?));
            }
            _ => return Err(FolderError::UnknownPage(page.to_string())),
        };

        if let Some(section) = section {
            tracing::debug!(page, section, "Ignoring section for page without sections");
        }
        Ok(folder)
    }

    /// Storage path prefix, without trailing slash.
    pub fn path(&self) -> String {
        match self {
            PageFolder::Home => "home".to_string(),
            PageFolder::About => "about".to_string(),
            PageFolder::Journal => "journal".to_string(),
            PageFolder::General => "general".to_string(),
            PageFolder::Portfolio(section) => format!("portfolio/{}", section.as_str()),
        }
    }
}

impl fmt::Display for PageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pages() {
        assert_eq!(PageFolder::resolve(Some("home"), None).unwrap().path(), "home");
        assert_eq!(PageFolder::resolve(Some("About"), None).unwrap().path(), "about");
        assert_eq!(
            PageFolder::resolve(Some("journal"), Some("ignored")).unwrap(),
            PageFolder::Journal
        );
    }

    #[test]
    fn test_missing_page_is_general() {
        assert_eq!(PageFolder::resolve(None, None).unwrap(), PageFolder::General);
        assert_eq!(PageFolder::resolve(Some("  "), None).unwrap(), PageFolder::General);
    }

    #[test]
    fn test_portfolio_section() {
        let folder = PageFolder::resolve(Some("portfolio"), Some("Weddings")).unwrap();
        assert_eq!(folder, PageFolder::Portfolio(PortfolioSection::Weddings));
        assert_eq!(folder.to_string(), "portfolio/weddings");
    }

    #[test]
    fn test_portfolio_requires_known_section() {
        let err = PageFolder::resolve(Some("portfolio"), Some("cats")).unwrap_err();
        assert!(matches!(err, FolderError::UnknownSection { .. }));
        assert!(err.to_string().contains("weddings"));

        let err = PageFolder::resolve(Some("portfolio"), None).unwrap_err();
        assert!(matches!(err, FolderError::MissingSection { .. }));
    }

    #[test]
    fn test_unknown_page() {
        let err = PageFolder::resolve(Some("shop"), None).unwrap_err();
        assert_eq!(err, FolderError::UnknownPage("shop".to_string()));
    }
}
