use climviz_core::errors::ClimvizError;
use thiserror::Error;

/// Error type for site assembly and navigation.
#[derive(Error, Debug)]
pub enum SiteError {
    #[error(transparent)]
    Core(#[from] ClimvizError),
    #[error("Invalid site configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Unknown page '{0}'")]
    UnknownPage(String),
    #[error("Page '{0}' is listed more than once")]
    DuplicatePage(String),
    #[error("The current page has no section {0}")]
    UnknownSection(usize),
    #[error("No page is open")]
    NoActivePage,
}

/// Convenience type for `Result<T, SiteError>`.
pub type SiteResult<T> = Result<T, SiteError>;
