//! Site configuration: pages, their banner and the charts they show.
//!
//! Charts are listed as `typetag` trait objects, so any variant registered with
//! [`Chart`] can appear in a page. The site shipped with the crate is available
//! from [`SiteConfig::bundled`].
//!
//! ```toml
//! [[pages]]
//! id = "problem"
//! banner = "Problem"
//!
//! [[pages.sections]]
//! header = "Top 10 Annual CO₂ Emissions Per Capita"
//!
//! [pages.sections.chart]
//! type = "RadarChart"
//! title = "CO₂ emissions per capita"
//! dataset = "co2-per-capita"
//! ```

use crate::errors::{SiteError, SiteResult};
use climviz_core::chart::Chart;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

const BUNDLED_SITE: &str = include_str!("../assets/site.toml");

/// A header followed by one chart
#[derive(Debug, Serialize, Deserialize)]
pub struct Section {
    pub header: String,
    pub chart: Box<dyn Chart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page {
    /// Identifier used to navigate to the page
    pub id: String,
    pub banner: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl SiteConfig {
    /// Parse a site from TOML, rejecting repeated page identifiers
    pub fn from_toml_str(text: &str) -> SiteResult<Self> {
        let config: SiteConfig = toml::from_str(text)?;

        let mut seen = HashSet::new();
        if let Some(page) = config.pages.iter().find(|page| !seen.insert(page.id.as_str())) {
            return Err(SiteError::DuplicatePage(page.id.clone()));
        }

        debug!(
            pages = config.pages.len(),
            charts = config.pages.iter().map(|p| p.sections.len()).sum::<usize>(),
            "Loaded site configuration"
        );
        Ok(config)
    }

    /// The site shipped with the crate
    pub fn bundled() -> SiteResult<Self> {
        Self::from_toml_str(BUNDLED_SITE)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn page_ids(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_site_lists_every_page() {
        let site = SiteConfig::bundled().unwrap();
        assert_eq!(
            site.page_ids().collect::<Vec<_>>(),
            vec!["problem", "causes", "effect", "initiative"]
        );

        let causes = site.page("causes").unwrap();
        assert_eq!(causes.banner, "Causes");
        let titles: Vec<&str> = causes.sections.iter().map(|s| s.chart.title()).collect();
        assert_eq!(
            titles,
            vec!["Transport fuel consumption", "Waste generated", "Waste generated"]
        );
        assert!(causes.sections.iter().all(|s| !s.chart.is_mounted()));
    }

    #[test]
    fn repeated_pages_are_rejected() {
        let text = r#"
            [[pages]]
            id = "problem"
            banner = "Problem"

            [[pages]]
            id = "problem"
            banner = "Problem again"
        "#;
        assert!(matches!(
            SiteConfig::from_toml_str(text),
            Err(SiteError::DuplicatePage(id)) if id == "problem"
        ));
    }

    #[test]
    fn unknown_chart_types_fail_to_parse() {
        let text = r#"
            [[pages]]
            id = "problem"
            banner = "Problem"

            [[pages.sections]]
            header = "Pie"
            chart = { type = "PieChart", title = "Pie", dataset = "co2-per-capita" }
        "#;
        assert!(matches!(SiteConfig::from_toml_str(text), Err(SiteError::Config(_))));
    }
}
