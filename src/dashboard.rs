//! Navigation between pages of a site.
//!
//! A [`Dashboard`] shows one page at a time. Opening a page unmounts every chart
//! of the page shown before it, which also releases any tooltip overlay one of
//! its elements owned, and then mounts the charts of the new page into the
//! shared [`Document`].

use crate::errors::{SiteError, SiteResult};
use crate::site::SiteConfig;
use climviz_core::chart::{Chart, Control, MountedChart, SelectionInput};
use climviz_core::document::{Document, ElementId, Mark, Point};
use climviz_core::errors::ClimvizError;
use climviz_core::registry::{DatasetRegistry, DATASET_REGISTRY};
use tracing::{debug, info, warn};

/// What became of a selection change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The chart accepted the change and was drawn again
    Redrawn,
    /// The selection already had that value
    Unchanged,
    /// The change was refused; holds the notice to show the user
    Rejected(String),
}

#[derive(Debug)]
struct PageSlot {
    id: String,
    banner: String,
    headers: Vec<String>,
    /// Charts of the page while it is not shown
    charts: Vec<Box<dyn Chart>>,
}

#[derive(Debug)]
struct ActivePage {
    index: usize,
    charts: Vec<MountedChart>,
}

#[derive(Debug)]
pub struct Dashboard<'a> {
    registry: &'a DatasetRegistry,
    document: Document,
    pages: Vec<PageSlot>,
    active: Option<ActivePage>,
}

impl Dashboard<'static> {
    /// A dashboard over the global dataset registry
    pub fn new(config: SiteConfig) -> Self {
        Self::with_registry(config, &DATASET_REGISTRY)
    }
}

impl<'a> Dashboard<'a> {
    pub fn with_registry(config: SiteConfig, registry: &'a DatasetRegistry) -> Self {
        let pages = config
            .pages
            .into_iter()
            .map(|page| {
                let (headers, charts) = page
                    .sections
                    .into_iter()
                    .map(|section| (section.header, section.chart))
                    .unzip();
                PageSlot {
                    id: page.id,
                    banner: page.banner,
                    headers,
                    charts,
                }
            })
            .collect();
        Self {
            registry,
            document: Document::default(),
            pages,
            active: None,
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn page_ids(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.id.as_str())
    }

    /// Identifier of the page being shown
    pub fn current_page(&self) -> Option<&str> {
        self.active.as_ref().map(|active| self.pages[active.index].id.as_str())
    }

    pub fn banner(&self) -> SiteResult<&str> {
        Ok(&self.pages[self.active_page()?.index].banner)
    }

    /// Section headers of the page being shown
    pub fn headers(&self) -> SiteResult<&[String]> {
        Ok(&self.pages[self.active_page()?.index].headers)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Show page `id`, replacing the page shown before it.
    ///
    /// If a chart of the new page fails to mount, no page is left open and
    /// every chart stays available for a later attempt.
    pub fn open(&mut self, id: &str) -> SiteResult<()> {
        let index = self
            .pages
            .iter()
            .position(|page| page.id == id)
            .ok_or_else(|| SiteError::UnknownPage(id.to_string()))?;
        self.close()?;

        let registry = self.registry;
        let slot = &mut self.pages[index];
        let mut mounted = 0;
        let result = slot.charts.iter_mut().try_for_each(|chart| {
            chart.mount(registry)?;
            mounted += 1;
            Ok::<(), ClimvizError>(())
        });
        if let Err(err) = result {
            for chart in &mut slot.charts[..mounted] {
                chart.unmount();
            }
            return Err(err.into());
        }

        let mut pending = std::mem::take(&mut slot.charts).into_iter();
        let mut charts = Vec::with_capacity(pending.len());
        while let Some(chart) = pending.next() {
            match MountedChart::try_attach(chart, &mut self.document) {
                Ok(mounted) => charts.push(mounted),
                Err((failed, err)) => {
                    for mounted in charts {
                        slot.charts.push(mounted.unmount(&mut self.document)?);
                    }
                    slot.charts.push(failed);
                    for mut chart in pending {
                        chart.unmount();
                        slot.charts.push(chart);
                    }
                    warn!(page = id, error = %err, "Failed to open page");
                    return Err(err.into());
                }
            }
        }
        info!(page = id, charts = charts.len(), "Opened page");
        self.active = Some(ActivePage { index, charts });
        Ok(())
    }

    /// Unmount the charts of the page being shown, if any
    pub fn close(&mut self) -> SiteResult<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        let slot = &mut self.pages[active.index];
        for mounted in active.charts {
            slot.charts.push(mounted.unmount(&mut self.document)?);
        }
        debug!(page = %slot.id, "Closed page");
        Ok(())
    }

    /// Controls of section `index` of the page being shown
    pub fn controls(&self, index: usize) -> SiteResult<Vec<Control>> {
        Ok(self.section(index)?.controls())
    }

    /// Marks of section `index` with the element ids used for pointer events
    pub fn elements(&self, index: usize) -> SiteResult<Vec<(ElementId, &Mark)>> {
        let root = self.section(index)?.root();
        Ok(self.document.elements(root)?)
    }

    /// Forward a selection change to section `index`.
    ///
    /// Changes the chart refuses, a selection below its minimum or a value it
    /// does not offer, come back as [`SelectionOutcome::Rejected`] and leave the
    /// chart as it was drawn.
    pub fn select(&mut self, index: usize, input: SelectionInput) -> SiteResult<SelectionOutcome> {
        let active = self.active.as_mut().ok_or(SiteError::NoActivePage)?;
        let chart = active
            .charts
            .get_mut(index)
            .ok_or(SiteError::UnknownSection(index))?;
        match chart.select(input, &mut self.document) {
            Ok(true) => Ok(SelectionOutcome::Redrawn),
            Ok(false) => Ok(SelectionOutcome::Unchanged),
            Err(
                err @ (ClimvizError::SelectionTooSmall { .. }
                | ClimvizError::UnknownOption { .. }),
            ) => Ok(SelectionOutcome::Rejected(err.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Pointer entered an element; returns whether a tooltip is shown
    pub fn hover(&mut self, element: ElementId, pointer: Point) -> SiteResult<bool> {
        Ok(self.document.pointer_enter(element, pointer)?)
    }

    pub fn move_pointer(&mut self, element: ElementId, pointer: Point) -> SiteResult<bool> {
        Ok(self.document.pointer_move(element, pointer)?)
    }

    pub fn leave(&mut self, element: ElementId) -> bool {
        self.document.pointer_leave(element)
    }

    fn active_page(&self) -> SiteResult<&ActivePage> {
        self.active.as_ref().ok_or(SiteError::NoActivePage)
    }

    fn section(&self, index: usize) -> SiteResult<&MountedChart> {
        self.active_page()?
            .charts
            .get(index)
            .ok_or(SiteError::UnknownSection(index))
    }
}
