//! The chart abstraction and its mount/redraw lifecycle.
//!
//! A [`Chart`] is a serialisable configuration (dataset identifier, title, fixed
//! options) plus the selection and dataset handles it picks up when mounted.
//! Charts are deserialised as trait objects, so a page can list them in a
//! configuration file:
//!
//! ```toml
//! [[pages.sections]]
//! header = "Waste Management"
//! chart = { type = "TopNBarChart", title = "Top 10 Countries", dataset = "waste-management" }
//! ```
//!
//! [`MountedChart`] drives a chart against a [`Document`]: it owns the chart's render
//! root, re-renders after every successful selection change and releases the root
//! (and any overlay owned by it) on unmount.

use crate::document::{Document, RenderSurface, RootId, Scene, Size};
use crate::errors::{ClimvizError, ClimvizResult};
use crate::registry::DatasetRegistry;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// A selection change requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum SelectionInput {
    Period(String),
    Category(String),
    Entity(String),
    Entities(Vec<String>),
}

impl SelectionInput {
    pub fn kind(&self) -> InputKind {
        match self {
            SelectionInput::Period(_) => InputKind::Period,
            SelectionInput::Category(_) => InputKind::Category,
            SelectionInput::Entity(_) => InputKind::Entity,
            SelectionInput::Entities(_) => InputKind::Entities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Period,
    Category,
    Entity,
    Entities,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Period => "period",
            InputKind::Category => "category",
            InputKind::Entity => "entity",
            InputKind::Entities => "entities",
        }
    }
}

/// A dropdown offered next to a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub label: String,
    pub input: InputKind,
    pub options: Vec<String>,
    pub selected: Vec<String>,
    /// Minimum number of selected options, for multi-selects
    pub minimum: Option<usize>,
    pub help: String,
}

impl Control {
    pub fn single(
        label: impl Into<String>,
        input: InputKind,
        options: Vec<String>,
        selected: &str,
    ) -> Self {
        Self {
            label: label.into(),
            input,
            options,
            selected: vec![selected.to_string()],
            minimum: None,
            help: String::new(),
        }
    }

    pub fn multiple(
        label: impl Into<String>,
        options: Vec<String>,
        selected: &[String],
        minimum: usize,
    ) -> Self {
        Self {
            label: label.into(),
            input: InputKind::Entities,
            options,
            selected: selected.to_vec(),
            minimum: Some(minimum),
            help: String::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// Reject a value that is not one of `options`
pub fn check_option(input: InputKind, options: &[String], value: &str) -> ClimvizResult<()> {
    if options.iter().any(|o| o == value) {
        Ok(())
    } else {
        Err(ClimvizError::UnknownOption {
            control: input.as_str().to_string(),
            value: value.to_string(),
        })
    }
}

/// Reject a set if any of its members is not one of `options`
pub fn check_options(input: InputKind, options: &[String], values: &[String]) -> ClimvizResult<()> {
    values
        .iter()
        .try_for_each(|value| check_option(input, options, value))
}

/// Error for an input a chart has no control for
pub fn invalid_input(chart: &str, input: &SelectionInput) -> ClimvizError {
    ClimvizError::InvalidInput {
        chart: chart.to_string(),
        input: input.kind().as_str().to_string(),
    }
}

/// Borrow state that only exists once a chart is mounted
pub fn mounted<'a, T>(state: &'a Option<T>, chart: &str) -> ClimvizResult<&'a T> {
    state
        .as_ref()
        .ok_or_else(|| ClimvizError::NotMounted(chart.to_string()))
}

/// A chart bound to a dataset and a selection
#[typetag::serde(tag = "type")]
pub trait Chart: Debug {
    /// Heading drawn at the top of the chart
    fn title(&self) -> &str;

    /// Size of the chart's render root
    fn size(&self) -> Size {
        Size::default()
    }

    /// Load datasets and set the default selection
    fn mount(&mut self, registry: &DatasetRegistry) -> ClimvizResult<()>;

    fn is_mounted(&self) -> bool;

    /// Controls in display order, reflecting the current selection
    fn controls(&self) -> Vec<Control>;

    /// Apply a selection change.
    ///
    /// Returns whether the selection changed. A rejected change leaves the
    /// selection exactly as it was.
    fn apply(&mut self, input: SelectionInput) -> ClimvizResult<bool>;

    /// Draw every mark for the current selection
    fn render(&self, surface: &mut dyn RenderSurface) -> ClimvizResult<()>;

    /// Drop dataset handles and the selection
    fn unmount(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartPhase {
    Idle,
    Rendered { generation: u64 },
}

/// A chart mounted into a [`Document`]
#[derive(Debug)]
pub struct MountedChart {
    chart: Box<dyn Chart>,
    root: RootId,
    phase: ChartPhase,
}

impl MountedChart {
    /// Mount `chart`, create its render root and draw it once
    pub fn mount(
        mut chart: Box<dyn Chart>,
        registry: &DatasetRegistry,
        document: &mut Document,
    ) -> ClimvizResult<Self> {
        chart.mount(registry)?;
        Self::attach(chart, document)
    }

    /// Create a render root for a chart that is already mounted and draw it once
    pub fn attach(chart: Box<dyn Chart>, document: &mut Document) -> ClimvizResult<Self> {
        Self::try_attach(chart, document).map_err(|(_, err)| err)
    }

    /// Like [`MountedChart::attach`], but a chart that fails to draw is handed
    /// back unmounted together with the error.
    pub fn try_attach(
        chart: Box<dyn Chart>,
        document: &mut Document,
    ) -> Result<Self, (Box<dyn Chart>, ClimvizError)> {
        if !chart.is_mounted() {
            let err = ClimvizError::NotMounted(chart.title().to_string());
            return Err((chart, err));
        }
        let root = document.create_root(chart.size());
        let mut mounted = Self {
            chart,
            root,
            phase: ChartPhase::Idle,
        };
        if let Err(err) = mounted.redraw(document) {
            let mut chart = mounted.chart;
            chart.unmount();
            return match document.remove_root(root) {
                Ok(()) => Err((chart, err)),
                Err(remove_err) => Err((chart, remove_err)),
            };
        }
        Ok(mounted)
    }

    /// Clear the render root and draw the chart from scratch
    pub fn redraw(&mut self, document: &mut Document) -> ClimvizResult<u64> {
        let mut scene = Scene::new(self.chart.size());
        self.chart.render(&mut scene)?;
        let generation = document.commit(self.root, scene)?;
        self.phase = ChartPhase::Rendered { generation };
        debug!(chart = self.chart.title(), generation, "Rendered chart");
        Ok(generation)
    }

    /// Apply a selection change and redraw if it changed anything
    pub fn select(
        &mut self,
        input: SelectionInput,
        document: &mut Document,
    ) -> ClimvizResult<bool> {
        if !self.chart.apply(input)? {
            return Ok(false);
        }
        self.redraw(document)?;
        Ok(true)
    }

    /// Remove the render root and hand the unmounted chart back
    pub fn unmount(mut self, document: &mut Document) -> ClimvizResult<Box<dyn Chart>> {
        document.remove_root(self.root)?;
        self.chart.unmount();
        debug!(chart = self.chart.title(), "Unmounted chart");
        Ok(self.chart)
    }

    pub fn chart(&self) -> &dyn Chart {
        self.chart.as_ref()
    }

    pub fn root(&self) -> RootId {
        self.root
    }

    pub fn phase(&self) -> ChartPhase {
        self.phase
    }

    pub fn controls(&self) -> Vec<Control> {
        self.chart.controls()
    }
}
