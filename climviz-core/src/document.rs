//! Retained render surface.
//!
//! A [`Document`] hosts one render root per mounted chart plus the shared tooltip
//! overlay. Charts never draw into a root directly: they draw [`Mark`]s into a
//! [`Scene`] through the [`RenderSurface`] trait and the finished scene is
//! committed in one step, so a half-drawn root is never observable.

use crate::color::Rgb;
use crate::dataset::FloatValue;
use crate::errors::{ClimvizError, ClimvizResult};
use crate::overlay::{Overlay, OverlayManager};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Identifier of a render root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootId(u64);

impl RootId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root#{}", self.0)
    }
}

/// Identifier of a drawn mark.
///
/// Identifiers are never reused, so an id from a previous render of a root
/// does not resolve after the root is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: FloatValue,
    pub y: FloatValue,
}

impl Point {
    pub fn new(x: FloatValue, y: FloatValue) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: FloatValue,
    pub height: FloatValue,
}

impl Size {
    pub fn new(width: FloatValue, height: FloatValue) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(900.0, 500.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect {
        x: FloatValue,
        y: FloatValue,
        width: FloatValue,
        height: FloatValue,
    },
    Circle {
        cx: FloatValue,
        cy: FloatValue,
        r: FloatValue,
    },
    Line {
        x1: FloatValue,
        y1: FloatValue,
        x2: FloatValue,
        y2: FloatValue,
    },
    Path {
        commands: Vec<PathCommand>,
    },
    Text {
        x: FloatValue,
        y: FloatValue,
        content: String,
        anchor: TextAnchor,
        /// Rotation in degrees around `(x, y)`
        rotate: FloatValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub stroke_width: FloatValue,
    pub opacity: FloatValue,
    pub font_size: Option<FloatValue>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            font_size: None,
        }
    }
}

/// Entrance animation timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub delay_ms: u32,
    pub duration_ms: u32,
}

/// A shape with its style and optional tooltip text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub shape: Shape,
    pub style: Style,
    pub tooltip: Option<String>,
    pub transition: Option<Transition>,
    /// Free-form tag such as `"axis"` or `"bar"`
    pub class: Option<String>,
}

impl Mark {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            style: Style::default(),
            tooltip: None,
            transition: None,
            class: None,
        }
    }

    pub fn rect(x: FloatValue, y: FloatValue, width: FloatValue, height: FloatValue) -> Self {
        Self::new(Shape::Rect {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        })
    }

    pub fn circle(cx: FloatValue, cy: FloatValue, r: FloatValue) -> Self {
        Self::new(Shape::Circle { cx, cy, r })
    }

    pub fn line(x1: FloatValue, y1: FloatValue, x2: FloatValue, y2: FloatValue) -> Self {
        Self::new(Shape::Line { x1, y1, x2, y2 })
    }

    pub fn path(commands: Vec<PathCommand>) -> Self {
        Self::new(Shape::Path { commands })
    }

    /// Closed polygon through `points`
    pub fn polygon(points: &[Point]) -> Self {
        let mut commands: Vec<PathCommand> = points
            .iter()
            .enumerate()
            .map(|(i, p)| if i == 0 { PathCommand::MoveTo(*p) } else { PathCommand::LineTo(*p) })
            .collect();
        if !commands.is_empty() {
            commands.push(PathCommand::Close);
        }
        Self::path(commands)
    }

    pub fn text(x: FloatValue, y: FloatValue, content: impl Into<String>) -> Self {
        Self::new(Shape::Text {
            x,
            y,
            content: content.into(),
            anchor: TextAnchor::Start,
            rotate: 0.0,
        })
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        if let Shape::Text { anchor: a, .. } = &mut self.shape {
            *a = anchor;
        }
        self
    }

    pub fn rotate(mut self, degrees: FloatValue) -> Self {
        if let Shape::Text { rotate, .. } = &mut self.shape {
            *rotate = degrees;
        }
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.style.fill = Some(color);
        self
    }

    pub fn stroke(mut self, color: Rgb, width: FloatValue) -> Self {
        self.style.stroke = Some(color);
        self.style.stroke_width = width;
        self
    }

    pub fn opacity(mut self, opacity: FloatValue) -> Self {
        self.style.opacity = opacity;
        self
    }

    pub fn font_size(mut self, size: FloatValue) -> Self {
        self.style.font_size = Some(size);
        self
    }

    pub fn tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }

    pub fn transition(mut self, delay_ms: u32, duration_ms: u32) -> Self {
        self.transition = Some(Transition {
            delay_ms,
            duration_ms,
        });
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class.as_deref() == Some(class)
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// Drawing target used by charts
pub trait RenderSurface {
    fn size(&self) -> Size;
    /// Remove everything drawn so far
    fn clear(&mut self);
    fn draw(&mut self, mark: Mark);
}

/// An in-memory list of marks waiting to be committed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    size: Size,
    marks: Vec<Mark>,
}

impl Scene {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            marks: Vec::new(),
        }
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Mark> {
        self.marks.iter().filter(move |m| m.has_class(class))
    }

    pub fn into_marks(self) -> Vec<Mark> {
        self.marks
    }
}

impl RenderSurface for Scene {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.marks.clear();
    }

    fn draw(&mut self, mark: Mark) {
        self.marks.push(mark);
    }
}

#[derive(Debug)]
struct RenderRoot {
    size: Size,
    generation: u64,
    elements: Vec<ElementId>,
}

#[derive(Debug)]
struct Element {
    root: RootId,
    mark: Mark,
}

/// Host of render roots and the tooltip overlay
#[derive(Debug)]
pub struct Document {
    viewport: Size,
    next_root: u64,
    next_element: u64,
    roots: BTreeMap<RootId, RenderRoot>,
    elements: HashMap<ElementId, Element>,
    overlays: OverlayManager,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            next_root: 0,
            next_element: 0,
            roots: BTreeMap::new(),
            elements: HashMap::new(),
            overlays: OverlayManager::default(),
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Add an empty render root
    pub fn create_root(&mut self, size: Size) -> RootId {
        let id = RootId(self.next_root);
        self.next_root += 1;
        self.roots.insert(
            id,
            RenderRoot {
                size,
                generation: 0,
                elements: Vec::new(),
            },
        );
        id
    }

    /// Replace the content of `root` with `scene`.
    ///
    /// Returns the new generation of the root. An overlay owned by one of the
    /// replaced elements is hidden.
    pub fn commit(&mut self, root: RootId, scene: Scene) -> ClimvizResult<u64> {
        let entry = self
            .roots
            .get_mut(&root)
            .ok_or(ClimvizError::UnknownRoot(root.value()))?;

        for id in entry.elements.drain(..) {
            self.elements.remove(&id);
        }
        for mark in scene.into_marks() {
            let id = ElementId(self.next_element);
            self.next_element += 1;
            entry.elements.push(id);
            self.elements.insert(id, Element { root, mark });
        }
        entry.generation += 1;

        let generation = entry.generation;
        let count = entry.elements.len();
        self.overlays.hide_root(root);
        debug!(root = %root, generation, marks = count, "Committed scene");
        Ok(generation)
    }

    /// Remove `root`, its elements and any overlay they own
    pub fn remove_root(&mut self, root: RootId) -> ClimvizResult<()> {
        let entry = self
            .roots
            .remove(&root)
            .ok_or(ClimvizError::UnknownRoot(root.value()))?;
        for id in entry.elements {
            self.elements.remove(&id);
        }
        self.overlays.release_root(root);
        Ok(())
    }

    pub fn has_root(&self, root: RootId) -> bool {
        self.roots.contains_key(&root)
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn root_size(&self, root: RootId) -> Option<Size> {
        self.roots.get(&root).map(|r| r.size)
    }

    /// Number of scenes committed to `root`
    pub fn generation(&self, root: RootId) -> Option<u64> {
        self.roots.get(&root).map(|r| r.generation)
    }

    /// Elements of `root` in drawing order
    pub fn elements(&self, root: RootId) -> ClimvizResult<Vec<(ElementId, &Mark)>> {
        let entry = self
            .roots
            .get(&root)
            .ok_or(ClimvizError::UnknownRoot(root.value()))?;
        Ok(entry
            .elements
            .iter()
            .filter_map(|id| self.elements.get(id).map(|e| (*id, &e.mark)))
            .collect())
    }

    pub fn element(&self, id: ElementId) -> Option<&Mark> {
        self.elements.get(&id).map(|e| &e.mark)
    }

    pub fn element_root(&self, id: ElementId) -> Option<RootId> {
        self.elements.get(&id).map(|e| e.root)
    }

    /// Total number of marks across every root
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Pointer entered `element` at page position `pointer`.
    ///
    /// If the element carries tooltip text the previous overlay is removed and a
    /// new one created for this element. Returns whether an overlay is shown.
    pub fn pointer_enter(&mut self, element: ElementId, pointer: Point) -> ClimvizResult<bool> {
        let entry = self
            .elements
            .get(&element)
            .ok_or(ClimvizError::UnknownElement(element))?;
        let Some(text) = entry.mark.tooltip.clone() else {
            return Ok(false);
        };
        self.overlays
            .acquire(element, entry.root, text, pointer, self.viewport);
        Ok(true)
    }

    /// Pointer moved over `element`; the overlay follows if `element` owns it
    pub fn pointer_move(&mut self, element: ElementId, pointer: Point) -> ClimvizResult<bool> {
        if !self.elements.contains_key(&element) {
            return Err(ClimvizError::UnknownElement(element));
        }
        Ok(self.overlays.reposition(element, pointer, self.viewport))
    }

    /// Pointer left `element`; the overlay is hidden if `element` owns it.
    ///
    /// Leaving an element that no longer exists is not an error.
    pub fn pointer_leave(&mut self, element: ElementId) -> bool {
        self.overlays.hide(element)
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlays.current()
    }

    /// Number of overlay nodes in the document, zero or one
    pub fn overlay_count(&self) -> usize {
        self.overlays.node_count()
    }

    /// Nodes living outside every render root
    pub fn nodes_outside_roots(&self) -> usize {
        self.overlay_count()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Size::new(1440.0, 900.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BLACK;

    fn scene_with_tooltips(count: usize) -> Scene {
        let mut scene = Scene::new(Size::default());
        for i in 0..count {
            let x = i as FloatValue * 10.0;
            scene.draw(Mark::rect(x, 0.0, 8.0, 8.0).tooltip(format!("bar {i}")));
        }
        scene.draw(Mark::text(0.0, 0.0, "title").class("title"));
        scene
    }

    #[test]
    fn commit_replaces_elements() {
        let mut document = Document::default();
        let root = document.create_root(Size::default());
        assert_eq!(document.commit(root, scene_with_tooltips(3)).unwrap(), 1);
        let first: Vec<ElementId> = document
            .elements(root)
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(first.len(), 4);

        assert_eq!(document.commit(root, scene_with_tooltips(1)).unwrap(), 2);
        assert_eq!(document.elements(root).unwrap().len(), 2);
        assert!(document.element(first[0]).is_none());
        assert_eq!(document.element_count(), 2);
    }

    #[test]
    fn scene_clear_discards_marks() {
        let mut scene = scene_with_tooltips(2);
        scene.clear();
        assert!(scene.is_empty());
        scene.draw(Mark::circle(1.0, 1.0, 3.0).fill(BLACK).class("dot"));
        assert_eq!(scene.with_class("dot").count(), 1);
    }

    #[test]
    fn unknown_root() {
        let mut document = Document::default();
        let root = document.create_root(Size::default());
        document.remove_root(root).unwrap();
        assert!(matches!(
            document.commit(root, Scene::default()),
            Err(ClimvizError::UnknownRoot(0))
        ));
        assert!(document.remove_root(root).is_err());
    }

    #[test]
    fn hover_without_tooltip_creates_nothing() {
        let mut document = Document::default();
        let root = document.create_root(Size::default());
        document.commit(root, scene_with_tooltips(1)).unwrap();
        let title = document.elements(root).unwrap()[1].0;
        assert!(!document.pointer_enter(title, Point::new(5.0, 5.0)).unwrap());
        assert_eq!(document.overlay_count(), 0);
    }

    #[test]
    fn redraw_hides_overlay_and_unmount_removes_it() {
        let mut document = Document::default();
        let root = document.create_root(Size::default());
        document.commit(root, scene_with_tooltips(2)).unwrap();
        let bar = document.elements(root).unwrap()[0].0;

        assert!(document.pointer_enter(bar, Point::new(100.0, 100.0)).unwrap());
        assert!(document.overlay().unwrap().is_visible());

        document.commit(root, scene_with_tooltips(2)).unwrap();
        assert_eq!(document.overlay_count(), 1);
        assert!(!document.overlay().unwrap().is_visible());
        assert!(matches!(
            document.pointer_move(bar, Point::new(1.0, 1.0)),
            Err(ClimvizError::UnknownElement(_))
        ));

        document.remove_root(root).unwrap();
        assert_eq!(document.nodes_outside_roots(), 0);
    }

    #[test]
    fn element_id_display() {
        assert_eq!(ElementId(7).to_string(), "#7");
        assert_eq!(RootId(2).to_string(), "root#2");
    }
}
