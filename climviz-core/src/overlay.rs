//! The shared hover tooltip.
//!
//! A document holds at most one overlay node. Hovering an element that carries
//! tooltip text removes whatever overlay exists and creates a fresh one owned by
//! that element; only the owner can move or hide it afterwards. Redrawing a root
//! hides an overlay owned by one of its elements and removing the root removes
//! the overlay altogether.

use crate::dataset::FloatValue;
use crate::document::{ElementId, Point, RootId, Size};
use serde::Serialize;
use tracing::trace;

/// Offset of the overlay's corner from the pointer
pub const POINTER_OFFSET: (FloatValue, FloatValue) = (10.0, -10.0);
/// Minimum distance between the overlay and the viewport edge
pub const VIEWPORT_MARGIN: FloatValue = 10.0;

const PADDING: FloatValue = 10.0;
const CHAR_WIDTH: FloatValue = 7.0;
const LINE_HEIGHT: FloatValue = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    owner: ElementId,
    root: RootId,
    content: String,
    position: Point,
    size: Size,
    visible: bool,
}

impl Overlay {
    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn root(&self) -> RootId {
        self.root
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Top-left corner in page coordinates
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Rough box size of `content` rendered as tooltip text
pub fn estimate_size(content: &str) -> Size {
    let lines = content.lines().count().max(1);
    let widest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Size::new(
        widest as FloatValue * CHAR_WIDTH + 2.0 * PADDING,
        lines as FloatValue * LINE_HEIGHT + 2.0 * PADDING,
    )
}

/// Position of an overlay of `size` next to `pointer`, kept inside `viewport`
pub fn place(pointer: Point, size: Size, viewport: Size) -> Point {
    let clamp = |value: FloatValue, extent: FloatValue, limit: FloatValue| {
        let max = (limit - extent - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN);
        value.clamp(VIEWPORT_MARGIN, max)
    };
    Point::new(
        clamp(pointer.x + POINTER_OFFSET.0, size.width, viewport.width),
        clamp(pointer.y + POINTER_OFFSET.1, size.height, viewport.height),
    )
}

/// Owner of the single tooltip overlay of a document
#[derive(Debug, Default)]
pub struct OverlayManager {
    current: Option<Overlay>,
    created: u64,
}

impl OverlayManager {
    /// Replace any existing overlay with a visible one owned by `owner`
    pub fn acquire(
        &mut self,
        owner: ElementId,
        root: RootId,
        content: String,
        pointer: Point,
        viewport: Size,
    ) -> &Overlay {
        if let Some(previous) = self.current.take() {
            trace!(owner = %previous.owner, "Removed overlay");
        }
        let size = estimate_size(&content);
        self.created += 1;
        trace!(owner = %owner, "Created overlay");
        self.current.insert(Overlay {
            owner,
            root,
            content,
            position: place(pointer, size, viewport),
            size,
            visible: true,
        })
    }

    /// Follow the pointer if `owner` holds the visible overlay
    pub fn reposition(&mut self, owner: ElementId, pointer: Point, viewport: Size) -> bool {
        match self.current.as_mut() {
            Some(overlay) if overlay.owner == owner && overlay.visible => {
                overlay.position = place(pointer, overlay.size, viewport);
                true
            }
            _ => false,
        }
    }

    /// Hide the overlay if `owner` holds it
    pub fn hide(&mut self, owner: ElementId) -> bool {
        match self.current.as_mut() {
            Some(overlay) if overlay.owner == owner => {
                overlay.visible = false;
                true
            }
            _ => false,
        }
    }

    /// Hide the overlay if an element of `root` holds it
    pub fn hide_root(&mut self, root: RootId) -> bool {
        match self.current.as_mut() {
            Some(overlay) if overlay.root == root => {
                overlay.visible = false;
                true
            }
            _ => false,
        }
    }

    /// Remove the overlay if an element of `root` holds it
    pub fn release_root(&mut self, root: RootId) -> bool {
        if self.current.as_ref().is_some_and(|o| o.root == root) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Overlay> {
        self.current.as_ref()
    }

    pub fn node_count(&self) -> usize {
        usize::from(self.current.is_some())
    }

    /// Number of overlays created so far
    pub fn created(&self) -> u64 {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Mark, RenderSurface, Scene};

    fn viewport() -> Size {
        Size::new(800.0, 600.0)
    }

    #[test]
    fn placement_offsets_and_clamps() {
        let size = Size::new(100.0, 40.0);
        assert_eq!(place(Point::new(200.0, 200.0), size, viewport()), Point::new(210.0, 190.0));
        // Right edge: 800 - 100 - 10
        assert_eq!(place(Point::new(790.0, 200.0), size, viewport()).x, 690.0);
        // Top edge
        assert_eq!(place(Point::new(200.0, 5.0), size, viewport()).y, 10.0);
        // Bottom edge: 600 - 40 - 10
        assert_eq!(place(Point::new(200.0, 700.0), size, viewport()).y, 550.0);
    }

    #[test]
    fn size_grows_with_lines() {
        let one = estimate_size("Germany");
        let two = estimate_size("Germany\nValue: 1,234 tons");
        assert!(two.height > one.height);
        assert!(two.width > one.width);
    }

    #[test]
    fn only_the_owner_moves_or_hides() {
        let mut document = Document::default();
        let root = document.create_root(Size::default());
        let mut scene = Scene::new(Size::default());
        scene.draw(Mark::rect(0.0, 0.0, 5.0, 5.0).tooltip("a"));
        scene.draw(Mark::rect(5.0, 0.0, 5.0, 5.0).tooltip("b"));
        document.commit(root, scene).unwrap();
        let ids: Vec<_> = document.elements(root).unwrap().iter().map(|(id, _)| *id).collect();

        document.pointer_enter(ids[0], Point::new(50.0, 50.0)).unwrap();
        assert!(!document.pointer_move(ids[1], Point::new(60.0, 60.0)).unwrap());
        assert!(!document.pointer_leave(ids[1]));
        assert!(document.overlay().unwrap().is_visible());

        document.pointer_enter(ids[1], Point::new(70.0, 70.0)).unwrap();
        assert_eq!(document.overlay_count(), 1);
        assert_eq!(document.overlay().unwrap().content(), "b");

        assert!(document.pointer_leave(ids[1]));
        assert!(!document.overlay().unwrap().is_visible());
        assert_eq!(document.overlay_count(), 1);
    }

    #[test]
    fn release_ignores_other_roots() {
        let mut manager = OverlayManager::default();
        let mut document = Document::default();
        let first = document.create_root(Size::default());
        let second = document.create_root(Size::default());
        let mut scene = Scene::new(Size::default());
        scene.draw(Mark::rect(0.0, 0.0, 5.0, 5.0).tooltip("a"));
        document.commit(first, scene).unwrap();
        let owner = document.elements(first).unwrap()[0].0;

        manager.acquire(owner, first, "a".to_string(), Point::default(), viewport());
        assert!(!manager.release_root(second));
        assert_eq!(manager.node_count(), 1);
        assert!(manager.release_root(first));
        assert_eq!(manager.node_count(), 0);
        assert_eq!(manager.created(), 1);
    }
}
