use crate::foundation::core::{Canvas, Point, Rect, Region};
use crate::param::kinds::RegionKind;
use crate::param::table::{ParamId, ParamTable};

/// Canvas plus the margins layout passes grew it by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    canvas: Canvas,
    top: u32,
    right: u32,
    bottom: u32,
    left: u32,
}

impl Viewport {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            top: 0,
            right: 0,
            bottom: 0,
            left: 0,
        }
    }

    /// Grow each side to at least the given margin. Never shrinks.
    pub fn expand(&mut self, top: u32, right: u32, bottom: u32, left: u32) {
        self.top = self.top.max(top);
        self.right = self.right.max(right);
        self.bottom = self.bottom.max(bottom);
        self.left = self.left.max(left);
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Margins as `(top, right, bottom, left)`.
    pub fn margins(&self) -> (u32, u32, u32, u32) {
        (self.top, self.right, self.bottom, self.left)
    }

    pub fn width(&self) -> u32 {
        self.canvas.width + self.left + self.right
    }

    pub fn height(&self) -> u32 {
        self.canvas.height + self.top + self.bottom
    }

    /// Where canvas `(0, 0)` sits inside the viewport.
    pub fn origin(&self) -> (i32, i32) {
        (self.left as i32, self.top as i32)
    }

    /// The part of `region` the viewport shows, or `None` when nothing of it is visible.
    pub fn clip(&self, region: Region) -> Option<Region> {
        let x0 = i64::from(region.x).max(-i64::from(self.left));
        let y0 = i64::from(region.y).max(-i64::from(self.top));
        let x1 = (i64::from(region.x) + i64::from(region.width))
            .min(i64::from(self.canvas.width) + i64::from(self.right));
        let y1 = (i64::from(region.y) + i64::from(region.height))
            .min(i64::from(self.canvas.height) + i64::from(self.bottom));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region::new(
            i32::try_from(x0).ok()?,
            i32::try_from(y0).ok()?,
            i32::try_from(x1 - x0).ok()?,
            i32::try_from(y1 - y0).ok()?,
        ))
    }

    /// Visible area in canvas coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(
            -f64::from(self.left),
            -f64::from(self.top),
            f64::from(self.canvas.width + self.right),
            f64::from(self.canvas.height + self.bottom),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Drag,
    Release,
    /// Movement with no button held.
    Hover,
}

/// Pointer input in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
}

impl PointerEvent {
    pub fn press(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Press,
            position: Point::new(x, y),
        }
    }

    pub fn drag(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Drag,
            position: Point::new(x, y),
        }
    }

    pub fn release(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Release,
            position: Point::new(x, y),
        }
    }

    pub fn hover(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Hover,
            position: Point::new(x, y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragMode {
    Move,
    Resize,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    mode: DragMode,
    anchor: Point,
    start: Region,
}

/// Selection frame the shell draws around the selected module, bound to a region input.
///
/// Drags are user edits: they go through [`crate::param::parameter::Parameter::commit`], so they
/// fire update listeners and land in undo history.
#[derive(Clone, Debug, Default)]
pub struct ResizeHandle {
    target: Option<ParamId>,
    draggable: bool,
    drag: Option<Drag>,
}

impl ResizeHandle {
    /// Corner grab area, in pixels.
    pub const GRIP: f64 = 6.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&mut self, region: ParamId, draggable: bool) {
        self.target = Some(region);
        self.draggable = draggable;
        self.drag = None;
    }

    pub fn unlink(&mut self) {
        *self = Self::default();
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
        if !draggable {
            self.drag = None;
        }
    }

    pub fn target(&self) -> Option<ParamId> {
        self.target
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn bounds(&self, table: &ParamTable) -> Option<Region> {
        table.get::<RegionKind>(self.target?)?.get_value()
    }

    /// Start a move (inside the frame) or resize (on the bottom-right grip).
    pub fn begin_drag(&mut self, table: &ParamTable, at: Point) -> bool {
        if !self.draggable {
            return false;
        }
        let Some(region) = self.bounds(table) else {
            return false;
        };
        let r = region.to_rect();
        let on_grip = (at.x - r.x1).abs() <= Self::GRIP && (at.y - r.y1).abs() <= Self::GRIP;
        let mode = if on_grip {
            DragMode::Resize
        } else if r.contains(at) {
            DragMode::Move
        } else {
            return false;
        };
        self.drag = Some(Drag {
            mode,
            anchor: at,
            start: region,
        });
        true
    }

    pub fn drag_to(&mut self, table: &mut ParamTable, at: Point) -> bool {
        let (Some(drag), Some(target)) = (self.drag, self.target) else {
            return false;
        };
        let dx = (at.x - drag.anchor.x).round() as i32;
        let dy = (at.y - drag.anchor.y).round() as i32;
        let next = match drag.mode {
            DragMode::Move => drag.start.translate(dx, dy),
            DragMode::Resize => Region {
                width: (drag.start.width + dx).max(0),
                height: (drag.start.height + dy).max(0),
                ..drag.start
            },
        };
        let Some(param) = table.get_mut::<RegionKind>(target) else {
            return false;
        };
        if param.get_value() == Some(next) {
            return false;
        }
        param.commit(next);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/handle.rs"]
mod tests;
