use doodleguess_shared::{Extent, GeometryError, Point, Stroke};
use log::{debug, trace};

use crate::surface::Surface;

/// Turns pointer samples into strokes and renders strokes from both sides.
pub struct DrawingEngine<S> {
    surface: S,
    pressing: bool,
    last: Option<Point>,
}

impl<S: Surface> DrawingEngine<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            pressing: false,
            last: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.pressing = true;
        self.last = Some(at);
    }

    /// Renders the segment from the previous sample and returns it for
    /// transmission. `None` while the pointer is up.
    pub fn pointer_move(&mut self, at: Point) -> Option<Stroke> {
        if !self.pressing {
            return None;
        }
        let from = self.last.replace(at)?;
        let stroke = Stroke::new(from, at, self.surface.extent());
        if let Err(error) = stroke.validate() {
            debug!("not drawing on this canvas: {error}");
            return None;
        }
        self.surface.draw_segment(from, at);
        Some(stroke)
    }

    pub fn pointer_up(&mut self) {
        self.pressing = false;
        self.last = None;
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    pub fn apply_remote(&mut self, stroke: &Stroke) -> Result<(), GeometryError> {
        let segment = stroke.normalized_to(self.surface.extent())?;
        trace!("remote segment {segment:?}");
        self.surface.draw_segment(segment.from, segment.to);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    pub fn resize(&mut self, extent: Extent) {
        if extent.validate().is_err() {
            debug!("ignoring resize to {extent:?}");
            return;
        }
        self.surface.resize(extent);
    }
}
