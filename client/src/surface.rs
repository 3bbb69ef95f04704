use doodleguess_shared::{Extent, Point, Raster};

/// Something strokes can be rendered onto.
pub trait Surface {
    fn extent(&self) -> Extent;
    fn draw_segment(&mut self, from: Point, to: Point);
    /// Must be a no-op on an already blank surface.
    fn clear(&mut self);
    /// Resamples existing content to the new size.
    fn resize(&mut self, extent: Extent);
}

impl Surface for Raster {
    fn extent(&self) -> Extent {
        Raster::extent(self)
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        Raster::draw_segment(self, from, to);
    }

    fn clear(&mut self) {
        Raster::clear(self);
    }

    fn resize(&mut self, extent: Extent) {
        let (width, height) = extent.to_pixels();
        Raster::resize(self, width, height);
    }
}
