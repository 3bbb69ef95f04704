use doodleguess_shared::raster::resample_rgba;
use doodleguess_shared::{Extent, Point};
use log::warn;
use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::surface::Surface;

const LINE_WIDTH: f64 = 2.0;

/// The on-page `<canvas>` as a drawing surface.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        let surface = Self { canvas, ctx };
        surface.apply_pen();
        surface
    }

    /// Setting the canvas size resets the context, so this runs after every resize.
    fn apply_pen(&self) {
        self.ctx.set_line_width(LINE_WIDTH);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_stroke_style_str("#000");
    }

    fn snapshot(&self) -> Result<Option<Vec<u8>>, JsValue> {
        let (width, height) = (self.canvas.width(), self.canvas.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, width as f64, height as f64)?;
        Ok(Some(image.data().0))
    }

    fn restore(&self, pixels: &[u8], width: u32, height: u32) -> Result<(), JsValue> {
        let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(pixels), width, height)?;
        self.ctx.put_image_data(&image, 0.0, 0.0)
    }
}

impl Surface for CanvasSurface {
    fn extent(&self) -> Extent {
        Extent::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn clear(&mut self) {
        let extent = self.extent();
        self.ctx.clear_rect(0.0, 0.0, extent.x, extent.y);
    }

    fn resize(&mut self, extent: Extent) {
        let (old_width, old_height) = (self.canvas.width(), self.canvas.height());
        let (width, height) = extent.to_pixels();
        if (width, height) == (old_width, old_height) {
            return;
        }
        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("could not read canvas pixels: {error:?}");
                None
            }
        };

        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.apply_pen();

        let Some(pixels) = snapshot else {
            return;
        };
        let Some(resampled) = resample_rgba(old_width, old_height, pixels, width, height) else {
            warn!("canvas snapshot has an unexpected size");
            return;
        };
        if let Err(error) = self.restore(&resampled, width, height) {
            warn!("could not restore canvas pixels: {error:?}");
        }
    }
}
