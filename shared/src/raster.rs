use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::geometry::{Extent, Point};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Half the side of the square pen, in pixels.
const PEN_RADIUS: i64 = 1;

/// In-memory RGBA drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width() as f64, self.height() as f64)
    }

    pub fn draw_segment(&mut self, from: Point, to: Point) {
        let Some((from, to)) = self.clip(from, to) else {
            return;
        };
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.stamp(from.x + dx * t, from.y + dy * t);
        }
    }

    /// Liang-Barsky clip against the image grown by the pen, so the step
    /// count is bounded by the image size rather than the segment length.
    fn clip(&self, from: Point, to: Point) -> Option<(Point, Point)> {
        if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
            return None;
        }
        let margin = (PEN_RADIUS + 1) as f64;
        let (max_x, max_y) = (self.width() as f64 + margin, self.height() as f64 + margin);
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let (mut enter, mut exit) = (0.0_f64, 1.0_f64);
        let edges = [
            (-dx, from.x + margin),
            (dx, max_x - from.x),
            (-dy, from.y + margin),
            (dy, max_y - from.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > exit {
                    return None;
                }
                enter = enter.max(r);
            } else {
                if r < enter {
                    return None;
                }
                exit = exit.min(r);
            }
        }
        let at = |t: f64| Point::new(from.x + dx * t, from.y + dy * t);
        Some((at(enter), at(exit)))
    }

    fn stamp(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let (cx, cy) = (x.floor() as i64, y.floor() as i64);
        let (width, height) = (self.width() as i64, self.height() as i64);
        for py in (cy - PEN_RADIUS)..=(cy + PEN_RADIUS) {
            for px in (cx - PEN_RADIUS)..=(cx + PEN_RADIUS) {
                if (0..width).contains(&px) && (0..height).contains(&py) {
                    self.image.put_pixel(px as u32, py as u32, INK);
                }
            }
        }
    }

    /// Erases every pixel. Clearing a blank raster leaves it unchanged.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    /// Resamples the current content to the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width() && height == self.height() {
            return;
        }
        self.image = resample(&self.image, width, height);
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|pixel| *pixel == BACKGROUND)
    }

    pub fn ink_at(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|pixel| pixel[3] > 0)
    }
}

fn resample(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.width() == 0 || image.height() == 0 || width == 0 || height == 0 {
        return RgbaImage::from_pixel(width, height, BACKGROUND);
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Resamples a raw RGBA buffer, as read back from a browser canvas.
/// Returns `None` when `pixels` does not hold `width * height` RGBA pixels.
pub fn resample_rgba(
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    new_width: u32,
    new_height: u32,
) -> Option<Vec<u8>> {
    let image = RgbaImage::from_raw(width, height, pixels)?;
    Some(resample(&image, new_width, new_height).into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test_log::test]
    fn draws_ink_along_the_segment() {
        let mut raster = Raster::new(20, 20);
        raster.draw_segment(Point::new(2.0, 10.0), Point::new(17.0, 10.0));
        for x in 2..=17 {
            assert!(raster.ink_at(x, 10), "x={x}");
        }
        assert!(!raster.ink_at(10, 2));
    }

    #[test_log::test]
    fn out_of_bounds_segments_are_clipped() {
        let mut raster = Raster::new(10, 10);
        raster.draw_segment(Point::new(-50.0, -50.0), Point::new(500.0, 500.0));
        assert!(raster.ink_at(5, 5));
        assert_eq!(raster.width(), 10);
    }

    #[test_log::test]
    fn far_off_endpoints_are_clipped_before_stepping() {
        let mut raster = Raster::new(10, 10);
        raster.draw_segment(Point::new(0.0, 5.0), Point::new(1e12, 5.0));
        for x in 0..10 {
            assert!(raster.ink_at(x, 5), "x={x}");
        }

        let mut raster = Raster::new(10, 10);
        raster.draw_segment(Point::new(-1e15, -1e15), Point::new(1e15, 1e15));
        assert!(raster.ink_at(0, 0));
        assert!(raster.ink_at(9, 9));
    }

    #[test_log::test]
    fn segments_entirely_outside_draw_nothing() {
        let mut raster = Raster::new(10, 10);
        raster.draw_segment(Point::new(50.0, 0.0), Point::new(1e12, 9.0));
        raster.draw_segment(Point::new(-40.0, -40.0), Point::new(-40.0, -40.0));
        assert!(raster.is_blank());
    }

    #[test_log::test]
    fn clear_is_idempotent() {
        let mut raster = Raster::new(16, 16);
        raster.clear();
        assert!(raster.is_blank());
        assert_eq!(raster, Raster::new(16, 16));

        raster.draw_segment(Point::new(1.0, 1.0), Point::new(14.0, 14.0));
        assert!(!raster.is_blank());
        raster.clear();
        let once = raster.clone();
        raster.clear();
        assert_eq!(raster, once);
        assert!(raster.is_blank());
    }

    #[test_log::test]
    fn resize_scales_existing_content() {
        let mut raster = Raster::new(40, 40);
        raster.draw_segment(Point::new(0.0, 20.0), Point::new(39.0, 20.0));
        raster.resize(20, 20);
        assert_eq!(raster.extent(), Extent::new(20.0, 20.0));
        assert!(raster.ink_at(10, 10));
        assert!(!raster.ink_at(10, 2));
    }

    #[test_log::test]
    fn resize_to_nothing_and_back_is_blank() {
        let mut raster = Raster::new(8, 8);
        raster.draw_segment(Point::new(0.0, 0.0), Point::new(7.0, 7.0));
        raster.resize(0, 0);
        raster.resize(8, 8);
        assert!(raster.is_blank());
    }

    #[test_log::test]
    fn non_overlapping_strokes_commute() {
        let a = (Point::new(1.0, 1.0), Point::new(8.0, 1.0));
        let b = (Point::new(1.0, 15.0), Point::new(8.0, 18.0));

        let mut first = Raster::new(20, 20);
        first.draw_segment(a.0, a.1);
        first.draw_segment(b.0, b.1);

        let mut second = Raster::new(20, 20);
        second.draw_segment(b.0, b.1);
        second.draw_segment(a.0, a.1);

        assert_eq!(first, second);
    }

    #[test_log::test]
    fn resample_rgba_checks_the_buffer_length() {
        assert_eq!(resample_rgba(2, 2, vec![0; 3], 4, 4), None);
        let out = resample_rgba(2, 2, vec![0; 16], 4, 3).unwrap();
        assert_eq!(out.len(), 4 * 3 * 4);
    }
}
