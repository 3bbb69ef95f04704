use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position on the canvas that produced it, in that canvas' pixels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn scaled(self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            x: self.x * scale_x,
            y: self.y * scale_y,
        }
    }
}

/// Width (`x`) and height (`y`) of a canvas.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub x: f64,
    pub y: f64,
}

impl Extent {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn validate(self) -> Result<Self, GeometryError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(GeometryError::NonFiniteExtent);
        }
        if self.x <= 0.0 || self.y <= 0.0 {
            return Err(GeometryError::DegenerateExtent {
                x: self.x,
                y: self.y,
            });
        }
        Ok(self)
    }

    /// Pixel dimensions, rounded to the nearest whole pixel.
    pub fn to_pixels(self) -> (u32, u32) {
        (to_pixel_count(self.x), to_pixel_count(self.y))
    }
}

fn to_pixel_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("canvas extent {x}x{y} has a zero or negative side")]
    DegenerateExtent { x: f64, y: f64 },
    #[error("canvas extent is not finite")]
    NonFiniteExtent,
    #[error("stroke coordinate is not finite")]
    NonFinitePoint,
}

/// One incremental line segment of freehand drawing.
///
/// `source_extent` is the size of the sender's canvas at capture time and is
/// carried on the wire as `size`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub from: Point,
    pub to: Point,
    #[serde(rename = "size")]
    pub source_extent: Extent,
}

/// A stroke expressed in the receiver's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Stroke {
    pub fn new(from: Point, to: Point, source_extent: Extent) -> Self {
        Self {
            from,
            to,
            source_extent,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.source_extent.validate()?;
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(GeometryError::NonFinitePoint);
        }
        Ok(())
    }

    /// Maps both endpoints from the sender's canvas onto a canvas of
    /// `receiver` size. Computed per call: the receiver may have been resized
    /// since the previous stroke.
    pub fn normalized_to(&self, receiver: Extent) -> Result<Segment, GeometryError> {
        self.validate()?;
        let (scale_x, scale_y) = scale_factors(self.source_extent, receiver)?;
        Ok(Segment {
            from: self.from.scaled(scale_x, scale_y),
            to: self.to.scaled(scale_x, scale_y),
        })
    }
}

pub fn scale_factors(sender: Extent, receiver: Extent) -> Result<(f64, f64), GeometryError> {
    let sender = sender.validate()?;
    let receiver = receiver.validate()?;
    Ok((receiver.x / sender.x, receiver.y / sender.y))
}
