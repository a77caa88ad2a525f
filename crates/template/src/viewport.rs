//! Screen-space to template-space conversion for the editor canvas.

use serde::{Deserialize, Serialize};

use crate::TemplateError;

/// On-screen rectangle of the canvas, in screen pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// A point in unscaled template units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemplatePoint {
    pub x: f64,
    pub y: f64,
}

/// Recomputed by the host on every layout or resize; the drop logic only reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CanvasViewport {
    pub bounding_box: BoundingBox,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for CanvasViewport {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            zoom: default_zoom(),
        }
    }
}

impl CanvasViewport {
    pub fn new(bounding_box: BoundingBox, zoom: f64) -> Result<Self, TemplateError> {
        validate_zoom(zoom)?;
        Ok(Self { bounding_box, zoom })
    }

    pub fn with_zoom(self, zoom: f64) -> Result<Self, TemplateError> {
        Self::new(self.bounding_box, zoom)
    }

    pub fn resolve(&self, client_x: f64, client_y: f64) -> Result<TemplatePoint, TemplateError> {
        resolve_drop_position(client_x, client_y, &self.bounding_box, self.zoom)
    }

    /// Inverse of [`CanvasViewport::resolve`].
    pub fn to_screen(&self, point: TemplatePoint) -> Result<(f64, f64), TemplateError> {
        validate_zoom(self.zoom)?;
        Ok((
            point.x * self.zoom + self.bounding_box.left,
            point.y * self.zoom + self.bounding_box.top,
        ))
    }
}

pub fn validate_zoom(zoom: f64) -> Result<(), TemplateError> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(TemplateError::InvalidZoom(zoom))
    }
}

/// Convert a pointer position on screen into template coordinates.
///
/// `x = (client_x - left) / zoom`, `y = (client_y - top) / zoom`. Fails on a
/// non-positive or non-finite zoom instead of producing `NaN`/`Infinity`.
pub fn resolve_drop_position(
    client_x: f64,
    client_y: f64,
    bounding_box: &BoundingBox,
    zoom: f64,
) -> Result<TemplatePoint, TemplateError> {
    validate_zoom(zoom)?;
    if !client_x.is_finite() || !client_y.is_finite() {
        return Err(TemplateError::InvalidPointer(client_x, client_y));
    }
    Ok(TemplatePoint {
        x: (client_x - bounding_box.left) / zoom,
        y: (client_y - bounding_box.top) / zoom,
    })
}
