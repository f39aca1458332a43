//! Rectangle selection without a GUI.
//!
//! A selection is made with a pointer: press at one corner, drag, release at
//! the opposite corner. [`RegionSelector`] tracks that gesture and yields a
//! normalized [`Rect`] in the coordinate space the points were given in.
//! Two coordinate transforms turn such a rectangle into image pixels:
//!
//! - [`Rect::scale`]: logical screen points → physical pixels, by the
//!   device-pixel ratio. Used for region screenshots.
//! - [`map_view_to_image`]: a selection drawn on a scaled preview ("view")
//!   → pixels of the full-size image. Used by the crop tool.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid rectangle '{0}': expected X,Y,W,H")]
    Parse(String),
    #[error("invalid size '{0}': expected WxH or W,H")]
    ParseSize(String),
    #[error("selection is empty after clamping to {width}x{height}")]
    Empty { width: u32, height: u32 },
}

/// A pointer position. Signed: drags may leave the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle. `x`/`y` may be negative until clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two opposite corners, in either order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        Self {
            x: x0,
            y: y0,
            width: x1.abs_diff(x0),
            height: y1.abs_diff(y0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert logical coordinates to physical pixels. Fractions are
    /// truncated. Results saturate at the bounds of the field types.
    pub fn scale(&self, device_pixel_ratio: f64) -> Self {
        let s = |v: f64| (v * device_pixel_ratio) as i64;
        let coord = |v: f64| s(v).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let extent = |v: f64| s(v).clamp(0, u32::MAX as i64) as u32;
        Self {
            x: coord(self.x as f64),
            y: coord(self.y as f64),
            width: extent(self.width as f64),
            height: extent(self.height as f64),
        }
    }

    /// Intersect with `[0, width) x [0, height)`. `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let x0 = (self.x as i64).clamp(0, width as i64);
        let y0 = (self.y as i64).clamp(0, height as i64);
        let x1 = (self.x as i64 + self.width as i64).clamp(0, width as i64);
        let y1 = (self.y as i64 + self.height as i64).clamp(0, height as i64);
        let clamped = Self {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0).max(0) as u32,
            height: (y1 - y0).max(0) as u32,
        };
        (!clamped.is_empty()).then_some(clamped)
    }

    /// Like [`clamp_to`](Self::clamp_to), with an error naming the bounds.
    pub fn clamp_or_err(&self, width: u32, height: u32) -> Result<Self, SelectionError> {
        self.clamp_to(width, height)
            .ok_or(SelectionError::Empty { width, height })
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for Rect {
    type Err = SelectionError;

    /// Parse `X,Y,W,H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SelectionError::Parse(s.to_string());
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(err());
        };
        Ok(Rect {
            x: x.parse().map_err(|_| err())?,
            y: y.parse().map_err(|_| err())?,
            width: w.parse().map_err(|_| err())?,
            height: h.parse().map_err(|_| err())?,
        })
    }
}

/// Parse a `WxH` (or `W,H`) size.
pub fn parse_size(s: &str) -> Result<(u32, u32), SelectionError> {
    let err = || SelectionError::ParseSize(s.to_string());
    let (w, h) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(err)?;
    let w: u32 = w.trim().parse().map_err(|_| err())?;
    let h: u32 = h.trim().parse().map_err(|_| err())?;
    if w == 0 || h == 0 {
        return Err(err());
    }
    Ok((w, h))
}

/// Gesture state of a pointer-driven rectangle selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionSelector {
    #[default]
    Idle,
    Selecting {
        start: Point,
        current: Point,
    },
    Done(Rect),
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Primary button pressed: start a new selection, discarding any
    /// previous one.
    pub fn press(&mut self, at: Point) {
        *self = RegionSelector::Selecting {
            start: at,
            current: at,
        };
    }

    /// Pointer moved. Ignored unless a selection is in progress.
    pub fn drag(&mut self, to: Point) {
        if let RegionSelector::Selecting { current, .. } = self {
            *current = to;
        }
    }

    /// Primary button released. Finishes the selection and returns it.
    /// Releasing without a prior press returns `None`.
    pub fn release(&mut self, at: Point) -> Option<Rect> {
        match *self {
            RegionSelector::Selecting { start, .. } => {
                let rect = Rect::from_corners(start, at);
                *self = RegionSelector::Done(rect);
                Some(rect)
            }
            _ => None,
        }
    }

    /// Rectangle to outline while dragging.
    pub fn preview(&self) -> Option<Rect> {
        match *self {
            RegionSelector::Selecting { start, current } => {
                Some(Rect::from_corners(start, current))
            }
            RegionSelector::Done(rect) => Some(rect),
            RegionSelector::Idle => None,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, RegionSelector::Selecting { .. })
    }

    pub fn reset(&mut self) {
        *self = RegionSelector::Idle;
    }
}

/// Map a selection made on a scaled preview of size `view` onto an image of
/// size `image`.
///
/// Each axis is scaled independently by `image / view`; both corners are
/// truncated after scaling and the result is clamped to the image.
pub fn map_view_to_image(
    selection: Rect,
    view: (u32, u32),
    image: (u32, u32),
) -> Result<Rect, SelectionError> {
    let (view_w, view_h) = view;
    let (img_w, img_h) = image;
    if view_w == 0 || view_h == 0 {
        return Err(SelectionError::Empty {
            width: view_w,
            height: view_h,
        });
    }
    let sw = img_w as f64 / view_w as f64;
    let sh = img_h as f64 / view_h as f64;

    let x1 = (selection.x as f64 * sw) as i64;
    let y1 = (selection.y as f64 * sh) as i64;
    let x2 = ((selection.x as f64 + selection.width as f64) * sw) as i64;
    let y2 = ((selection.y as f64 + selection.height as f64) * sh) as i64;

    let x1 = x1.max(0);
    let y1 = y1.max(0);
    let x2 = x2.min(img_w as i64);
    let y2 = y2.min(img_h as i64);

    if x2 <= x1 || y2 <= y1 {
        return Err(SelectionError::Empty {
            width: img_w,
            height: img_h,
        });
    }
    Ok(Rect {
        x: x1 as i32,
        y: y1 as i32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}
