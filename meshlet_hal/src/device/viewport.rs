/// Viewport, scissor and color types, and their native-convention conversions

/// Viewport in logical (top-left origin, Y-down) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Viewport {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_y, max_y, min_z, max_z }
    }

    /// Full-depth viewport covering `width` x `height`
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, width, 0.0, height, 0.0, 1.0)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Rect {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self { min_x, max_x, min_y, max_y }
    }
}

/// Viewports and scissor rectangles of a draw
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportState {
    pub viewports: Vec<Viewport>,
    pub scissor_rects: Vec<Rect>,
}

impl ViewportState {
    /// One viewport and a matching scissor rectangle
    pub fn single(viewport: Viewport) -> Self {
        Self {
            viewports: vec![viewport],
            scissor_rects: vec![Rect::new(
                viewport.min_x as i32,
                viewport.max_x as i32,
                viewport.min_y as i32,
                viewport.max_y as i32,
            )],
        }
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ===== NATIVE CONVENTION =====

/// Viewport in the backend's convention (negative height flips Y)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeViewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl From<&Viewport> for NativeViewport {
    fn from(vp: &Viewport) -> Self {
        Self {
            x: vp.min_x,
            y: vp.max_y,
            width: vp.max_x - vp.min_x,
            height: -(vp.max_y - vp.min_y),
            min_depth: vp.min_z,
            max_depth: vp.max_z,
        }
    }
}

/// Scissor rectangle in the backend's convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<&Rect> for ScissorRect {
    fn from(rect: &Rect) -> Self {
        Self {
            x: rect.min_x,
            y: rect.min_y,
            width: rect.max_x.abs_diff(rect.min_x),
            height: rect.max_y.abs_diff(rect.min_y),
        }
    }
}

#[cfg(test)]
#[path = "viewport_tests.rs"]
mod tests;
