//! The drawable bitmap surface.
//!
//! A [`DrawingSurface`] owns an RGBA8 bitmap with a transparent background.
//! Strokes are painted as solid black segments with rounded caps by stamping
//! discs along the segment. The live bitmap keeps its transparency; export
//! composites a scratch copy onto opaque white (see [`super::export`]).

/// A canvas-relative coordinate, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Default canvas dimensions, matching the fixed 500x500 export contract.
pub const DEFAULT_SIZE: u32 = 500;

/// Default stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// A persistent RGBA8 bitmap with stroke painting.
pub struct DrawingSurface {
    width: u32,
    height: u32,
    /// Row-major RGBA8, all zero (fully transparent black) when empty
    pixels: Vec<u8>,
    stroke_width: f32,
}

impl DrawingSurface {
    /// Creates a transparent surface.
    pub fn new(width: u32, height: u32, stroke_width: f32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width * height * 4) as usize],
            stroke_width: stroke_width.max(1.0),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA8 buffer, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Erases the bitmap back to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        tracing::debug!("Surface cleared");
    }

    /// True iff at least one pixel differs from the all-zero initial state.
    ///
    /// Inspects the full raw pixel buffer; O(width * height) is fine at the
    /// target resolution.
    pub fn has_content(&self) -> bool {
        self.pixels.iter().any(|&byte| byte != 0)
    }

    /// Paints a stroke segment from `from` to `to` in solid black with
    /// rounded caps.
    pub fn draw_segment(&mut self, from: Point, to: Point) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = (dx * dx + dy * dy).sqrt();
        let radius = self.stroke_width / 2.0;

        // Stamping at half-pixel steps keeps the segment gap-free at any angle
        let steps = (length * 2.0).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = from.x + dx * t;
            let y = from.y + dy * t;
            self.stamp_disc(x, y, radius);
        }
    }

    /// Fills a disc of the given radius, clipped to the surface bounds.
    fn stamp_disc(&mut self, cx: f32, cy: f32, radius: f32) {
        let min_x = (cx - radius).floor().max(0.0) as i64;
        let max_x = (cx + radius).ceil().min((self.width - 1) as f32) as i64;
        let min_y = (cy - radius).floor().max(0.0) as i64;
        let max_y = (cy + radius).ceil().min((self.height - 1) as f32) as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    let offset = ((y as u32 * self.width + x as u32) * 4) as usize;
                    // Solid black, fully opaque
                    self.pixels[offset] = 0;
                    self.pixels[offset + 1] = 0;
                    self.pixels[offset + 2] = 0;
                    self.pixels[offset + 3] = 255;
                }
            }
        }
    }

    /// Alpha value of the pixel at (x, y); zero outside the surface.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[((y * self.width + x) * 4 + 3) as usize]
    }

    /// Composites the bitmap over an opaque white background into a fresh
    /// RGB8 buffer, leaving the live surface untouched.
    pub fn composite_on_white(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);

        for pixel in self.pixels.chunks_exact(4) {
            let alpha = pixel[3] as u32;
            let inverse = 255 - alpha;
            for channel in 0..3 {
                let value = (pixel[channel] as u32 * alpha + 255 * inverse) / 255;
                rgb.push(value as u8);
            }
        }

        rgb
    }
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_SIZE, DEFAULT_STROKE_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_surface_is_empty() {
        let surface = DrawingSurface::default();
        assert_eq!(surface.width(), 500);
        assert_eq!(surface.height(), 500);
        assert!(!surface.has_content());
    }

    #[test]
    fn test_stroke_then_clear_round_trip() {
        let mut surface = DrawingSurface::default();

        surface.draw_segment(Point::new(10.0, 10.0), Point::new(50.0, 50.0));
        assert!(surface.has_content());
        // The painted diagonal passes through its midpoint
        assert_eq!(surface.alpha_at(30, 30), 255);

        surface.clear();
        assert!(!surface.has_content());
    }

    #[test]
    fn test_segment_is_gap_free() {
        let mut surface = DrawingSurface::default();
        surface.draw_segment(Point::new(0.0, 0.0), Point::new(100.0, 0.0));

        for x in 0..=100 {
            assert_eq!(surface.alpha_at(x, 0), 255, "gap at x={x}");
        }
    }

    #[test]
    fn test_strokes_clip_to_bounds() {
        let mut surface = DrawingSurface::new(20, 20, 2.0);
        // Runs well past the right edge; must not panic or wrap
        surface.draw_segment(Point::new(10.0, 10.0), Point::new(200.0, 10.0));
        assert!(surface.has_content());
        assert_eq!(surface.alpha_at(19, 10), 255);
        assert_eq!(surface.alpha_at(0, 0), 0);
    }

    #[test]
    fn test_white_composite_preserves_the_live_bitmap() {
        let mut surface = DrawingSurface::new(4, 4, 2.0);
        surface.draw_segment(Point::new(1.0, 1.0), Point::new(1.0, 1.0));

        let rgb = surface.composite_on_white();
        assert_eq!(rgb.len(), 4 * 4 * 3);

        // Untouched pixels flatten to opaque white
        let corner = &rgb[(3 * 4 + 3) * 3..(3 * 4 + 3) * 3 + 3];
        assert_eq!(corner, &[255, 255, 255]);

        // The live surface still has a transparent background
        assert_eq!(surface.alpha_at(3, 3), 0);
    }
}
