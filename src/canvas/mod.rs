//! Freehand drawing feature for bedtime.
//!
//! The bitmap surface, the pointer interaction state machine, PNG export,
//! and the imperative handle a host drives.

pub mod export;
pub mod pointer;
pub mod surface;

pub use pointer::{PointerPhase, PointerTracker};
pub use surface::{DrawingSurface, Point};

use std::path::{Path, PathBuf};

/// The imperative handle a parent drives to operate the drawing widget.
///
/// Wraps the surface, the pointer tracker and the download target behind
/// exactly the enumerated operations. When the surface has not been mounted
/// every operation degrades gracefully: exports return `None`, `clear` is a
/// no-op and `has_content` is false. Nothing here signals errors to the
/// parent; failures are logged.
pub struct SketchPad {
    surface: Option<DrawingSurface>,
    pointer: PointerTracker,
    download_path: PathBuf,
}

impl SketchPad {
    /// Creates a handle with a mounted surface.
    pub fn new(width: u32, height: u32, stroke_width: f32, download_path: PathBuf) -> Self {
        Self {
            surface: Some(DrawingSurface::new(width, height, stroke_width)),
            pointer: PointerTracker::new(),
            download_path,
        }
    }

    /// Creates a handle whose surface is not mounted yet.
    pub fn unmounted(download_path: PathBuf) -> Self {
        Self {
            surface: None,
            pointer: PointerTracker::new(),
            download_path,
        }
    }

    pub fn surface(&self) -> Option<&DrawingSurface> {
        self.surface.as_ref()
    }

    pub fn is_stroking(&self) -> bool {
        self.pointer.is_stroking()
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    /// Erases the bitmap; no-op if the surface is not mounted.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }

    /// True iff at least one pixel has been painted.
    pub fn has_content(&self) -> bool {
        self.surface
            .as_ref()
            .map(DrawingSurface::has_content)
            .unwrap_or(false)
    }

    /// The white-composited drawing as a data URL, `None` if unavailable.
    pub fn export_data_url(&self) -> Option<String> {
        let surface = self.surface.as_ref()?;
        match export::export_data_url(surface) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!("Canvas export failed: {e}");
                None
            }
        }
    }

    /// The white-composited drawing as a prefix-free base64 payload,
    /// `None` if unavailable.
    pub fn export_base64(&self) -> Option<String> {
        let surface = self.surface.as_ref()?;
        match export::export_base64(surface) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::error!("Canvas export failed: {e}");
                None
            }
        }
    }

    /// Saves the white-composited drawing as a PNG file at the configured
    /// download path. No-op if the surface is not mounted.
    pub fn download(&self) {
        let Some(surface) = self.surface.as_ref() else {
            tracing::warn!("Download requested with no surface mounted");
            return;
        };
        if let Err(e) = export::download(surface, &self.download_path) {
            tracing::error!("Download failed: {e}");
        }
    }

    // Pointer events, forwarded from the host with canvas-relative coords

    pub fn pointer_down(&mut self, point: Point) {
        if self.surface.is_some() {
            self.pointer.pointer_down(point);
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        if let Some(surface) = self.surface.as_mut() {
            self.pointer.pointer_move(surface, point);
        }
    }

    pub fn pointer_up(&mut self) {
        self.pointer.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.pointer_leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> SketchPad {
        SketchPad::new(500, 500, 2.0, PathBuf::from("drawing.png"))
    }

    #[test]
    fn test_handle_round_trip() {
        let mut pad = pad();
        assert!(!pad.has_content());

        pad.pointer_down(Point::new(10.0, 10.0));
        pad.pointer_move(Point::new(50.0, 50.0));
        pad.pointer_up();
        assert!(pad.has_content());

        pad.clear();
        assert!(!pad.has_content());
    }

    #[test]
    fn test_unmounted_surface_degrades_gracefully() {
        let mut pad = SketchPad::unmounted(PathBuf::from("drawing.png"));

        pad.clear();
        pad.pointer_down(Point::new(1.0, 1.0));
        pad.pointer_move(Point::new(2.0, 2.0));
        pad.download();

        assert!(!pad.has_content());
        assert!(pad.export_data_url().is_none());
        assert!(pad.export_base64().is_none());
    }

    #[test]
    fn test_export_forms_agree() {
        let mut pad = pad();
        pad.pointer_down(Point::new(10.0, 10.0));
        pad.pointer_move(Point::new(50.0, 50.0));
        pad.pointer_up();

        let payload = pad.export_base64().unwrap();
        let data_url = pad.export_data_url().unwrap();
        assert_eq!(&data_url[export::PNG_DATA_URL_PREFIX.len()..], payload);
    }
}
