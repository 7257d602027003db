//! Pointer interaction state machine for the drawing surface.
//!
//! Two states: `Idle` and `Stroking`. A pointer-down begins a path at the
//! canvas-relative coordinate, each pointer-move while stroking paints the
//! segment from the previous point immediately, and pointer-up or leaving
//! the surface closes the path. The host UI is responsible for resolving
//! device coordinates to canvas space and for intercepting platform
//! gestures while interacting with the surface.

use super::surface::{DrawingSurface, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    Stroking,
}

/// Tracks the in-progress stroke.
#[derive(Debug, Default)]
pub struct PointerTracker {
    phase: PointerPhase,
    last_point: Option<Point>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn is_stroking(&self) -> bool {
        self.phase == PointerPhase::Stroking
    }

    /// Begins a new path at `point`. Paint happens on the first move, so a
    /// press with no movement leaves the bitmap unchanged.
    pub fn pointer_down(&mut self, point: Point) {
        self.phase = PointerPhase::Stroking;
        self.last_point = Some(point);
    }

    /// Extends the current path to `point`, painting the segment. Ignored
    /// while idle.
    pub fn pointer_move(&mut self, surface: &mut DrawingSurface, point: Point) {
        if self.phase != PointerPhase::Stroking {
            return;
        }
        if let Some(last) = self.last_point {
            surface.draw_segment(last, point);
        }
        self.last_point = Some(point);
    }

    /// Closes the current path.
    pub fn pointer_up(&mut self) {
        self.phase = PointerPhase::Idle;
        self.last_point = None;
    }

    /// Leaving the surface closes the path the same way a release does.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_without_movement_paints_nothing() {
        let surface = DrawingSurface::default();
        let mut tracker = PointerTracker::new();

        tracker.pointer_down(Point::new(10.0, 10.0));
        assert!(tracker.is_stroking());
        tracker.pointer_up();

        assert!(!surface.has_content());
        assert_eq!(tracker.phase(), PointerPhase::Idle);
    }

    #[test]
    fn test_drag_paints_a_continuous_stroke() {
        let mut surface = DrawingSurface::default();
        let mut tracker = PointerTracker::new();

        tracker.pointer_down(Point::new(10.0, 10.0));
        tracker.pointer_move(&mut surface, Point::new(30.0, 30.0));
        tracker.pointer_move(&mut surface, Point::new(50.0, 50.0));
        tracker.pointer_up();

        assert!(surface.has_content());
        assert_eq!(surface.alpha_at(10, 10), 255);
        assert_eq!(surface.alpha_at(30, 30), 255);
        assert_eq!(surface.alpha_at(50, 50), 255);
    }

    #[test]
    fn test_moves_while_idle_are_ignored() {
        let mut surface = DrawingSurface::default();
        let mut tracker = PointerTracker::new();

        tracker.pointer_move(&mut surface, Point::new(100.0, 100.0));
        assert!(!surface.has_content());
    }

    #[test]
    fn test_leave_closes_the_path() {
        let mut surface = DrawingSurface::default();
        let mut tracker = PointerTracker::new();

        tracker.pointer_down(Point::new(10.0, 10.0));
        tracker.pointer_leave();
        assert!(!tracker.is_stroking());

        // A move after leaving must not connect back to the old path
        tracker.pointer_move(&mut surface, Point::new(200.0, 200.0));
        assert!(!surface.has_content());
    }
}
