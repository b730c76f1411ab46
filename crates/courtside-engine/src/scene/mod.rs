//! Scene snapshot types and the scene-builder boundary.
//!
//! The engine does not know what a bracket (or anything else) is. A
//! collaborator implementing [`SceneSource`] hands the render loop an
//! immutable-for-the-frame [`SceneSnapshot`] once per tick; the render pass
//! executor draws exactly what the snapshot says.

use std::sync::{Arc, Mutex};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// One renderable quad, addressed in world space.
///
/// `right` and `up` are half-extent vectors: the quad's corners are
/// `center ± right ± up`. Axis-aligned cards and arbitrarily oriented
/// connector segments both reduce to this form, so a single instanced
/// pipeline draws the whole scene.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    pub center: [f32; 3],
    pub right: [f32; 3],
    pub up: [f32; 3],
    pub color: [f32; 4],
}

impl QuadInstance {
    /// A quad lying in the world XY plane.
    pub fn axis_aligned(center: Vec3, half_extent: Vec2, color: [f32; 4]) -> Self {
        Self {
            center: center.to_array(),
            right: [half_extent.x, 0.0, 0.0],
            up: [0.0, half_extent.y, 0.0],
            color,
        }
    }

    /// A thin quad spanning `from` → `to`, `half_thickness` tall in Y.
    pub fn segment(from: Vec3, to: Vec3, half_thickness: f32, color: [f32; 4]) -> Self {
        let center = (from + to) * 0.5;
        let half_dir = (to - from) * 0.5;
        Self {
            center: center.to_array(),
            right: half_dir.to_array(),
            up: [0.0, half_thickness, 0.0],
            color,
        }
    }
}

/// Immutable-for-the-frame view of the renderable scene.
///
/// The render pass executor holds a snapshot only for the duration of one
/// frame and never mutates it.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    /// Linear RGBA clear color.
    pub clear_color: [f32; 4],

    /// Combined view-projection matrix for the frame's camera.
    pub view_projection: Mat4,

    /// Everything to draw this frame.
    pub quads: Vec<QuadInstance>,
}

impl SceneSnapshot {
    /// An empty scene: black clear, identity camera, nothing to draw.
    pub fn empty() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            view_projection: Mat4::IDENTITY,
            quads: Vec::new(),
        }
    }
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Scene-builder collaborator boundary.
///
/// Called once per frame on the rendering thread. Implementations own their
/// scene state (layout, animation clocks) and produce a self-contained
/// snapshot; the engine never reaches past this trait.
pub trait SceneSource: Send {
    fn current_snapshot(&mut self) -> SceneSnapshot;
}

/// Hosts that keep a handle to their scene (to feed it resize or data
/// updates) can hand the controller a shared reference directly.
impl<S: SceneSource> SceneSource for Arc<Mutex<S>> {
    fn current_snapshot(&mut self) -> SceneSnapshot {
        self.lock().unwrap().current_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── quad construction ─────────────────────────────────────────────────

    #[test]
    fn axis_aligned_quad_spans_half_extents() {
        let q = QuadInstance::axis_aligned(
            Vec3::new(1.0, 2.0, -3.0),
            Vec2::new(0.7, 0.175),
            [1.0, 0.0, 0.0, 1.0],
        );
        assert_eq!(q.center, [1.0, 2.0, -3.0]);
        assert_eq!(q.right, [0.7, 0.0, 0.0]);
        assert_eq!(q.up, [0.0, 0.175, 0.0]);
    }

    #[test]
    fn segment_quad_centers_on_midpoint() {
        let q = QuadInstance::segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, -0.8),
            0.02,
            [0.8, 0.8, 0.8, 1.0],
        );
        assert_eq!(q.center, [1.0, 0.5, -0.4]);
        assert_eq!(q.right, [1.0, 0.5, -0.4]);
        assert_eq!(q.up, [0.0, 0.02, 0.0]);
    }

    #[test]
    fn instance_layout_is_tightly_packed() {
        // The GPU vertex layout assumes 13 consecutive f32s per instance.
        assert_eq!(std::mem::size_of::<QuadInstance>(), 13 * 4);
    }
}
