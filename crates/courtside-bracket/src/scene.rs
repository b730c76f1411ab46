//! Bracket scene source.

use std::time::Instant;

use glam::{Mat4, Vec3};

use courtside_engine::scene::{SceneSnapshot, SceneSource};

use crate::data::Bracket;
use crate::layout::{self, BACKGROUND_COLOR, LayoutParams};

/// Degrees of camera orbit per second.
const ORBIT_SPEED: f32 = 9.0;

/// Vertical field of view, degrees.
const FOV_Y: f32 = 45.0;

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Camera orbit radius and eye height around the bracket center.
const ORBIT_RADIUS: f32 = 6.0;
const EYE_HEIGHT: f32 = 0.5;

/// A bracket rendered as an orbiting wall of cards.
///
/// Layout is baked once per bracket update; `current_snapshot` only
/// recomputes the camera, so the per-frame cost is one `Vec` clone plus a
/// couple of matrix multiplies.
pub struct BracketScene {
    quads: Vec<courtside_engine::scene::QuadInstance>,
    params: LayoutParams,
    aspect: f32,
    started: Instant,
}

impl BracketScene {
    pub fn new(bracket: &Bracket) -> Self {
        Self::with_params(bracket, LayoutParams::default())
    }

    pub fn with_params(bracket: &Bracket, params: LayoutParams) -> Self {
        let quads = layout::layout(bracket, &params).quads();
        Self {
            quads,
            params,
            aspect: 1.0,
            started: Instant::now(),
        }
    }

    /// Re-bakes the layout after bracket results change.
    pub fn set_bracket(&mut self, bracket: &Bracket) {
        self.quads = layout::layout(bracket, &self.params).quads();
    }

    /// Updates the camera aspect ratio; the host calls this on view resize.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    fn view_projection(&self) -> Mat4 {
        let angle = (self.started.elapsed().as_secs_f32() * ORBIT_SPEED).to_radians();
        let eye = Vec3::new(
            ORBIT_RADIUS * angle.sin(),
            EYE_HEIGHT,
            ORBIT_RADIUS * angle.cos(),
        );

        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(FOV_Y.to_radians(), self.aspect, Z_NEAR, Z_FAR);
        projection * view
    }
}

impl SceneSource for BracketScene {
    fn current_snapshot(&mut self) -> SceneSnapshot {
        SceneSnapshot {
            clear_color: BACKGROUND_COLOR,
            view_projection: self.view_projection(),
            quads: self.quads.clone(),
        }
    }
}
