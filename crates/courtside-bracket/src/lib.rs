//! Tournament bracket scene building.
//!
//! This crate is the scene-builder collaborator plugged into
//! `courtside-engine`: it owns what a bracket *is* (rounds, matchups,
//! winners), where everything sits in 3D space, and how that becomes a
//! per-frame scene snapshot. The engine knows none of this — it only sees
//! [`courtside_engine::scene::SceneSource`].

pub mod data;
pub mod layout;
pub mod scene;

pub use data::{Bracket, Matchup, Round, Side, Team};
pub use layout::{BracketLayout, LayoutParams};
pub use scene::BracketScene;
