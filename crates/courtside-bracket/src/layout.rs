//! Deterministic 3D placement of a bracket.
//!
//! Rounds march left to right along X, matchups stack along Y, and each
//! round steps back in Z so the bracket reads as a staggered wall of cards.
//! Connector segments run from every matchup card to its successor in the
//! next round.

use glam::{Vec2, Vec3};

use courtside_engine::scene::QuadInstance;

use crate::data::Bracket;

/// Card and spacing dimensions, in world units.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    pub card_width: f32,
    pub card_height: f32,
    /// X distance between consecutive rounds.
    pub round_spacing: f32,
    /// Y distance between matchups within a round.
    pub matchup_spacing: f32,
    /// Z step backward per round.
    pub round_depth: f32,
    /// Half thickness of connector segments.
    pub connector_thickness: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            card_width: 1.4,
            card_height: 0.35,
            round_spacing: 2.0,
            matchup_spacing: 1.0,
            round_depth: 0.8,
            connector_thickness: 0.02,
        }
    }
}

/// Card colors by round, cycling on overflow.
pub const ROUND_COLORS: [[f32; 4]; 3] = [
    [0.298, 0.686, 0.314, 1.0], // green
    [0.129, 0.588, 0.953, 1.0], // blue
    [1.0, 0.596, 0.0, 1.0],     // orange
];

/// Decided matchups render gold.
pub const WINNER_COLOR: [f32; 4] = [1.0, 0.843, 0.0, 1.0];

/// Connector segments.
pub const CONNECTOR_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Dark blue-gray backdrop behind the bracket.
pub const BACKGROUND_COLOR: [f32; 4] = [0.1, 0.1, 0.15, 1.0];

/// The bracket reduced to renderable quads.
#[derive(Debug, Clone, Default)]
pub struct BracketLayout {
    pub cards: Vec<QuadInstance>,
    pub connectors: Vec<QuadInstance>,
}

impl BracketLayout {
    /// Everything to draw, cards first.
    pub fn quads(&self) -> Vec<QuadInstance> {
        let mut all = Vec::with_capacity(self.cards.len() + self.connectors.len());
        all.extend_from_slice(&self.cards);
        all.extend_from_slice(&self.connectors);
        all
    }
}

/// World-space center of one matchup card.
pub fn card_center(
    params: &LayoutParams,
    total_rounds: usize,
    round: usize,
    matchups_in_round: usize,
    matchup: usize,
) -> Vec3 {
    let x = (round as f32 - (total_rounds as f32 - 1.0) / 2.0) * params.round_spacing;
    let total_height = (matchups_in_round as f32 - 1.0) * params.matchup_spacing;
    let y = matchup as f32 * params.matchup_spacing - total_height / 2.0;
    let z = -(round as f32) * params.round_depth;
    Vec3::new(x, y, z)
}

/// Lays out the whole bracket.
pub fn layout(bracket: &Bracket, params: &LayoutParams) -> BracketLayout {
    let total_rounds = bracket.rounds.len();
    let half_card = Vec2::new(params.card_width / 2.0, params.card_height / 2.0);

    let mut out = BracketLayout::default();

    for (round_idx, round) in bracket.rounds.iter().enumerate() {
        let count = round.matchups.len();
        for (matchup_idx, matchup) in round.matchups.iter().enumerate() {
            let center = card_center(params, total_rounds, round_idx, count, matchup_idx);
            let color = if matchup.is_decided() {
                WINNER_COLOR
            } else {
                ROUND_COLORS[round_idx % ROUND_COLORS.len()]
            };
            out.cards
                .push(QuadInstance::axis_aligned(center, half_card, color));
        }
    }

    // One segment per feeding matchup: right edge of the source card to the
    // left edge of its successor.
    for round_idx in 0..total_rounds.saturating_sub(1) {
        let current_count = bracket.rounds[round_idx].matchups.len();
        let next_count = bracket.rounds[round_idx + 1].matchups.len();

        for next_idx in 0..next_count {
            for source_idx in [next_idx * 2, next_idx * 2 + 1] {
                if source_idx >= current_count {
                    continue;
                }

                let from = card_center(params, total_rounds, round_idx, current_count, source_idx)
                    + Vec3::new(params.card_width / 2.0, 0.0, 0.0);
                let to = card_center(params, total_rounds, round_idx + 1, next_count, next_idx)
                    - Vec3::new(params.card_width / 2.0, 0.0, 0.0);

                out.connectors.push(QuadInstance::segment(
                    from,
                    to,
                    params.connector_thickness,
                    CONNECTOR_COLOR,
                ));
            }
        }
    }

    out
}
