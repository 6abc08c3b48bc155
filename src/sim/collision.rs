//! Collision tests between raiders and blast zones
//!
//! Geometry only; the tick pipeline applies the consequences. The tie-break
//! rule matters: a raider dies to the FIRST matching blast in insertion
//! order, and to at most one blast per tick.

use glam::Vec2;

use super::state::BlastZone;
use crate::distance;

/// True if `point` lies inside the blast's kill radius. The hit radius is the
/// current visual radius plus a fixed slack so near-misses still connect.
#[inline]
pub fn blast_contains(blast: &BlastZone, point: Vec2, slack: f32) -> bool {
    distance(blast.center, point) < blast.radius + slack
}

/// Index of the first active blast containing `point`, scanning in insertion
/// order. Returns None when no blast connects.
pub fn first_blast_hit(blasts: &[BlastZone], point: Vec2, slack: f32) -> Option<usize> {
    blasts
        .iter()
        .position(|blast| blast.active && blast_contains(blast, point, slack))
}
