//! Generation-time reachability test
//!
//! A bounding test on the jump, not a simulation of the arc. O(1) per
//! candidate. A gap that passes may still demand near-optimal play; that is
//! accepted difficulty.

use super::envelope::MovementEnvelope;
use super::geom::Aabb;
use crate::consts::MIN_PLATFORM_GAP;

/// Can the player get from the top of `from` onto `to`?
///
/// `dx` is measured from `from`'s right edge to `to`'s left edge and `dy` is
/// positive when `to` sits higher.
pub fn can_reach(from: &Aabb, to: &Aabb, envelope: &MovementEnvelope) -> bool {
    let dx = to.left() - from.right();
    let dy = from.top() - to.top();

    if dx < MIN_PLATFORM_GAP || dx > envelope.max_dist {
        return false;
    }
    if dy > envelope.max_up {
        return false;
    }
    if dy < -envelope.max_down {
        return false;
    }
    true
}
