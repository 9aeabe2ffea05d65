//! Service possession and side-out rotation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Team;

use super::lineup::Lineup;

/// When the scouted lineup rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationPolicy {
    /// Rotate on every change of serve, whichever team gains it.
    #[default]
    EverySideOut,
    /// Rotate only when the scouted team wins the serve back.
    OnServiceGain,
}

/// Result of one service transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceTransition {
    /// Team credited with the rally.
    pub winner: Team,
    /// Service changed hands.
    pub side_out: bool,
    /// The scouted lineup rotated.
    pub rotated: bool,
}

/// Applies a decided rally to the serving team and lineup.
pub fn transition(serving: &mut Team, lineup: &mut Lineup, winner: Team, policy: RotationPolicy) -> ServiceTransition {
    if winner == *serving {
        return ServiceTransition {
            winner,
            side_out: false,
            rotated: false,
        };
    }

    *serving = winner;
    let rotated = match policy {
        RotationPolicy::EverySideOut => true,
        RotationPolicy::OnServiceGain => winner == Team::A,
    };
    if rotated {
        lineup.rotate();
    }
    debug!(serving = %winner, rotated, "side-out");

    ServiceTransition {
        winner,
        side_out: true,
        rotated,
    }
}
