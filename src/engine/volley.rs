use serde::{Deserialize, Serialize};

use crate::{
    config::MatchConfig,
    event::EventRecord,
    types::{SetNumber, Team},
};

use super::{
    EngineError,
    libero::{LiberoOutcome, apply_libero_rule},
    lineup::Lineup,
    rotation::{ServiceTransition, transition},
    score::{Score, rally_winner},
    traits::RallyEngine,
};

/// Score, service and lineup after some prefix of a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RallyState {
    /// Running score.
    pub score: Score,
    /// Team serving the next rally.
    pub serving_team: Team,
    /// Scouted lineup.
    pub lineup: Lineup,
}

/// What one event did to the state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RallyOutcome {
    /// `None` for quality-only entries.
    pub transition: Option<ServiceTransition>,
    /// Libero rule evaluation.
    pub libero: LiberoOutcome,
}

/// Volleyball rules over one match configuration.
#[derive(Debug, Clone)]
pub struct VolleyEngine {
    config: MatchConfig,
}

impl VolleyEngine {
    /// Engine over `config`.
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
}

impl RallyEngine for VolleyEngine {
    type State = RallyState;
    type Eval = RallyOutcome;
    type Error = EngineError;

    fn initial_state(&self, set: SetNumber) -> Result<RallyState, EngineError> {
        let set_cfg = self
            .config
            .set_config(set)
            .ok_or(EngineError::UnconfiguredSet(set))?;
        let lineup = Lineup::from_draft(&set_cfg.starting_lineup, &self.config.roster)?;
        Ok(RallyState {
            score: Score::default(),
            serving_team: set_cfg.starting_server,
            lineup,
        })
    }

    fn apply(&self, state: &mut RallyState, event: &EventRecord) -> RallyOutcome {
        let Some(winner) = rally_winner(event) else {
            return RallyOutcome {
                transition: None,
                libero: LiberoOutcome::default(),
            };
        };

        state.score.credit(winner);
        let step = transition(
            &mut state.serving_team,
            &mut state.lineup,
            winner,
            self.config.rotation_policy,
        );
        let libero = apply_libero_rule(&mut state.lineup, &self.config.roster, state.serving_team);

        RallyOutcome {
            transition: Some(step),
            libero,
        }
    }
}
