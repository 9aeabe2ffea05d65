use volleylog::{
    action::{Action, AttackResult, ReceptionResult, ServeResult},
    config::MatchConfig,
    core::ledger::LedgerError,
    engine::{
        EngineError,
        libero::LiberoSwap,
        lineup::LineupDraft,
        rotation::RotationPolicy,
        score::Score,
    },
    event::InvalidEvent,
    roster::{Player, Role, Roster},
    session::{MatchSession, SessionError},
    state::derive_match_state,
    types::{Slot, Team},
};

fn plain_session(server: Team) -> MatchSession {
    let names = ["P1", "P2", "P3", "P4", "P5", "P6"];
    let roster = Roster::new(names.iter().map(|n| Player::new(*n, None, Role::Regular)).collect()).unwrap();
    MatchSession::new(MatchConfig::new(roster, server, LineupDraft::new(names, None)))
}

fn libero_roster() -> Roster {
    let players = [
        ("S", Role::Setter),
        ("O", Role::Regular),
        ("H1", Role::Regular),
        ("H2", Role::Regular),
        ("M1", Role::Middle),
        ("M2", Role::Middle),
        ("L", Role::Libero),
    ];
    Roster::new(
        players
            .iter()
            .enumerate()
            .map(|(i, (n, role))| Player::new(*n, Some(i as u32 + 1), *role))
            .collect(),
    )
    .unwrap()
}

fn libero_session(server: Team, slots: [&str; 6]) -> MatchSession {
    MatchSession::new(MatchConfig::new(
        libero_roster(),
        server,
        LineupDraft::new(slots, Some("L")),
    ))
}

fn slot(n: u8) -> Slot {
    Slot::new(n).unwrap()
}

fn names(state: &volleylog::state::MatchState) -> Vec<&str> {
    state.lineup.slots().iter().map(String::as_str).collect()
}

#[test]
fn point_for_serving_team_keeps_serve_and_lineup() {
    let mut session = plain_session(Team::A);
    session.record_action("P1", Action::Attack(AttackResult::Point)).unwrap();

    let state = session.state().unwrap();
    assert_eq!(state.score, Score::new(1, 0));
    assert_eq!(state.serving_team, Team::A);
    assert_eq!(names(&state), ["P1", "P2", "P3", "P4", "P5", "P6"]);
}

#[test]
fn attack_error_while_serving_is_a_side_out_with_rotation() {
    let mut session = plain_session(Team::A);
    session.record_action("P1", Action::Attack(AttackResult::Error)).unwrap();

    let state = session.state().unwrap();
    assert_eq!(state.score, Score::new(0, 1));
    assert_eq!(state.serving_team, Team::B);
    assert_eq!(names(&state), ["P2", "P3", "P4", "P5", "P6", "P1"]);
}

#[test]
fn own_team_error_matches_attack_error() {
    let mut generic = plain_session(Team::A);
    generic.record_generic(Action::OwnTeamError).unwrap();
    let mut fundamental = plain_session(Team::A);
    fundamental.record_action("P1", Action::Attack(AttackResult::Error)).unwrap();

    let a = generic.state().unwrap();
    let b = fundamental.state().unwrap();
    assert_eq!(a.score, b.score);
    assert_eq!(a.serving_team, b.serving_team);
    assert_eq!(a.lineup, b.lineup);
}

#[test]
fn removing_only_event_restores_initial_state() {
    let mut session = plain_session(Team::A);
    let initial = session.state().unwrap();
    let seq = session.record_action("P1", Action::Attack(AttackResult::Point)).unwrap();

    session.remove(seq).unwrap();
    let state = session.state().unwrap();
    assert_eq!(state.score, Score::new(0, 0));
    assert_eq!(state.serving_team, initial.serving_team);
    assert_eq!(state.lineup, initial.lineup);
    assert_eq!(state.events_in_set, 0);
}

#[test]
fn removing_a_side_out_rewinds_service_and_rotation() {
    let mut session = plain_session(Team::A);
    session.record_action("P1", Action::Attack(AttackResult::Point)).unwrap();
    let side_out = session.record_generic(Action::OpponentPoint).unwrap();
    session.record_generic(Action::OpponentError).unwrap();
    assert_eq!(session.state().unwrap().serving_team, Team::A);
    assert_eq!(names(&session.state().unwrap()), ["P3", "P4", "P5", "P6", "P1", "P2"]);

    session.remove(side_out).unwrap();
    let state = session.state().unwrap();
    assert_eq!(state.score, Score::new(2, 0));
    assert_eq!(state.serving_team, Team::A);
    assert_eq!(names(&state), ["P1", "P2", "P3", "P4", "P5", "P6"]);
    assert_eq!(state, derive_match_state(session.ledger(), session.config()).unwrap());
}

#[test]
fn quality_entries_change_nothing_but_the_count() {
    let mut session = plain_session(Team::B);
    session.record_action("P5", Action::Reception(ReceptionResult::Excellent)).unwrap();
    session.record_action("P4", Action::Attack(AttackResult::Blocked)).unwrap();
    session.record_action("P1", Action::Serve(ServeResult::Good)).unwrap();

    let state = session.state().unwrap();
    assert_eq!(state.score, Score::default());
    assert_eq!(state.serving_team, Team::B);
    assert_eq!(state.events_in_set, 3);
    assert!(session.outcomes(1).iter().all(|s| s.eval.transition.is_none()));
}

#[test]
fn receiving_team_swaps_libero_for_back_row_middle() {
    let mut session = libero_session(Team::B, ["H1", "O", "S", "M1", "M2", "H2"]);
    session.record_generic(Action::OpponentPoint).unwrap();

    let state = session.state().unwrap();
    assert_eq!(state.serving_team, Team::B);
    assert_eq!(state.lineup.occupant(slot(5)), "L");
    assert_eq!(state.lineup.replaced_by_libero(), Some("M2"));
    assert_eq!(state.lineup.occupant(slot(4)), "M1");

    let last = session.outcomes(1).last().unwrap();
    assert_eq!(
        last.eval.libero.swaps,
        vec![LiberoSwap::In {
            slot: slot(5),
            replaced: "M2".into()
        }]
    );
}

#[test]
fn libero_leaves_when_rotated_into_front_row() {
    let mut session = libero_session(Team::B, ["H1", "O", "M1", "H2", "M2", "S"]);

    session.record_generic(Action::OpponentPoint).unwrap();
    assert_eq!(names(&session.state().unwrap()), ["H1", "O", "M1", "H2", "L", "S"]);

    session.record_generic(Action::OpponentError).unwrap();
    let state = session.state().unwrap();
    assert_eq!(state.serving_team, Team::A);
    assert_eq!(names(&state), ["O", "M1", "H2", "M2", "S", "H1"]);
    assert_eq!(state.lineup.libero_slot(), None);

    session.record_generic(Action::OwnTeamError).unwrap();
    let state = session.state().unwrap();
    assert_eq!(names(&state), ["M1", "H2", "M2", "S", "H1", "O"]);
    assert_eq!(state.lineup.libero_slot(), None);
}

#[test]
fn initial_lineup_is_left_as_configured() {
    let session = libero_session(Team::B, ["H1", "O", "S", "M1", "M2", "H2"]);
    let state = session.state().unwrap();
    assert_eq!(state.lineup.libero_slot(), None);
    assert_eq!(state.rotation_label(), "P3");
}

#[test]
fn rotation_label_follows_setter() {
    let mut session = libero_session(Team::A, ["S", "O", "H1", "M1", "H2", "M2"]);
    assert_eq!(session.state().unwrap().rotation_label(), "P1");

    let seq = session.record_generic(Action::OpponentPoint).unwrap();
    let state = session.state().unwrap();
    assert_eq!(state.setter_slot, Some(slot(6)));
    assert_eq!(state.rotation_label(), "P6");

    let recorded = session.ledger().get(seq).unwrap();
    assert_eq!(recorded.snapshot.serving_team, Some(Team::A));
    assert_eq!(recorded.snapshot.setter_slot, Some(slot(1)));
}

#[test]
fn service_gain_policy_rotates_only_when_winning_serve_back() {
    let order = ["P1", "P2", "P3", "P4", "P5", "P6"];
    let roster = Roster::new(order.iter().map(|n| Player::new(*n, None, Role::Regular)).collect()).unwrap();
    let mut config = MatchConfig::new(roster, Team::A, LineupDraft::new(order, None));
    config.rotation_policy = RotationPolicy::OnServiceGain;
    let mut session = MatchSession::new(config);

    session.record_generic(Action::OpponentPoint).unwrap();
    assert_eq!(names(&session.state().unwrap()), order);

    session.record_generic(Action::OpponentError).unwrap();
    let state = session.state().unwrap();
    assert_eq!(state.serving_team, Team::A);
    assert_eq!(names(&state), ["P2", "P3", "P4", "P5", "P6", "P1"]);
}

#[test]
fn incomplete_lineup_refuses_to_record() {
    let roster = libero_roster();
    let mut draft = LineupDraft::new(["S", "O", "H1", "M1", "H2", "M2"], Some("L"));
    draft.set(slot(3), None);
    let mut session = MatchSession::new(MatchConfig::new(roster, Team::A, draft));

    let err = session.record_generic(Action::OpponentError).unwrap_err();
    assert_eq!(
        err,
        SessionError::Engine(EngineError::IncompleteLineup {
            missing: vec![slot(3)]
        })
    );
    assert!(session.ledger().is_empty());
    assert!(session.state().is_err());
}

#[test]
fn repeated_player_counts_as_incomplete_lineup() {
    let draft = LineupDraft::new(["S", "O", "H1", "M1", "H1", "M2"], Some("L"));
    let mut session = MatchSession::new(MatchConfig::new(libero_roster(), Team::A, draft));

    let err = session.record_action("S", Action::Serve(ServeResult::Point)).unwrap_err();
    assert_eq!(
        err,
        SessionError::Engine(EngineError::IncompleteLineup {
            missing: vec![slot(5)]
        })
    );
    assert!(session.ledger().is_empty());
}

#[test]
fn unknown_player_is_rejected_before_append() {
    let mut session = plain_session(Team::A);
    let err = session.record_action("Nobody", Action::Attack(AttackResult::Point)).unwrap_err();
    assert_eq!(
        err,
        SessionError::Ledger(LedgerError::InvalidEvent(InvalidEvent::UnknownPlayer("Nobody".into())))
    );
    assert!(session.ledger().is_empty());
}

#[test]
fn undo_and_redo_move_state_with_the_ledger() {
    let mut session = plain_session(Team::A);
    session.record_action("P2", Action::Serve(ServeResult::Point)).unwrap();
    session.record_action("P2", Action::Serve(ServeResult::Error)).unwrap();
    let after = session.state().unwrap();

    session.undo().unwrap();
    let undone = session.state().unwrap();
    assert_eq!(undone.score, Score::new(1, 0));
    assert_eq!(undone.serving_team, Team::A);

    session.redo().unwrap();
    assert_eq!(session.state().unwrap(), after);
}

#[test]
fn sets_are_scored_independently() {
    let mut session = plain_session(Team::A);
    session.record_action("P1", Action::Attack(AttackResult::Point)).unwrap();
    session.set_current_set(2).unwrap();
    session.record_generic(Action::OpponentPoint).unwrap();
    session.record_generic(Action::OpponentPoint).unwrap();

    let scores = session.set_scores();
    assert_eq!(scores.get(&1), Some(&Score::new(1, 0)));
    assert_eq!(scores.get(&2), Some(&Score::new(0, 2)));

    let set_two = session.state().unwrap();
    assert_eq!(set_two.current_set, 2);
    assert_eq!(set_two.serving_team, Team::B);
    assert_eq!(session.state_for_set(1).unwrap().score, Score::new(1, 0));
}
