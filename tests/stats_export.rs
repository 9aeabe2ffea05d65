use tempfile::TempDir;

use volleylog::{
    action::{Action, ActionKind, AttackResult, DigResult, ResultCode, ServeResult},
    config::MatchConfig,
    engine::lineup::LineupDraft,
    roster::{Role, Roster, RosterRow},
    session::MatchSession,
    stats::{GENERIC_SUBJECT, StatsTable},
    types::Team,
};

const CONFIG: &str = r#"{
    "team_names": {"a": "Lions", "b": "Hawks"},
    "roster": [
        {"name": "Ana", "number": 1, "role": "Setter"},
        {"name": "Bia", "number": 4},
        {"name": "Cris", "number": 7, "role": "Middle"},
        {"name": "Dani", "number": 9},
        {"name": "Eva", "number": 11, "role": "Middle"},
        {"name": "Fer", "number": 12},
        {"name": "Gabi", "number": 5, "role": "Libero"}
    ],
    "sets": {
        "1": {
            "starting_server": "A",
            "starting_lineup": {
                "slots": ["Ana", "Bia", "Cris", "Dani", "Eva", "Fer"],
                "libero": "Gabi"
            }
        }
    }
}"#;

fn load_session() -> MatchSession {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("match.json");
    std::fs::write(&path, CONFIG).expect("write config");
    MatchSession::new(MatchConfig::load(&path).expect("load config"))
}

#[test]
fn columns_follow_vocabulary_order() {
    let columns = StatsTable::columns();
    assert_eq!(&columns[..5], ["SRV_Point", "SRV_Good", "SRV_Regular", "SRV_Error", "SRV_Tot"]);
    assert_eq!(columns.last().map(String::as_str), Some("BLK_Tot"));
    let expected: usize = ActionKind::FUNDAMENTALS
        .iter()
        .map(|k| k.result_codes().len() + 1)
        .sum();
    assert_eq!(columns.len(), expected);
}

#[test]
fn every_roster_player_gets_a_row() {
    let mut session = load_session();
    session.record_action("Ana", Action::Serve(ServeResult::Point)).unwrap();
    session.record_action("Ana", Action::Serve(ServeResult::Good)).unwrap();
    session.record_action("Bia", Action::Attack(AttackResult::Blocked)).unwrap();
    session.record_generic(Action::OpponentPoint).unwrap();

    let table = session.stats(None);
    assert_eq!(table.rows.len(), 7);

    let ana = table.player("Ana").unwrap();
    let serve = ana.tally(ActionKind::Serve).unwrap();
    assert_eq!(serve.count(ResultCode::Point), 1);
    assert_eq!(serve.count(ResultCode::Good), 1);
    assert_eq!(serve.total, 2);
    assert_eq!(ana.values().len(), StatsTable::columns().len());

    let gabi = table.player("Gabi").unwrap();
    assert!(gabi.values().iter().all(|v| *v == 0));
    assert_eq!(
        table.player("Bia").and_then(|p| p.tally(ActionKind::Attack)).map(|t| t.count(ResultCode::Blocked)),
        Some(1)
    );
}

#[test]
fn stats_can_be_limited_to_one_set() {
    let mut session = load_session();
    session.record_action("Eva", Action::Dig(DigResult::Excellent)).unwrap();
    session.set_current_set(2).unwrap();
    session.record_action("Eva", Action::Dig(DigResult::Error)).unwrap();

    let dig = |set| {
        session
            .stats(set)
            .player("Eva")
            .and_then(|p| p.tally(ActionKind::Dig).cloned())
            .unwrap()
    };
    assert_eq!(dig(Some(1)).count(ResultCode::Excellent), 1);
    assert_eq!(dig(Some(2)).count(ResultCode::Error), 1);
    assert_eq!(dig(None).total, 2);
}

#[test]
fn event_rows_carry_team_names_and_rotation_context() {
    let mut session = load_session();
    session
        .record_action("Ana", Action::Serve(ServeResult::Error))
        .unwrap();
    session.record_generic(Action::OpponentError).unwrap();

    let rows = session.event_rows();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].team, "Lions");
    assert_eq!(rows[0].subject, "Ana");
    assert_eq!(rows[0].code, Some(ResultCode::Error));
    assert_eq!(rows[0].serving, Some(Team::A));
    assert_eq!(rows[0].rotation, "P1");

    assert_eq!(rows[1].team, "Lions");
    assert_eq!(rows[1].subject, GENERIC_SUBJECT);
    assert_eq!(rows[1].action, ActionKind::OpponentError);
    assert_eq!(rows[1].code, None);
    assert_eq!(rows[1].serving, Some(Team::B));
    assert_eq!(rows[1].rotation, "P6");
}

#[test]
fn roster_rows_are_normalized() {
    let rows = vec![
        RosterRow {
            number: " 3 ".into(),
            name: "  Ana ".into(),
            role: "setter".into(),
        },
        RosterRow {
            number: "x".into(),
            name: "Bia".into(),
            role: String::new(),
        },
        RosterRow {
            number: "8".into(),
            name: "   ".into(),
            role: "Middle".into(),
        },
    ];
    let roster = Roster::from_rows(rows).unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster.get("Ana").map(|p| (p.number, p.role)), Some((Some(3), Role::Setter)));
    assert_eq!(roster.get("Bia").map(|p| (p.number, p.role)), Some((None, Role::Regular)));
}

#[test]
fn italian_roster_sheet_drives_the_rotation_label() {
    let sheet = [
        ("1", "Ana", "PALLEGGIATRICE"),
        ("4", "Bia", "SCHIACCIATRICE"),
        ("7", "Cris", "CENTRALE"),
        ("9", "Dani", "OPPOSTO"),
        ("11", "Eva", "CENTRALE"),
        ("12", "Fer", "SCHIACCIATRICE"),
        ("5", "Gabi", "LIBERO"),
    ];
    let rows: Vec<RosterRow> = sheet
        .iter()
        .map(|(number, name, role)| RosterRow {
            number: (*number).into(),
            name: (*name).into(),
            role: (*role).into(),
        })
        .collect();
    let roster = Roster::from_rows(rows).unwrap();
    assert_eq!(roster.role_of("Ana"), Some(Role::Setter));
    assert_eq!(roster.role_of("Eva"), Some(Role::Middle));

    let lineup = LineupDraft::new(["Ana", "Bia", "Cris", "Dani", "Eva", "Fer"], Some("Gabi"));
    let mut session = MatchSession::new(MatchConfig::new(roster, Team::A, lineup));
    assert_eq!(session.state().unwrap().rotation_label(), "P1");

    session.record_action("Ana", Action::Serve(ServeResult::Error)).unwrap();
    assert_eq!(session.state().unwrap().rotation_label(), "P6");
}
