//! Integration tests for registration: capacity, waitlist promotion and reconciliation.

mod common;

use common::{engine, entrant, field, settings, tournament};
use cue_tournament_web::logic::{reconcile, register, withdraw};
use cue_tournament_web::{
    EngineError, Entrant, ErrorKind, GroupFormat, MemoryStore, Repository, RegistrationStatus,
    Tournament, TournamentFormat, TournamentSettings,
};
use proptest::prelude::*;

fn small(capacity: u32) -> TournamentSettings {
    TournamentSettings {
        capacity,
        ..settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin)
    }
}

#[test]
fn registrations_beyond_capacity_are_waitlisted() {
    let engine = engine();
    let t = tournament(&engine, small(2));
    let regs = field(&engine, &t, 3);
    assert_eq!(regs[0].status, RegistrationStatus::Active);
    assert_eq!(regs[1].status, RegistrationStatus::Active);
    assert_eq!(regs[2].status, RegistrationStatus::Waitlist);
    assert_eq!(engine.active_count(t.id).unwrap(), 2);
}

#[test]
fn withdraw_promotes_oldest_waitlisted() {
    let engine = engine();
    let t = tournament(&engine, small(2));
    let regs = field(&engine, &t, 4);

    let promoted = engine.withdraw(regs[0].id).unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].id, regs[2].id);

    let now = engine.registrations(t.id).unwrap();
    assert_eq!(now[0].status, RegistrationStatus::Withdrawn);
    assert_eq!(now[2].status, RegistrationStatus::Active);
    assert_eq!(now[3].status, RegistrationStatus::Waitlist);
}

#[test]
fn withdrawing_a_waitlisted_entry_promotes_nobody() {
    let engine = engine();
    let t = tournament(&engine, small(1));
    let regs = field(&engine, &t, 3);
    assert!(engine.withdraw(regs[1].id).unwrap().is_empty());
    assert_eq!(engine.active_count(t.id).unwrap(), 1);
}

#[test]
fn disqualify_in_draft_frees_the_seat() {
    let engine = engine();
    let t = tournament(&engine, small(1));
    let regs = field(&engine, &t, 2);
    let promoted = engine.disqualify(regs[0].id).unwrap();
    assert_eq!(promoted[0].id, regs[1].id);
}

#[test]
fn withdrawn_cannot_be_disqualified() {
    let engine = engine();
    let t = tournament(&engine, small(4));
    let regs = field(&engine, &t, 2);
    engine.withdraw(regs[0].id).unwrap();
    // Repeating the same removal is a no-op.
    assert!(engine.withdraw(regs[0].id).unwrap().is_empty());
    let err = engine.disqualify(regs[0].id).unwrap_err();
    assert!(matches!(err, EngineError::StatusTransition { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn player_registers_once_under_their_own_name() {
    let engine = engine();
    let t = tournament(&engine, small(8));
    let player = engine.create_player("Raymond", Some("Club Norte".into())).unwrap();
    let entry = Entrant {
        player_id: Some(player.id),
        ..Entrant::default()
    };
    let reg = engine.register(t.id, entry.clone()).unwrap();
    assert_eq!(reg.display_name, "Raymond");
    assert_eq!(reg.club.as_deref(), Some("Club Norte"));

    let err = engine.register(t.id, entry).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRegistered(id) if id == player.id));
}

#[test]
fn blank_name_is_rejected() {
    let engine = engine();
    let t = tournament(&engine, small(8));
    let err = engine.register(t.id, entrant("   ", 1)).unwrap_err();
    assert!(matches!(err, EngineError::EmptyName));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn unknown_player_is_not_found() {
    let engine = engine();
    let t = tournament(&engine, small(8));
    let entry = Entrant {
        player_id: Some(uuid::Uuid::new_v4()),
        ..Entrant::default()
    };
    assert_eq!(engine.register(t.id, entry).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn registration_closes_once_groups_are_built() {
    let engine = engine();
    let t = tournament(&engine, small(8));
    field(&engine, &t, 4);
    engine.build_groups(t.id).unwrap();
    let err = engine.register(t.id, entrant("Late", 9)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[test]
fn reconcile_repairs_drifted_statuses() {
    let mut store = MemoryStore::new();
    let t = Tournament::new("Open", small(2));
    store.save_tournament(t.clone());
    for i in 1..=4 {
        register(&mut store, t.id, entrant(&format!("P{i}"), i)).unwrap();
    }
    // Simulate drift: everyone marked active.
    for mut r in store.registrations(t.id) {
        r.status = RegistrationStatus::Active;
        store.save_registration(r);
    }

    reconcile(&mut store, t.id).unwrap();
    let statuses: Vec<_> = store.registrations(t.id).iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            RegistrationStatus::Active,
            RegistrationStatus::Active,
            RegistrationStatus::Waitlist,
            RegistrationStatus::Waitlist,
        ]
    );
}

#[derive(Clone, Debug)]
enum Op {
    Register,
    Withdraw(usize),
    Reconcile,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Register),
        1 => (0usize..32).prop_map(Op::Withdraw),
        1 => Just(Op::Reconcile),
    ]
}

proptest! {
    #[test]
    fn active_never_exceeds_capacity(capacity in 1u32..6, ops in proptest::collection::vec(op(), 1..40)) {
        let mut store = MemoryStore::new();
        let t = Tournament::new("Open", small(capacity));
        store.save_tournament(t.clone());
        let mut registered = Vec::new();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Register => {
                    let r = register(&mut store, t.id, entrant(&format!("E{i}"), i as u32)).unwrap();
                    registered.push(r.id);
                }
                Op::Withdraw(k) if !registered.is_empty() => {
                    let id = registered[k % registered.len()];
                    withdraw(&mut store, id).unwrap();
                }
                Op::Withdraw(_) => {}
                Op::Reconcile => {
                    reconcile(&mut store, t.id).unwrap();
                }
            }

            let regs = store.registrations(t.id);
            let active = regs.iter().filter(|r| r.status == RegistrationStatus::Active).count();
            let waiting = regs.iter().filter(|r| r.status == RegistrationStatus::Waitlist).count();
            prop_assert!(active <= capacity as usize);
            // Nobody waits while a seat is free.
            prop_assert!(waiting == 0 || active == capacity as usize);
        }
    }
}
