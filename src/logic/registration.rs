//! Registration and capacity: active seats, FIFO waitlist, promotion and repair.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Entrant, Registration, RegistrationId, RegistrationStatus, TournamentId, TournamentStatus,
};
use crate::store::Repository;

fn active_count(regs: &[Registration]) -> usize {
    regs.iter()
        .filter(|r| r.status == RegistrationStatus::Active)
        .count()
}

/// Enter a tournament (Draft only). Active while seats remain, otherwise waitlisted.
pub fn register<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    mut entrant: Entrant,
) -> EngineResult<Registration> {
    let tournament = store.tournament(tournament_id)?;
    tournament.require_status(TournamentStatus::Draft)?;

    entrant.display_name = entrant.display_name.trim().to_string();
    if let Some(player_id) = entrant.player_id {
        let player = store.player(player_id)?;
        if entrant.display_name.is_empty() {
            entrant.display_name = player.name;
        }
        if entrant.club.is_none() {
            entrant.club = player.club;
        }
    }
    if entrant.display_name.is_empty() {
        return Err(EngineError::EmptyName);
    }

    let regs = store.registrations(tournament_id);
    if let Some(player_id) = entrant.player_id {
        let duplicate = regs
            .iter()
            .any(|r| r.player_id == Some(player_id) && r.status != RegistrationStatus::Withdrawn);
        if duplicate {
            return Err(EngineError::AlreadyRegistered(player_id));
        }
    }

    let status = if active_count(&regs) < tournament.settings.capacity as usize {
        RegistrationStatus::Active
    } else {
        RegistrationStatus::Waitlist
    };
    let admission_order = regs.iter().map(|r| r.admission_order + 1).max().unwrap_or(0);
    let registration = Registration::new(tournament_id, entrant, admission_order, status);
    log::info!(
        "Registered {} in tournament {} as {:?}",
        registration.display_name,
        tournament_id,
        status
    );
    store.save_registration(registration.clone());
    Ok(registration)
}

/// Promote the oldest waitlisted registrations while seats are free. Returns the promoted.
fn fill_vacancies<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    capacity: usize,
) -> Vec<Registration> {
    let regs = store.registrations(tournament_id);
    let free = capacity.saturating_sub(active_count(&regs));
    let promoted: Vec<Registration> = regs
        .into_iter()
        .filter(|r| r.status == RegistrationStatus::Waitlist)
        .take(free)
        .map(|mut r| {
            r.status = RegistrationStatus::Active;
            r
        })
        .collect();
    for r in &promoted {
        log::info!("Promoted {} from the waitlist of {}", r.display_name, tournament_id);
        store.save_registration(r.clone());
    }
    promoted
}

fn remove<R: Repository>(
    store: &mut R,
    registration_id: RegistrationId,
    status: RegistrationStatus,
) -> EngineResult<Vec<Registration>> {
    let mut registration = store.registration(registration_id)?;
    let tournament = store.tournament(registration.tournament_id)?;
    let was_active = registration.status == RegistrationStatus::Active;

    match (registration.status, status) {
        (current, _) if current == status => return Ok(Vec::new()),
        (RegistrationStatus::Active | RegistrationStatus::Waitlist, _) => {}
        (RegistrationStatus::Eliminated, RegistrationStatus::Disqualified) => {}
        (from, to) => {
            return Err(EngineError::StatusTransition {
                registration: registration_id,
                from,
                to,
            })
        }
    }
    if status == RegistrationStatus::Withdrawn {
        tournament.require_status(TournamentStatus::Draft)?;
    }

    registration.status = status;
    store.save_registration(registration);

    if was_active && tournament.status == TournamentStatus::Draft {
        Ok(fill_vacancies(store, tournament.id, tournament.settings.capacity as usize))
    } else {
        Ok(Vec::new())
    }
}

/// Leave a draft tournament. Frees the seat for the oldest waitlisted entry.
pub fn withdraw<R: Repository>(
    store: &mut R,
    registration_id: RegistrationId,
) -> EngineResult<Vec<Registration>> {
    remove(store, registration_id, RegistrationStatus::Withdrawn)
}

/// Bar a registration. In Draft this frees the seat like `withdraw`.
pub fn disqualify<R: Repository>(
    store: &mut R,
    registration_id: RegistrationId,
) -> EngineResult<Vec<Registration>> {
    remove(store, registration_id, RegistrationStatus::Disqualified)
}

/// Re-derive active/waitlist from admission order, ignoring whatever status is stored.
pub fn reconcile<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
) -> EngineResult<Vec<Registration>> {
    let tournament = store.tournament(tournament_id)?;
    tournament.require_status(TournamentStatus::Draft)?;
    let capacity = tournament.settings.capacity as usize;

    let mut entries: Vec<_> = store
        .registrations(tournament_id)
        .into_iter()
        .filter(|r| r.status.is_entry())
        .collect();
    entries.sort_by_key(|r| (r.admission_order, r.registered_at));

    let mut changed = 0;
    for (i, r) in entries.iter_mut().enumerate() {
        let status = if i < capacity {
            RegistrationStatus::Active
        } else {
            RegistrationStatus::Waitlist
        };
        if r.status != status {
            r.status = status;
            changed += 1;
            store.save_registration(r.clone());
        }
    }
    if changed > 0 {
        log::info!("Reconciled {} registration(s) of {}", changed, tournament_id);
    }
    Ok(entries)
}
