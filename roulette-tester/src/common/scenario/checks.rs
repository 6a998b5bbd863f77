use anyhow::{Context, Result, ensure};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use roulette_game::{
    Domain, GameMap, MapScoped, Role, RollEventKind, RollOutcome, RouletteSession, SlotStatus,
};

use crate::logic::TesterAssets;

fn settles(session: &RouletteSession, domain: Domain) -> Vec<u64> {
    session
        .events()
        .iter()
        .filter(|e| matches!(&e.kind, RollEventKind::Settled { domain: d, .. } if *d == domain))
        .map(|e| e.at_ms)
        .collect()
}

fn stage_start(session: &RouletteSession, stage: Domain) -> Option<u64> {
    session
        .events()
        .iter()
        .find(|e| e.kind == RollEventKind::StageStarted { stage })
        .map(|e| e.at_ms)
}

fn random_role(rng: &mut SmallRng) -> Role {
    Role::ALL[rng.gen_range(0..Role::ALL.len())]
}

/// Restrict the session to exactly one role.
fn isolate_role(session: &mut RouletteSession, role: Role) {
    session.reset_roles_to_single_default();
    if role != Role::Fighter {
        session.toggle_role(role);
        session.toggle_role(Role::Fighter);
    }
}

pub fn deck_uniqueness(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = assets.session(seed);
    let size = session.set_pool_size(rng.gen_range(1..=5));

    let pool: HashSet<String> = session
        .pools()
        .characters
        .into_iter()
        .map(|c| c.id)
        .collect();
    ensure!(
        session.roll_characters() == RollOutcome::Started,
        "deck roll did not start"
    );
    session.run_until_idle();

    let deck = session.deck().deck();
    let ids: HashSet<&str> = deck.iter().map(|c| c.id.as_str()).collect();
    ensure!(ids.len() == deck.len(), "deck repeats a champion: {ids:?}");
    ensure!(
        deck.len() == pool.len().min(usize::from(size)),
        "deck holds {} cards, expected {}",
        deck.len(),
        pool.len().min(usize::from(size))
    );
    ensure!(
        ids.iter().all(|id| pool.contains(*id)),
        "deck contains a champion outside the eligible pool"
    );
    ensure!(
        session.deck().spotlight().is_none(),
        "spotlight should clear once the deck settles"
    );
    Ok(())
}

pub fn deck_clamp(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = assets.session(seed);
    let role = random_role(&mut rng);
    isolate_role(&mut session, role);
    ensure!(
        session.filters().enabled_roles().len() == 1,
        "expected only {role} enabled"
    );

    let size = usize::from(session.set_pool_size(5));
    let pool = session.pools().characters.len();
    let outcome = session.roll_characters();
    if pool == 0 {
        ensure!(
            outcome == RollOutcome::Unavailable,
            "empty {role} pool should be unavailable, got {outcome:?}"
        );
        return Ok(());
    }

    session.run_until_idle();
    let dealt = session.deck().deck().len();
    ensure!(
        dealt == pool.min(size),
        "{role}: dealt {dealt} of pool {pool} at size {size}"
    );
    ensure!(
        session.deck().status() == SlotStatus::Settled,
        "deck did not settle"
    );
    Ok(())
}

pub fn cancellation(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = assets.session(seed);
    let spin = session.config().win_condition_flicker.spin_duration_ms();

    ensure!(
        session.roll_win_condition().is_started(),
        "first win roll did not start"
    );
    session.advance(rng.gen_range(0..spin.max(1)));
    ensure!(
        session.roll_win_condition() == RollOutcome::Ignored,
        "plain roll while spinning should be ignored"
    );
    ensure!(
        session.reroll(Domain::WinCondition).is_started(),
        "reroll did not restart the spin"
    );
    session.run_until_idle();

    let settled = settles(&session, Domain::WinCondition);
    ensure!(
        settled.len() == 1,
        "expected one settle, saw {}",
        settled.len()
    );
    ensure!(
        session.events().iter().any(|e| e.kind
            == RollEventKind::Cancelled {
                domain: Domain::WinCondition
            }),
        "first spin was never cancelled"
    );
    ensure!(
        session.win_condition().current().is_some(),
        "win condition empty after settling"
    );
    Ok(())
}

pub fn map_reconcile(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed);
    session.set_map(Some(GameMap::Rift));
    session.roll_rule();
    session.roll_win_condition();
    session.run_until_idle();

    let rule = session
        .rule()
        .current()
        .cloned()
        .context("rule did not settle on rift")?;
    let win = session
        .win_condition()
        .current()
        .cloned()
        .context("win condition did not settle on rift")?;

    session.set_map(None);
    ensure!(
        session.rule().current() == Some(&rule),
        "clearing the map dropped the rule"
    );

    session.set_map(Some(GameMap::Aram));
    ensure!(
        session.rule().current().is_some() == rule.applies_to(Some(GameMap::Aram)),
        "rule {} reconciled wrongly on aram",
        rule.id
    );
    ensure!(
        session.win_condition().current().is_some() == win.applies_to(Some(GameMap::Aram)),
        "win condition {} reconciled wrongly on aram",
        win.id
    );

    let pools = session.pools();
    ensure!(
        pools.rules.iter().all(|r| r.applies_to(Some(GameMap::Aram))),
        "rule pool leaks rift-only rules"
    );
    ensure!(
        pools
            .win_conditions
            .iter()
            .all(|w| w.applies_to(Some(GameMap::Aram))),
        "win pool leaks rift-only conditions"
    );
    Ok(())
}

pub fn roll_all_order(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed);
    let delays = session.config().stage_delays;
    ensure!(
        session.roll_all() == RollOutcome::Started,
        "roll all did not start"
    );
    ensure!(
        session.roll_all() == RollOutcome::Ignored,
        "second roll all should be ignored while queued"
    );
    session.run_until_idle();

    let deck = settles(&session, Domain::Characters);
    let rule = settles(&session, Domain::Rule);
    let win = settles(&session, Domain::WinCondition);
    ensure!(
        (deck.len(), rule.len(), win.len()) == (1, 1, 1),
        "each stage should settle once: {deck:?} {rule:?} {win:?}"
    );
    ensure!(
        deck[0] < rule[0] && rule[0] < win[0],
        "stages overlapped: deck {} rule {} win {}",
        deck[0],
        rule[0],
        win[0]
    );
    ensure!(
        stage_start(&session, Domain::Characters) == Some(delays.characters_ms),
        "deck stage started late"
    );
    ensure!(
        stage_start(&session, Domain::Rule) == Some(deck[0] + delays.rule_ms),
        "rule stage did not wait {}ms after the deck",
        delays.rule_ms
    );
    ensure!(
        stage_start(&session, Domain::WinCondition) == Some(rule[0] + delays.win_condition_ms),
        "win stage did not wait {}ms after the rule",
        delays.win_condition_ms
    );
    ensure!(
        session
            .events()
            .iter()
            .any(|e| e.kind == RollEventKind::QueueCompleted),
        "queue never completed"
    );
    ensure!(!session.orchestrator().is_active(), "queue still active");
    Ok(())
}

pub fn reset_idempotent(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = assets.session(seed);
    session.toggle_role(random_role(&mut rng));
    session.set_map(Some(GameMap::Rift));
    session.roll_all();
    session.advance(rng.gen_range(0..6_000));

    let roles = session.filters().enabled_roles().clone();
    let categories = session.filters().enabled_categories().clone();
    session.reset();
    let once = session.snapshot();
    session.reset();
    let twice = session.snapshot();

    ensure!(once == twice, "second reset changed the session");
    ensure!(
        session.filters().enabled_roles() == &roles
            && session.filters().enabled_categories() == &categories,
        "reset touched role or category filters"
    );
    ensure!(
        session.filters().selected_map().is_none(),
        "reset kept the map"
    );
    ensure!(
        once.characters.deck.is_empty()
            && once.rule.current.is_none()
            && once.win_condition.current.is_none(),
        "reset left results behind"
    );
    ensure!(session.next_due().is_none(), "reset left timers armed");
    ensure!(
        session.run_until_idle() == 0,
        "timers fired after reset"
    );
    Ok(())
}

pub fn empty_pools(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed);
    session.disable_all_categories();
    ensure!(
        session.roll_rule() == RollOutcome::Unavailable,
        "rule roll with no categories should be unavailable"
    );
    ensure!(
        session.roll_all() == RollOutcome::Unavailable,
        "roll all with an empty rule pool should be unavailable"
    );
    ensure!(
        session.rule().status() == SlotStatus::Idle && session.rule().current().is_none(),
        "rule slot changed on an unavailable roll"
    );
    ensure!(session.events().is_empty(), "unavailable rolls emitted events");

    // Emptying a pool mid-queue aborts the remaining stages.
    session.enable_all_categories();
    ensure!(
        session.roll_all() == RollOutcome::Started,
        "roll all should start once categories return"
    );
    session.advance(1);
    session.disable_all_categories();
    session.run_until_idle();
    ensure!(
        session.events().iter().any(|e| e.kind
            == RollEventKind::QueueAborted {
                stage: Domain::Rule
            }),
        "queue did not abort at the rule stage"
    );
    ensure!(
        session.win_condition().status() == SlotStatus::Idle,
        "win stage ran after the abort"
    );
    Ok(())
}

pub fn role_invariant(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut session = assets.session(seed);
    for step in 0..128 {
        match rng.gen_range(0..10) {
            0 => session.select_all_roles(),
            1 => session.reset_roles_to_single_default(),
            _ => {
                session.toggle_role(random_role(&mut rng));
            }
        }
        ensure!(
            !session.filters().enabled_roles().is_empty(),
            "all roles disabled after step {step}"
        );
    }
    Ok(())
}

pub fn end_to_end(assets: &TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed);
    ensure!(
        session.filters().enabled_roles().len() == Role::ALL.len(),
        "every role should start enabled"
    );
    ensure!(
        session.filters().selected_map().is_none(),
        "no map should start selected"
    );

    session.roll_rule();
    session.roll_win_condition();
    session.roll_characters();
    session.run_until_idle();

    let expected = session
        .pools()
        .characters
        .len()
        .min(usize::from(session.pool_size()));
    ensure!(
        session.deck().deck().len() == expected,
        "deck holds {} cards, expected {expected}",
        session.deck().deck().len()
    );
    let rule = session
        .rule()
        .current()
        .cloned()
        .context("rule did not settle")?;
    let win = session
        .win_condition()
        .current()
        .cloned()
        .context("win condition did not settle")?;

    session.set_map(Some(GameMap::Aram));
    ensure!(
        session.rule().current().is_some() == rule.applies_to(Some(GameMap::Aram)),
        "rule reconciliation mismatch"
    );
    ensure!(
        session.win_condition().current().is_some() == win.applies_to(Some(GameMap::Aram)),
        "win reconciliation mismatch"
    );
    ensure!(
        session.deck().deck().len() == expected,
        "map switch touched the deck"
    );
    Ok(())
}
