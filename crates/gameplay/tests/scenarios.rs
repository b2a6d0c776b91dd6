//! End-to-end hand scenarios driven straight through the state machine.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rvb_core::Chips;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_gameplay::Action;
use rvb_gameplay::Config;
use rvb_gameplay::Effect;
use rvb_gameplay::Input;
use rvb_gameplay::Machine;
use rvb_gameplay::Phase;
use rvb_gameplay::view;
use rvb_gameplay::view::HoleView;

fn p(n: u64) -> PlayerId {
    PlayerId::from(n)
}

fn table(stacks: &[Chips]) -> Machine {
    let config = Config::default();
    let mut m = Machine::new(ID::default(), config, StdRng::seed_from_u64(42));
    for (i, &chips) in stacks.iter().enumerate() {
        m.apply(Input::Sit {
            player: p(i as u64 + 1),
            name: format!("p{}", i + 1),
            seat: i,
            buy_in: chips,
        });
    }
    let mut last = Vec::new();
    for i in 0..stacks.len() {
        last = m.apply(Input::Ready {
            player: p(i as u64 + 1),
        });
    }
    let effects = fire(&mut m, &last);
    assert!(effects.iter().any(|e| matches!(e, Effect::Acted { .. })));
    m
}

fn fire(m: &mut Machine, effects: &[Effect]) -> Vec<Effect> {
    let (kind, token) = effects
        .iter()
        .rev()
        .find_map(|e| match e {
            Effect::Arm { kind, token, .. } => Some((*kind, *token)),
            _ => None,
        })
        .expect("a timer is armed");
    m.apply(Input::Timer { kind, token })
}

fn act_by(m: &mut Machine, seat: Position, action: Action) -> Vec<Effect> {
    assert_eq!(m.acting(), Some(seat), "expected seat {} to act", seat);
    let player = m.seats()[seat].as_ref().unwrap().player();
    m.apply(Input::Act { player, action })
}

fn stacks_total(m: &Machine) -> Chips {
    m.seats().iter().flatten().map(|s| s.stack()).sum()
}

/// Full hand with a raise, a call, and a fold: P1 on the button, blinds
/// 10/20, preflop raise to 100, turn lead of 200.
#[test]
fn scenario_full_hand_with_raise_call_fold() {
    let mut m = table(&[1000, 1000, 1000]);
    assert_eq!(m.phase(), Phase::PreFlop);
    assert_eq!(m.dealer(), 0);
    act_by(&mut m, 0, Action::Raise(100));
    act_by(&mut m, 1, Action::Call);
    act_by(&mut m, 2, Action::Fold);
    assert!(m.pot() >= 210);
    assert_eq!(m.phase(), Phase::Flop);
    act_by(&mut m, 1, Action::Check);
    act_by(&mut m, 0, Action::Check);
    assert_eq!(m.phase(), Phase::Turn);
    act_by(&mut m, 1, Action::Raise(200));
    act_by(&mut m, 0, Action::Call);
    assert!(m.pot() >= 610);
    assert_eq!(m.phase(), Phase::River);
    act_by(&mut m, 1, Action::Check);
    act_by(&mut m, 0, Action::Check);
    assert!(matches!(
        m.phase(),
        Phase::ShowdownReveal | Phase::PayoutAnimation
    ));
    assert_eq!(stacks_total(&m), 3000);
}

/// Three players check and call their way to showdown at 20 apiece.
#[test]
fn scenario_check_down_to_showdown() {
    let mut m = table(&[1000, 1000, 1000]);
    act_by(&mut m, 0, Action::Call);
    act_by(&mut m, 1, Action::Call);
    let mut effects = act_by(&mut m, 2, Action::Check);
    assert_eq!(m.pot(), 60);
    while m.phase().is_betting() {
        let seat = m.acting().unwrap();
        effects = act_by(&mut m, seat, Action::Check);
    }
    let (winners, pots) = effects
        .iter()
        .find_map(|e| match e {
            Effect::Result { winners, pots } => Some((winners.clone(), pots.clone())),
            _ => None,
        })
        .expect("showdown result");
    assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), 60);
    assert!(!winners.is_empty());
    assert_eq!(winners.iter().map(|w| w.amount).sum::<Chips>(), 60);
    assert_eq!(stacks_total(&m), 3000);
}

/// Stacks of 100/200/300 all-in preflop build a main pot and two sides.
#[test]
fn scenario_all_in_side_pots() {
    let mut m = table(&[100, 200, 300]);
    act_by(&mut m, 0, Action::AllIn);
    act_by(&mut m, 1, Action::AllIn);
    let effects = act_by(&mut m, 2, Action::AllIn);
    let pots = effects
        .iter()
        .find_map(|e| match e {
            Effect::Result { pots, .. } => Some(pots.clone()),
            _ => None,
        })
        .expect("showdown result");
    assert_eq!(pots.len(), 3);
    assert_eq!(pots[0].amount, 300);
    assert_eq!(pots[0].eligible, vec![p(1), p(2), p(3)]);
    assert_eq!(pots[1].amount, 200);
    assert_eq!(pots[1].eligible, vec![p(2), p(3)]);
    assert_eq!(pots[2].amount, 100);
    assert_eq!(pots[2].eligible, vec![p(3)]);
    assert_eq!(stacks_total(&m), 600);
}

/// Preflop views hide every opponent's cards and never mention the deck.
#[test]
fn scenario_sanitized_personal_view() {
    let m = table(&[1000, 1000, 1000]);
    let snapshot = view::personal(&m, p(1));
    assert!(view::validate(&snapshot, p(1)));
    for player in snapshot.players.iter() {
        match player.steam_id == p(1) {
            true => assert!(matches!(player.hole_cards, HoleView::Shown(_))),
            false => assert_eq!(player.hole_cards, HoleView::Hidden),
        }
    }
    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json.get("deck").is_none());
    let text = json.to_string();
    assert!(!text.contains("deck"));
}

/// Showdown views reveal exactly the hands that went to showdown.
#[test]
fn scenario_showdown_reveals_unfolded_hands() {
    let mut m = table(&[1000, 1000, 1000]);
    act_by(&mut m, 0, Action::Fold);
    act_by(&mut m, 1, Action::Call);
    let mut _effects = act_by(&mut m, 2, Action::Check);
    while m.phase().is_betting() {
        let seat = m.acting().unwrap();
        _effects = act_by(&mut m, seat, Action::Check);
    }
    assert_eq!(m.phase(), Phase::PayoutAnimation);
    let snapshot = view::personal(&m, p(2));
    assert!(view::validate(&snapshot, p(2)));
    let by_seat = |i: usize| {
        snapshot
            .players
            .iter()
            .find(|v| v.seat == i)
            .unwrap()
            .hole_cards
    };
    assert!(matches!(by_seat(1), HoleView::Shown(_))); // viewer's own
    assert!(matches!(by_seat(2), HoleView::Shown(_))); // reached showdown
    assert!(!matches!(by_seat(0), HoleView::Shown(_))); // folded, never shown
}

/// Serializing a view, reading it back, and serializing again is stable.
#[test]
fn view_round_trip_is_stable() {
    let m = table(&[1000, 1000, 1000]);
    let snapshot = view::personal(&m, p(2));
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: rvb_gameplay::view::Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}

/// Deltas carry only what changed, always under a fresh sequence number.
#[test]
fn deltas_between_consecutive_views() {
    let mut m = table(&[1000, 1000, 1000]);
    let before = view::personal(&m, p(2));
    act_by(&mut m, 0, Action::Raise(100));
    let after = view::personal(&m, p(2));
    let patch = view::delta(&before, &after);
    assert!(patch.sequence_id > before.sequence_id);
    assert_eq!(patch.pot, Some(after.pot));
    assert_eq!(patch.current_bet, Some(100));
    assert_eq!(patch.community, None);
    assert_eq!(patch.dealer, None);
    assert!(patch.players.iter().any(|v| v.seat == 0));
    assert!(patch.players.iter().all(|v| v.seat != 2));
}

/// Chip conservation and betting-round closure hold across a random storm
/// of legal and illegal commands.
#[test]
fn random_action_storm_conserves_chips() {
    use rand::Rng;
    let mut driver = StdRng::seed_from_u64(1337);
    for round in 0..20u64 {
        let mut m = Machine::new(
            ID::default(),
            Config::default(),
            StdRng::seed_from_u64(round),
        );
        for i in 0..3usize {
            m.apply(Input::Sit {
                player: p(i as u64 + 1),
                name: format!("p{}", i + 1),
                seat: i,
                buy_in: 500,
            });
        }
        let mut last = Vec::new();
        for i in 0..3u64 {
            last = m.apply(Input::Ready { player: p(i + 1) });
        }
        let mut effects = fire(&mut m, &last);
        let mut steps = 0;
        while m.phase().is_betting() && steps < 200 {
            steps += 1;
            let seat = match m.acting() {
                Some(seat) => seat,
                None => break,
            };
            let player = match driver.random_range(0..4u8) {
                // occasionally poke from the wrong player; must be rejected
                0 => m.seats()[(seat + 1) % 3].as_ref().map(|s| s.player()),
                _ => m.seats()[seat].as_ref().map(|s| s.player()),
            };
            let Some(player) = player else { continue };
            let action = match driver.random_range(0..5u8) {
                0 => Action::Fold,
                1 => Action::Check,
                2 => Action::Call,
                3 => Action::Raise(m.current_bet() + m.min_raise()),
                _ => Action::AllIn,
            };
            effects = m.apply(Input::Act { player, action });
            // invariant: stacks plus the live pot always add to the buy-ins
            match m.phase().is_betting() {
                true => assert_eq!(stacks_total(&m) + m.pot(), 1500),
                false => assert_eq!(stacks_total(&m), 1500),
            }
        }
        let _ = effects;
        if matches!(m.phase(), Phase::PayoutAnimation) {
            assert_eq!(stacks_total(&m), 1500);
        }
    }
}
