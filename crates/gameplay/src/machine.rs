use super::action::Action;
use super::phase::Phase;
use super::pot::Pots;
use super::protocol::ErrorCode;
use super::protocol::PotOut;
use super::protocol::WinnerOut;
use super::record::ActionRecord;
use super::record::HandRecord;
use super::record::SeatRecord;
use super::seat::Seat;
use rand::rngs::StdRng;
use rvb_cards::Deck;
use rvb_cards::Evaluator;
use rvb_core::Chips;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_core::Seq;
use rvb_core::Table;
use std::collections::BTreeMap;

/// Per-table tuning: seat count, blinds, and phase timings.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub seats: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub countdown_ms: u64,
    pub turn_ms: u64,
    pub payout_ms: u64,
    pub banter_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seats: rvb_core::MAX_SEATS,
            small_blind: rvb_core::DEFAULT_SMALL_BLIND,
            big_blind: rvb_core::DEFAULT_BIG_BLIND,
            countdown_ms: rvb_core::COUNTDOWN_MS,
            turn_ms: rvb_core::TURN_TIMEOUT_MS,
            payout_ms: rvb_core::PAYOUT_ANIMATION_MS,
            banter_ms: rvb_core::BANTER_PHASE_MS,
        }
    }
}

/// Which deadline fired. Tokens guard against stale deliveries: a timer is
/// cancelled by bumping the token, never by reaching into the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Countdown,
    Turn,
    Payout,
    Banter,
}

/// Commands the reducer accepts. The async runner feeds these in strict
/// arrival order; nothing else ever mutates the god state.
#[derive(Debug, Clone)]
pub enum Input {
    Sit {
        player: PlayerId,
        name: String,
        seat: Position,
        buy_in: Chips,
    },
    Ready {
        player: PlayerId,
    },
    Leave {
        player: PlayerId,
    },
    Act {
        player: PlayerId,
        action: Action,
    },
    Timer {
        kind: TimerKind,
        token: u64,
    },
}

/// What the reducer asks of the outside world. State changes themselves are
/// observed by re-projecting views after each input.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Arm a timer; deliver `Input::Timer` with the same token when it fires.
    Arm {
        kind: TimerKind,
        token: u64,
        delay_ms: u64,
    },
    /// Public broadcast of an accepted action (blinds included).
    Acted {
        seat: Position,
        player: PlayerId,
        label: &'static str,
        amount: Option<Chips>,
        pot: Chips,
    },
    /// Hand outcome for the HAND_RESULT broadcast.
    Result {
        winners: Vec<WinnerOut>,
        pots: Vec<PotOut>,
    },
    /// Persist stack deltas and the hand history as one unit of work.
    Settle {
        deltas: Vec<(PlayerId, Chips)>,
        record: HandRecord,
    },
    /// Protocol error for one offending player; state is untouched.
    Reject {
        player: PlayerId,
        code: ErrorCode,
        message: String,
    },
}

/// The authoritative table state machine.
///
/// Owns everything about one table: deck, seats, pots, phase, and the
/// monotone sequence counter. Exactly one `apply` runs at a time (the table
/// run-loop serializes commands), so invariants hold without locks. The
/// sequence counter moves by exactly one per state-changing input, so every
/// emitted view train is gap-free.
pub struct Machine {
    id: ID<Table>,
    config: Config,
    rng: StdRng,
    phase: Phase,
    seq: Seq,
    hand_no: u64,
    deck: Option<Deck>,
    community: Vec<rvb_cards::Card>,
    pots: Pots,
    bet: Chips,
    min_raise: Chips,
    dealer: Position,
    acting: Option<Position>,
    seats: Vec<Option<Seat>>,
    timer_token: u64,
    started_ms: u64,
    log: Vec<ActionRecord>,
    halted: bool,
}

impl Machine {
    pub fn new(id: ID<Table>, config: Config, rng: StdRng) -> Self {
        assert!(config.seats >= 2 && config.seats <= rvb_core::MAX_SEATS);
        Self {
            id,
            config,
            rng,
            phase: Phase::Lobby,
            seq: 0,
            hand_no: 0,
            deck: None,
            community: Vec::new(),
            pots: Pots::default(),
            bet: 0,
            min_raise: config.big_blind,
            dealer: 0,
            acting: None,
            seats: vec![None; config.seats],
            timer_token: 0,
            started_ms: 0,
            log: Vec::new(),
            halted: false,
        }
    }

    pub fn id(&self) -> ID<Table> {
        self.id
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn seq(&self) -> Seq {
        self.seq
    }
    pub fn hand_no(&self) -> u64 {
        self.hand_no
    }
    pub fn community(&self) -> &[rvb_cards::Card] {
        &self.community
    }
    pub fn pot(&self) -> Chips {
        self.pots.total()
    }
    pub fn current_bet(&self) -> Chips {
        self.bet
    }
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }
    pub fn dealer(&self) -> Position {
        self.dealer
    }
    pub fn acting(&self) -> Option<Position> {
        self.acting
    }
    pub fn seats(&self) -> &[Option<Seat>] {
        &self.seats
    }
    pub fn occupied(&self) -> usize {
        self.seats.iter().flatten().count()
    }
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Stop dealing new hands after a persistence failure. The current
    /// dealer button stays where it is until `resume`.
    pub fn halt(&mut self) {
        self.halted = true;
    }
    pub fn resume(&mut self) -> Vec<Effect> {
        self.halted = false;
        let mut effects = Vec::new();
        let before = self.phase;
        self.check_start(&mut effects);
        if self.phase != before {
            self.seq += 1;
        }
        effects
    }

    /// Feed one command through the reducer. Returns the side effects; the
    /// sequence counter advances by exactly one iff state changed.
    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mutated = match input {
            Input::Sit {
                player,
                name,
                seat,
                buy_in,
            } => self.on_sit(player, name, seat, buy_in, &mut effects),
            Input::Ready { player } => self.on_ready(player, &mut effects),
            Input::Leave { player } => self.on_leave(player, &mut effects),
            Input::Act { player, action } => self.on_act(player, action, &mut effects),
            Input::Timer { kind, token } => self.on_timer(kind, token, &mut effects),
        };
        if mutated {
            self.seq += 1;
        }
        effects
    }

    // ------------------------------------------------------------------
    // seating and readiness
    // ------------------------------------------------------------------

    fn on_sit(
        &mut self,
        player: PlayerId,
        name: String,
        seat: Position,
        buy_in: Chips,
        effects: &mut Vec<Effect>,
    ) -> bool {
        if !self.phase.seatable() {
            return self.reject(player, ErrorCode::InvalidAction, "cannot sit mid-hand", effects);
        }
        if buy_in <= 0 {
            return self.reject(player, ErrorCode::InvalidAction, "buy-in must be positive", effects);
        }
        if self.seated().any(|s| s.player() == player) {
            return self.reject(player, ErrorCode::AlreadyInTable, "already seated", effects);
        }
        if self.occupied() == self.config.seats {
            return self.reject(player, ErrorCode::TableFull, "no open seats", effects);
        }
        if seat >= self.config.seats {
            return self.reject(player, ErrorCode::InvalidAction, "no such seat", effects);
        }
        if self.seats[seat].is_some() {
            return self.reject(player, ErrorCode::SeatTaken, "seat is occupied", effects);
        }
        log::info!("[table {}] {} sits at seat {} for {}", self.id, player, seat, buy_in);
        self.seats[seat] = Some(Seat::new(player, name, seat, buy_in));
        if self.phase == Phase::Lobby {
            self.phase = Phase::Waiting;
        }
        true
    }

    fn on_ready(&mut self, player: PlayerId, effects: &mut Vec<Effect>) -> bool {
        let Some(idx) = self.index_of(player) else {
            return self.reject(player, ErrorCode::InvalidAction, "not seated", effects);
        };
        let seat = self.seats[idx].as_mut().expect("seat occupied");
        if seat.ready() {
            return false;
        }
        seat.mark_ready();
        self.check_start(effects);
        true
    }

    fn on_leave(&mut self, player: PlayerId, effects: &mut Vec<Effect>) -> bool {
        let Some(idx) = self.index_of(player) else {
            return false;
        };
        let seat = self.seats[idx].as_ref().expect("seat occupied");
        if self.phase.is_betting() && seat.still_in() {
            // mid-hand departure plays on as a fold; the seat frees up at hand end
            log::info!("[table {}] {} leaves mid-hand, folding", self.id, player);
            let was_acting = self.acting == Some(idx);
            let seat = self.seats[idx].as_mut().expect("seat occupied");
            seat.mark_leaving();
            seat.fold();
            self.log_action(idx, "FOLD", None);
            effects.push(Effect::Acted {
                seat: idx,
                player,
                label: "FOLD",
                amount: None,
                pot: self.pots.total(),
            });
            self.after_fold(idx, was_acting, effects);
        } else if self.phase.is_betting() || self.phase == Phase::ShowdownReveal {
            self.seats[idx].as_mut().expect("seat occupied").mark_leaving();
        } else {
            log::info!("[table {}] {} leaves seat {}", self.id, player, idx);
            self.seats[idx] = None;
            if self.acting == Some(idx) {
                self.acting = None;
            }
            if self.phase == Phase::Starting && !self.startable() {
                self.phase = Phase::Waiting;
                self.cancel_timer();
            }
        }
        true
    }

    fn check_start(&mut self, effects: &mut Vec<Effect>) {
        if self.phase == Phase::Waiting && !self.halted && self.startable() {
            self.phase = Phase::Starting;
            self.arm(TimerKind::Countdown, self.config.countdown_ms, effects);
        }
    }

    /// At least two funded, staying players, all of them ready.
    fn startable(&self) -> bool {
        let funded = self
            .seated()
            .filter(|s| s.stack() > 0 && !s.leaving())
            .collect::<Vec<&Seat>>();
        funded.len() >= 2 && funded.iter().all(|s| s.ready())
    }

    // ------------------------------------------------------------------
    // hand lifecycle
    // ------------------------------------------------------------------

    fn on_timer(&mut self, kind: TimerKind, token: u64, effects: &mut Vec<Effect>) -> bool {
        if token != self.timer_token {
            log::trace!("[table {}] stale {:?} timer ignored", self.id, kind);
            return false;
        }
        match kind {
            TimerKind::Countdown => {
                self.begin_hand(effects);
                true
            }
            TimerKind::Turn => {
                let Some(idx) = self.acting else { return false };
                let player = self.seats[idx].as_ref().expect("seat occupied").player();
                log::info!("[table {}] seat {} timed out, auto-folding", self.id, idx);
                let seat = self.seats[idx].as_mut().expect("seat occupied");
                seat.fold();
                self.log_action(idx, "FOLD", None);
                effects.push(Effect::Acted {
                    seat: idx,
                    player,
                    label: "FOLD",
                    amount: None,
                    pot: self.pots.total(),
                });
                self.after_fold(idx, true, effects);
                true
            }
            TimerKind::Payout => {
                self.phase = Phase::SocialBanter;
                self.arm(TimerKind::Banter, self.config.banter_ms, effects);
                true
            }
            TimerKind::Banter => {
                self.finish_hand(effects);
                true
            }
        }
    }

    fn begin_hand(&mut self, effects: &mut Vec<Effect>) {
        assert!(self.phase == Phase::Starting, "deal from countdown only");
        let dealt = self.funded_indices();
        assert!(dealt.len() >= 2, "countdown requires two funded seats");
        self.dealer = match self.hand_no {
            0 => dealt[0],
            _ => self.next_index(self.dealer, |s| s.stack() > 0 && !s.leaving())
                .expect("funded seat exists"),
        };
        self.hand_no += 1;
        self.started_ms = rvb_core::now_ms();
        self.log.clear();
        self.phase = Phase::Dealing;
        self.community.clear();
        self.pots.reset();
        self.bet = 0;
        self.min_raise = self.config.big_blind;
        for seat in self.seats.iter_mut().flatten() {
            seat.reset_for_hand();
        }
        log::info!(
            "[table {}] hand #{} dealing to {} seats, button at {}",
            self.id,
            self.hand_no,
            dealt.len(),
            self.dealer
        );
        let mut deck = Deck::shuffled(&mut self.rng);
        for &idx in dealt.iter() {
            let hole = deck.deal(2).expect("fresh deck covers every seat");
            self.seats[idx]
                .as_mut()
                .expect("seat occupied")
                .deal([hole[0], hole[1]]);
        }
        self.deck = Some(deck);
        // blinds: heads-up puts the small blind on the button
        let dealt = self.dealt_indices();
        let (sb, bb) = match dealt.len() {
            2 => (self.dealer, self.next_in(&dealt, self.dealer)),
            _ => {
                let sb = self.next_in(&dealt, self.dealer);
                (sb, self.next_in(&dealt, sb))
            }
        };
        self.post_blind(sb, self.config.small_blind, "SMALL_BLIND", effects);
        self.post_blind(bb, self.config.big_blind, "BIG_BLIND", effects);
        self.bet = self.config.big_blind;
        self.phase = Phase::PreFlop;
        match self.next_index(bb, Seat::can_act) {
            Some(first) => self.set_acting(Some(first), effects),
            None => self.advance(effects),
        }
    }

    fn post_blind(&mut self, idx: Position, blind: Chips, label: &'static str, effects: &mut Vec<Effect>) {
        let seat = self.seats[idx].as_mut().expect("seat occupied");
        let player = seat.player();
        let paid = blind.min(seat.stack());
        seat.spend(paid);
        self.pots.add(player, paid);
        self.log_action(idx, label, Some(paid));
        effects.push(Effect::Acted {
            seat: idx,
            player,
            label,
            amount: Some(paid),
            pot: self.pots.total(),
        });
    }

    fn finish_hand(&mut self, effects: &mut Vec<Effect>) {
        for slot in self.seats.iter_mut() {
            if slot.as_ref().map(|s| s.leaving()).unwrap_or(false) {
                *slot = None;
            }
        }
        self.phase = Phase::Waiting;
        self.acting = None;
        self.check_start(effects);
    }

    // ------------------------------------------------------------------
    // betting
    // ------------------------------------------------------------------

    fn on_act(&mut self, player: PlayerId, action: Action, effects: &mut Vec<Effect>) -> bool {
        if !self.phase.is_betting() {
            return self.reject(player, ErrorCode::InvalidAction, "no betting round open", effects);
        }
        let Some(idx) = self.acting else {
            return self.reject(player, ErrorCode::NotYourTurn, "nobody to act", effects);
        };
        if self.seats[idx].as_ref().expect("seat occupied").player() != player {
            return self.reject(player, ErrorCode::NotYourTurn, "another seat is acting", effects);
        }
        if let Err(message) = self.permitted(idx, action) {
            return self.reject(player, ErrorCode::InvalidAction, message, effects);
        }
        let (label, amount) = self.commit(idx, action);
        self.log_action(idx, label, amount);
        effects.push(Effect::Acted {
            seat: idx,
            player,
            label,
            amount,
            pot: self.pots.total(),
        });
        if action == Action::Fold {
            self.after_fold(idx, true, effects);
        } else {
            self.progress(idx, effects);
        }
        true
    }

    /// The action-validation matrix. Pure: no mutation on any path.
    fn permitted(&self, idx: Position, action: Action) -> Result<(), &'static str> {
        let seat = self.seats[idx].as_ref().expect("seat occupied");
        match action {
            Action::Fold => Ok(()),
            Action::Check if seat.wager() == self.bet => Ok(()),
            Action::Check => Err("a live bet must be called"),
            Action::Call if self.bet > seat.wager() => Ok(()),
            Action::Call => Err("nothing to call"),
            Action::Raise(total) if total <= self.bet => Err("raise must exceed the current bet"),
            Action::Raise(total) if total - self.bet < self.min_raise => {
                Err("raise below the minimum increment")
            }
            Action::Raise(total) if total - seat.wager() > seat.stack() => {
                Err("raise exceeds stack")
            }
            Action::Raise(_) => Ok(()),
            Action::AllIn if seat.stack() > 0 => Ok(()),
            Action::AllIn => Err("no chips behind"),
        }
    }

    /// Apply a permitted action and report its broadcast label and amount.
    fn commit(&mut self, idx: Position, action: Action) -> (&'static str, Option<Chips>) {
        let bet = self.bet;
        let seat = self.seats[idx].as_mut().expect("seat occupied");
        let player = seat.player();
        match action {
            Action::Fold => {
                seat.fold();
                ("FOLD", None)
            }
            Action::Check => {
                seat.mark_acted();
                ("CHECK", None)
            }
            Action::Call => {
                let paid = (bet - seat.wager()).min(seat.stack());
                seat.spend(paid);
                seat.mark_acted();
                self.pots.add(player, paid);
                ("CALL", Some(paid))
            }
            Action::Raise(total) => {
                let paid = total - seat.wager();
                seat.spend(paid);
                seat.mark_acted();
                self.pots.add(player, paid);
                self.min_raise = total - self.bet;
                self.bet = total;
                self.reopen(idx);
                ("RAISE", Some(total))
            }
            Action::AllIn => {
                let paid = seat.stack();
                let total = seat.wager() + paid;
                seat.spend(paid);
                seat.mark_acted();
                self.pots.add(player, paid);
                if total > self.bet {
                    // a short all-in moves the bet but reopens nothing:
                    // players who already acted are not asked again
                    if total - self.bet >= self.min_raise {
                        self.min_raise = total - self.bet;
                        self.reopen(idx);
                    }
                    self.bet = total;
                }
                ("ALL_IN", Some(total))
            }
        }
    }

    /// A full raise puts everyone else back on the clock.
    fn reopen(&mut self, raiser: Position) {
        for seat in self.seats.iter_mut().flatten() {
            if seat.index() != raiser && seat.can_act() {
                seat.clear_acted();
            }
        }
    }

    fn after_fold(&mut self, idx: Position, was_acting: bool, effects: &mut Vec<Effect>) {
        if self.still_in_count() <= 1 {
            self.shortcircuit(effects);
        } else if self.round_closed() {
            self.advance(effects);
        } else if was_acting {
            self.rotate(idx, effects);
        }
    }

    fn progress(&mut self, idx: Position, effects: &mut Vec<Effect>) {
        if self.round_closed() {
            self.advance(effects);
        } else {
            self.rotate(idx, effects);
        }
    }

    /// A betting round is closed when all but one seat folded, when every
    /// live seat is all-in, or when every live seat with chips has acted
    /// and matched the bet.
    fn round_closed(&self) -> bool {
        self.still_in_count() <= 1
            || self.seated().filter(|s| s.still_in()).all(|s| s.all_in())
            || self
                .seated()
                .filter(|s| s.can_act())
                .all(|s| s.acted() && s.wager() == self.bet)
    }

    fn advance(&mut self, effects: &mut Vec<Effect>) {
        while let Some(next) = self.phase.next_street() {
            for seat in self.seats.iter_mut().flatten() {
                seat.reset_for_street();
            }
            self.bet = 0;
            self.min_raise = self.config.big_blind;
            self.acting = None;
            let deck = self.deck.as_mut().expect("deck lives for the hand");
            deck.burn().expect("deck covers a full hand");
            let cards = deck.deal(next.reveals()).expect("deck covers a full hand");
            self.community.extend(cards);
            self.phase = next;
            log::debug!("[table {}] {} {:?}", self.id, self.phase, self.community);
            if !self.round_closed() {
                let first = self
                    .next_index(self.dealer, Seat::can_act)
                    .expect("open round has an actor");
                self.set_acting(Some(first), effects);
                return;
            }
        }
        self.showdown(effects);
    }

    fn rotate(&mut self, from: Position, effects: &mut Vec<Effect>) {
        let bet = self.bet;
        let next = self
            .next_index(from, |s| s.can_act() && (!s.acted() || s.wager() < bet))
            .expect("open round has a next actor");
        self.set_acting(Some(next), effects);
    }

    fn set_acting(&mut self, idx: Option<Position>, effects: &mut Vec<Effect>) {
        self.acting = idx;
        self.cancel_timer();
        if idx.is_some() {
            self.arm(TimerKind::Turn, self.config.turn_ms, effects);
        }
    }

    // ------------------------------------------------------------------
    // settlement
    // ------------------------------------------------------------------

    fn shortcircuit(&mut self, effects: &mut Vec<Effect>) {
        let idx = self
            .seated()
            .find(|s| s.still_in())
            .expect("one seat remains")
            .index();
        let amount = self.pots.total();
        let player = self.seats[idx].as_ref().expect("seat occupied").player();
        log::info!("[table {}] everyone folded, {} wins {}", self.id, player, amount);
        self.seats[idx].as_mut().expect("seat occupied").win(amount);
        let winners = vec![WinnerOut {
            steam_id: player,
            seat: idx,
            cards: None,
            hand_rank: None,
            amount,
        }];
        let pots = vec![PotOut {
            amount,
            eligible: vec![player],
        }];
        self.conclude(winners, pots, effects);
    }

    fn showdown(&mut self, effects: &mut Vec<Effect>) {
        self.phase = Phase::ShowdownReveal;
        self.acting = None;
        assert!(self.community.len() == 5, "showdown needs a full board");
        let board = self.community.clone();
        let mut scores = BTreeMap::new();
        for seat in self.seats.iter_mut().flatten().filter(|s| s.still_in()) {
            let hole = seat.hole().expect("live seat holds cards");
            let mut seven = board.clone();
            seven.extend(hole);
            let strength = rvb_cards::Strength::from(Evaluator::from(seven.as_slice()));
            scores.insert(seat.player(), strength.score());
            seat.evaluate(strength);
        }
        let live = self
            .seated()
            .filter(|s| s.still_in())
            .map(Seat::player)
            .collect::<Vec<PlayerId>>();
        let pots = self.pots.pots(&live);
        let order = self.clockwise_of_dealer();
        let payouts = Pots::distribute(&pots, &scores, &order);
        let mut winners = Vec::new();
        for (&player, &amount) in payouts.iter().filter(|&(_, &amount)| amount > 0) {
            let idx = self.index_of(player).expect("winner is seated");
            let seat = self.seats[idx].as_mut().expect("seat occupied");
            seat.win(amount);
            winners.push(WinnerOut {
                steam_id: player,
                seat: idx,
                cards: seat.hole().map(|h| h.to_vec()),
                hand_rank: seat.strength().map(|s| s.label().to_string()),
                amount,
            });
        }
        let pots = pots
            .into_iter()
            .map(|p| PotOut {
                amount: p.amount,
                eligible: p.eligible,
            })
            .collect::<Vec<PotOut>>();
        self.conclude(winners, pots, effects);
    }

    /// Shared tail of both payout paths: broadcast the result, hand the
    /// ledger its unit of work, start the payout animation.
    fn conclude(&mut self, winners: Vec<WinnerOut>, pots: Vec<PotOut>, effects: &mut Vec<Effect>) {
        self.phase = Phase::PayoutAnimation;
        self.acting = None;
        self.deck = None;
        let record = self.record(&winners, &pots);
        let deltas = self
            .seated()
            .filter(|s| s.stack() != s.start_stack())
            .map(|s| (s.player(), s.stack() - s.start_stack()))
            .collect::<Vec<(PlayerId, Chips)>>();
        effects.push(Effect::Result {
            winners,
            pots,
        });
        effects.push(Effect::Settle { deltas, record });
        self.arm(TimerKind::Payout, self.config.payout_ms, effects);
    }

    fn record(&self, winners: &[WinnerOut], pots: &[PotOut]) -> HandRecord {
        HandRecord {
            table_id: self.id,
            hand_no: self.hand_no,
            started_ms: self.started_ms,
            ended_ms: rvb_core::now_ms(),
            community: self.community.clone(),
            seats: self
                .seated()
                .map(|s| SeatRecord {
                    seat: s.index(),
                    steam_id: s.player(),
                    display_name: s.name().to_string(),
                    start_stack: s.start_stack(),
                    end_stack: s.stack(),
                    hole: s.hole().filter(|_| !s.folded()),
                    hand_rank: s.strength().map(|x| x.label().to_string()),
                })
                .collect(),
            actions: self.log.clone(),
            pots: pots.to_vec(),
            winners: winners.to_vec(),
        }
    }

    // ------------------------------------------------------------------
    // plumbing
    // ------------------------------------------------------------------

    fn reject(
        &self,
        player: PlayerId,
        code: ErrorCode,
        message: &str,
        effects: &mut Vec<Effect>,
    ) -> bool {
        log::debug!("[table {}] rejecting {}: {} ({})", self.id, player, code, message);
        effects.push(Effect::Reject {
            player,
            code,
            message: message.to_string(),
        });
        false
    }

    fn arm(&mut self, kind: TimerKind, delay_ms: u64, effects: &mut Vec<Effect>) {
        self.timer_token += 1;
        effects.push(Effect::Arm {
            kind,
            token: self.timer_token,
            delay_ms,
        });
    }
    fn cancel_timer(&mut self) {
        self.timer_token += 1;
    }

    fn log_action(&mut self, seat: Position, action: &str, amount: Option<Chips>) {
        self.log.push(ActionRecord {
            seat,
            action: action.to_string(),
            amount,
        });
    }

    fn seated(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().flatten()
    }
    fn index_of(&self, player: PlayerId) -> Option<Position> {
        self.seated().find(|s| s.player() == player).map(Seat::index)
    }
    fn still_in_count(&self) -> usize {
        self.seated().filter(|s| s.still_in()).count()
    }
    fn funded_indices(&self) -> Vec<Position> {
        self.seated()
            .filter(|s| s.stack() > 0 && !s.leaving())
            .map(Seat::index)
            .collect()
    }
    fn dealt_indices(&self) -> Vec<Position> {
        self.seated()
            .filter(|s| s.hole().is_some())
            .map(Seat::index)
            .collect()
    }
    /// First occupied seat clockwise of `from` satisfying the predicate.
    fn next_index<F>(&self, from: Position, pred: F) -> Option<Position>
    where
        F: Fn(&Seat) -> bool,
    {
        let n = self.config.seats;
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&idx| self.seats[idx].as_ref().map(|s| pred(s)).unwrap_or(false))
    }
    /// Next member of `group` clockwise of `from`.
    fn next_in(&self, group: &[Position], from: Position) -> Position {
        let n = self.config.seats;
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|idx| group.contains(idx))
            .expect("group is non-empty")
    }
    /// Seated players clockwise starting one left of the dealer, for the
    /// deterministic odd-chip award.
    fn clockwise_of_dealer(&self) -> Vec<PlayerId> {
        let n = self.config.seats;
        (1..=n)
            .map(|step| (self.dealer + step) % n)
            .filter_map(|idx| self.seats[idx].as_ref())
            .map(Seat::player)
            .collect()
    }
}

impl std::fmt::Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "table {} #{} {} @ {} pot {}",
            self.id,
            self.hand_no,
            self.phase,
            self.seq,
            self.pots.total()
        )
    }
}
