//! In-memory game state and its transitions.
//!
//! Transitions that produce a ledger write are split in two: a `plan_*`
//! method validates and builds the hop without touching state, and an apply
//! method mutates state once the hop is durable. Everything else validates
//! before mutating, so a failed command leaves the state untouched.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use relay_core::error::RelayError;
use relay_core::hop::{Artifact, ChainEntry, CompletedHop, PendingHop};
use relay_core::participant::{Participant, ParticipantId};
use relay_core::rng::DeterministicRng;

use super::sampling::{pick_one, sample_without_replacement};

/// Most receivers offered to a sender at once.
pub const MAX_CANDIDATES: usize = 4;

/// The single live turn. Holder and deadline are always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    /// Who currently holds the artifact.
    pub holder: ParticipantId,
    /// When the watchdog may reassign the artifact.
    pub deadline: DateTime<Utc>,
}

/// Result of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First registration in this game.
    Joined,
    /// A participant who already took a turn, in this process or in the
    /// chain recovered at startup, is eligible again.
    Requeued,
}

/// What a submission will do, decided before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// Receivers remain: offer them to the sender.
    Offer(PendingHop),
    /// Nobody remains: close the chain with this self-loop.
    Terminal(CompletedHop),
}

/// What an automatic reassignment will do, decided before anything is
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassignment {
    /// Hand the artifact to `receiver`, closing the pending hop if there is
    /// one.
    Pass {
        /// The randomly picked receiver.
        receiver: Participant,
        /// The back-filled pending hop.
        hop: Option<CompletedHop>,
    },
    /// Nobody remains. A pending hop is closed as the terminal self-loop.
    Exhausted {
        /// The closed pending hop.
        terminal: Option<CompletedHop>,
    },
}

/// The whole game, owned by the turn engine.
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) participants: BTreeMap<ParticipantId, Participant>,
    pub(crate) taken_turns: BTreeSet<ParticipantId>,
    pub(crate) turn: Option<Turn>,
    pub(crate) pending: Option<PendingHop>,
    pub(crate) chain: Vec<CompletedHop>,
    pub(crate) deadline_duration: TimeDelta,
    pub(crate) results_destination: Option<String>,
}

impl GameState {
    /// Creates an empty game.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidDuration` if `deadline_duration` is not
    /// positive.
    pub fn new(
        deadline_duration: TimeDelta,
        results_destination: Option<String>,
    ) -> Result<Self, RelayError> {
        if deadline_duration <= TimeDelta::zero() {
            return Err(RelayError::InvalidDuration(deadline_duration.num_seconds()));
        }
        Ok(Self {
            participants: BTreeMap::new(),
            taken_turns: BTreeSet::new(),
            turn: None,
            pending: None,
            chain: Vec::new(),
            deadline_duration,
            results_destination,
        })
    }

    // --- queries ---

    /// Registered participants, ordered by id.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Looks up a registered participant.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Whether `id` has held the artifact in this game.
    #[must_use]
    pub fn is_taken(&self, id: ParticipantId) -> bool {
        self.taken_turns.contains(&id)
    }

    /// Ids that have held the artifact in this game.
    #[must_use]
    pub fn taken_turns(&self) -> &BTreeSet<ParticipantId> {
        &self.taken_turns
    }

    /// Registered participants still waiting for a turn.
    pub fn remaining(&self) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(|p| !self.taken_turns.contains(&p.id))
    }

    /// The live turn, if any.
    #[must_use]
    pub fn turn(&self) -> Option<Turn> {
        self.turn
    }

    /// The current holder, if any.
    #[must_use]
    pub fn holder(&self) -> Option<&Participant> {
        self.turn.and_then(|t| self.participants.get(&t.holder))
    }

    /// The hop awaiting a receiver, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingHop> {
        self.pending.as_ref()
    }

    /// Completed hops in chain order.
    #[must_use]
    pub fn chain(&self) -> &[CompletedHop] {
        &self.chain
    }

    /// The full chain, with the pending hop (if any) last.
    #[must_use]
    pub fn entries(&self) -> Vec<ChainEntry> {
        self.chain
            .iter()
            .cloned()
            .map(ChainEntry::Completed)
            .chain(self.pending.iter().cloned().map(ChainEntry::Pending))
            .collect()
    }

    /// Deadline applied to each new assignment.
    #[must_use]
    pub fn deadline_duration(&self) -> TimeDelta {
        self.deadline_duration
    }

    /// Where final reports are delivered.
    #[must_use]
    pub fn results_destination(&self) -> Option<&str> {
        self.results_destination.as_deref()
    }

    /// Whether the live turn's deadline has passed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.turn.is_some_and(|t| now > t.deadline)
    }

    // --- registration ---

    /// Adds `participant`, or re-queues them if they already took a turn.
    ///
    /// # Errors
    ///
    /// `AlreadyWaiting` if registered and not yet taken; `AlreadyTaken` if
    /// they are holding the artifact right now.
    pub fn register(&mut self, participant: Participant) -> Result<Registration, RelayError> {
        let id = participant.id;
        if !self.taken_turns.contains(&id) {
            if self.participants.contains_key(&id) {
                return Err(RelayError::AlreadyWaiting(id));
            }
            self.participants.insert(id, participant);
            return Ok(Registration::Joined);
        }
        if self.turn.is_some_and(|t| t.holder == id) {
            return Err(RelayError::AlreadyTaken(id));
        }
        // Rehydrated chain members are taken but not yet in the roster.
        self.participants.insert(id, participant);
        self.taken_turns.remove(&id);
        Ok(Registration::Requeued)
    }

    /// Checks that `id` may leave. Returns whether they hold the artifact,
    /// in which case the turn must be reassigned in the same transition.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if `id` is not registered.
    pub fn check_leave(&self, id: ParticipantId) -> Result<bool, RelayError> {
        if !self.participants.contains_key(&id) {
            return Err(RelayError::NotRegistered(id));
        }
        Ok(self.turn.is_some_and(|t| t.holder == id))
    }

    /// Removes `id` from the game.
    pub(crate) fn remove(&mut self, id: ParticipantId) {
        self.participants.remove(&id);
        self.taken_turns.remove(&id);
    }

    // --- turn assignment ---

    fn assign(&mut self, id: ParticipantId, now: DateTime<Utc>) -> Turn {
        let turn = Turn {
            holder: id,
            deadline: now + self.deadline_duration,
        };
        self.taken_turns.insert(id);
        self.turn = Some(turn);
        turn
    }

    /// Hands the artifact to `id` as the opening holder. A stale pending hop
    /// from a previous holder is dropped.
    ///
    /// # Errors
    ///
    /// `NotRegistered` or `AlreadyTaken`.
    pub fn start(
        &mut self,
        id: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<(Participant, Turn), RelayError> {
        let participant = self
            .participants
            .get(&id)
            .cloned()
            .ok_or(RelayError::NotRegistered(id))?;
        if self.taken_turns.contains(&id) {
            return Err(RelayError::AlreadyTaken(id));
        }
        self.pending = None;
        Ok((participant, self.assign(id, now)))
    }

    // --- submission ---

    /// Validates a submission and decides between an offer and the terminal
    /// self-loop.
    ///
    /// # Errors
    ///
    /// `NotYourTurn` unless `sender` holds the artifact.
    pub fn plan_submission(
        &self,
        sender: ParticipantId,
        artifact: Artifact,
        now: DateTime<Utc>,
        rng: &mut dyn DeterministicRng,
    ) -> Result<SubmissionPlan, RelayError> {
        let holder = self
            .holder()
            .filter(|h| h.id == sender)
            .ok_or(RelayError::NotYourTurn(sender))?;

        let pool: Vec<Participant> = self.remaining().filter(|p| p.id != sender).cloned().collect();
        if pool.is_empty() {
            return Ok(SubmissionPlan::Terminal(CompletedHop {
                sender: holder.clone(),
                receiver: holder.clone(),
                artifact,
                recorded_at: now,
            }));
        }

        Ok(SubmissionPlan::Offer(PendingHop {
            sender: holder.clone(),
            artifact,
            candidates: sample_without_replacement(&pool, MAX_CANDIDATES, rng),
            submitted_at: now,
        }))
    }

    /// Records an offer. Replaces any earlier offer by the same holder.
    pub(crate) fn offer(&mut self, pending: PendingHop) {
        self.pending = Some(pending);
    }

    // --- choice ---

    /// Validates a choice and builds the completed hop.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless `sender` has a pending hop that offered
    /// `receiver`; `NotRegistered`/`AlreadyTaken` if the candidate left or
    /// was taken since the offer.
    pub fn plan_choice(
        &self,
        sender: ParticipantId,
        receiver: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<CompletedHop, RelayError> {
        let pending = self
            .pending
            .as_ref()
            .filter(|p| p.sender.id == sender && p.offered(receiver).is_some())
            .ok_or(RelayError::NotAuthorized(sender))?;
        let current = self
            .participants
            .get(&receiver)
            .ok_or(RelayError::NotRegistered(receiver))?;
        if self.taken_turns.contains(&receiver) {
            return Err(RelayError::AlreadyTaken(receiver));
        }
        Ok(pending.clone().complete(current.clone(), now))
    }

    /// Applies a durable hop: appends it, clears the pending hop and hands
    /// the artifact to its receiver.
    pub(crate) fn hand_over(&mut self, hop: CompletedHop, now: DateTime<Utc>) -> Turn {
        let receiver = hop.receiver.id;
        self.chain.push(hop);
        self.pending = None;
        self.assign(receiver, now)
    }

    // --- automatic reassignment ---

    /// Picks a random receiver among everyone still waiting. The holder is
    /// already taken, so they are never picked.
    pub fn plan_reassignment(
        &self,
        now: DateTime<Utc>,
        rng: &mut dyn DeterministicRng,
    ) -> Reassignment {
        let pool: Vec<Participant> = self.remaining().cloned().collect();
        match pick_one(&pool, rng) {
            Some(receiver) => Reassignment::Pass {
                receiver: receiver.clone(),
                hop: self
                    .pending
                    .clone()
                    .map(|p| p.complete(receiver.clone(), now)),
            },
            None => Reassignment::Exhausted {
                terminal: self.pending.clone().map(|p| {
                    let sender = p.sender.clone();
                    p.complete(sender, now)
                }),
            },
        }
    }

    /// Applies a planned reassignment to `receiver`.
    pub(crate) fn reassign(
        &mut self,
        receiver: ParticipantId,
        hop: Option<CompletedHop>,
        now: DateTime<Utc>,
    ) -> Turn {
        if let Some(hop) = hop {
            self.chain.push(hop);
        }
        self.pending = None;
        self.assign(receiver, now)
    }

    /// Records the terminal self-loop. Finalization follows.
    pub(crate) fn close(&mut self, terminal: Option<CompletedHop>) {
        if let Some(hop) = terminal {
            self.chain.push(hop);
        }
        self.pending = None;
        self.turn = None;
    }

    // --- settings ---

    /// Changes the deadline for future assignments.
    ///
    /// # Errors
    ///
    /// `InvalidDuration` unless `seconds > 0`.
    pub fn set_deadline_duration(&mut self, seconds: i64) -> Result<TimeDelta, RelayError> {
        let duration = TimeDelta::try_seconds(seconds)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or(RelayError::InvalidDuration(seconds))?;
        self.deadline_duration = duration;
        Ok(duration)
    }

    /// Sets where reports go.
    pub fn set_results_destination(&mut self, destination: Option<String>) {
        self.results_destination = destination;
    }

    // --- lifecycle ---

    /// Clears the game. Settings survive.
    pub(crate) fn reset(&mut self) {
        self.participants.clear();
        self.taken_turns.clear();
        self.turn = None;
        self.pending = None;
        self.chain.clear();
    }

    /// Rebuilds the chain from durable hops after a restart. Everyone who
    /// appears in the chain counts as having taken a turn.
    pub(crate) fn rehydrate(&mut self, hops: Vec<CompletedHop>) {
        self.reset();
        for hop in &hops {
            self.taken_turns.insert(hop.sender.id);
            self.taken_turns.insert(hop.receiver.id);
        }
        self.chain = hops;
    }

    /// Checks the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(turn) = self.turn {
            if !self.participants.contains_key(&turn.holder) {
                return Err(format!("holder {} is not registered", turn.holder));
            }
            if !self.taken_turns.contains(&turn.holder) {
                return Err(format!("holder {} is not marked taken", turn.holder));
            }
        }
        if let Some(pending) = &self.pending {
            if self.turn.is_none_or(|t| t.holder != pending.sender.id) {
                return Err(format!(
                    "pending hop sender {} does not hold the artifact",
                    pending.sender.id
                ));
            }
            if pending.candidates.is_empty() || pending.candidates.len() > MAX_CANDIDATES {
                return Err(format!(
                    "pending hop offers {} candidates",
                    pending.candidates.len()
                ));
            }
        }
        if self.deadline_duration <= TimeDelta::zero() {
            return Err("deadline duration is not positive".to_owned());
        }
        Ok(())
    }
}
