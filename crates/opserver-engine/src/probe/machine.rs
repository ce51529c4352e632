//! Synchronous core of the sequential probe.
//!
//! The machine hands out one [`ProbeTicket`] per attempt. Every completion
//! signal must present the ticket of the attempt it belongs to; anything
//! carrying an older generation, or arriving after a terminal phase, is
//! dropped. This is what keeps a late failure from an abandoned attempt from
//! overturning a success.

use opserver_common::error::LoadError;
use opserver_common::protocol::{Candidate, ResolutionResult};
use tracing::{debug, warn};

/// Where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Idle,
    Probing(usize),
    Succeeded,
    Exhausted,
    Cancelled,
}

impl ProbePhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProbePhase::Succeeded | ProbePhase::Exhausted | ProbePhase::Cancelled
        )
    }
}

/// Token tying a completion signal to one probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTicket {
    generation: u64,
    index: usize,
}

impl ProbeTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of the candidate being probed.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Completion signal for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSignal {
    Loaded,
    Failed(LoadError),
    TimedOut,
}

/// Why a signal was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateSignal {
    /// The ticket belongs to an attempt that has been superseded.
    Stale,
    /// The machine already reached a terminal phase.
    Terminal(ProbePhase),
}

/// What the driver should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Attempt the candidate at `ticket.index()`.
    Probe(ProbeTicket),
    /// Resolution finished. Produced once per machine.
    Finished(ResolutionResult),
    /// The signal was dropped.
    Ignored(LateSignal),
}

#[derive(Debug)]
pub struct ProbeMachine {
    candidates: Vec<Candidate>,
    phase: ProbePhase,
    generation: u64,
    attempted: Vec<usize>,
}

impl ProbeMachine {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            phase: ProbePhase::Idle,
            generation: 0,
            attempted: Vec::new(),
        }
    }

    pub fn phase(&self) -> ProbePhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Ticket of the attempt in flight, if any.
    pub fn current_ticket(&self) -> Option<ProbeTicket> {
        match self.phase {
            ProbePhase::Probing(index) => Some(ProbeTicket {
                generation: self.generation,
                index,
            }),
            _ => None,
        }
    }

    /// Indices handed out so far, in order.
    pub fn attempted(&self) -> &[usize] {
        &self.attempted
    }

    /// Leave `Idle`. An empty candidate list finishes as exhausted right away.
    pub fn start(&mut self) -> Step {
        if self.phase != ProbePhase::Idle {
            return Step::Ignored(LateSignal::Terminal(self.phase));
        }
        self.advance_to(0)
    }

    /// Feed the outcome of the attempt identified by `ticket`.
    pub fn signal(&mut self, ticket: ProbeTicket, signal: ProbeSignal) -> Step {
        if self.phase.is_terminal() {
            debug!(
                "Dropping {:?} for candidate {} after {:?}",
                signal, ticket.index, self.phase
            );
            return Step::Ignored(LateSignal::Terminal(self.phase));
        }

        if ticket.generation != self.generation || self.phase != ProbePhase::Probing(ticket.index)
        {
            debug!(
                "Dropping stale {:?} for candidate {} (generation {} vs {})",
                signal, ticket.index, ticket.generation, self.generation
            );
            return Step::Ignored(LateSignal::Stale);
        }

        match signal {
            ProbeSignal::Loaded => {
                self.phase = ProbePhase::Succeeded;
                self.generation += 1;
                let candidate = self.candidates[ticket.index].clone();
                debug!("Candidate {} ({}) loaded", ticket.index, candidate.strategy);
                Step::Finished(ResolutionResult::Resolved(candidate))
            }
            ProbeSignal::Failed(err) => {
                debug!("Candidate {} failed: {}", ticket.index, err);
                self.advance_to(ticket.index + 1)
            }
            ProbeSignal::TimedOut => {
                debug!("Candidate {} timed out", ticket.index);
                self.advance_to(ticket.index + 1)
            }
        }
    }

    /// Tear down. Every outstanding ticket becomes stale.
    pub fn cancel(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        debug!("Cancelling probe in {:?}", self.phase);
        self.phase = ProbePhase::Cancelled;
        self.generation += 1;
    }

    fn advance_to(&mut self, index: usize) -> Step {
        self.generation += 1;

        if index >= self.candidates.len() {
            if !self.candidates.is_empty() {
                warn!("All {} avatar candidates failed", self.candidates.len());
            }
            self.phase = ProbePhase::Exhausted;
            return Step::Finished(ResolutionResult::Exhausted);
        }

        self.phase = ProbePhase::Probing(index);
        self.attempted.push(index);
        Step::Probe(ProbeTicket {
            generation: self.generation,
            index,
        })
    }
}
