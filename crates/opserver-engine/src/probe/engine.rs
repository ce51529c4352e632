//! Async driver for [`ProbeMachine`].

use super::machine::{ProbeMachine, ProbeSignal, ProbeTicket, Step};
use super::policy::ProbePolicy;
use crate::image_loader::ImageLoader;
use opserver_common::protocol::{Candidate, ResolutionResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// A machine shared between a driver task and whoever may cancel it.
pub type SharedProbe = Arc<Mutex<ProbeMachine>>;

pub(crate) fn lock(probe: &SharedProbe) -> MutexGuard<'_, ProbeMachine> {
    probe.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Probes candidates one at a time until one loads or the list runs out.
pub struct ProbeEngine<L: ImageLoader + ?Sized> {
    loader: Arc<L>,
    policy: ProbePolicy,
}

impl<L: ImageLoader + ?Sized> ProbeEngine<L> {
    pub fn new(loader: Arc<L>, policy: ProbePolicy) -> Self {
        Self { loader, policy }
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    /// Resolve a candidate list with a private machine.
    pub async fn resolve(&self, candidates: Vec<Candidate>) -> ResolutionResult {
        let probe: SharedProbe = Arc::new(Mutex::new(ProbeMachine::new(candidates)));
        // nobody else holds the machine, so it cannot be cancelled
        self.drive(&probe)
            .await
            .unwrap_or(ResolutionResult::Exhausted)
    }

    /// Drive a shared machine to completion.
    ///
    /// Returns `None` when the machine was cancelled (or started elsewhere)
    /// before a result was reached. The lock is never held across an await.
    pub async fn drive(&self, probe: &SharedProbe) -> Option<ResolutionResult> {
        let mut step = lock(probe).start();

        loop {
            match step {
                Step::Probe(ticket) => {
                    let url = match lock(probe).candidate(ticket.index()) {
                        Some(candidate) => candidate.url.clone(),
                        None => return None,
                    };
                    let signal = self.attempt(ticket, &url).await;
                    step = lock(probe).signal(ticket, signal);
                }
                Step::Finished(result) => {
                    if let ResolutionResult::Resolved(candidate) = &result {
                        info!("Resolved avatar via {} ({})", candidate.strategy, candidate.url);
                    }
                    return Some(result);
                }
                Step::Ignored(reason) => {
                    debug!("Probe stopped: {:?}", reason);
                    return None;
                }
            }
        }
    }

    async fn attempt(&self, ticket: ProbeTicket, url: &str) -> ProbeSignal {
        let index = ticket.index();
        let delay = self.policy.delay_before(index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        debug!("Probing candidate {}: {}", index, url);
        match tokio::time::timeout(self.policy.timeout_for(index), self.loader.load(url)).await {
            Ok(Ok(())) => ProbeSignal::Loaded,
            Ok(Err(err)) => ProbeSignal::Failed(err),
            Err(_) => ProbeSignal::TimedOut,
        }
    }
}

impl<L: ImageLoader + ?Sized> Clone for ProbeEngine<L> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            policy: self.policy,
        }
    }
}
