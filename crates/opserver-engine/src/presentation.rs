//! Render state for avatar views and the binding that drives it.

use crate::config::OpserverConfig;
use crate::image_loader::ImageLoader;
use crate::probe::{ProbeEngine, ProbeMachine, ProbePolicy, SharedProbe};
use crate::strategy::CandidateBuilder;
use opserver_common::protocol::{RenderState, ResolutionResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Glyph drawn when no candidate loaded: the first letter or digit of the
/// label, uppercased, or `?`.
pub fn fallback_glyph(label: Option<&str>) -> String {
    label
        .and_then(|l| l.chars().find(|c| c.is_alphanumeric()))
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Monotonic render state.
///
/// Each mount opens a new generation. Results are only accepted for the
/// current generation, and once a mount has succeeded nothing moves it.
#[derive(Debug, Clone)]
pub struct Presentation {
    state: RenderState,
    label: Option<String>,
    generation: u64,
}

impl Presentation {
    pub fn new() -> Self {
        Self {
            state: RenderState::Loading,
            label: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new resolution and return its generation.
    pub fn begin(&mut self, label: Option<&str>) -> u64 {
        self.generation += 1;
        self.label = label.map(str::to_string);
        self.state = RenderState::Loading;
        self.generation
    }

    /// Invalidate the current generation without starting a new one.
    pub fn retire(&mut self) {
        self.generation += 1;
    }

    /// Apply a terminal result. Returns whether the state changed.
    pub fn apply(&mut self, generation: u64, result: ResolutionResult) -> bool {
        if generation != self.generation {
            debug!(
                "Dropping result for generation {} (current {})",
                generation, self.generation
            );
            return false;
        }
        if !self.state.is_loading() {
            debug!("Dropping {:?}, already settled as {:?}", result, self.state);
            return false;
        }

        self.state = match result {
            ResolutionResult::Resolved(candidate) => RenderState::Succeeded {
                url: candidate.url,
                strategy: candidate.strategy,
            },
            ResolutionResult::Exhausted => RenderState::Exhausted {
                glyph: fallback_glyph(self.label.as_deref()),
            },
        };
        true
    }

    /// The displayed image reported an error after it resolved.
    ///
    /// Logged only. A settled state never changes, so this returns `false`;
    /// the return value matches [`Self::apply`] so callers can treat both
    /// uniformly.
    pub fn display_error(&mut self, generation: u64) -> bool {
        debug!(
            "Ignoring display error for generation {} in {:?}",
            generation, self.state
        );
        false
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

struct Mounted {
    source: Option<String>,
    probe: SharedProbe,
    task: Option<JoinHandle<()>>,
}

struct ViewShared {
    presentation: Mutex<Presentation>,
    state_tx: watch::Sender<RenderState>,
}

impl ViewShared {
    fn presentation(&self) -> MutexGuard<'_, Presentation> {
        self.presentation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, generation: u64, result: ResolutionResult) {
        let mut presentation = self.presentation();
        if presentation.apply(generation, result) {
            self.state_tx.send_replace(presentation.state().clone());
        }
    }
}

/// Avatar resolution bound to a view's lifecycle.
///
/// Must be used inside a tokio runtime. Dropping the view unmounts it.
pub struct AvatarView<L: ImageLoader + ?Sized + 'static> {
    engine: ProbeEngine<L>,
    builder: CandidateBuilder,
    shared: Arc<ViewShared>,
    mounted: Option<Mounted>,
}

impl<L: ImageLoader + ?Sized + 'static> AvatarView<L> {
    pub fn new(engine: ProbeEngine<L>, builder: CandidateBuilder) -> Self {
        let (state_tx, _) = watch::channel(RenderState::Loading);
        Self {
            engine,
            builder,
            shared: Arc::new(ViewShared {
                presentation: Mutex::new(Presentation::new()),
                state_tx,
            }),
            mounted: None,
        }
    }

    pub fn from_config(config: &OpserverConfig, loader: Arc<L>) -> Self {
        Self::new(
            ProbeEngine::new(loader, ProbePolicy::from_config(&config.probe)),
            CandidateBuilder::new(config.sources.clone()),
        )
    }

    pub fn state(&self) -> RenderState {
        self.shared.presentation().state().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait until the current mount leaves `Loading`.
    pub async fn settled(&self) -> RenderState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // sender lives in `self`, so this only happens mid-teardown
            Err(_) => self.state(),
        }
    }

    /// Start resolving `source`, abandoning any resolution in flight.
    pub fn mount(&mut self, source: Option<&str>, label: Option<&str>) {
        self.unmount();

        let candidates = self.builder.build(source);
        let nothing_to_probe = candidates.is_empty();
        let generation = {
            let mut presentation = self.shared.presentation();
            let generation = presentation.begin(label);
            self.shared
                .state_tx
                .send_replace(presentation.state().clone());
            generation
        };
        debug!(
            "Mounting avatar generation {} with {} candidates",
            generation,
            candidates.len()
        );

        let probe: SharedProbe = Arc::new(Mutex::new(ProbeMachine::new(candidates)));
        let task = if nothing_to_probe {
            self.shared.apply(generation, ResolutionResult::Exhausted);
            None
        } else {
            let engine = self.engine.clone();
            let shared = Arc::clone(&self.shared);
            let task_probe = Arc::clone(&probe);
            Some(tokio::spawn(async move {
                if let Some(result) = engine.drive(&task_probe).await {
                    shared.apply(generation, result);
                }
            }))
        };

        self.mounted = Some(Mounted {
            source: source.map(str::to_string),
            probe,
            task,
        });
    }

    /// Remount only if `source` differs from the mounted one.
    pub fn set_source(&mut self, source: Option<&str>, label: Option<&str>) {
        if let Some(mounted) = &self.mounted
            && mounted.source.as_deref() == source
        {
            return;
        }
        self.mount(source, label);
    }

    /// Cancel the in-flight resolution. Nothing from it reaches the view
    /// afterwards.
    pub fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };

        self.shared.presentation().retire();
        mounted
            .probe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        if let Some(task) = mounted.task {
            task.abort();
        }
    }

    /// Shared machine of the current mount.
    ///
    /// For rendering hosts that run their own loads (a browser `Image`
    /// element, say) and feed completion signals back through
    /// [`ProbeMachine::signal`] with the ticket from
    /// [`ProbeMachine::current_ticket`].
    pub fn probe(&self) -> Option<&SharedProbe> {
        self.mounted.as_ref().map(|m| &m.probe)
    }

    /// Generation that results must carry to be accepted.
    pub fn generation(&self) -> u64 {
        self.shared.presentation().generation()
    }

    /// Hand a terminal result to the view.
    ///
    /// Used by rendering hosts that drive the machine from [`Self::probe`]
    /// themselves. The result is dropped unless `generation` is current and
    /// the view is still loading.
    pub fn deliver(&self, generation: u64, result: ResolutionResult) {
        self.shared.apply(generation, result);
    }

    /// The rendering host's displayed image fired an error event.
    ///
    /// Logged only: a settled view keeps its state.
    pub fn report_display_error(&self) {
        let mut presentation = self.shared.presentation();
        let generation = presentation.generation();
        presentation.display_error(generation);
    }
}

impl<L: ImageLoader + ?Sized + 'static> Drop for AvatarView<L> {
    fn drop(&mut self) {
        self.unmount();
    }
}
