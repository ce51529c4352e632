pub mod engine;
pub mod machine;
pub mod policy;

pub use engine::{ProbeEngine, SharedProbe};
pub use machine::{LateSignal, ProbeMachine, ProbePhase, ProbeSignal, ProbeTicket, Step};
pub use policy::ProbePolicy;
