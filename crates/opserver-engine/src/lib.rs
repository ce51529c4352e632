pub mod config;
pub mod countries;
pub mod image_loader;
pub mod normalizer;
pub mod presentation;
pub mod probe;
pub mod settings;
pub mod strategy;

pub use opserver_common::error;
pub use opserver_common::protocol;

pub use image_loader::{HttpImageLoader, ImageLoader};
pub use normalizer::normalize;
pub use presentation::{AvatarView, Presentation, fallback_glyph};
pub use probe::{ProbeEngine, ProbePolicy};
pub use strategy::{CandidateBuilder, build_candidates};
