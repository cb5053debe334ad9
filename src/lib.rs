//! Phase Simulation Engine
//!
//! Produces follow-up survey phases from a baseline population:
//! - Intervention catalog loaded from YAML
//! - First-match (or strongest-effect) targeting of sentiment cells and capability dimensions
//! - Targeted improvement vs. bounded natural drift per score
//! - Sequential, seeded and record-parallel transformation
//! - Advisory validation, phase summaries and multi-phase journeys

pub mod catalog;
pub mod config;
pub mod effects;
pub mod error;
pub mod journey;
pub mod model;
pub mod store;
pub mod summary;
pub mod targeting;
pub mod transformer;
pub mod validator;

// Re-exports for convenience
pub use catalog::{Intervention, InterventionCatalog};
pub use config::{ConflictPolicy, EngineConfig};
pub use effects::{RandomSource, ScoreDomain, VarianceConfig};
pub use error::{SimResult, SimulationError};
pub use journey::{Journey, JourneyStep, PhasePlan};
pub use model::{PhaseDataset, RespondentRecord};
pub use summary::{PhaseDelta, PhaseSummary};
pub use targeting::TargetResolver;
pub use transformer::{PhaseRequest, PhaseTransformer};
pub use validator::{validate, ValidationReport};
