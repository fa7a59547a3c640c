//! Validation engine: provider catalog, probe, usage estimation, orchestration.

pub mod clock;
pub mod http;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod usage;
pub mod validator;

pub use clock::{Clock, FixedClock, FixedRandom, RandomSource, SeededRandom, SystemClock, ThreadRandom};
pub use models::{TokenUsage, UsageSource, ValidationRequest, ValidationResult, key_fingerprint};
pub use orchestrator::{OrchestratorBuilder, ValidationOrchestrator};
pub use provider::{Provider, ProviderDescriptor, ProviderRegistry, UsageStrategy};
pub use usage::UsageEstimator;
pub use validator::{KeyValidator, ProbeOutcome, ProbeVerdict};
