pub mod api;
pub mod defaults;
pub mod errors;
pub mod loader;
pub mod model;

pub use api::{InMemoryPolicyCenter, PolicyCenter};
pub use defaults::default_policy;
pub use errors::PolicyError;
pub use loader::{load_policy, load_policy_with_options, LoadOptions};
pub use model::{
    FuzzyPolicy, HealPolicy, HeuristicPolicy, LoggingPolicy, PolicySource, ScoringMode,
    StagePolicy,
};
