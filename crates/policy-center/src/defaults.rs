use crate::model::{
    FuzzyPolicy, HealPolicy, HeuristicPolicy, LoggingPolicy, ScoringMode, StagePolicy,
};

pub fn default_policy() -> HealPolicy {
    HealPolicy {
        rev: 1,
        stages: StagePolicy {
            history: true,
            heuristics: true,
            fuzzy: true,
        },
        heuristics: HeuristicPolicy {
            disabled: Vec::new(),
        },
        fuzzy: FuzzyPolicy {
            min_score: 1,
            scoring: ScoringMode::Shallow,
        },
        logging: LoggingPolicy {
            level: "info".to_string(),
            json: false,
        },
        provenance: Default::default(),
    }
}
