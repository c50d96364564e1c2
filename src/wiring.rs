//! Builds a resolver from a policy snapshot.

use std::sync::Arc;

use action_locator::{
    BrowserSession, FuzzyMatcher, LocatorHistory, NodeSerialization, SelfHealingResolver,
    StageToggles, StrategyChain,
};
use selfheal_policy_center::{HealPolicy, ScoringMode};
use tracing::debug;

pub fn resolver_from_policy<S: BrowserSession>(
    session: S,
    history: Arc<dyn LocatorHistory>,
    policy: &HealPolicy,
) -> SelfHealingResolver<S> {
    let stages = StageToggles {
        history: policy.stages.history,
        heuristics: policy.stages.heuristics,
        fuzzy: policy.stages.fuzzy,
    };
    let chain = StrategyChain::default().without(&policy.heuristics.disabled);
    let matcher = FuzzyMatcher::default()
        .with_min_score(policy.fuzzy.min_score)
        .with_serialization(node_serialization(policy.fuzzy.scoring));
    debug!(
        rev = policy.rev,
        heuristics = ?chain.names(),
        min_score = matcher.min_score(),
        "resolver configured from policy"
    );

    SelfHealingResolver::new(session, history)
        .with_stages(stages)
        .with_chain(chain)
        .with_matcher(matcher)
}

fn node_serialization(mode: ScoringMode) -> NodeSerialization {
    match mode {
        ScoringMode::Shallow => NodeSerialization::Shallow,
        ScoringMode::Subtree => NodeSerialization::Subtree,
    }
}
