use std::path::{Path, PathBuf};
use std::sync::Arc;

use selfheal_policy_center::{HealPolicy, InMemoryPolicyCenter, PolicyCenter};

pub struct CliContext {
    policy_center: InMemoryPolicyCenter,
    policy_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(policy: HealPolicy, policy_path: Option<PathBuf>) -> Self {
        Self {
            policy_center: InMemoryPolicyCenter::new(policy),
            policy_path,
        }
    }

    /// Current policy snapshot
    pub fn policy(&self) -> Arc<HealPolicy> {
        self.policy_center.snapshot()
    }

    pub fn policy_center(&self) -> &InMemoryPolicyCenter {
        &self.policy_center
    }

    pub fn policy_path(&self) -> Option<&Path> {
        self.policy_path.as_deref()
    }
}
