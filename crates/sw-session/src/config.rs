//! Configuration for a session.

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// RNG seed for AI move selection. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Nodes the host may create per turn.
    pub host_quota: u32,
    /// Nodes every other player may create per turn.
    pub guest_quota: u32,
    /// Characters of each description quoted in turn summaries.
    pub summary_excerpt_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            host_quota: 2,
            guest_quota: 1,
            summary_excerpt_len: 50,
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the host's per-turn quota (at least 1).
    pub fn with_host_quota(mut self, quota: u32) -> Self {
        self.host_quota = quota.max(1);
        self
    }

    /// Set the per-turn quota for everyone but the host (at least 1).
    pub fn with_guest_quota(mut self, quota: u32) -> Self {
        self.guest_quota = quota.max(1);
        self
    }

    /// Set the summary excerpt length.
    pub fn with_excerpt_len(mut self, len: usize) -> Self {
        self.summary_excerpt_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.host_quota, 2);
        assert_eq!(cfg.guest_quota, 1);
        assert_eq!(cfg.summary_excerpt_len, 50);
    }

    #[test]
    fn builder_methods() {
        let cfg = SessionConfig::default()
            .with_seed(7)
            .with_host_quota(3)
            .with_excerpt_len(20);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.host_quota, 3);
        assert_eq!(cfg.summary_excerpt_len, 20);
    }

    #[test]
    fn quotas_never_drop_to_zero() {
        let cfg = SessionConfig::default().with_host_quota(0).with_guest_quota(0);
        assert_eq!(cfg.host_quota, 1);
        assert_eq!(cfg.guest_quota, 1);
    }
}
