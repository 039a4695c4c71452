use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Worker pool settings for training.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = let rayon decide)
    pub n_jobs: usize,
}

impl RuntimeConfig {
    pub fn with_jobs(n_jobs: usize) -> Self {
        Self { n_jobs }
    }
}

/// Builds a dedicated, bounded pool so training never competes with the
/// global rayon pool of the host process.
pub fn create_thread_pool(config: &RuntimeConfig) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("tabforest-train-{}", i));

    if config.n_jobs > 0 {
        builder = builder.num_threads(config.n_jobs);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_follows_config() {
        let pool = create_thread_pool(&RuntimeConfig::with_jobs(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }

    #[test]
    fn test_default_pool_builds() {
        let pool = create_thread_pool(&RuntimeConfig::default());
        assert!(pool.is_ok());
        assert!(pool.unwrap().current_num_threads() > 0);
    }
}
