//! Parallel processing strategies

/// Processing mode for tile work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Single-threaded processing on the caller's thread
    Sequential,
    /// Parallel processing using all available cores
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl Default for ProcessingMode {
    fn default() -> Self {
        ProcessingMode::Parallel
    }
}

impl ProcessingMode {
    /// Mode for an optional thread count: `None` or `Some(0)` means all cores.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None | Some(0) => ProcessingMode::Parallel,
            Some(1) => ProcessingMode::Sequential,
            Some(n) => ProcessingMode::ParallelWith(n),
        }
    }

    /// Number of worker threads this mode asks for
    pub fn threads(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => num_cpus(),
            ProcessingMode::ParallelWith(n) => (*n).max(1),
        }
    }

    /// Build the dedicated worker pool for this mode.
    ///
    /// Returns `None` for [`ProcessingMode::Sequential`] or when the
    /// `parallel` feature is disabled.
    #[cfg(feature = "parallel")]
    pub(crate) fn build_pool(&self) -> sunclock_core::Result<Option<rayon::ThreadPool>> {
        if *self == ProcessingMode::Sequential {
            return Ok(None);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads())
            .thread_name(|i| format!("sunclock-tile-{}", i))
            .build()
            .map(Some)
            .map_err(|e| sunclock_core::Error::Other(format!("failed to build tile worker pool: {}", e)))
    }
}

/// Get the number of available CPU cores
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
