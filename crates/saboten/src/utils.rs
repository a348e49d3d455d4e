//! Parallelism configuration shared by routing and training.
//!
//! The growth algorithm itself is sequential. Only read-only routing of
//! independent samples through a model snapshot fans out over rayon; merging
//! the results stays on the calling thread.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, components may use `rayon` parallel iterators. The
/// thread pool itself is set up by [`run_with_threads`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over `iter`, in parallel if allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Build a pool of exactly `n_threads` threads.
///
/// Returns `None` for `0` and `1` (global pool and sequential execution need
/// no pool of their own) and when the pool cannot be built.
pub fn dedicated_pool(n_threads: usize) -> Option<rayon::ThreadPool> {
    if n_threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(n_threads).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            log::warn!("falling back to sequential execution: {}", err);
            None
        }
    }
}

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use the global pool)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// Falls back to sequential execution if a dedicated pool cannot be built.
/// Builds a fresh pool per call; callers that run repeatedly should keep the
/// result of [`dedicated_pool`] instead.
pub fn run_with_threads<T: Send>(n_threads: usize, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel if n_threads == 0 => f(Parallelism::Parallel),
        Parallelism::Parallel => match dedicated_pool(n_threads) {
            Some(pool) => pool.install(|| f(Parallelism::Parallel)),
            None => f(Parallelism::Sequential),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallelism_from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(2).is_parallel());
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn test_run_with_threads_sequential() {
        let result = run_with_threads(1, |p| (p, 42));
        assert_eq!(result, (Parallelism::Sequential, 42));
    }

    #[test]
    fn test_run_with_threads_explicit() {
        let result = run_with_threads(2, |_| rayon::current_num_threads());
        assert_eq!(result, 2);
    }

    #[test]
    fn test_dedicated_pool() {
        assert!(dedicated_pool(0).is_none());
        assert!(dedicated_pool(1).is_none());
        let pool = dedicated_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        assert_eq!(pool.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn test_maybe_par_map_keeps_order() {
        let result: Vec<_> = Parallelism::Sequential.maybe_par_map(0..5usize, |i| i * 2);
        assert_eq!(result, vec![0, 2, 4, 6, 8]);

        let result: Vec<_> = Parallelism::Parallel.maybe_par_map(0..5usize, |i| i * 2);
        assert_eq!(result, vec![0, 2, 4, 6, 8]);
    }
}
