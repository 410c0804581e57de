/// Tile Operation Executor
///
/// Runs the index-parallel loops behind every bulk tile operation:
/// - serial loop or an owned rayon pool, picked from [`ExecConfig`]
/// - an explicit barrier after every dispatch
/// - chunked exclusive prefix sum for stream compaction
/// - the named count read-back that finalizes a compaction
/// - lock-free counters and an optional event trace of all of the above
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::scan::{exclusive_scan_chunked, exclusive_scan_serial, MaskFlag};
use crate::config::{ExecConfig, ExecutionSpace};
use crate::error::{invalid_config, TransformResult};

/// A synchronization-relevant step recorded when tracing is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecEvent {
    /// An index-parallel loop over `len` indices was launched
    Dispatch { len: usize },
    /// All work of the preceding dispatch has completed
    Barrier,
    /// An exclusive prefix sum over `len` mask entries completed
    Scan { len: usize },
    /// The selected count was read back after a scan
    ReadBack { count: usize },
}

/// Snapshot of the executor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecStats {
    pub dispatches: u64,
    pub barriers: u64,
    pub scans: u64,
    pub read_backs: u64,
}

#[derive(Debug, Default)]
struct ExecCounters {
    dispatches: AtomicU64,
    barriers: AtomicU64,
    scans: AtomicU64,
    read_backs: AtomicU64,
}

enum Backend {
    Serial,
    Pool(ThreadPool),
}

/// Execution context shared by the tiles that use it
pub struct Executor {
    backend: Backend,
    config: ExecConfig,
    counters: ExecCounters,
    trace: Option<Mutex<Vec<ExecEvent>>>,
}

/// Process-wide default executor
static GLOBAL_EXECUTOR: OnceLock<Arc<Executor>> = OnceLock::new();

impl Executor {
    /// Build an executor, creating its thread pool if configured
    pub fn new(config: ExecConfig) -> TransformResult<Self> {
        config.validate()?;

        let backend = match config.execution_space {
            ExecutionSpace::Serial => Backend::Serial,
            ExecutionSpace::ThreadPool => {
                let prefix = config.thread_name_prefix.clone();
                let mut builder = ThreadPoolBuilder::new()
                    .num_threads(config.resolved_threads())
                    .thread_name(move |idx| format!("{}-{}", prefix, idx));

                if let Some(stack_size) = config.stack_size {
                    builder = builder.stack_size(stack_size);
                }

                Backend::Pool(builder.build()?)
            }
        };

        log::debug!(
            "[Executor::new] {:?} with {} thread(s), grain {}",
            config.execution_space,
            config.resolved_threads(),
            config.min_parallel_len
        );

        let trace = config.trace_events.then(|| Mutex::new(Vec::new()));

        Ok(Self {
            backend,
            config,
            counters: ExecCounters::default(),
            trace,
        })
    }

    /// Single-threaded executor, never fails
    pub fn serial() -> Self {
        let config = ExecConfig::serial();
        let trace = config.trace_events.then(|| Mutex::new(Vec::new()));
        Self {
            backend: Backend::Serial,
            config,
            counters: ExecCounters::default(),
            trace,
        }
    }

    /// Install the global executor. Fails if one is already installed.
    pub fn initialize(config: ExecConfig) -> TransformResult<()> {
        if GLOBAL_EXECUTOR.get().is_some() {
            return Err(invalid_config("executor", "global executor already initialized"));
        }

        let executor = Arc::new(Self::new(config)?);
        GLOBAL_EXECUTOR
            .set(executor)
            .map_err(|_| invalid_config("executor", "global executor already initialized"))
    }

    /// Get the global executor, installing the default one on first use
    pub fn global() -> Arc<Executor> {
        GLOBAL_EXECUTOR
            .get_or_init(|| {
                let executor = Self::new(ExecConfig::default()).unwrap_or_else(|e| {
                    log::warn!("[Executor::global] falling back to serial execution: {}", e);
                    Self::serial()
                });
                Arc::new(executor)
            })
            .clone()
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Number of workers a dispatch can use
    pub fn num_threads(&self) -> usize {
        match &self.backend {
            Backend::Serial => 1,
            Backend::Pool(pool) => pool.current_num_threads(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.backend, Backend::Pool(_))
    }

    /// Run `body(i)` for every `i` in `[0, n)`, then synchronize.
    ///
    /// Iterations may run in any order and concurrently; the call returns only
    /// once all of them have completed.
    pub fn for_each_index<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        self.record_dispatch(n);

        match &self.backend {
            Backend::Serial => (0..n).for_each(&body),
            Backend::Pool(pool) => {
                let grain = self.config.min_parallel_len;
                pool.install(|| (0..n).into_par_iter().with_min_len(grain).for_each(&body));
            }
        }

        self.synchronize();
    }

    /// Evaluate `keep(i)` for every `i` in `[0, n)` into a 0/1 mask
    pub fn build_mask<F>(&self, n: usize, keep: F) -> Vec<u8>
    where
        F: Fn(usize) -> bool + Sync + Send,
    {
        let mut mask = vec![0u8; n];
        self.record_dispatch(n);

        match &self.backend {
            Backend::Serial => {
                for (i, flag) in mask.iter_mut().enumerate() {
                    *flag = u8::from(keep(i));
                }
            }
            Backend::Pool(pool) => {
                let grain = self.config.min_parallel_len;
                pool.install(|| {
                    mask.par_iter_mut()
                        .with_min_len(grain)
                        .enumerate()
                        .for_each(|(i, flag)| *flag = u8::from(keep(i)));
                });
            }
        }

        self.synchronize();
        mask
    }

    /// Exclusive prefix sum of the mask flags: `offsets[k]` is the number of
    /// set entries strictly before `k`.
    pub fn exclusive_scan<M: MaskFlag>(&self, mask: &[M]) -> Vec<usize> {
        let mut offsets = vec![0usize; mask.len()];

        match &self.backend {
            Backend::Serial => {
                exclusive_scan_serial(mask, &mut offsets);
            }
            Backend::Pool(pool) => {
                let chunk_len = self.scan_chunk_len(mask.len());
                pool.install(|| exclusive_scan_chunked(mask, &mut offsets, chunk_len));
            }
        }

        self.counters.scans.fetch_add(1, Ordering::Relaxed);
        self.record(ExecEvent::Scan { len: mask.len() });
        log::trace!("[Executor::exclusive_scan] scanned {} mask entries", mask.len());
        offsets
    }

    /// Read back the selected count once the scan has completed.
    ///
    /// The count is the last entry's own flag plus the number of set entries
    /// before it. Returns 0 for an empty mask.
    pub fn read_back_count<M: MaskFlag>(&self, mask: &[M], offsets: &[usize]) -> usize {
        debug_assert_eq!(mask.len(), offsets.len());

        let count = match (mask.last(), offsets.last()) {
            (Some(&last_mask), Some(&last_offset)) => last_mask.flag() + last_offset,
            _ => 0,
        };

        self.counters.read_backs.fetch_add(1, Ordering::Relaxed);
        self.record(ExecEvent::ReadBack { count });
        log::trace!("[Executor::read_back_count] {} of {} selected", count, mask.len());
        count
    }

    /// Barrier closing a dispatch
    pub fn synchronize(&self) {
        self.counters.barriers.fetch_add(1, Ordering::Relaxed);
        self.record(ExecEvent::Barrier);
    }

    pub fn stats(&self) -> ExecStats {
        ExecStats {
            dispatches: self.counters.dispatches.load(Ordering::Relaxed),
            barriers: self.counters.barriers.load(Ordering::Relaxed),
            scans: self.counters.scans.load(Ordering::Relaxed),
            read_backs: self.counters.read_backs.load(Ordering::Relaxed),
        }
    }

    /// Recorded events, empty unless `trace_events` is enabled
    pub fn events(&self) -> Vec<ExecEvent> {
        self.trace
            .as_ref()
            .map(|trace| trace.lock().clone())
            .unwrap_or_default()
    }

    pub fn clear_events(&self) {
        if let Some(trace) = &self.trace {
            trace.lock().clear();
        }
    }

    fn scan_chunk_len(&self, len: usize) -> usize {
        let per_worker = len.div_ceil(self.num_threads() * 4);
        per_worker.max(self.config.min_parallel_len)
    }

    fn record_dispatch(&self, len: usize) {
        self.counters.dispatches.fetch_add(1, Ordering::Relaxed);
        self.record(ExecEvent::Dispatch { len });
    }

    fn record(&self, event: ExecEvent) {
        if let Some(trace) = &self.trace {
            trace.lock().push(event);
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("execution_space", &self.config.execution_space)
            .field("num_threads", &self.num_threads())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn pool_executor() -> Executor {
        Executor::new(ExecConfig::thread_pool(4).with_min_parallel_len(8).with_trace(true)).unwrap()
    }

    #[test]
    fn test_for_each_visits_every_index_once() {
        for executor in [Executor::serial(), pool_executor()] {
            let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
            executor.for_each_index(hits.len(), |i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
            });
            assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        }
    }

    #[test]
    fn test_dispatch_is_followed_by_barrier() {
        let executor = pool_executor();
        executor.for_each_index(10, |_| {});
        assert_eq!(
            executor.events(),
            vec![ExecEvent::Dispatch { len: 10 }, ExecEvent::Barrier]
        );
        assert_eq!(executor.stats().barriers, 1);

        executor.clear_events();
        assert!(executor.events().is_empty());
    }

    #[test]
    fn test_build_mask_and_scan() {
        let executor = pool_executor();
        let mask = executor.build_mask(100, |i| i % 3 == 0);
        assert_eq!(mask.iter().filter(|&&m| m == 1).count(), 34);

        let offsets = executor.exclusive_scan(&mask);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[3], 1);
        assert_eq!(offsets[99], 33);
        assert_eq!(executor.read_back_count(&mask, &offsets), 34);
    }

    #[test]
    fn test_read_back_of_empty_mask() {
        let executor = Executor::serial();
        let mask: [u8; 0] = [];
        assert_eq!(executor.read_back_count(&mask, &[]), 0);
    }

    #[test]
    fn test_untraced_executor_records_nothing() {
        let executor = Executor::serial();
        executor.for_each_index(4, |_| {});
        assert!(executor.events().is_empty());
        assert_eq!(executor.stats().dispatches, 1);
    }

    #[test]
    fn test_global_executor_is_shared() {
        let a = Executor::global();
        let b = Executor::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Executor::initialize(ExecConfig::serial()).is_err());
    }
}
