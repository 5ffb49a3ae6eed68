//! Parallel execution of independent simulation scenarios
//!
//! Each scenario is a job: a closure that receives its `scenario_id`, builds
//! and runs its own simulation, and returns whatever result the caller wants
//! to keep. Jobs share nothing, so they can run on any thread in any order.
//!
//! # Example: a parameter sweep
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! use des::{Agent, Context, EventLoop, Response};
//!
//! struct Counter;
//! impl Agent<u8, usize> for Counter {
//!     fn act(&mut self, t: f64, _: &u8, ctx: &mut Context<u8, usize>) -> Response<u8, usize> {
//!         *ctx.state += 1;
//!         Response::event(t + 1.0, 0)
//!     }
//! }
//!
//! let results = ParallelRunner::new(20, |scenario_id| {
//!     let mut event_loop = EventLoop::<u8, usize>::new(0);
//!     event_loop.spawn(0.0, 0, Box::new(Counter));
//!     event_loop.run(10.0 + scenario_id as f64);
//!     event_loop.into_state()
//! })
//! .progress(|completed, total| println!("{}/{} scenarios done", completed, total))
//! .num_threads(4)
//! .run();
//!
//! assert_eq!(results[0], Ok(10));
//! assert_eq!(results[5], Ok(15));
//! ```
//!
//! # Determinism
//!
//! Results are deterministic when each job derives its RNG seed from
//! `scenario_id` and no mutable state is shared between jobs. Results are
//! returned in scenario order regardless of thread count.
//!
//! # Error Handling
//!
//! Panics in individual scenarios are caught and returned as `Err(String)`.
//! Other scenarios continue executing normally.

use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::panic_message;

/// Executes independent scenario jobs in parallel
///
/// The job `F` is called once per scenario with its `scenario_id` and must be
/// `Send + Sync` so rayon can call it from worker threads.
pub struct ParallelRunner<R, F>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    num_scenarios: usize,
    job: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
}

impl<R, F> ParallelRunner<R, F>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    pub fn new(num_scenarios: usize, job: F) -> Self {
        ParallelRunner {
            num_scenarios,
            job,
            num_threads: None,
            progress_callback: None,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios and return results in scenario_id order
    ///
    /// - `Ok(R)` for scenarios that returned normally
    /// - `Err(String)` carrying the panic message otherwise
    ///
    /// If a custom thread pool cannot be built the global pool is used.
    pub fn run(self) -> Vec<Result<R, String>> {
        let progress_counter = AtomicUsize::new(0);

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| tracing::warn!(error = %e, "falling back to global thread pool"))
                .ok()
        });

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        (self.job)(scenario_id)
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    result.map_err(panic_message)
                })
                .collect()
        };

        if let Some(pool) = pool {
            pool.install(execute)
        } else {
            execute()
        }
    }
}
