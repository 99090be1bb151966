// src/operation.rs
//! Invoke-and-track container for remote operations.
//!
//! Each `run` takes a new generation number. Only the completion carrying the
//! latest generation is written back; older completions are dropped, so a slow
//! response can never overwrite a fresher one.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{JobBoardError, Result};

pub type OperationFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

type OperationFn<O, A, T> = dyn Fn(O, A) -> OperationFuture<T> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    NotStarted,
    InFlight,
    Settled,
}

#[derive(Debug, Clone)]
pub struct OperationState<T> {
    pub loading: Loading,
    pub data: Option<T>,
    pub error: Option<Arc<JobBoardError>>,
    generation: u64,
}

impl<T> OperationState<T> {
    fn new() -> Self {
        Self {
            loading: Loading::NotStarted,
            data: None,
            error: None,
            generation: 0,
        }
    }

    /// Number of `run` calls issued so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to the result of a single `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Applied,
    /// A later `run` was issued before this one completed
    Superseded,
}

/// Wraps `op(options, args)` and tracks `{loading, data, error}`.
///
/// `options` are the pre-bound arguments (e.g. the current `JobFilter`);
/// `args` are supplied per call.
pub struct AsyncOperation<O, A, T> {
    op: Arc<OperationFn<O, A, T>>,
    options: Mutex<O>,
    state: Arc<watch::Sender<OperationState<T>>>,
}

impl<O, A, T> AsyncOperation<O, A, T>
where
    O: Clone + Send + 'static,
    A: Send + 'static,
    T: Send + Sync + 'static,
{
    pub fn new<F>(options: O, op: F) -> Self
    where
        F: Fn(O, A) -> OperationFuture<T> + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(OperationState::new());
        Self {
            op: Arc::new(op),
            options: Mutex::new(options),
            state: Arc::new(state),
        }
    }

    /// Replace the pre-bound options used by subsequent runs
    pub fn set_options(&self, options: O) {
        *self.options.lock().unwrap_or_else(PoisonError::into_inner) = options;
    }

    pub fn options(&self) -> O {
        self.options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start the operation.
    ///
    /// `loading` is `InFlight` by the time this returns, before the returned
    /// future is first polled. Previous `data` is kept until the new result
    /// lands.
    pub fn run(&self, args: A) -> impl Future<Output = RunOutcome> + Send + 'static {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.loading = Loading::InFlight;
            state.error = None;
        });

        let pending = (self.op)(self.options(), args);
        let state = Arc::clone(&self.state);

        async move {
            let result = pending.await;
            let applied = state.send_if_modified(move |current| {
                if current.generation != generation {
                    return false;
                }
                match result {
                    Ok(data) => {
                        current.data = Some(data);
                        current.error = None;
                    }
                    Err(error) => {
                        current.data = None;
                        current.error = Some(Arc::new(error));
                    }
                }
                current.loading = Loading::Settled;
                true
            });

            if applied {
                RunOutcome::Applied
            } else {
                debug!("Discarding result of superseded run {}", generation);
                RunOutcome::Superseded
            }
        }
    }

    pub fn loading(&self) -> Loading {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<Arc<JobBoardError>> {
        self.state.borrow().error.clone()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<OperationState<T>> {
        self.state.subscribe()
    }
}

impl<O, A, T> AsyncOperation<O, A, T>
where
    T: Clone,
{
    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn snapshot(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }
}
