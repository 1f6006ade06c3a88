//! # Pantry Runtime
//!
//! Runtime pieces shared by every Pantry call site.
//!
//! ## Contents
//!
//! - **Store**: owns a reducer's state, runs it, executes the returned effects
//!   and feeds the actions they produce back in
//! - **Transport**: [`transport::ReqwestTransport`], the production
//!   [`pantry_core::environment::HttpTransport`]
//! - **Logging**: [`logging::init`] and [`logging::report_error`]
//!
//! ## Example
//!
//! ```ignore
//! use pantry_runtime::Store;
//!
//! let store = Store::new(FetchState::default(), FetchReducer::new(endpoint, options), env);
//! let pending = store.observe(|s: &FetchState| s.pending).await;
//!
//! let mut handle = store.send(FetchAction::Start { inputs, refresh: false }).await?;
//! handle.wait().await;
//! assert!(!*pending.borrow());
//! ```

use pantry_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};

pub mod logging;
pub mod transport;

pub use transport::ReqwestTransport;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store was closed and no longer accepts actions.
        ///
        /// Returned for actions sent after [`crate::Store::close`], including
        /// results of effects that were still running when the store closed.
        #[error("Store is closed")]
        Closed,
    }
}

pub use error::StoreError;

/// Completion tracker for the effects of one action.
///
/// Returned by [`Store::send()`]. Waiting on it resolves once every effect
/// produced directly by that action has finished. Actions fed back by those
/// effects are processed before their effect completes, so their state
/// changes are visible once `wait()` returns.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// A handle with nothing to wait for.
    #[must_use]
    pub fn completed() -> Self {
        let (_, rx) = watch::channel(());
        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Resolves when the tracked effects are done.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// [`EffectHandle::wait`], bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Effect counter shared by every effect of one `send`.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Decrements the effect counter on drop, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Projection of the state kept in sync with every reduction.
///
/// Returns `false` once nobody listens, so the store can drop it.
type Observer<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;

/// The reducer runtime.
pub mod store {
    use super::{
        Arc, AtomicBool, DecrementGuard, Effect, EffectHandle, EffectTracking, Mutex, Observer,
        Ordering, Reducer, RwLock, StoreError, watch,
    };

    /// Runs one reducer over its own state.
    ///
    /// Actions are reduced under the state write lock, observers are
    /// refreshed before the lock is released, and effects are spawned on the
    /// tokio runtime. Actions produced by effects go through [`Store::send`]
    /// again.
    ///
    /// Cloning a store is cheap and yields a handle to the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        observers: Arc<Mutex<Vec<Observer<S>>>>,
        closed: Arc<AtomicBool>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// A store starting from `initial_state`.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                observers: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Reduce `action` and spawn its effects.
        ///
        /// Returns once the effects are spawned; use the returned [`EffectHandle`] to wait for it.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Closed`] if the store has been closed.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.closed.load(Ordering::Acquire) {
                tracing::debug!("Rejected action: store is closed");
                return Err(StoreError::Closed);
            }

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                tracing::trace!(effects = effects.len(), "Action reduced");

                self.observers.lock().await.retain(|observer| observer(&*state));
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Project the current state.
        ///
        /// ```ignore
        /// let phase = store.state(|s| s.phase).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Observe a projection of the state.
        ///
        /// The receiver starts with the projection of the current state and
        /// is updated after every reduction that changes it. Dropping the
        /// receiver unsubscribes.
        pub async fn observe<T, F>(&self, project: F) -> watch::Receiver<T>
        where
            T: PartialEq + Send + Sync + 'static,
            F: Fn(&S) -> T + Send + Sync + 'static,
        {
            let state = self.state.read().await;
            let (tx, rx) = watch::channel(project(&*state));

            self.observers.lock().await.push(Box::new(move |state| {
                if tx.is_closed() {
                    return false;
                }
                tx.send_if_modified(|current| {
                    let next = project(state);
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
                true
            }));

            rx
        }

        /// Stop accepting actions.
        ///
        /// Effects already running are not cancelled; the actions they
        /// produce are dropped.
        pub fn close(&self) {
            self.closed.store(true, Ordering::Release);
        }

        /// Returns `true` once [`Store::close`] was called.
        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::Acquire)
        }

        /// `Parallel` children share the parent's tracking; `Sequential`
        /// children run in a single spawned task.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        if let Some(action) = fut.await {
                            if let Err(e) = store.send(action).await {
                                tracing::debug!(error = %e, "Dropped effect result");
                            }
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    tracking.increment();
                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        for effect in effects {
                            let (mut sub_handle, sub_tracking) = EffectHandle::new();
                            store.execute_effect(effect, sub_tracking);
                            sub_handle.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                observers: Arc::clone(&self.observers),
                closed: Arc::clone(&self.closed),
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("closed", &self.closed.load(Ordering::Acquire))
                .finish_non_exhaustive()
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use pantry_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone)]
    enum TestAction {
        Increment,
        Record(&'static str),
        ProduceEffect,
        ProduceParallelEffects,
        ProduceSequentialEffects,
    }

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TestState,
            action: TestAction,
            _env: &(),
        ) -> SmallVec<[Effect<TestAction>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Record(entry) => {
                    state.log.push(entry);
                    smallvec![Effect::None]
                },
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async { Some(TestAction::Increment) }))]
                },
                TestAction::ProduceParallelEffects => smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                ])],
                TestAction::ProduceSequentialEffects => smallvec![Effect::Sequential(vec![
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(TestAction::Record("first"))
                    })),
                    Effect::Future(Box::pin(async { Some(TestAction::Record("second")) })),
                ])],
            }
        }
    }

    fn store() -> Store<TestState, TestAction, (), TestReducer> {
        Store::new(TestState::default(), TestReducer, ())
    }

    #[tokio::test]
    async fn test_send_updates_state() {
        let store = store();
        store.send(TestAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_feedback() {
        let store = store();
        let mut handle = store.send(TestAction::ProduceEffect).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_parallel_effects() {
        let store = store();
        let mut handle = store.send(TestAction::ProduceParallelEffects).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test]
    async fn test_sequential_effects_keep_order() {
        let store = store();
        let mut handle = store.send(TestAction::ProduceSequentialEffects).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_observe_projection() {
        let store = store();
        let mut rx = store.observe(|s| s.value).await;
        assert_eq!(*rx.borrow(), 0);

        store.send(TestAction::Increment).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        store.send(TestAction::Record("no value change")).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_actions() {
        let store = store();
        store.close();
        assert!(store.is_closed());
        assert_eq!(store.send(TestAction::Increment).await.unwrap_err(), StoreError::Closed);
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait_with_timeout(Duration::from_millis(10)).await.unwrap();
    }
}
