//! Given-When-Then helper for reducers.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use pantry_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Runs one action through a reducer and checks the outcome.
///
/// ```ignore
/// let state = ReducerTest::new(FetchReducer, environment)
///     .given_state(FetchState::default())
///     .when_action(FetchAction::Start { descriptor, bypass_cache: false })
///     .then_state(|s| assert!(s.pending))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: R::Environment,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_assertions: Vec<StateAssertion<R::State>>,
    effect_assertions: Vec<EffectAssertion<R::Action>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::State: Default,
{
    /// Test `reducer` against `environment`.
    pub fn new(reducer: R, environment: R::Environment) -> Self {
        Self {
            reducer,
            environment,
            state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Starting state (default state if not given).
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Action to reduce. Several calls reduce several actions in order;
    /// effect assertions see the effects of the last one.
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Check the final state.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Check the effects returned by the last action.
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Reduce the actions, run the assertions and return the final state.
    pub fn run(self) -> R::State {
        let mut state = self.state.unwrap_or_default();
        let mut effects = Vec::new();

        for action in self.actions {
            effects = self
                .reducer
                .reduce(&mut state, action, &self.environment)
                .into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
        state
    }
}
