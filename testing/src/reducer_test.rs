//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use storefront_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several `when_action` calls fold the actions in order; effect assertions
/// see the effects of the last action only.
///
/// # Example
///
/// ```ignore
/// use storefront_testing::ReducerTest;
///
/// ReducerTest::new(CartReducer)
///     .with_env(test_environment())
///     .given_state(CartState::default())
///     .when_action(StorefrontAction::CartAddCouponCode { code: "SAVE10".into() })
///     .when_action(StorefrontAction::CartAddCouponCode { code: "SAVE10".into() })
///     .then_state(|state| {
///         assert_eq!(state.coupons, vec!["SAVE10", "SAVE10"]);
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to fold (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to fold, in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = smallvec::SmallVec::<[Effect<A>; 4]>::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use std::time::Duration;
    use storefront_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Return the first `Delay` effect matching `duration`, panicking if none exists
    ///
    /// # Panics
    ///
    /// Panics if no `Delay` effect with that duration is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A: std::fmt::Debug>(effects: &[Effect<A>], duration: Duration) -> &A {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Delay { duration: d, action } if *d == duration => Some(action.as_ref()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("Expected a Delay effect of {duration:?}, found {effects:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use storefront_core::effect::Effect;
    use storefront_core::reducer::Reducer;

    #[derive(Clone, Debug)]
    struct BadgeState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum BadgeAction {
        Increment,
        Decrement,
        Flash,
        Unflash,
    }

    struct BadgeReducer;

    struct BadgeEnv;

    impl Reducer for BadgeReducer {
        type State = BadgeState;
        type Action = BadgeAction;
        type Environment = BadgeEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                BadgeAction::Increment => {
                    state.count += 1;
                    smallvec::smallvec![Effect::None]
                },
                BadgeAction::Decrement => {
                    state.count -= 1;
                    smallvec::smallvec![Effect::None]
                },
                BadgeAction::Flash => smallvec::smallvec![Effect::Delay {
                    duration: Duration::from_secs(4),
                    action: Box::new(BadgeAction::Unflash),
                }],
                BadgeAction::Unflash => smallvec::SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_reducer_test_single_action() {
        ReducerTest::new(BadgeReducer)
            .with_env(BadgeEnv)
            .given_state(BadgeState { count: 0 })
            .when_action(BadgeAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_folds_actions_in_order() {
        ReducerTest::new(BadgeReducer)
            .with_env(BadgeEnv)
            .given_state(BadgeState { count: 5 })
            .when_actions([BadgeAction::Decrement, BadgeAction::Decrement])
            .when_action(BadgeAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 4);
            })
            .run();
    }

    #[test]
    fn test_assert_has_delay_effect_returns_action() {
        ReducerTest::new(BadgeReducer)
            .with_env(BadgeEnv)
            .given_state(BadgeState { count: 0 })
            .when_action(BadgeAction::Flash)
            .then_effects(|effects| {
                let action = assertions::assert_has_delay_effect(effects, Duration::from_secs(4));
                assert_eq!(action, &BadgeAction::Unflash);
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<BadgeAction>(&[Effect::None]);
        assertions::assert_no_effects::<BadgeAction>(&[]);
        assertions::assert_effects_count::<BadgeAction>(&[], 0);
    }
}
