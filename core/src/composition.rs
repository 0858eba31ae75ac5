//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on one slice of a larger state
//!
//! Both produce reducers that are `Clone + Send + Sync`, so the result can be
//! handed straight to the store runtime.
//!
//! # Example
//!
//! ```
//! use storefront_core::{Effect, Reducer, SmallVec};
//! use storefront_core::composition::{SharedReducer, combine_reducers, scope_reducer};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct BadgeState {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     badge: BadgeState,
//!     title: String,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     ItemAdded,
//!     Retitled(String),
//! }
//!
//! struct BadgeReducer;
//!
//! impl Reducer for BadgeReducer {
//!     type State = BadgeState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut BadgeState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if matches!(action, AppAction::ItemAdded) {
//!             state.count += 1;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! struct TitleReducer;
//!
//! impl Reducer for TitleReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if let AppAction::Retitled(title) = action {
//!             state.title = title;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! fn badge(state: &AppState) -> &BadgeState {
//!     &state.badge
//! }
//!
//! fn set_badge(state: &mut AppState, badge: BadgeState) {
//!     state.badge = badge;
//! }
//!
//! let badge_slice: SharedReducer<AppState, AppAction, ()> =
//!     Arc::new(scope_reducer(BadgeReducer, badge, set_badge));
//! let title: SharedReducer<AppState, AppAction, ()> = Arc::new(TitleReducer);
//! let app = combine_reducers(vec![badge_slice, title]);
//!
//! let mut state = AppState::default();
//! let _ = app.reduce(&mut state, AppAction::ItemAdded, &());
//! let _ = app.reduce(&mut state, AppAction::Retitled("Cart".into()), &());
//! assert_eq!(state.badge.count, 1);
//! assert_eq!(state.title, "Cart");
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// A shareable, type-erased reducer
pub type SharedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in order, and all effects are collected and concatenated.
/// Every reducer sees every action; a reducer that does not recognise an action
/// leaves its part of the state alone.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<SharedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<SharedReducer<S, A, E>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.iter().map(Arc::clone).collect(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a reducer to operate on a slice of a larger state.
///
/// The slice is cloned, reduced, and written back, so a snapshot taken before
/// the transition is never observed half-updated.
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a slice of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Clone for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            get_state: self.get_state,
            set_state: self.set_state,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut next = (self.get_state)(state).clone();
        let effects = self.reducer.reduce(&mut next, action, env);
        (self.set_state)(state, next);
        effects
    }
}
