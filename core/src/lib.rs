//! # Storefront Core
//!
//! Core traits and types for the storefront state container.
//!
//! This crate provides the fundamental abstractions for folding a stream of
//! client-side events (cart requests, server responses, session changes) into
//! one owned state snapshot.
//!
//! ## Core Concepts
//!
//! - **State**: The snapshot owned by the store (cart, notifications)
//! - **Action**: Every event kind the store can fold (`CART_REQUEST`, `CART_SUCCESS`, ...)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (clock, HTTP collaborator)
//!
//! ## Example
//!
//! ```ignore
//! use storefront_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct BadgeState {
//!     items: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum BadgeAction {
//!     ItemsLoaded { items: u32 },
//!     Cleared,
//! }
//!
//! impl Reducer for BadgeReducer {
//!     type State = BadgeState;
//!     type Action = BadgeAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BadgeState,
//!         action: BadgeAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<BadgeAction>; 4]> {
//!         match action {
//!             BadgeAction::ItemsLoaded { items } => state.items = items,
//!             BadgeAction::Cleared => state.items = 0,
//!         }
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub use reducer::Reducer;
pub use effect::Effect;

/// Reducer composition utilities (`combine_reducers`, `scope_reducer`)
pub mod composition;

/// Declarative macros for effect construction
pub mod effect_macros;

/// HTTP collaborator abstraction
pub mod http;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Contract
    ///
    /// A reducer must never panic for a structurally valid action. Action kinds
    /// it does not recognise leave the state untouched and return no effects.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime (usually none)
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution).
pub mod effect {
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Delayed action (toast expiry)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    pub use crate::http::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
