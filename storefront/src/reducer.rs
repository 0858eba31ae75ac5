//! Cart reducer.
//!
//! Folds every [`StorefrontAction`] into the [`CartState`] slice. The fold is
//! total: events it does not handle leave the slice unchanged.

use crate::environment::StorefrontEnvironment;
use crate::notifications::{NotificationsReducer, NotificationsState};
use crate::types::{CartState, StorefrontAction, StorefrontState};
use std::sync::Arc;
use storefront_core::composition::{CombinedReducer, SharedReducer, combine_reducers, scope_reducer};
use storefront_core::{Effect, Reducer, SmallVec};

/// Root reducer type handed to the store
pub type StorefrontReducer = CombinedReducer<StorefrontState, StorefrontAction, StorefrontEnvironment>;

/// Fold one event into a cart snapshot.
///
/// `None` stands for "no state yet" and starts from [`CartState::default`].
#[must_use]
pub fn reduce(state: Option<&CartState>, action: &StorefrontAction) -> CartState {
    let mut next = state.cloned().unwrap_or_default();
    apply(&mut next, action.clone());
    next
}

/// Fold one event into the cart slice in place
#[allow(clippy::too_many_lines)] // One arm per event kind
pub fn apply(state: &mut CartState, action: StorefrontAction) {
    match action {
        StorefrontAction::RestoreState { persisted } => {
            if let Some(cart) = persisted.cart {
                state.restore(cart);
            }
        },

        StorefrontAction::CartRequest { fetching } => {
            state.fetching = fetching;
        },
        StorefrontAction::CartSuccess { vendor_id, mut cart } => {
            cart.denormalize_payment_ids();
            if vendor_id.is_some() {
                state.vendor_carts.push(cart.clone());
            } else {
                state.vendor_carts = vec![cart.clone()];
            }
            state.merge_snapshot(cart);
            state.fetching = false;
            state.coupons.clear();
        },

        StorefrontAction::CartClearSuccess => {
            state.amount = 0;
            state.products.clear();
            state.coupons.clear();
            state.vendor_carts.clear();
            state.fetching = false;
            state.last_error = None;
        },

        StorefrontAction::CartContentSuccess { user_data } => {
            state.user_data = user_data;
            state.fetching = false;
        },
        StorefrontAction::CartContentSaveSuccess { fields } => {
            state.user_data.extend(fields);
            state.fetching = false;
        },

        StorefrontAction::CartRecalculateSuccess { totals } => {
            state.total = totals.total;
            state.total_formatted = totals.total_formatted;
            state.subtotal = totals.subtotal;
            state.subtotal_formatted = totals.subtotal_formatted;
            state.coupons = totals.coupons.into_iter().map(|(code, _)| code).collect();
            state.fetching = false;
        },

        StorefrontAction::ChangeAmount { cid, amount } => match state.products.get_mut(&cid) {
            Some(product) => {
                product.amount = amount;
                state.last_error = None;
            },
            None => {
                tracing::warn!(%cid, amount, "Amount change for a line not in the cart");
                state.last_error = Some(format!("Cart item {cid} is not in the cart"));
            },
        },

        StorefrontAction::CartAddCouponCode { code } => {
            state.coupons.push(code);
        },
        StorefrontAction::CartRemoveCouponCode { code } => {
            state.coupons.retain(|applied| *applied != code);
        },

        StorefrontAction::AuthLogout => {
            *state = CartState::default();
        },

        // The profile save keeps the loading flag on both its request and
        // its failure.
        StorefrontAction::AddToCartRequest
        | StorefrontAction::CartClearRequest
        | StorefrontAction::CartContentRequest
        | StorefrontAction::CartContentSaveRequest
        | StorefrontAction::CartContentSaveFail { .. }
        | StorefrontAction::CartUpdateRequest { .. }
        | StorefrontAction::CartRecalculateRequest => {
            state.fetching = true;
        },

        StorefrontAction::AddToCartSuccess { .. }
        | StorefrontAction::AddToCartFail { .. }
        | StorefrontAction::CartFail { .. }
        | StorefrontAction::CartClearFail { .. }
        | StorefrontAction::CartContentFail { .. }
        | StorefrontAction::CartUpdateSuccess { .. }
        | StorefrontAction::CartUpdateFail { .. }
        | StorefrontAction::CartRecalculateFail { .. } => {
            state.fetching = false;
        },

        StorefrontAction::SettlementsRequest
        | StorefrontAction::SettlementsSuccess { .. }
        | StorefrontAction::SettlementsFail { .. }
        | StorefrontAction::FetchOneProductRequest
        | StorefrontAction::FetchOneProductSuccess { .. }
        | StorefrontAction::FetchOneProductFail { .. }
        | StorefrontAction::FetchProductOptionsRequest
        | StorefrontAction::FetchProductOptionsSuccess { .. }
        | StorefrontAction::FetchProductOptionsFail { .. }
        | StorefrontAction::FetchDiscussionRequest
        | StorefrontAction::FetchDiscussionSuccess { .. }
        | StorefrontAction::FetchDiscussionFail { .. }
        | StorefrontAction::SearchProductsRequest
        | StorefrontAction::SearchProductsSuccess { .. }
        | StorefrontAction::SearchProductsFail { .. }
        | StorefrontAction::FetchProductsRequest
        | StorefrontAction::FetchProductsSuccess { .. }
        | StorefrontAction::FetchProductsFail { .. }
        | StorefrontAction::NotificationShow { .. }
        | StorefrontAction::NotificationHide { .. } => {},
    }
}

/// Reducer for the cart slice
#[derive(Clone, Copy, Debug, Default)]
pub struct CartReducer;

impl Reducer for CartReducer {
    type State = CartState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        apply(state, action);
        SmallVec::new()
    }
}

fn cart(state: &StorefrontState) -> &CartState {
    &state.cart
}

fn set_cart(state: &mut StorefrontState, cart: CartState) {
    state.cart = cart;
}

fn notifications(state: &StorefrontState) -> &NotificationsState {
    &state.notifications
}

fn set_notifications(state: &mut StorefrontState, notifications: NotificationsState) {
    state.notifications = notifications;
}

/// Root reducer: the cart and notifications slices, each scoped to its field
#[must_use]
pub fn storefront_reducer() -> StorefrontReducer {
    let cart_slice: SharedReducer<StorefrontState, StorefrontAction, StorefrontEnvironment> =
        Arc::new(scope_reducer(CartReducer, cart, set_cart));
    let notifications_slice: SharedReducer<StorefrontState, StorefrontAction, StorefrontEnvironment> =
        Arc::new(scope_reducer(NotificationsReducer, notifications, set_notifications));

    combine_reducers(vec![cart_slice, notifications_slice])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::environment::tests::test_environment;
    use crate::notifications::NotificationKind;
    use crate::types::{CartProduct, CartSnapshot, CartTotals};
    use rust_decimal::Decimal;
    use serde_json::json;
    use storefront_core::http::HttpError;
    use storefront_testing::{ReducerTest, assertions};

    fn snapshot(value: serde_json::Value) -> CartSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn absent_state_starts_from_initial() {
        let next = reduce(None, &StorefrontAction::SettlementsRequest);
        assert_eq!(next, CartState::default());
    }

    #[test]
    fn reduce_does_not_touch_the_input() {
        let before = CartState::default();
        let after = reduce(Some(&before), &StorefrontAction::CartClearRequest);
        assert!(!before.fetching);
        assert!(after.fetching);
    }

    #[test]
    fn cart_success_replaces_then_accumulates_vendor_carts() {
        ReducerTest::new(CartReducer)
            .with_env(test_environment())
            .given_state(CartState {
                fetching: true,
                coupons: vec!["SAVE10".to_string()],
                ..CartState::default()
            })
            .when_action(StorefrontAction::CartSuccess {
                vendor_id: None,
                cart: snapshot(json!({ "amount": 1 })),
            })
            .when_action(StorefrontAction::CartSuccess {
                vendor_id: Some("4".to_string()),
                cart: snapshot(json!({ "amount": 2, "payments": { "7": {} } })),
            })
            .then_state(|state| {
                assert_eq!(state.vendor_carts.len(), 2);
                assert_eq!(state.amount, 2);
                assert!(!state.fetching);
                assert!(state.coupons.is_empty());
                assert_eq!(state.payments["7"].payment_id, "7");
                let pushed = state.vendor_carts[1].payments.as_ref().unwrap();
                assert_eq!(pushed["7"].payment_id, "7");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn clear_success_empties_lines_but_keeps_profile() {
        let mut state = CartState {
            amount: 3,
            fetching: true,
            coupons: vec!["A".to_string()],
            vendor_carts: vec![CartSnapshot::default()],
            user_data: json!({ "email": "x@y.z" }).as_object().cloned().unwrap(),
            ..CartState::default()
        };
        state.products.insert("1".to_string(), CartProduct::with_amount(3));

        let next = reduce(Some(&state), &StorefrontAction::CartClearSuccess);

        assert_eq!(next.amount, 0);
        assert!(next.products.is_empty());
        assert!(next.coupons.is_empty());
        assert!(next.vendor_carts.is_empty());
        assert!(!next.fetching);
        assert_eq!(next.user_data["email"], "x@y.z");
    }

    #[test]
    fn profile_save_merges_and_failure_keeps_loading() {
        let state = CartState {
            user_data: json!({ "email": "a@b.c", "b_city": "Paris" })
                .as_object()
                .cloned()
                .unwrap(),
            ..CartState::default()
        };

        let saved = reduce(
            Some(&state),
            &StorefrontAction::CartContentSaveSuccess {
                fields: json!({ "b_city": "Lyon" }).as_object().cloned().unwrap(),
            },
        );
        assert_eq!(saved.user_data["email"], "a@b.c");
        assert_eq!(saved.user_data["b_city"], "Lyon");
        assert!(!saved.fetching);

        let failed = reduce(
            Some(&saved),
            &StorefrontAction::CartContentSaveFail {
                error: HttpError::Transport("reset".to_string()),
            },
        );
        assert!(failed.fetching);
    }

    #[test]
    fn recalculate_success_takes_subtotal_from_subtotal() {
        let totals: CartTotals = serde_json::from_value(json!({
            "total": "25.00",
            "total_formatted": { "price": "$25.00" },
            "subtotal": "20.00",
            "subtotal_formatted": { "price": "$20.00" },
            "coupons": { "SAVE10": {}, "FREESHIP": {} }
        }))
        .unwrap();

        let next = reduce(
            Some(&CartState {
                fetching: true,
                ..CartState::default()
            }),
            &StorefrontAction::CartRecalculateSuccess { totals },
        );

        assert_eq!(next.total, Some(Decimal::new(2500, 2)));
        assert_eq!(next.subtotal, Some(Decimal::new(2000, 2)));
        assert_eq!(next.subtotal_formatted, Some(json!({ "price": "$20.00" })));
        assert_eq!(next.coupons, vec!["SAVE10", "FREESHIP"]);
        assert!(!next.fetching);
    }

    #[test]
    fn change_amount_for_unknown_line_records_error() {
        let mut state = CartState::default();
        state.products.insert("1".to_string(), CartProduct::with_amount(1));

        let missing = reduce(
            Some(&state),
            &StorefrontAction::ChangeAmount {
                cid: "2".to_string(),
                amount: 5,
            },
        );
        assert_eq!(missing.products, state.products);
        assert!(missing.last_error.as_deref().unwrap().contains('2'));

        let changed = reduce(
            Some(&missing),
            &StorefrontAction::ChangeAmount {
                cid: "1".to_string(),
                amount: 5,
            },
        );
        assert_eq!(changed.products["1"].amount, 5);
        assert!(changed.last_error.is_none());
    }

    #[test]
    fn coupon_removal_drops_every_copy() {
        ReducerTest::new(CartReducer)
            .with_env(test_environment())
            .given_state(CartState::default())
            .when_actions(["A", "B", "A"].map(|code| StorefrontAction::CartAddCouponCode {
                code: code.to_string(),
            }))
            .when_action(StorefrontAction::CartRemoveCouponCode {
                code: "A".to_string(),
            })
            .then_state(|state| assert_eq!(state.coupons, vec!["B"]))
            .run();
    }

    #[test]
    fn logout_resets_the_slice() {
        let mut state = CartState {
            amount: 4,
            fetching: true,
            ..CartState::default()
        };
        state.products.insert("1".to_string(), CartProduct::with_amount(4));

        assert_eq!(reduce(Some(&state), &StorefrontAction::AuthLogout), CartState::default());
    }

    #[test]
    fn settlements_and_notifications_are_identity_for_the_cart() {
        let state = CartState {
            amount: 2,
            ..CartState::default()
        };
        let events = [
            StorefrontAction::SettlementsRequest,
            StorefrontAction::SettlementsSuccess { response: json!({}) },
            StorefrontAction::NotificationShow {
                kind: NotificationKind::Info,
                title: "t".to_string(),
                text: "x".to_string(),
            },
            StorefrontAction::NotificationHide { id: 0 },
        ];
        for event in &events {
            assert_eq!(reduce(Some(&state), event), state);
        }
    }

    #[test]
    fn root_reducer_routes_to_both_slices() {
        ReducerTest::new(storefront_reducer())
            .with_env(test_environment())
            .given_state(StorefrontState::default())
            .when_action(StorefrontAction::CartClearRequest)
            .when_action(StorefrontAction::error_notification("Error", "Something went wrong."))
            .then_state(|state| {
                assert!(state.cart.fetching);
                assert_eq!(state.notifications.items.len(), 1);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }
}
