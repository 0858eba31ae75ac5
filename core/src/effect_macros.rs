//! Declarative macros for effect construction

/// Create an `Effect::Delay` that feeds `action` back after `duration`
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(4),
///     action: StorefrontAction::NotificationHide { id }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
