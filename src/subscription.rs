//! Subscription: the disposal half of the reactive contract.

pub mod boxed;
pub mod dynamic;

pub use boxed::BoxedSubscription;
pub use dynamic::DynamicSubscriptions;

/// Handle returned by `Observable::actual_subscribe`, used to release the
/// resources behind an active subscription before it finishes on its own.
///
/// `unsubscribe` consumes the handle, so a single handle can only release
/// once. Where several handles alias one underlying resource (clones of a
/// cancellation flag, a shared record slot), the release logic behind them is
/// guarded by a checked-and-set flag and the later release is a no-op.
pub trait Subscription {
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// Sources that finish synchronously during subscribe hand back a unit
/// subscription: there is nothing left to release.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}
