use super::Subscription;

/// Helper trait for calling unsubscribe on boxed trait objects
///
/// `Subscription::unsubscribe(self)` requires `Sized`, so `Box<dyn
/// Subscription>` cannot call it directly; this mirror trait adapts the
/// consuming call for vtables.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// Type-erased subscription handle.
///
/// Subscriptions are control handles, not data views: they are stored and
/// released at an arbitrary later time (the repeat operator keeps its child
/// subscriptions this way), so the erased type is `'static` and owns
/// everything it needs.
///
/// # Examples
///
/// ```rust
/// use marbles::prelude::*;
///
/// let subs: Vec<BoxedSubscription> =
///   vec![BoxedSubscription::new(()), BoxedSubscription::new(())];
///
/// for sub in subs {
///   sub.unsubscribe();
/// }
/// ```
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner>);

impl BoxedSubscription {
  /// Create a new boxed subscription from any subscription type.
  #[inline]
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Box::new(subscription)) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}
