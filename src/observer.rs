//! Observer trait and adapters
//!
//! An `Observer` is the consumer half of the reactive contract: it receives
//! any number of values followed by at most one terminal notification. The
//! terminal methods consume the observer, which lets the type system enforce
//! that nothing is delivered past an `error` or `complete`.

use crate::rc::{MutRc, RcDeref, RcDerefMut};

pub trait Observer<Item, Err> {
  /// Receive the next value of the sequence.
  fn next(&mut self, value: Item);

  /// Terminate the sequence with a failure, consuming the observer.
  fn error(self, err: Err);

  /// Terminate the sequence normally, consuming the observer.
  fn complete(self);

  /// Whether this observer already saw a terminal notification (or was
  /// detached). Producers check this before delivering.
  fn is_finished(&self) -> bool;
}

/// Object-safe mirror of [`Observer`], used wherever observers of unknown
/// concrete type are stored behind a vtable (scheduler tasks, subject
/// subscriber lists).
pub trait Publisher<Item, Err> {
  fn p_next(&mut self, value: Item);
  fn p_error(self: Box<Self>, err: Err);
  fn p_complete(self: Box<Self>);
  fn p_is_finished(&self) -> bool;
}

impl<T, Item, Err> Publisher<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn p_next(&mut self, value: Item) { self.next(value) }

  fn p_error(self: Box<Self>, err: Err) { self.error(err) }

  fn p_complete(self: Box<Self>) { self.complete() }

  fn p_is_finished(&self) -> bool { self.is_finished() }
}

impl<Item, Err> Observer<Item, Err> for Box<dyn Publisher<Item, Err>> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).p_next(value) }

  #[inline]
  fn error(self, err: Err) { self.p_error(err) }

  #[inline]
  fn complete(self) { self.p_complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).p_is_finished() }
}

/// Closure adapter enabling `observable.subscribe(|v| ...)`: the closure
/// becomes the `next` handler; terminal notifications are dropped.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item, Err> Observer<Item, Err> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, _err: Err) {}

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_finished(&self) -> bool { false }
}

/// `None` swallows everything; `Some` delegates.
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_finished(&self) -> bool { self.as_ref().is_none_or(Observer::is_finished) }
}

/// Shared observer slot. Terminal notifications take the inner observer out,
/// so every clone of the slot sees the sequence as finished afterwards; a
/// subscription can detach the observer the same way, which is how disposal
/// suppresses deliveries that are already queued.
impl<O, Item, Err> Observer<Item, Err> for MutRc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.rc_deref_mut().next(value); }

  fn error(self, err: Err) {
    // Bind the take before the call so the cell borrow is released; the
    // inner observer may reach back into the cell while it winds down.
    let taken = self.rc_deref_mut().take();
    if let Some(inner) = taken {
      inner.error(err);
    }
  }

  fn complete(self) {
    let taken = self.rc_deref_mut().take();
    if let Some(inner) = taken {
      inner.complete();
    }
  }

  fn is_finished(&self) -> bool { self.rc_deref().is_none() }
}
