use crate::{
  notification::Notification,
  observer::{FnMutObserver, Observer},
  ops::repeat_when::RepeatWhenOp,
  recorder::Recorded,
  scheduler::VirtualScheduler,
  subject::Subject,
  subscription::Subscription,
};

pub mod cold;
pub mod hot;
pub mod of;
pub mod trivial;

pub use cold::ColdObservable;
pub use hot::HotObservable;
pub use of::{of, OfObservable};
pub use trivial::{
  empty, never, throw, EmptyObservable, NeverObservable, ThrowObservable,
};

/// A push-based stream of `Item` values that ends with at most one terminal
/// signal: an `Err` or a completion.
///
/// Subscribing hands ownership of an [`Observer`] to the producer and returns
/// a [`Subscription`] that releases everything the producer set up for it.
/// The observer type is a parameter of the trait rather than of the method so
/// that producers can thread observers through wrapper types of their own.
pub trait Observable<Item, Err, O: Observer<Item, Err>> {
  type Unsub: Subscription;

  /// Invoke the producer for one observer.
  ///
  /// Implementations must uphold the stream grammar: any number of `next`
  /// calls, then at most one `error` or `complete`, then silence.
  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Combinators and subscribe sugar shared by every observable in this crate.
///
/// This is a marker-style extension trait: implementors add an empty `impl`
/// and get the methods for free. Keeping `Item` and `Err` as trait parameters
/// (instead of associated types) lets sources stay polymorphic over the error
/// type they never produce.
pub trait ObservableExt<Item, Err>: Sized {
  /// Resubscribe to this observable each time `notifier` signals.
  ///
  /// `handler` receives a [`Subject`] that emits `()` whenever the source
  /// completes, and returns the notifier observable built from it. A value
  /// from the notifier while the source is between runs triggers one
  /// resubscription, scheduled on `scheduler` at the current tick. The
  /// notifier completing ends the composite; source errors and notifier
  /// errors pass straight through.
  fn repeat_when<F, N, NItem>(
    self,
    handler: F,
    scheduler: &VirtualScheduler,
  ) -> RepeatWhenOp<Self, F, NItem>
  where
    F: FnOnce(Subject<(), Err>) -> N,
    N: ObservableExt<NItem, Err>,
  {
    RepeatWhenOp::new(self, handler, scheduler.clone())
  }

  /// Subscribe with a values-only closure. Terminal signals are dropped.
  #[inline]
  fn subscribe<F>(
    self,
    next: F,
  ) -> <Self as Observable<Item, Err, FnMutObserver<F>>>::Unsub
  where
    Self: Observable<Item, Err, FnMutObserver<F>>,
    F: FnMut(Item),
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribe with a full observer.
  #[inline]
  fn subscribe_with<O>(
    self,
    observer: O,
  ) -> <Self as Observable<Item, Err, O>>::Unsub
  where
    Self: Observable<Item, Err, O>,
    O: Observer<Item, Err>,
  {
    self.actual_subscribe(observer)
  }
}

/// Scripts keep nothing past their first terminal entry. Truncating at
/// construction keeps every subscription's playback consistent with the
/// stream grammar without per-delivery checks.
pub(crate) fn truncate_script<Item, Err>(
  mut entries: Vec<Recorded<Notification<Item, Err>>>,
) -> Vec<Recorded<Notification<Item, Err>>> {
  if let Some(pos) = entries.iter().position(|e| e.value.is_terminal()) {
    entries.truncate(pos + 1);
  }
  entries
}
