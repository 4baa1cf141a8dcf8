use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::VirtualScheduler,
  subject::Subject,
  subscription::{BoxedSubscription, Subscription},
  type_hint::TypeHint,
};

/// Observable returned by [`ObservableExt::repeat_when`].
///
/// Subscribing wires up two legs. The notifier leg is built once, before the
/// source is touched: the handler receives a completion-signal [`Subject`]
/// and its output is subscribed immediately. The source leg then runs the
/// source and, on every completion, disposes the finished run and pushes `()`
/// into the signal subject instead of completing downstream. A notifier
/// value received while a run is pending schedules one resubscription at the
/// current tick; the notifier completing releases the held completion (or
/// marks that the next one passes through); any error on either leg tears
/// the whole composite down.
pub struct RepeatWhenOp<S, F, NItem> {
  source: S,
  handler: F,
  scheduler: VirtualScheduler,
  _hint: TypeHint<fn(NItem)>,
}

impl<S, F, NItem> RepeatWhenOp<S, F, NItem> {
  pub(crate) fn new(source: S, handler: F, scheduler: VirtualScheduler) -> Self {
    RepeatWhenOp { source, handler, scheduler, _hint: TypeHint::new() }
  }
}

#[derive(Default)]
struct RepeatState {
  source_sub: Option<BoxedSubscription>,
  notifier_sub: Option<BoxedSubscription>,
  /// Source has completed and the composite is parked until the notifier
  /// speaks.
  waiting: bool,
  /// Notifier has completed; the next source completion passes through.
  notifier_done: bool,
}

impl<Item, Err, O, S, F, N, NItem> Observable<Item, Err, O>
  for RepeatWhenOp<S, F, NItem>
where
  Item: 'static,
  Err: Clone + 'static,
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, RepeatSourceObserver<O, Err>> + Clone + 'static,
  S::Unsub: 'static,
  F: FnOnce(Subject<(), Err>) -> N,
  N: Observable<NItem, Err, RepeatNotifierObserver<S, O, Item, Err>>,
  N::Unsub: 'static,
{
  type Unsub = RepeatWhenSubscription<O, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let RepeatWhenOp { source, handler, scheduler, _hint } = self;
    let observer = MutRc::own(Some(observer));
    let state: MutRc<RepeatState> = MutRc::own(RepeatState::default());
    let signals: Subject<(), Err> = Subject::default();

    let notifier = handler(signals.clone());
    let notifier_sub = notifier.actual_subscribe(RepeatNotifierObserver {
      source: source.clone(),
      observer: observer.clone(),
      signals: signals.clone(),
      state: state.clone(),
      scheduler,
      _hint: TypeHint::new(),
    });
    state.rc_deref_mut().notifier_sub =
      Some(BoxedSubscription::new(notifier_sub));

    // The notifier may fail synchronously, in which case the source never
    // gets subscribed at all.
    if observer.rc_deref().is_some() {
      let source_sub = source.actual_subscribe(RepeatSourceObserver {
        observer: observer.clone(),
        signals: signals.clone(),
        state: state.clone(),
      });
      state.rc_deref_mut().source_sub =
        Some(BoxedSubscription::new(source_sub));
    }

    RepeatWhenSubscription { observer, state, signals }
  }
}

impl<Item, Err, S, F, NItem> ObservableExt<Item, Err>
  for RepeatWhenOp<S, F, NItem>
where
  S: ObservableExt<Item, Err>,
{
}

/// Downstream half of one source run: values pass through, completion is
/// converted into a signal, errors tear everything down.
pub struct RepeatSourceObserver<O, Err> {
  observer: MutRc<Option<O>>,
  signals: Subject<(), Err>,
  state: MutRc<RepeatState>,
}

impl<Item, Err, O> Observer<Item, Err> for RepeatSourceObserver<O, Err>
where
  Err: Clone,
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) {
    let (source_sub, notifier_sub) = {
      let mut state = self.state.rc_deref_mut();
      (state.source_sub.take(), state.notifier_sub.take())
    };
    if let Some(sub) = source_sub {
      sub.unsubscribe();
    }
    if let Some(sub) = notifier_sub {
      sub.unsubscribe();
    }
    self.observer.error(err);
  }

  fn complete(self) {
    let RepeatSourceObserver { observer, mut signals, state } = self;
    let (source_sub, notifier_done) = {
      let mut state = state.rc_deref_mut();
      (state.source_sub.take(), state.notifier_done)
    };
    // The finished run is released before anything else happens, so its
    // subscription window closes at the completion tick.
    if let Some(sub) = source_sub {
      sub.unsubscribe();
    }
    if notifier_done {
      observer.complete();
    } else {
      state.rc_deref_mut().waiting = true;
      signals.next(());
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

/// Downstream half of the notifier: a value resubscribes the source when a
/// run is pending, completion releases (or arms) the held completion, an
/// error tears everything down.
pub struct RepeatNotifierObserver<S, O, Item, Err> {
  source: S,
  observer: MutRc<Option<O>>,
  signals: Subject<(), Err>,
  state: MutRc<RepeatState>,
  scheduler: VirtualScheduler,
  _hint: TypeHint<fn(Item)>,
}

impl<S: Clone, O, Item, Err> Clone for RepeatNotifierObserver<S, O, Item, Err> {
  fn clone(&self) -> Self {
    RepeatNotifierObserver {
      source: self.source.clone(),
      observer: self.observer.clone(),
      signals: self.signals.clone(),
      state: self.state.clone(),
      scheduler: self.scheduler.clone(),
      _hint: TypeHint::new(),
    }
  }
}

impl<NItem, S, O, Item, Err> Observer<NItem, Err>
  for RepeatNotifierObserver<S, O, Item, Err>
where
  S: Observable<Item, Err, RepeatSourceObserver<O, Err>> + Clone + 'static,
  S::Unsub: 'static,
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, _value: NItem) {
    let fire = {
      let mut state = self.state.rc_deref_mut();
      if state.waiting {
        state.waiting = false;
        true
      } else {
        // A notifier value with no pending completion means nothing.
        false
      }
    };
    if !fire || self.observer.is_finished() {
      return;
    }
    // Resubscribing goes through the scheduler rather than reentering the
    // source here: the restart runs at the current tick, behind actions
    // already queued for it, and chained restarts cannot grow the stack.
    let this = self.clone();
    self.scheduler.schedule(0, move |_| {
      if !this.observer.is_finished() {
        resubscribe_source(&this);
      }
    });
  }

  fn error(self, err: Err) {
    let (source_sub, notifier_sub) = {
      let mut state = self.state.rc_deref_mut();
      (state.source_sub.take(), state.notifier_sub.take())
    };
    if let Some(sub) = source_sub {
      sub.unsubscribe();
    }
    if let Some(sub) = notifier_sub {
      sub.unsubscribe();
    }
    self.observer.error(err);
  }

  fn complete(self) {
    let (waiting, notifier_sub) = {
      let mut state = self.state.rc_deref_mut();
      state.notifier_done = true;
      (state.waiting, state.notifier_sub.take())
    };
    if let Some(sub) = notifier_sub {
      sub.unsubscribe();
    }
    if waiting {
      self.observer.complete();
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

fn resubscribe_source<Item, Err, S, O>(
  this: &RepeatNotifierObserver<S, O, Item, Err>,
) where
  S: Observable<Item, Err, RepeatSourceObserver<O, Err>> + Clone,
  S::Unsub: 'static,
  O: Observer<Item, Err>,
  Err: Clone,
{
  let source_sub = this.source.clone().actual_subscribe(RepeatSourceObserver {
    observer: this.observer.clone(),
    signals: this.signals.clone(),
    state: this.state.clone(),
  });
  this.state.rc_deref_mut().source_sub =
    Some(BoxedSubscription::new(source_sub));
}

/// Composite handle: disposing detaches the downstream observer, releases
/// the current source run and the notifier, and closes the signal subject,
/// so a restart already queued on the scheduler finds nobody listening.
pub struct RepeatWhenSubscription<O, Err> {
  observer: MutRc<Option<O>>,
  state: MutRc<RepeatState>,
  signals: Subject<(), Err>,
}

impl<O, Err> Subscription for RepeatWhenSubscription<O, Err> {
  fn unsubscribe(self) {
    let (source_sub, notifier_sub) = {
      let mut state = self.state.rc_deref_mut();
      (state.source_sub.take(), state.notifier_sub.take())
    };
    if let Some(sub) = source_sub {
      sub.unsubscribe();
    }
    if let Some(sub) = notifier_sub {
      sub.unsubscribe();
    }
    self.observer.rc_deref_mut().take();
    self.signals.close();
  }

  fn is_closed(&self) -> bool { self.observer.rc_deref().is_none() }
}
