use smallvec::SmallVec;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{Observer, Publisher},
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::{DynamicSubscriptions, Subscription},
};

/// One multicast slot. The observer lives behind its own shared cell so a
/// broadcast can lift it out, call it without holding any borrow on the
/// subject, and put it back. Emptying the cell is how a disposal takes
/// effect even while a broadcast is mid-flight.
type SubscriberSlot<Item, Err> = MutRc<Option<Box<dyn Publisher<Item, Err>>>>;

struct SubjectCore<Item, Err> {
  observers: DynamicSubscriptions<SubscriberSlot<Item, Err>>,
  stopped: bool,
}

/// Multicast relay: an [`Observer`] that forwards every signal it receives to
/// all currently registered observers.
///
/// Clones share one observer list, so any clone can be handed out as the
/// subscribe side while another acts as the push side. The first terminal
/// stops the subject for good: it is delivered to every registered observer,
/// the list is drained, and later subscribers get an already-closed token
/// and hear nothing.
///
/// ```
/// use marbles::prelude::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let mut subject = Subject::<i32, ()>::default();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let inner = seen.clone();
/// let sub = subject.clone().subscribe(move |v| inner.borrow_mut().push(v));
///
/// subject.next(1);
/// subject.next(2);
/// sub.unsubscribe();
/// subject.next(3);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      core: MutRc::own(SubjectCore {
        observers: DynamicSubscriptions::new(),
        stopped: false,
      }),
    }
  }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn subscriber_count(&self) -> usize {
    self.core.rc_deref().observers.len()
  }

  /// Detach every observer without delivering a terminal, and refuse any
  /// future registrations. Used on teardown paths where the observers must
  /// simply stop hearing from this subject.
  pub fn close(&self) {
    let slots = {
      let mut core = self.core.rc_deref_mut();
      core.stopped = true;
      core.observers.drain().collect::<SmallVec<[_; 2]>>()
    };
    // Emptying each slot silences observers already lifted out by an
    // in-flight broadcast.
    for slot in slots {
      slot.rc_deref_mut().take();
    }
  }

  fn snapshot(&self) -> SmallVec<[SubscriberSlot<Item, Err>; 2]> {
    let core = self.core.rc_deref();
    if core.stopped {
      SmallVec::new()
    } else {
      core.observers.iter().cloned().collect()
    }
  }

  fn drain(&self) -> SmallVec<[SubscriberSlot<Item, Err>; 2]> {
    let mut core = self.core.rc_deref_mut();
    if core.stopped {
      SmallVec::new()
    } else {
      core.stopped = true;
      core.observers.drain().collect()
    }
  }
}

impl<Item, Err, O> Observable<Item, Err, O> for Subject<Item, Err>
where
  Item: 'static,
  Err: 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let id = {
      let mut core = self.core.rc_deref_mut();
      if core.stopped {
        None
      } else {
        let slot: SubscriberSlot<Item, Err> =
          MutRc::own(Some(Box::new(observer)));
        Some(core.observers.add(slot))
      }
    };
    SubjectSubscription { core: self.core, id }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for Subject<Item, Err> {}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    // Snapshot first, call second: no borrow on the subject is live while
    // observers run, so a callback may subscribe or unsubscribe freely.
    let mut slots = self.snapshot().into_iter().peekable();
    while let Some(slot) = slots.next() {
      // Each observer is lifted out of its slot before the call and put
      // back after, releasing the slot borrow across the call.
      let taken = slot.rc_deref_mut().take();
      let Some(mut observer) = taken else { continue };
      let last = slots.peek().is_none();
      if last {
        observer.next(value);
        if !observer.is_finished() {
          *slot.rc_deref_mut() = Some(observer);
        }
        break;
      }
      observer.next(value.clone());
      if !observer.is_finished() {
        *slot.rc_deref_mut() = Some(observer);
      }
    }
  }

  fn error(self, err: Err) {
    let mut slots = self.drain().into_iter().peekable();
    while let Some(slot) = slots.next() {
      let taken = slot.rc_deref_mut().take();
      let Some(observer) = taken else { continue };
      if slots.peek().is_none() {
        observer.error(err);
        break;
      }
      observer.error(err.clone());
    }
  }

  fn complete(self) {
    for slot in self.drain() {
      let taken = slot.rc_deref_mut().take();
      if let Some(observer) = taken {
        observer.complete();
      }
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.core.rc_deref().stopped }
}

/// Registration token for one subject observer. Disposing removes the
/// observer from the list and empties its slot, so the removal holds even
/// against a broadcast already in progress.
pub struct SubjectSubscription<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
  id: Option<usize>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    if let Some(id) = self.id {
      let removed = self.core.rc_deref_mut().observers.remove(id);
      if let Some(slot) = removed {
        slot.rc_deref_mut().take();
      }
    }
  }

  fn is_closed(&self) -> bool {
    match self.id {
      Some(id) => !self.core.rc_deref().observers.contains(id),
      None => true,
    }
  }
}
