use crate::{
  notification::Notification,
  observable::{truncate_script, Observable, ObservableExt},
  observer::Observer,
  recorder::{Recorded, SubscriptionLog, SubscriptionRecord},
  scheduler::VirtualScheduler,
  subject::{Subject, SubjectSubscription},
  subscription::Subscription,
};

impl VirtualScheduler {
  /// Scripted source with one shared timeline: entry times are absolute
  /// ticks, queued at construction, and play out whether or not anyone is
  /// subscribed. Subscribers hear only the entries that fire while they are
  /// registered. The script is cut at its first terminal entry.
  pub fn hot<Item, Err>(
    &self,
    script: Vec<Recorded<Notification<Item, Err>>>,
  ) -> HotObservable<Item, Err>
  where
    Item: Clone + 'static,
    Err: Clone + 'static,
  {
    let subject = Subject::default();
    let log = SubscriptionLog::default();
    for entry in truncate_script(script) {
      let notification = entry.value;
      let mut relay = subject.clone();
      let log = log.clone();
      self.schedule_at(entry.time, move |s| match notification {
        Notification::Next(value) => relay.next(value),
        Notification::Error(err) => {
          log.close_open(s.clock());
          relay.error(err);
        }
        Notification::Complete => {
          log.close_open(s.clock());
          relay.complete();
        }
      });
    }
    HotObservable { subject, log, scheduler: self.clone() }
  }
}

/// See [`VirtualScheduler::hot`]. Clones share the timeline, so resubscribing
/// a clone attaches to the same broadcast mid-flight.
pub struct HotObservable<Item, Err> {
  subject: Subject<Item, Err>,
  log: SubscriptionLog,
  scheduler: VirtualScheduler,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self {
    HotObservable {
      subject: self.subject.clone(),
      log: self.log.clone(),
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<Item, Err> HotObservable<Item, Err> {
  /// Every subscribe window this source has seen, in subscribe order. Still
  /// open windows report [`SubscriptionRecord::PENDING`].
  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.log.records() }
}

impl<Item, Err, O> Observable<Item, Err, O> for HotObservable<Item, Err>
where
  Item: 'static,
  Err: 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = HotSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let HotObservable { subject, log, scheduler } = self;
    let index = log.open(scheduler.clock());
    let inner = subject.actual_subscribe(observer);
    HotSubscription { inner, log, index, scheduler }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for HotObservable<Item, Err> {}

pub struct HotSubscription<Item, Err> {
  inner: SubjectSubscription<Item, Err>,
  log: SubscriptionLog,
  index: usize,
  scheduler: VirtualScheduler,
}

impl<Item, Err> Subscription for HotSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.log.close(self.index, self.scheduler.clock());
    self.inner.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.inner.is_closed() }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::recorder::{completed, next, Recorder};

  #[test]
  fn subscribers_miss_entries_from_before_their_subscribe_tick() {
    let scheduler = VirtualScheduler::new();
    let source = scheduler.hot::<i32, ()>(vec![
      next(150, 1),
      next(210, 2),
      next(220, 3),
      completed(250),
    ]);

    let recorded = scheduler.start({
      let source = source.clone();
      move || source
    });
    assert_eq!(
      recorded.records(),
      vec![next(210, 2), next(220, 3), completed(250)]
    );
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 250)]);
  }

  #[test]
  fn one_timeline_is_shared_by_every_subscriber() {
    let scheduler = VirtualScheduler::new();
    let source =
      scheduler.hot::<i32, ()>(vec![next(10, 1), next(30, 2), next(50, 3)]);

    let early: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    let late: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    source.clone().subscribe_with(early.clone());
    scheduler.advance_to(20);
    source.clone().subscribe_with(late.clone());
    scheduler.run();

    assert_eq!(early.records(), vec![next(10, 1), next(30, 2), next(50, 3)]);
    assert_eq!(late.records(), vec![next(30, 2), next(50, 3)]);
    assert_eq!(
      source.subscriptions(),
      vec![SubscriptionRecord::pending(0), SubscriptionRecord::pending(20)]
    );
  }

  #[test]
  fn unsubscribing_closes_the_window_but_not_the_timeline() {
    let scheduler = VirtualScheduler::new();
    let source =
      scheduler.hot::<i32, ()>(vec![next(10, 1), next(30, 2), next(50, 3)]);

    let first: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    let second: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    let sub = source.clone().subscribe_with(first.clone());
    source.clone().subscribe_with(second.clone());

    scheduler.advance_to(20);
    sub.unsubscribe();
    scheduler.run();

    assert_eq!(first.records(), vec![next(10, 1)]);
    assert_eq!(second.records(), vec![next(10, 1), next(30, 2), next(50, 3)]);
    assert_eq!(
      source.subscriptions(),
      vec![SubscriptionRecord::new(0, 20), SubscriptionRecord::pending(0)]
    );
  }

  #[test]
  fn resubscribing_a_clone_attaches_to_the_live_timeline() {
    let scheduler = VirtualScheduler::new();
    let source =
      scheduler.hot::<i32, ()>(vec![next(10, 1), next(30, 2), completed(40)]);

    let recorder: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    scheduler.advance_to(20);
    source.clone().subscribe_with(recorder.clone());
    scheduler.run();

    assert_eq!(recorder.records(), vec![next(30, 2), completed(40)]);
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(20, 40)]);
  }
}
