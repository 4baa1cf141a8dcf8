//! Recorded timelines and subscription bookkeeping
//!
//! Assertions in marble tests compare two kinds of evidence: the timeline of
//! notifications a [`Recorder`] captured, and the subscribe/unsubscribe
//! intervals each scripted source logged. Both live here, together with the
//! `next`/`error`/`completed` shorthand used to author scripts and expected
//! timelines.

use crate::{
  notification::Notification,
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::{Tick, VirtualScheduler},
};

/// A value stamped with the virtual tick at which it occurs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded<T> {
  pub time: Tick,
  pub value: T,
}

impl<T> Recorded<T> {
  #[inline]
  pub fn new(time: Tick, value: T) -> Self { Recorded { time, value } }
}

/// A value at `time`.
#[inline]
pub fn next<Item, Err>(time: Tick, value: Item) -> Recorded<Notification<Item, Err>> {
  Recorded::new(time, Notification::Next(value))
}

/// A failure at `time`.
#[inline]
pub fn error<Item, Err>(time: Tick, err: Err) -> Recorded<Notification<Item, Err>> {
  Recorded::new(time, Notification::Error(err))
}

/// A normal completion at `time`.
#[inline]
pub fn completed<Item, Err>(time: Tick) -> Recorded<Notification<Item, Err>> {
  Recorded::new(time, Notification::Complete)
}

/// One subscribe/unsubscribe interval as seen by a scripted source. The
/// unsubscribe tick holds [`SubscriptionRecord::PENDING`] while the
/// subscription is still live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionRecord {
  pub subscribe: Tick,
  pub unsubscribe: Tick,
}

impl SubscriptionRecord {
  /// Sentinel meaning "never unsubscribed before the run ended".
  pub const PENDING: Tick = Tick::MAX;

  #[inline]
  pub fn new(subscribe: Tick, unsubscribe: Tick) -> Self {
    SubscriptionRecord { subscribe, unsubscribe }
  }

  #[inline]
  pub fn pending(subscribe: Tick) -> Self { Self::new(subscribe, Self::PENDING) }
}

/// Shared log of every subscription a scripted source received.
///
/// `open` appends a pending record and returns its index; `close` finalizes
/// the unsubscribe tick. Closing is checked-and-set: once an interval is
/// finalized, a later disposal reaching the same record (the harness
/// disposing after a source already tore itself down at a terminal) leaves
/// it untouched.
#[derive(Clone, Default)]
pub struct SubscriptionLog(MutRc<Vec<SubscriptionRecord>>);

impl SubscriptionLog {
  pub fn open(&self, at: Tick) -> usize {
    let mut records = self.0.rc_deref_mut();
    records.push(SubscriptionRecord::pending(at));
    records.len() - 1
  }

  pub fn close(&self, index: usize, at: Tick) {
    let mut records = self.0.rc_deref_mut();
    if let Some(record) = records.get_mut(index) {
      if record.unsubscribe == SubscriptionRecord::PENDING {
        record.unsubscribe = at;
      }
    }
  }

  /// Finalize every still-pending interval at `at`. Scripted sources use
  /// this when a terminal entry plays out: delivering a terminal ends every
  /// live subscription, and an explicit disposal arriving later in the same
  /// tick then finds the record already closed.
  pub fn close_open(&self, at: Tick) {
    for record in self.0.rc_deref_mut().iter_mut() {
      if record.unsubscribe == SubscriptionRecord::PENDING {
        record.unsubscribe = at;
      }
    }
  }

  pub fn is_open(&self, index: usize) -> bool {
    self
      .0
      .rc_deref()
      .get(index)
      .is_some_and(|r| r.unsubscribe == SubscriptionRecord::PENDING)
  }

  pub fn records(&self) -> Vec<SubscriptionRecord> { self.0.rc_deref().clone() }
}

/// Observer that captures every delivery stamped with its scheduler's
/// current tick. Capture stops at the first terminal notification; whatever
/// arrives past it (a defective producer, a late replay) is dropped rather
/// than recorded.
pub struct Recorder<Item, Err> {
  inner: MutRc<RecorderInner<Item, Err>>,
  scheduler: VirtualScheduler,
}

struct RecorderInner<Item, Err> {
  records: Vec<Recorded<Notification<Item, Err>>>,
  closed: bool,
}

impl<Item, Err> Recorder<Item, Err> {
  pub fn new(scheduler: VirtualScheduler) -> Self {
    Recorder {
      inner: MutRc::own(RecorderInner { records: Vec::new(), closed: false }),
      scheduler,
    }
  }

  fn record(&self, notification: Notification<Item, Err>) {
    let mut inner = self.inner.rc_deref_mut();
    if inner.closed {
      return;
    }
    inner.closed = notification.is_terminal();
    let time = self.scheduler.clock();
    inner.records.push(Recorded::new(time, notification));
  }
}

impl<Item: Clone, Err: Clone> Recorder<Item, Err> {
  /// Snapshot of the captured timeline.
  pub fn records(&self) -> Vec<Recorded<Notification<Item, Err>>> {
    self.inner.rc_deref().records.clone()
  }
}

impl<Item, Err> Clone for Recorder<Item, Err> {
  fn clone(&self) -> Self {
    Recorder { inner: self.inner.clone(), scheduler: self.scheduler.clone() }
  }
}

impl<Item, Err> Observer<Item, Err> for Recorder<Item, Err> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)); }

  fn error(self, err: Err) { self.record(Notification::Error(err)); }

  fn complete(self) { self.record(Notification::Complete); }

  fn is_finished(&self) -> bool { self.inner.rc_deref().closed }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn marble_shorthand() {
    assert_eq!(next::<_, ()>(10, 5), Recorded::new(10, Notification::Next(5)));
    assert_eq!(error::<i32, _>(20, "oops"), Recorded::new(20, Notification::Error("oops")));
    assert_eq!(completed::<i32, ()>(30), Recorded::new(30, Notification::Complete));
  }

  #[test]
  fn recorder_stamps_the_scheduler_clock() {
    let scheduler = VirtualScheduler::new();
    let recorder: Recorder<i32, ()> = Recorder::new(scheduler.clone());

    {
      let mut r = recorder.clone();
      scheduler.schedule_at(10, move |_| r.next(1));
    }
    {
      let mut r = recorder.clone();
      scheduler.schedule_at(25, move |_| r.next(2));
    }
    {
      let r = recorder.clone();
      scheduler.schedule_at(40, move |_| r.complete());
    }

    scheduler.run();
    assert_eq!(recorder.records(), vec![next(10, 1), next(25, 2), completed(40)]);
  }

  #[test]
  fn capture_stops_at_first_terminal() {
    let scheduler = VirtualScheduler::new();
    let recorder: Recorder<i32, &str> = Recorder::new(scheduler.clone());

    recorder.clone().complete();
    assert!(recorder.is_finished());

    recorder.clone().next(9);
    recorder.clone().error("late");
    assert_eq!(recorder.records(), vec![completed(0)]);
  }

  #[test]
  fn subscription_log_closes_once() {
    let log = SubscriptionLog::default();
    let first = log.open(200);
    assert!(log.is_open(first));

    log.close(first, 230);
    assert!(!log.is_open(first));
    // A later aliased disposal must not overwrite the finalized tick.
    log.close(first, 1000);

    let second = log.open(230);
    assert_eq!(
      log.records(),
      vec![SubscriptionRecord::new(200, 230), SubscriptionRecord::pending(230)]
    );
    log.close(second, 260);
    assert_eq!(
      log.records(),
      vec![SubscriptionRecord::new(200, 230), SubscriptionRecord::new(230, 260)]
    );
  }

  #[test]
  fn close_open_finalizes_only_pending_intervals() {
    let log = SubscriptionLog::default();
    let early = log.open(200);
    log.close(early, 240);
    log.open(210);
    log.open(230);

    log.close_open(250);
    assert_eq!(
      log.records(),
      vec![
        SubscriptionRecord::new(200, 240),
        SubscriptionRecord::new(210, 250),
        SubscriptionRecord::new(230, 250),
      ]
    );
  }
}
