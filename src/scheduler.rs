//! Virtual-time scheduler
//!
//! A discrete logical clock plus an ordered queue of one-shot actions. Every
//! timed effect in the engine (scripted playback, harness stages, the repeat
//! operator's trampolined resubscription) is an action in this queue, which
//! is what makes runs exactly reproducible: actions execute ordered by
//! (due tick, insertion sequence), so two actions scheduled for the same tick
//! run in the order they were scheduled.

use std::collections::VecDeque;

use crate::{
  observable::Observable,
  rc::{MutRc, RcDeref, RcDerefMut},
  recorder::Recorder,
  subscription::Subscription,
};

/// Virtual time. Nothing here relates to wall-clock time; a tick only means
/// "later than any smaller tick".
pub type Tick = usize;

/// Cheap-to-clone handle on a virtual clock and its action queue.
///
/// The scheduler is always passed around explicitly (sources, operators and
/// the harness each hold a clone); independent schedulers can coexist in one
/// process.
pub struct VirtualScheduler(MutRc<InnerScheduler>);

struct InnerScheduler {
  clock: Tick,
  next_seq: usize,
  queue: VecDeque<ScheduledAction>,
}

struct ScheduledAction {
  due: Tick,
  seq: usize,
  cancelled: MutRc<bool>,
  work: Box<dyn FnOnce(&VirtualScheduler)>,
}

/// Cancellation handle for one scheduled action. Cancelling is idempotent:
/// the flag is shared by every clone, and a cancelled action is skipped by
/// the drain loop without advancing the clock.
#[derive(Clone)]
pub struct ActionHandle {
  cancelled: MutRc<bool>,
}

impl Subscription for ActionHandle {
  fn unsubscribe(self) { *self.cancelled.rc_deref_mut() = true; }

  fn is_closed(&self) -> bool { *self.cancelled.rc_deref() }
}

impl Default for VirtualScheduler {
  fn default() -> Self {
    let inner = InnerScheduler { clock: 0, next_seq: 0, queue: Default::default() };
    VirtualScheduler(MutRc::own(inner))
  }
}

impl Clone for VirtualScheduler {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl VirtualScheduler {
  /// Default harness tick at which the observable under test is created.
  pub const CREATED: Tick = 100;
  /// Default harness tick at which the recorder subscribes.
  pub const SUBSCRIBED: Tick = 200;
  /// Default harness tick at which the recorder's subscription is disposed.
  pub const DISPOSED: Tick = 1000;

  #[inline]
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn clock(&self) -> Tick { self.0.rc_deref().clock }

  /// Schedule `work` to run `delay` ticks after the current clock. The
  /// action receives this scheduler, through which it may schedule follow-up
  /// actions; those are ordered into the queue before draining continues.
  pub fn schedule(
    &self,
    delay: Tick,
    work: impl FnOnce(&VirtualScheduler) + 'static,
  ) -> ActionHandle {
    let due = self.clock() + delay;
    self.schedule_at(due, work)
  }

  /// Schedule `work` at an absolute tick. A due tick already in the past is
  /// clamped to the current clock, so the action still runs, in FIFO order
  /// behind anything already queued for the current tick.
  pub fn schedule_at(
    &self,
    due: Tick,
    work: impl FnOnce(&VirtualScheduler) + 'static,
  ) -> ActionHandle {
    let cancelled = MutRc::own(false);
    let handle = ActionHandle { cancelled: cancelled.clone() };

    let mut inner = self.0.rc_deref_mut();
    let due = due.max(inner.clock);
    let seq = inner.next_seq;
    inner.next_seq += 1;
    order_insert(&mut inner.queue, ScheduledAction { due, seq, cancelled, work: Box::new(work) });
    handle
  }

  /// Pop the earliest pending action due at or before `limit`, advancing the
  /// clock to its due tick. Cancelled actions are discarded without touching
  /// the clock. No queue borrow is held once this returns, so the action can
  /// freely reschedule or cancel.
  fn pop_due(&self, limit: Tick) -> Option<ScheduledAction> {
    loop {
      let mut inner = self.0.rc_deref_mut();
      let due = inner.queue.front().map(|a| a.due)?;
      if due > limit {
        return None;
      }
      let action = match inner.queue.pop_front() {
        Some(action) => action,
        None => return None,
      };
      if *action.cancelled.rc_deref() {
        continue;
      }
      inner.clock = due;
      return Some(action);
    }
  }

  /// Run every action due at or before `to`, then rest the clock at `to`
  /// (or later, if it was already past).
  pub fn advance_to(&self, to: Tick) {
    while let Some(action) = self.pop_due(to) {
      (action.work)(self);
    }
    let mut inner = self.0.rc_deref_mut();
    if inner.clock < to {
      inner.clock = to;
    }
  }

  #[inline]
  pub fn advance_by(&self, delta: Tick) { self.advance_to(self.clock() + delta); }

  /// Drain the queue completely. The clock ends at the due tick of the last
  /// action that ran.
  pub fn run(&self) {
    while let Some(action) = self.pop_due(Tick::MAX) {
      (action.work)(self);
    }
  }

  /// Marble-test harness with the default stage ticks: create the observable
  /// under test at [`Self::CREATED`], subscribe a [`Recorder`] at
  /// [`Self::SUBSCRIBED`], dispose that subscription at [`Self::DISPOSED`],
  /// drain everything, and hand back the recorder for assertions.
  pub fn start<Item, Err, S, F>(&self, create: F) -> Recorder<Item, Err>
  where
    Item: 'static,
    Err: 'static,
    S: Observable<Item, Err, Recorder<Item, Err>> + 'static,
    S::Unsub: 'static,
    F: FnOnce() -> S + 'static,
  {
    self.start_at(Self::CREATED, Self::SUBSCRIBED, Self::DISPOSED, create)
  }

  /// [`Self::start`] with explicit stage ticks.
  pub fn start_at<Item, Err, S, F>(
    &self,
    created: Tick,
    subscribed: Tick,
    disposed: Tick,
    create: F,
  ) -> Recorder<Item, Err>
  where
    Item: 'static,
    Err: 'static,
    S: Observable<Item, Err, Recorder<Item, Err>> + 'static,
    S::Unsub: 'static,
    F: FnOnce() -> S + 'static,
  {
    let recorder = Recorder::new(self.clone());
    let source_slot: MutRc<Option<S>> = MutRc::own(None);
    let sub_slot: MutRc<Option<S::Unsub>> = MutRc::own(None);

    {
      let source_slot = source_slot.clone();
      self.schedule_at(created, move |_| {
        *source_slot.rc_deref_mut() = Some(create());
      });
    }
    {
      let sub_slot = sub_slot.clone();
      let recorder = recorder.clone();
      self.schedule_at(subscribed, move |_| {
        let source = source_slot.rc_deref_mut().take();
        if let Some(source) = source {
          *sub_slot.rc_deref_mut() = Some(source.actual_subscribe(recorder));
        }
      });
    }
    self.schedule_at(disposed, move |_| {
      let sub = sub_slot.rc_deref_mut().take();
      if let Some(sub) = sub {
        sub.unsubscribe();
      }
    });

    self.run();
    recorder
  }
}

fn order_insert(queue: &mut VecDeque<ScheduledAction>, action: ScheduledAction) {
  let key = (action.due, action.seq);
  let position = queue
    .make_contiguous()
    .binary_search_by(|a| (a.due, a.seq).cmp(&key));
  let position = match position {
    Ok(p) => p,
    Err(p) => p,
  };
  queue.insert(position, action);
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use bencher::benchmark_group;

  use super::*;

  #[test]
  fn clock_follows_due_ticks() {
    let scheduler = VirtualScheduler::new();
    assert_eq!(scheduler.clock(), 0);

    let seen = Rc::new(RefCell::new(Vec::new()));
    for due in [30, 10, 20] {
      let seen = seen.clone();
      scheduler.schedule_at(due, move |s| seen.borrow_mut().push(s.clock()));
    }

    scheduler.run();
    assert_eq!(*seen.borrow(), vec![10, 20, 30]);
    assert_eq!(scheduler.clock(), 30);
  }

  #[test]
  fn same_tick_runs_in_insertion_order() {
    let scheduler = VirtualScheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for tag in ["a", "b", "c"] {
      let seen = seen.clone();
      scheduler.schedule_at(50, move |_| seen.borrow_mut().push(tag));
    }

    scheduler.run();
    assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
  }

  #[test]
  fn cancelled_action_never_runs() {
    let scheduler = VirtualScheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let handle = {
      let seen = seen.clone();
      scheduler.schedule_at(10, move |_| seen.borrow_mut().push("cancelled"))
    };
    {
      let seen = seen.clone();
      scheduler.schedule_at(20, move |_| seen.borrow_mut().push("kept"));
    }

    assert!(!handle.is_closed());
    let alias = handle.clone();
    handle.unsubscribe();
    assert!(alias.is_closed());
    // Cancelling again through the surviving alias changes nothing.
    alias.unsubscribe();

    scheduler.run();
    assert_eq!(*seen.borrow(), vec!["kept"]);
    assert_eq!(scheduler.clock(), 20);
  }

  #[test]
  fn past_due_clamps_to_current_clock() {
    let scheduler = VirtualScheduler::new();
    scheduler.advance_to(100);

    let seen = Rc::new(RefCell::new(Vec::new()));
    {
      let seen = seen.clone();
      scheduler.schedule_at(40, move |s| seen.borrow_mut().push(s.clock()));
    }
    scheduler.run();
    assert_eq!(*seen.borrow(), vec![100]);
  }

  #[test]
  fn actions_schedule_follow_ups_in_fifo_position() {
    let scheduler = VirtualScheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    {
      let seen = seen.clone();
      scheduler.schedule_at(10, move |s| {
        seen.borrow_mut().push("first");
        let follow = seen.clone();
        // Due now: lands behind the sibling already queued for tick 10.
        s.schedule(0, move |_| follow.borrow_mut().push("follow-up"));
      });
    }
    {
      let seen = seen.clone();
      scheduler.schedule_at(10, move |_| seen.borrow_mut().push("second"));
    }

    scheduler.run();
    assert_eq!(*seen.borrow(), vec!["first", "second", "follow-up"]);
  }

  #[test]
  fn advance_to_stops_at_limit() {
    let scheduler = VirtualScheduler::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for due in [10, 20, 30] {
      let seen = seen.clone();
      scheduler.schedule_at(due, move |_| seen.borrow_mut().push(due));
    }

    scheduler.advance_to(20);
    assert_eq!(*seen.borrow(), vec![10, 20]);
    assert_eq!(scheduler.clock(), 20);

    scheduler.advance_by(5);
    assert_eq!(scheduler.clock(), 25);

    scheduler.run();
    assert_eq!(*seen.borrow(), vec![10, 20, 30]);
  }

  #[test]
  fn deep_follow_up_chains_stay_flat() {
    // Depth lives in the queue, not on the call stack: each action queues
    // the next one and returns to the drain loop.
    fn chain(s: &VirtualScheduler, count: Rc<RefCell<usize>>, left: usize) {
      if left == 0 {
        return;
      }
      *count.borrow_mut() += 1;
      s.schedule(0, move |s| chain(s, count, left - 1));
    }

    let scheduler = VirtualScheduler::new();
    let count = Rc::new(RefCell::new(0usize));
    {
      let count = count.clone();
      scheduler.schedule_at(0, move |s| chain(s, count, 100_000));
    }
    scheduler.run();
    assert_eq!(*count.borrow(), 100_000);
    assert_eq!(scheduler.clock(), 0);
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_schedule_drain);

  fn bench_schedule_drain(b: &mut bencher::Bencher) { b.iter(clock_follows_due_ticks); }
}
