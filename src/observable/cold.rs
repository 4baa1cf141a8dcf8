use std::rc::Rc;

use crate::{
  notification::Notification,
  observable::{truncate_script, Observable, ObservableExt},
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  recorder::{Recorded, SubscriptionLog, SubscriptionRecord},
  scheduler::{ActionHandle, VirtualScheduler},
  subscription::{DynamicSubscriptions, Subscription},
};

impl VirtualScheduler {
  /// Scripted source that restarts for every subscriber: entry times are
  /// offsets from the subscribe tick, so each subscription replays the whole
  /// script on its own timeline. The script is cut at its first terminal
  /// entry.
  pub fn cold<Item, Err>(
    &self,
    script: Vec<Recorded<Notification<Item, Err>>>,
  ) -> ColdObservable<Item, Err> {
    ColdObservable {
      script: Rc::new(truncate_script(script)),
      log: SubscriptionLog::default(),
      scheduler: self.clone(),
    }
  }
}

/// See [`VirtualScheduler::cold`]. Clones share the script and the
/// subscription log, so a clone handed to an operator still reports its
/// subscribe windows here.
pub struct ColdObservable<Item, Err> {
  script: Rc<Vec<Recorded<Notification<Item, Err>>>>,
  log: SubscriptionLog,
  scheduler: VirtualScheduler,
}

impl<Item, Err> Clone for ColdObservable<Item, Err> {
  fn clone(&self) -> Self {
    ColdObservable {
      script: self.script.clone(),
      log: self.log.clone(),
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<Item, Err> ColdObservable<Item, Err> {
  /// Every subscribe window this source has seen, in subscribe order. Still
  /// open windows report [`SubscriptionRecord::PENDING`].
  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.log.records() }
}

impl<Item, Err, O> Observable<Item, Err, O> for ColdObservable<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = ScriptedSubscription<O>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ColdObservable { script, log, scheduler } = self;
    let subscribed_at = scheduler.clock();
    let index = log.open(subscribed_at);

    let slot = MutRc::own(Some(observer));
    let mut handles = DynamicSubscriptions::new();
    for entry in script.iter() {
      let notification = entry.value.clone();
      let mut deliver = slot.clone();
      let log = log.clone();
      let handle =
        scheduler.schedule_at(subscribed_at + entry.time, move |s| {
          match notification {
            Notification::Next(value) => deliver.next(value),
            Notification::Error(err) => {
              log.close(index, s.clock());
              deliver.error(err);
            }
            Notification::Complete => {
              log.close(index, s.clock());
              deliver.complete();
            }
          }
        });
      handles.add(handle);
    }

    ScriptedSubscription { slot, handles, log, index, scheduler }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for ColdObservable<Item, Err> {}

/// Handle for one playback of a scripted source. Unsubscribing finalizes the
/// subscription record at the current tick, silences the observer slot and
/// cancels every entry still queued.
pub struct ScriptedSubscription<O> {
  slot: MutRc<Option<O>>,
  handles: DynamicSubscriptions<ActionHandle>,
  log: SubscriptionLog,
  index: usize,
  scheduler: VirtualScheduler,
}

impl<O> Subscription for ScriptedSubscription<O> {
  fn unsubscribe(mut self) {
    self.log.close(self.index, self.scheduler.clock());
    self.slot.rc_deref_mut().take();
    self.handles.unsubscribe_all();
  }

  fn is_closed(&self) -> bool { self.slot.rc_deref().is_none() }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::recorder::{completed, error, next, Recorder};

  #[test]
  fn playback_is_relative_to_the_subscribe_tick() {
    let scheduler = VirtualScheduler::new();
    let source = scheduler.cold::<i32, ()>(vec![
      next(100, 1),
      next(150, 2),
      next(200, 3),
      completed(250),
    ]);

    let recorded = scheduler.start(|| source);
    assert_eq!(
      recorded.records(),
      vec![next(300, 1), next(350, 2), next(400, 3), completed(450)]
    );
  }

  #[test]
  fn terminal_playback_finalizes_the_subscription_record() {
    let scheduler = VirtualScheduler::new();
    let source =
      scheduler.cold::<i32, ()>(vec![next(10, 1), completed(30)]);

    scheduler.start({
      let source = source.clone();
      move || source
    });
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 230)]);
  }

  #[test]
  fn script_is_cut_at_the_first_terminal() {
    let scheduler = VirtualScheduler::new();
    let source = scheduler.cold(vec![
      next(10, 1),
      next(20, 2),
      error(30, "boom"),
      completed(40),
    ]);

    let recorded = scheduler.start({
      let source = source.clone();
      move || source
    });
    assert_eq!(
      recorded.records(),
      vec![next(210, 1), next(220, 2), error(230, "boom")]
    );
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 230)]);
  }

  #[test]
  fn each_subscription_replays_independently() {
    let scheduler = VirtualScheduler::new();
    let source = scheduler.cold::<i32, ()>(vec![next(10, 1), next(30, 2)]);

    let early: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    let late: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    source.clone().subscribe_with(early.clone());
    scheduler.advance_to(15);
    source.clone().subscribe_with(late.clone());
    scheduler.run();

    assert_eq!(early.records(), vec![next(10, 1), next(30, 2)]);
    assert_eq!(late.records(), vec![next(25, 1), next(45, 2)]);
    assert_eq!(
      source.subscriptions(),
      vec![SubscriptionRecord::pending(0), SubscriptionRecord::pending(15)]
    );
  }

  #[test]
  fn unsubscribe_cancels_queued_entries() {
    let scheduler = VirtualScheduler::new();
    let source =
      scheduler.cold::<i32, ()>(vec![next(10, 1), next(20, 2), completed(30)]);

    let recorder: Recorder<i32, ()> = Recorder::new(scheduler.clone());
    let sub = source.clone().subscribe_with(recorder.clone());
    scheduler.advance_to(15);
    assert!(!sub.is_closed());
    sub.unsubscribe();
    scheduler.run();

    assert_eq!(recorder.records(), vec![next(10, 1)]);
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(0, 15)]);
  }
}
