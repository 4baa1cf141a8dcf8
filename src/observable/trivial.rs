use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Creates an observable that emits no values and completes as soon as it is
/// subscribed. Never emits an error.
pub fn empty<Item>() -> EmptyObservable<Item> { EmptyObservable(TypeHint::new()) }

/// Creates an observable that never emits anything.
///
/// Neither emits a value, nor completes, nor fails.
pub fn never() -> NeverObservable { NeverObservable }

/// Creates an observable that emits no values, just terminates with `err`.
pub fn throw<Err>(err: Err) -> ThrowObservable<Err> { ThrowObservable(err) }

#[derive(Clone)]
pub struct EmptyObservable<Item>(TypeHint<Item>);

impl<Item, O> Observable<Item, (), O> for EmptyObservable<Item>
where
  O: Observer<Item, ()>,
{
  type Unsub = ();

  #[inline]
  fn actual_subscribe(self, observer: O) { observer.complete(); }
}

impl<Item> ObservableExt<Item, ()> for EmptyObservable<Item> {}

#[derive(Clone)]
pub struct NeverObservable;

impl<O> Observable<(), (), O> for NeverObservable
where
  O: Observer<(), ()>,
{
  type Unsub = ();

  #[inline]
  fn actual_subscribe(self, _observer: O) {}
}

impl ObservableExt<(), ()> for NeverObservable {}

#[derive(Clone)]
pub struct ThrowObservable<Err>(Err);

impl<Err, O> Observable<(), Err, O> for ThrowObservable<Err>
where
  O: Observer<(), Err>,
{
  type Unsub = ();

  #[inline]
  fn actual_subscribe(self, observer: O) { observer.error(self.0); }
}

impl<Err> ObservableExt<(), Err> for ThrowObservable<Err> {}

#[cfg(test)]
mod test {
  use super::*;
  use crate::notification::Notification;
  use std::{cell::RefCell, rc::Rc};

  struct Collect<Item, Err>(Rc<RefCell<Vec<Notification<Item, Err>>>>);

  impl<Item, Err> Observer<Item, Err> for Collect<Item, Err> {
    fn next(&mut self, value: Item) {
      self.0.borrow_mut().push(Notification::Next(value));
    }
    fn error(self, err: Err) {
      self.0.borrow_mut().push(Notification::Error(err));
    }
    fn complete(self) { self.0.borrow_mut().push(Notification::Complete); }
    fn is_finished(&self) -> bool { false }
  }

  #[test]
  fn empty_completes_immediately() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    empty::<i32>().subscribe_with(Collect(seen.clone()));
    assert_eq!(*seen.borrow(), vec![Notification::Complete]);
  }

  #[test]
  fn never_stays_silent() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    never().subscribe_with(Collect(seen.clone()));
    assert!(seen.borrow().is_empty());
  }

  #[test]
  fn throw_fails_immediately() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    throw("boom").subscribe_with(Collect(seen.clone()));
    assert_eq!(*seen.borrow(), vec![Notification::Error("boom")]);
  }
}
