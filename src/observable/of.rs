use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an
/// error.
///
/// ```
/// use marbles::prelude::*;
///
/// let mut sum = 0;
/// of(123).subscribe(|v| sum += v);
/// assert_eq!(sum, 123);
/// ```
pub fn of<Item>(value: Item) -> OfObservable<Item> { OfObservable(value) }

#[derive(Clone)]
pub struct OfObservable<Item>(Item);

impl<Item, O> Observable<Item, (), O> for OfObservable<Item>
where
  O: Observer<Item, ()>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) {
    observer.next(self.0);
    observer.complete();
  }
}

impl<Item> ObservableExt<Item, ()> for OfObservable<Item> {}
