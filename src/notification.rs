/// One unit of a reactive sequence: a value, a failure, or the completion
/// marker. A well-formed sequence carries any number of `Next` entries
/// followed by at most one terminal (`Error` or `Complete`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }
}
