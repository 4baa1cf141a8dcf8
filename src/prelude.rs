//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Core traits
pub use crate::observable::{Observable, ObservableExt};
pub use crate::observer::{FnMutObserver, Observer, Publisher};
// Creation
pub use crate::observable::{
  empty, never, of, throw, ColdObservable, HotObservable,
};
// Notifications and recording
pub use crate::notification::Notification;
pub use crate::recorder::{
  completed, error, next, Recorded, Recorder, SubscriptionLog,
  SubscriptionRecord,
};
// Scheduler
pub use crate::scheduler::{ActionHandle, Tick, VirtualScheduler};
// Subject
pub use crate::subject::{Subject, SubjectSubscription};
// Subscription
pub use crate::subscription::{
  BoxedSubscription, DynamicSubscriptions, Subscription,
};
// Operators
pub use crate::ops::RepeatWhenOp;
