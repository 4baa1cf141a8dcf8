//! # marbles: virtual-time reactive streams
//!
//! A push-based event-stream engine that runs entirely on a virtual clock.
//! Scripted hot and cold sources play out over a [`VirtualScheduler`], a
//! [`Recorder`] stamps everything it hears with the tick it arrived at, and
//! the whole run is exactly reproducible: same script, same clock, same
//! recording, every time.
//!
//! ## Quick Start
//!
//! ```rust
//! use marbles::prelude::*;
//!
//! let scheduler = VirtualScheduler::new();
//! let source = scheduler.cold::<i32, ()>(vec![
//!   next(10, 1),
//!   next(20, 2),
//!   completed(30),
//! ]);
//!
//! // Create at 100, subscribe at 200, dispose at 1000, then drain.
//! let recorded = scheduler.start({
//!   let source = source.clone();
//!   move || source
//! });
//!
//! assert_eq!(
//!   recorded.records(),
//!   vec![next(210, 1), next(220, 2), completed(230)]
//! );
//! assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 230)]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`VirtualScheduler`] | Discrete clock plus an action queue ordered by (tick, insertion) |
//! | [`Observable`] / [`Observer`] | Producer and consumer halves of the push contract |
//! | [`Subject`] | Multicast relay behind hot sources and the repeat operator's signals |
//! | [`VirtualScheduler::cold`] / [`VirtualScheduler::hot`] | Scripted sources with per-subscription and shared timelines |
//! | [`Recorder`] | Observer that logs tick-stamped notifications for assertions |
//! | [`ObservableExt::repeat_when`] | Notifier-driven resubscription |
//!
//! [`VirtualScheduler`]: scheduler::VirtualScheduler
//! [`VirtualScheduler::cold`]: scheduler::VirtualScheduler::cold
//! [`VirtualScheduler::hot`]: scheduler::VirtualScheduler::hot
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subject`]: subject::Subject
//! [`Recorder`]: recorder::Recorder
//! [`ObservableExt::repeat_when`]: observable::ObservableExt::repeat_when

pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod recorder;
pub mod scheduler;
pub mod subject;
pub mod subscription;
pub mod type_hint;

// Re-export the prelude module
pub use prelude::*;

// Bring README code blocks into Cargo-driven doctests.
#[cfg(doctest)]
mod readme_doctests {
  #![doc = include_str!("../README.md")]
}
