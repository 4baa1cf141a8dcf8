pub mod repeat_when;

pub use repeat_when::RepeatWhenOp;
