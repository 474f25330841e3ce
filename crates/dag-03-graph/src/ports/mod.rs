pub mod outbound;

pub use outbound::{ManualTimeSource, SystemTimeSource, TimeSource};
