mod dispatch;
pub(crate) mod run;
pub(crate) mod stats;

pub use dispatch::dispatch;
