pub mod ledger;

pub use ledger::{already_done, load_reports, ResumeLedger};
