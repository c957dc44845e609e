//! Process exit codes. These are part of the CLI contract.

pub const SUCCESS: i32 = 0;
/// No input file was processed (none found, or every file failed).
pub const NO_FILES_PROCESSED: i32 = 1;
/// Invalid configuration or unreadable checklist file.
pub const CONFIG_ERROR: i32 = 2;
