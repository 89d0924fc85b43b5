//! Process exit codes. These are part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const PACKAGE_FAILED: i32 = 1; // At least one package could not be restored
pub const CONFIG_ERROR: i32 = 2; // Bad arguments, config, or unreadable input
