//! CLI exit codes.
//!
//! A completed run exits 0 even when the report records an error: the report
//! file is the contract, not the exit status.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Run completed, report written                        |
//! | 1    | Report could not be written                          |
//! | 2    | Usage error (bad arguments, unreadable/invalid config) |

/// Run completed and the report was written.
pub const EXIT_SUCCESS: u8 = 0;

/// The report file could not be written.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments or gateway config. clap exits with the same code for
/// parse failures.
pub const EXIT_USAGE: u8 = 2;
