//! Terminal output for preupload

pub mod report;

pub use report::{ReportRenderer, write_json};

use std::io::IsTerminal;

/// Whether stderr output should be colored
pub fn stderr_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

/// Whether stdout output should be colored
pub fn stdout_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
