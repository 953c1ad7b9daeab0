//! `securedata version` — display version and build information.

use console::style;

use crate::errors::Result;
use crate::store::layout::FORMAT_VERSION;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("securedata {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  {} {}",
        style("store format:").dim(),
        style(FORMAT_VERSION).cyan()
    );
    let audit = if cfg!(feature = "audit-log") {
        style("enabled").green()
    } else {
        style("disabled").yellow()
    };
    println!("  {} {}", style("audit log:").dim(), audit);
    Ok(())
}
