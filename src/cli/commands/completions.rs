//! `securedata completions` — generate shell completion scripts.
//!
//! Usage:
//!   securedata completions bash > ~/.bash_completion.d/securedata
//!   securedata completions zsh
//!   securedata completions fish

use std::io::{self, Write};

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, SecureDataError};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    write_completions(shell, &mut io::stdout())
}

/// Render the completion script for `shell` into `out`.
fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    Ok(())
}

/// Parse a shell name, accepting `ps` as short for PowerShell.
fn parse_shell(name: &str) -> Result<Shell> {
    let lowered = name.trim().to_lowercase();
    let wanted = if lowered == "ps" { "powershell" } else { lowered.as_str() };
    <Shell as ValueEnum>::from_str(wanted, true).map_err(|_| {
        let supported: Vec<String> = Shell::value_variants()
            .iter()
            .filter_map(|s| s.to_possible_value().map(|v| v.get_name().to_string()))
            .collect();
        SecureDataError::CommandFailed(format!(
            "unknown shell '{name}' — supported: {}",
            supported.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_shells() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("zsh").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("fish").unwrap(), Shell::Fish);
        assert_eq!(parse_shell("elvish").unwrap(), Shell::Elvish);
    }

    #[test]
    fn parse_powershell_aliases() {
        assert_eq!(parse_shell("powershell").unwrap(), Shell::PowerShell);
        assert_eq!(parse_shell("ps").unwrap(), Shell::PowerShell);
    }

    #[test]
    fn parse_shell_case_insensitive() {
        assert_eq!(parse_shell("BASH").unwrap(), Shell::Bash);
        assert_eq!(parse_shell(" Zsh ").unwrap(), Shell::Zsh);
    }

    #[test]
    fn parse_shell_unknown_lists_supported() {
        let err = parse_shell("csh").unwrap_err().to_string();
        assert!(err.contains("csh"));
        assert!(err.contains("bash"));
        assert!(parse_shell("").is_err());
    }

    #[test]
    fn bash_script_mentions_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("securedata"));
        assert!(script.contains("add-account"));
    }
}
