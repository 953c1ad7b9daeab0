//! One module per subcommand. Each exposes an `execute` function.

pub mod add_account;
pub mod add_folder;
pub mod audit_cmd;
pub mod completions;
pub mod decrypt;
pub mod delete;
pub mod edit;
pub mod encrypt;
pub mod init;
pub mod list;
pub mod show;
pub mod version;
