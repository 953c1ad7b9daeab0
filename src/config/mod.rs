//! Project configuration (`.securedata.toml`).

pub mod settings;

pub use settings::Settings;
