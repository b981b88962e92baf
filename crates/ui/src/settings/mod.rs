pub mod state;

pub use state::{ClientSettings, SettingsChanged, SettingsError, SettingsState, SettingsStore};
