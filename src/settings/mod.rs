pub mod file;
pub mod traits;

pub use file::FileSettings;
pub use traits::{
    DEBUG_MODE_KEY, MemorySettings, SettingsStore, load_debug_mode, save_debug_mode,
};
