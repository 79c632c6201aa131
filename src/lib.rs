#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

pub mod bridge;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod protocol;
pub mod sanitize;
pub mod scheduler;
pub mod settings;
pub mod utils;
pub mod widgets;

pub use bridge::{Bridge, BridgeTimer, PumpReport};
pub use config::Config;
pub use error::BridgeError;
pub use events::BridgeEvent;
pub use host::HostSession;
