pub mod schema;

pub use schema::{
    Config, EventsConfig, LayoutConfig, ObserverConfig, ProtocolConfig, WidgetsConfig,
};
