//! Widget engine: typed configs, rendering, and the live registry.

pub mod config;
pub mod registry;
pub mod render;
pub mod view;

pub use config::{
    CommonConfig, DisplayValue, ListItem, WidgetBody, WidgetConfig, WidgetKind, Zone,
    check_widget_id,
};
pub use registry::{DEFAULT_CONTAINER_ID, WidgetRecord, WidgetRegistry};
pub use render::{bar_percent, format_percent, render};
pub use view::{VElement, VNode};
