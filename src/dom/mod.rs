//! Host-page model: the DOM, layout boxes and host event subscriptions the
//! bridge is driven by.

pub mod document;
pub mod page;

pub use document::{Document, Element, MutationKind, MutationRecord, NodeId, NodeKind, ObserverId, Rect};
pub use page::{HostEvent, HostTopic, NavigationSource, Page, SubscriptionId, Viewport};
