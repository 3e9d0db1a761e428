//! Small shared helpers.

pub mod navigation;

pub use navigation::{ArcNavigator, MemoryNavigator, Navigator};
