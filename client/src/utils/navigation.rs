//! Navigation seam between the auth layer and whatever renders routes.

use std::sync::{Arc, Mutex};
use tracing::info;

/// Where the user currently is, and a way to send them elsewhere.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;

    /// `replace` drops the current entry from history instead of pushing.
    fn navigate_to(&self, route: &str, replace: bool);
}

pub type ArcNavigator = Arc<dyn Navigator>;

/// Navigator that only remembers the current route and its history.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial_route: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial_route.into()]),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.history
            .lock()
            .ok()
            .and_then(|h| h.last().cloned())
            .unwrap_or_else(|| "/".to_string())
    }

    fn navigate_to(&self, route: &str, replace: bool) {
        info!("Navigating to {}", route);
        if let Ok(mut history) = self.history.lock() {
            if replace {
                history.pop();
            }
            history.push(route.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_navigator() {
        let nav = MemoryNavigator::default();
        assert_eq!(nav.current_route(), "/");

        nav.navigate_to("/home", false);
        nav.navigate_to("/users", false);
        nav.navigate_to("/login", true);

        assert_eq!(nav.current_route(), "/login");
        assert_eq!(nav.history(), vec!["/home", "/login"]);
    }
}
