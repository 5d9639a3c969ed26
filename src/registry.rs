//! Process-global registry of resources to release on interrupt
//!
//! Anything that owns terminal state or a background task while the probe
//! runs registers itself here. The Ctrl+C handler calls [`cleanup_all`] before
//! the process exits.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A resource that can be released from the interrupt handler
pub trait Cleanup: Send + Sync {
    /// Stable identity of the resource
    fn key(&self) -> String;

    /// Release the resource; calling it twice is harmless
    fn exit(&self);
}

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<dyn Cleanup>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Register `resource`, replacing any earlier one with the same key
pub fn register(resource: Arc<dyn Cleanup>) {
    if let Ok(mut map) = REGISTRY.lock() {
        map.insert(resource.key(), resource);
    }
}

pub fn unregister(key: &str) -> bool {
    REGISTRY
        .lock()
        .map(|mut map| map.remove(key).is_some())
        .unwrap_or(false)
}

pub fn len() -> usize {
    REGISTRY.lock().map(|map| map.len()).unwrap_or(0)
}

/// Release every registered resource and empty the registry
///
/// Returns the number of resources released.
pub fn cleanup_all() -> usize {
    let drained: Vec<Arc<dyn Cleanup>> = match REGISTRY.lock() {
        Ok(mut map) => map.drain().map(|(_, resource)| resource).collect(),
        Err(poisoned) => poisoned.into_inner().drain().map(|(_, resource)| resource).collect(),
    };
    // exit() runs outside the lock so a resource may unregister itself
    for resource in &drained {
        resource.exit();
    }
    drained.len()
}
