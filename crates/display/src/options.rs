//! Observable application options
//!
//! Two options drive the display: the active [`Projection`] and the light-map
//! resolution. Each lives in an [`OptionCell`], which notifies registered
//! listeners synchronously on the thread that calls [`OptionCell::set`].
//! Parsing and serialization use the legacy `key = value` properties layout;
//! reading and writing the file itself is left to the caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use sunclock_core::Projection;
use tracing::debug;

/// Properties key of the projection option.
pub const PROJECTION_KEY: &str = "projections.name";
/// Properties key of the light-map resolution option.
pub const RESOLUTION_KEY: &str = "light-map.resolution";
/// Light-map resolution used when none is configured.
pub const DEFAULT_RESOLUTION: u32 = 128;

/// Handle returned by [`OptionCell::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

/// A single option value plus its change listeners.
pub struct OptionCell<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> OptionCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the value, then call every listener with `(old, new)` in
    /// registration order.
    ///
    /// Listeners run after the value lock is released, so they may read
    /// this cell or set other options.
    pub fn set(&self, value: T) {
        let old = {
            let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *guard, value.clone())
        };

        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener(&old, &value);
        }
    }

    /// Register a listener called on every [`set`](Self::set).
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for OptionCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OptionCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock().map(|l| l.len()).unwrap_or(0);
        match self.value.read() {
            Ok(v) => f
                .debug_struct("OptionCell")
                .field("value", &*v)
                .field("listeners", &listeners)
                .finish(),
            Err(_) => f.debug_struct("OptionCell").field("value", &"<poisoned>").finish(),
        }
    }
}

/// The options the display depends on.
#[derive(Debug)]
pub struct Options {
    /// Active projection; `None` leaves the surface without a map.
    pub projection: OptionCell<Option<Projection>>,
    /// Maximum number of light-map tiles along each axis.
    pub light_resolution: OptionCell<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            projection: OptionCell::new(Some(Projection::default())),
            light_resolution: OptionCell::new(DEFAULT_RESOLUTION),
        }
    }
}

/// Serializable copy of every option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub projection: Option<Projection>,
    pub light_resolution: u32,
}

impl Options {
    pub fn snapshot(&self) -> OptionsSnapshot {
        OptionsSnapshot {
            projection: self.projection.get(),
            light_resolution: self.light_resolution.get(),
        }
    }

    /// Set every option from a snapshot, notifying listeners.
    pub fn restore(&self, snapshot: &OptionsSnapshot) {
        self.projection.set(snapshot.projection);
        self.light_resolution.set(snapshot.light_resolution);
    }

    /// Update options from legacy properties.
    ///
    /// Missing or unparsable entries leave the current value untouched.
    pub fn apply_properties(&self, properties: &HashMap<String, String>) {
        if let Some(projection) = parse_projection(properties.get(PROJECTION_KEY).map(String::as_str)) {
            self.projection.set(Some(projection));
        }
        if let Some(resolution) = parse_resolution(properties.get(RESOLUTION_KEY).map(String::as_str)) {
            self.light_resolution.set(resolution);
        }
    }

    /// Current options as legacy properties.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        properties.insert(PROJECTION_KEY.to_string(), serialize_projection(self.projection.get()));
        properties.insert(RESOLUTION_KEY.to_string(), serialize_resolution(self.light_resolution.get()));
        properties
    }
}

/// Parse a persisted projection name.
///
/// Missing, blank, `null` and unknown names yield `None`.
pub fn parse_projection(raw: Option<&str>) -> Option<Projection> {
    let name = raw?.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("null") {
        return None;
    }
    match name.parse() {
        Ok(projection) => Some(projection),
        Err(e) => {
            debug!("ignoring persisted projection: {}", e);
            None
        }
    }
}

pub fn serialize_projection(projection: Option<Projection>) -> String {
    projection.map(|p| p.key().to_string()).unwrap_or_default()
}

/// Parse a persisted light-map resolution; only positive integers are accepted.
pub fn parse_resolution(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|&r| r > 0)
}

pub fn serialize_resolution(resolution: u32) -> String {
    if resolution == 0 {
        String::new()
    } else {
        resolution.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_old_and_new() {
        let cell = OptionCell::new(1u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        cell.add_listener(move |old, new| s.lock().unwrap().push((*old, *new)));

        cell.set(2);
        cell.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 5)]);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let cell = OptionCell::new(0u32);
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let o = Arc::clone(&order);
            cell.add_listener(move |_, _| o.lock().unwrap().push(tag));
        }
        cell.set(1);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn removed_listener_is_silent() {
        let cell = OptionCell::new(0u32);
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        let id = cell.add_listener(move |_, _| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        cell.set(1);
        assert!(cell.remove_listener(id));
        assert!(!cell.remove_listener(id));
        cell.set(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(cell.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_the_cell() {
        let cell = Arc::new(OptionCell::new(0u32));
        let c = Arc::clone(&cell);
        let seen = Arc::new(AtomicU64::new(0));
        let s = Arc::clone(&seen);
        cell.add_listener(move |_, _| s.store(c.get() as u64, Ordering::SeqCst));
        cell.set(9);
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.projection.get(), Some(Projection::Equirectangular));
        assert_eq!(options.light_resolution.get(), 128);
    }

    #[test]
    fn parse_legacy_projection() {
        assert_eq!(parse_projection(Some("WEB_MERCATOR")), Some(Projection::WebMercator));
        assert_eq!(parse_projection(Some("  CASSINI ")), Some(Projection::Cassini));
        assert_eq!(parse_projection(Some("")), None);
        assert_eq!(parse_projection(Some("NULL")), None);
        assert_eq!(parse_projection(Some("MOLLWEIDE")), None);
        assert_eq!(parse_projection(None), None);
    }

    #[test]
    fn parse_legacy_resolution() {
        assert_eq!(parse_resolution(Some("64")), Some(64));
        assert_eq!(parse_resolution(Some("0")), None);
        assert_eq!(parse_resolution(Some("-3")), None);
        assert_eq!(parse_resolution(Some("lots")), None);
        assert_eq!(parse_resolution(None), None);
        assert_eq!(serialize_resolution(0), "");
        assert_eq!(serialize_resolution(32), "32");
    }

    #[test]
    fn properties_round_trip() {
        let options = Options::default();
        let mut props = HashMap::new();
        props.insert(PROJECTION_KEY.to_string(), "CASSINI".to_string());
        props.insert(RESOLUTION_KEY.to_string(), "garbage".to_string());
        options.apply_properties(&props);

        assert_eq!(options.projection.get(), Some(Projection::Cassini));
        assert_eq!(options.light_resolution.get(), DEFAULT_RESOLUTION);

        let out = options.to_properties();
        assert_eq!(out[PROJECTION_KEY], "CASSINI");
        assert_eq!(out[RESOLUTION_KEY], "128");

        options.projection.set(None);
        assert_eq!(options.to_properties()[PROJECTION_KEY], "");
    }

    #[test]
    fn snapshot_restore_notifies() {
        let options = Options::default();
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        options.light_resolution.add_listener(move |_, _| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        options.restore(&OptionsSnapshot {
            projection: Some(Projection::WebMercator),
            light_resolution: 16,
        });
        assert_eq!(options.snapshot().light_resolution, 16);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
