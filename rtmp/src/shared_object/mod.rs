/*!
This module contains client side support for RTMP shared objects, the sub-protocol used
to synchronize a named key/value store with the server.

A `SharedObject` is a sans-IO type.  Methods that need to talk to the server return a
`SharedObjectMessage` describing the events to send, and the owning code is responsible
for handing it to its client session (e.g. via `send_shared_object_message()`) and for
feeding incoming `SharedObjectMessageReceived` events back in through `handle_message()`.

Instances are deduplicated through the `SharedObjectRegistry`, since two handles for the
same name, path, and persistence flag must observe the same state.
*/

use std::collections::HashMap;
use std::sync::Arc;

use freshet_amf0::{Amf0Object, Amf0Value};
use parking_lot::Mutex;

use messages::SharedObjectEvent;

/// A handle for a shared object instance.  Mutation should stay confined to the thread
/// driving the owning connection.
pub type SharedObjectHandle = Arc<Mutex<SharedObject>>;

/// An outbound shared object message that should be passed to the client session for
/// delivery to the server
#[derive(PartialEq, Debug)]
pub struct SharedObjectMessage {
    pub name: String,
    pub version: u32,
    pub persistent: bool,
    pub events: Vec<SharedObjectEvent>,
}

/// A single change that was applied to a shared object while processing a message from
/// the server
#[derive(PartialEq, Debug, Clone)]
pub struct SharedObjectSyncEntry {
    /// What happened to the property (`change`, `success`, `reject`, `clear` or `delete`)
    pub code: String,

    /// The property the change applies to, when the change is specific to one property
    pub key: Option<String>,

    /// The value the property had before the change was applied
    pub previous_value: Option<Amf0Value>,
}

/// Raised for every processed shared object message so observers can react to the
/// ordered list of changes that were applied
#[derive(PartialEq, Debug, Clone)]
pub struct SharedObjectNotification {
    pub name: String,
    pub version: u32,
    pub changes: Vec<SharedObjectSyncEntry>,
}

/// Client side state of a single named shared object
pub struct SharedObject {
    name: String,
    persistent: bool,
    properties: Amf0Object,
    current_version: u32,
    succeeded: bool,
    is_attached: bool,

    // Values that keys had before we sent a `requestChange` that the server has not
    // acknowledged yet, so a rejection can roll them back.
    pending_changes: HashMap<String, Option<Amf0Value>>,
}

impl SharedObject {
    pub fn new(name: String, persistent: bool) -> SharedObject {
        SharedObject {
            name,
            persistent,
            properties: Amf0Object::new(),
            current_version: 0,
            succeeded: false,
            is_attached: false,
            pending_changes: HashMap::new(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// True once the server has acknowledged our `use` event
    pub fn has_succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.properties.get(key)
    }

    /// Starts (or restarts) synchronization with the server by announcing that this
    /// client is using the shared object.  This should be sent when the connection is
    /// established, and again if the connection reports a new connect success.
    pub fn start_synchronization(&mut self) -> SharedObjectMessage {
        self.is_attached = true;
        self.succeeded = false;

        let version = self.get_next_version();
        SharedObjectMessage {
            name: self.name.clone(),
            version,
            persistent: self.persistent,
            events: vec![SharedObjectEvent::Use],
        }
    }

    /// Sets a property on the shared object.  The local value is updated immediately.
    /// If the server has acknowledged us a change request is returned for delivery,
    /// otherwise the write stays local and will be flushed when the server sends
    /// its `useSuccess` event.
    pub fn set_property(&mut self, key: String, value: Amf0Value) -> Option<SharedObjectMessage> {
        let previous = self.properties.remove(&key);
        self.properties.insert(key.clone(), value.clone());

        if !self.succeeded {
            return None;
        }

        self.pending_changes.entry(key.clone()).or_insert(previous);

        let version = self.get_next_version();
        Some(SharedObjectMessage {
            name: self.name.clone(),
            version,
            persistent: self.persistent,
            events: vec![SharedObjectEvent::RequestChange { key, value }],
        })
    }

    /// Empties the local state and tells the server to clear the shared object
    pub fn clear(&mut self) -> SharedObjectMessage {
        self.properties = Amf0Object::new();
        self.pending_changes.clear();

        let version = self.get_next_version();
        SharedObjectMessage {
            name: self.name.clone(),
            version,
            persistent: self.persistent,
            events: vec![SharedObjectEvent::Clear],
        }
    }

    /// Empties the local state, releases the shared object on the server, and detaches
    /// from the connection.  The instance can be reattached later with
    /// `start_synchronization()`.
    pub fn close(&mut self) -> SharedObjectMessage {
        self.properties = Amf0Object::new();
        self.pending_changes.clear();
        self.is_attached = false;
        self.succeeded = false;

        let version = self.get_next_version();
        SharedObjectMessage {
            name: self.name.clone(),
            version,
            persistent: self.persistent,
            events: vec![SharedObjectEvent::Release],
        }
    }

    /// Applies an incoming shared object message from the server.  Events are applied in
    /// order against the local state.  Returns a notification with the ordered changes
    /// that were applied, plus an optional follow up message that must be sent to the
    /// server (buffered writes being flushed after a `useSuccess` event).
    pub fn handle_message(
        &mut self,
        version: u32,
        events: Vec<SharedObjectEvent>,
    ) -> (SharedObjectNotification, Option<SharedObjectMessage>) {
        self.current_version = version;

        let mut changes = Vec::new();
        let mut outgoing_events = Vec::new();

        for event in events {
            match event {
                SharedObjectEvent::Change { key, value } => {
                    let previous = self.properties.remove(&key);
                    self.properties.insert(key.clone(), value);
                    changes.push(SharedObjectSyncEntry {
                        code: "change".to_string(),
                        key: Some(key),
                        previous_value: previous,
                    });
                }

                SharedObjectEvent::Success { key } => {
                    self.pending_changes.remove(&key);
                    changes.push(SharedObjectSyncEntry {
                        code: "success".to_string(),
                        key: Some(key),
                        previous_value: None,
                    });
                }

                SharedObjectEvent::Status { .. } => {
                    self.revert_pending_changes(&mut changes);
                }

                SharedObjectEvent::Clear => {
                    self.properties = Amf0Object::new();
                    self.pending_changes.clear();
                    changes.push(SharedObjectSyncEntry {
                        code: "clear".to_string(),
                        key: None,
                        previous_value: None,
                    });
                }

                SharedObjectEvent::Remove { key } => {
                    let previous = self.properties.remove(&key);
                    self.pending_changes.remove(&key);
                    changes.push(SharedObjectSyncEntry {
                        code: "delete".to_string(),
                        key: Some(key),
                        previous_value: previous,
                    });
                }

                SharedObjectEvent::UseSuccess => {
                    self.succeeded = true;
                    for (key, value) in self.properties.iter() {
                        outgoing_events.push(SharedObjectEvent::RequestChange {
                            key: key.clone(),
                            value: value.clone(),
                        });
                    }
                }

                // The remaining events only flow from client to server
                SharedObjectEvent::Use
                | SharedObjectEvent::Release
                | SharedObjectEvent::RequestChange { .. }
                | SharedObjectEvent::RequestRemove { .. }
                | SharedObjectEvent::SendMessage { .. } => (),
            }
        }

        let notification = SharedObjectNotification {
            name: self.name.clone(),
            version: self.current_version,
            changes,
        };

        let outgoing = if outgoing_events.is_empty() {
            None
        } else {
            let version = self.get_next_version();
            Some(SharedObjectMessage {
                name: self.name.clone(),
                version,
                persistent: self.persistent,
                events: outgoing_events,
            })
        };

        (notification, outgoing)
    }

    fn revert_pending_changes(&mut self, changes: &mut Vec<SharedObjectSyncEntry>) {
        let pending = std::mem::replace(&mut self.pending_changes, HashMap::new());
        for (key, previous) in pending {
            let current = self.properties.remove(&key);
            if let Some(ref value) = previous {
                self.properties.insert(key.clone(), value.clone());
            }

            changes.push(SharedObjectSyncEntry {
                code: "reject".to_string(),
                key: Some(key),
                previous_value: current,
            });
        }
    }

    // The version is bumped for every message of our own, but once the server has
    // acknowledged the object the transmitted version is always zero.
    fn get_next_version(&mut self) -> u32 {
        if self.succeeded {
            0
        } else {
            self.current_version += 1;
            self.current_version
        }
    }
}

/// Creates and caches shared object instances for the lifetime of the registry, so all
/// callers asking for the same object observe the same state
pub struct SharedObjectRegistry {
    instances: Mutex<HashMap<String, SharedObjectHandle>>,
}

impl SharedObjectRegistry {
    pub fn new() -> SharedObjectRegistry {
        SharedObjectRegistry {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the unique instance for the given name, path, and persistence flag,
    /// creating it on first use
    pub fn get_or_create(&self, name: &str, path: &str, persistence: bool) -> SharedObjectHandle {
        let key = format!("{}/{}?persistence={}", path, name, persistence);
        let mut instances = self.instances.lock();
        instances
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(SharedObject::new(name.to_string(), persistence))))
            .clone()
    }

    /// Removes an instance from the registry.  Existing handles stay valid but new
    /// lookups will create a fresh instance.
    pub fn remove(&self, name: &str, path: &str, persistence: bool) {
        let key = format!("{}/{}?persistence={}", path, name, persistence);
        self.instances.lock().remove(&key);
    }
}
