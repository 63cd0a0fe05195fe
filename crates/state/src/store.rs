//! Object store
//!
//! In-memory collections of the four entity kinds, keyed by (namespace, name).
//! While a command runs this is the single source of truth; it is loaded from
//! and written back to the state file around the command.

use crate::error::StoreError;
use chrono::Utc;
use objects::{Cluster, Machine, Object, ProvisionedMachine, Secret};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Objects of one kind keyed by (namespace, name)
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: BTreeMap<(String, String), T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T> Collection<T> {
    /// Number of objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An entity kind held by [`ObjectStore`]
pub trait Stored: Object {
    /// This kind's collection
    fn collection(store: &ObjectStore) -> &Collection<Self>;

    /// This kind's collection, mutably
    fn collection_mut(store: &mut ObjectStore) -> &mut Collection<Self>;
}

macro_rules! impl_stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn collection(store: &ObjectStore) -> &Collection<Self> {
                &store.$field
            }

            fn collection_mut(store: &mut ObjectStore) -> &mut Collection<Self> {
                &mut store.$field
            }
        }
    };
}

/// The four entity collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectStore {
    secrets: Collection<Secret>,
    clusters: Collection<Cluster>,
    machines: Collection<Machine>,
    provisioned_machines: Collection<ProvisionedMachine>,
}

impl_stored!(Secret, secrets);
impl_stored!(Cluster, clusters);
impl_stored!(Machine, machines);
impl_stored!(ProvisionedMachine, provisioned_machines);

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

impl ObjectStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new object
    ///
    /// Stamps `uid` and `creationTimestamp` when absent and normalizes
    /// `apiVersion`/`kind`. Fails if (namespace, name) is taken.
    pub fn create<T: Stored>(&mut self, mut object: T) -> Result<T, StoreError> {
        let k = key(object.namespace(), object.name());
        let collection = T::collection_mut(self);
        if collection.items.contains_key(&k) {
            return Err(StoreError::AlreadyExists {
                kind: T::KIND,
                namespace: k.0,
                name: k.1,
            });
        }

        object.set_type_meta();
        let meta = object.metadata_mut();
        if meta.uid.is_none() {
            meta.uid = Some(Uuid::new_v4().to_string());
        }
        if meta.creation_timestamp.is_none() {
            meta.creation_timestamp = Some(Utc::now());
        }

        debug!("Created {} {}/{}", T::KIND, k.0, k.1);
        collection.items.insert(k, object.clone());
        Ok(object)
    }

    /// Fetch an object
    pub fn get<T: Stored>(&self, namespace: &str, name: &str) -> Result<T, StoreError> {
        self.find(namespace, name).ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    /// Fetch an object if it exists
    pub fn find<T: Stored>(&self, namespace: &str, name: &str) -> Option<T> {
        T::collection(self).items.get(&key(namespace, name)).cloned()
    }

    /// Whether an object exists
    pub fn contains<T: Stored>(&self, namespace: &str, name: &str) -> bool {
        T::collection(self).items.contains_key(&key(namespace, name))
    }

    /// Objects in `namespace`, name-ascending
    pub fn list<T: Stored>(&self, namespace: &str) -> Vec<T> {
        T::collection(self)
            .items
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, object)| object.clone())
            .collect()
    }

    /// Objects in every namespace, ordered by (namespace, name)
    pub fn list_all<T: Stored>(&self) -> Vec<T> {
        T::collection(self).items.values().cloned().collect()
    }

    /// Replace an object's spec and metadata, keeping its stored status and identity
    pub fn update<T: Stored>(&mut self, mut object: T) -> Result<T, StoreError> {
        let k = key(object.namespace(), object.name());
        let stored = self.stored_mut::<T>(&k)?;

        object.set_type_meta();
        object.replace_status(stored);
        let meta = object.metadata_mut();
        meta.uid.clone_from(&stored.metadata().uid);
        meta.creation_timestamp = stored.metadata().creation_timestamp;

        *stored = object.clone();
        debug!("Updated {} {}/{}", T::KIND, k.0, k.1);
        Ok(object)
    }

    /// Replace only an object's status
    pub fn update_status<T: Stored>(&mut self, object: &T) -> Result<T, StoreError> {
        let k = key(object.namespace(), object.name());
        let stored = self.stored_mut::<T>(&k)?;
        stored.replace_status(object);
        debug!("Updated status of {} {}/{}", T::KIND, k.0, k.1);
        Ok(stored.clone())
    }

    /// Remove an object, returning it
    pub fn delete<T: Stored>(&mut self, namespace: &str, name: &str) -> Result<T, StoreError> {
        let removed = T::collection_mut(self).items.remove(&key(namespace, name));
        match removed {
            Some(object) => {
                debug!("Deleted {} {}/{}", T::KIND, namespace, name);
                Ok(object)
            }
            None => Err(StoreError::NotFound {
                kind: T::KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn stored_mut<T: Stored>(&mut self, k: &(String, String)) -> Result<&mut T, StoreError> {
        T::collection_mut(self)
            .items
            .get_mut(k)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                namespace: k.0.clone(),
                name: k.1.clone(),
            })
    }
}
