//! In-memory HPA storage for tests
//!
//! Mimics the API server's optimistic concurrency: every write bumps a global
//! resourceVersion, create fails on an existing key and update fails when the
//! submitted resourceVersion is not the stored one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;

use super::HpaClient;
use crate::hpa::HPA_KIND;
use crate::Error;

type Key = (String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, HorizontalPodAutoscaler>,
    version: u64,
    calls: Vec<&'static str>,
    bump_after_get: BTreeSet<Key>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }
}

/// HPA store backed by a map
#[derive(Default)]
pub(crate) struct InMemoryHpaStore {
    state: Mutex<State>,
}

fn key_of(hpa: &HorizontalPodAutoscaler) -> Key {
    (
        hpa.metadata.namespace.clone().unwrap_or_default(),
        hpa.metadata.name.clone().unwrap_or_default(),
    )
}

fn conflict(key: &Key, message: &str) -> Error {
    Error::Conflict {
        kind: HPA_KIND.to_string(),
        namespace: key.0.clone(),
        name: key.1.clone(),
        message: message.to_string(),
    }
}

impl InMemoryHpaStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed the store; seeded objects keep their resourceVersion
    pub(crate) fn with_objects(objects: Vec<HorizontalPodAutoscaler>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            for hpa in objects {
                state.objects.insert(key_of(&hpa), hpa);
            }
            state.version = 100;
        }
        store
    }

    pub(crate) fn object(&self, namespace: &str, name: &str) -> Option<HorizontalPodAutoscaler> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Storage calls issued so far, in order
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Simulate a concurrent writer touching the object right after the next read
    pub(crate) fn bump_version_after_next_get(&self, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .bump_after_get
            .insert((namespace.to_string(), name.to_string()));
    }
}

#[async_trait]
impl HpaClient for InMemoryHpaStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<HorizontalPodAutoscaler>, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("get");
        let key = (namespace.to_string(), name.to_string());
        let found = state.objects.get(&key).cloned();
        if state.bump_after_get.remove(&key) {
            let version = state.next_version();
            if let Some(stored) = state.objects.get_mut(&key) {
                stored.metadata.resource_version = Some(version);
            }
        }
        Ok(found)
    }

    async fn create(
        &self,
        hpa: &HorizontalPodAutoscaler,
    ) -> Result<HorizontalPodAutoscaler, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create");
        let key = key_of(hpa);
        if state.objects.contains_key(&key) {
            return Err(conflict(&key, "already exists"));
        }
        let mut stored = hpa.clone();
        stored.metadata.resource_version = Some(state.next_version());
        stored.metadata.uid = Some(format!("uid-{}-{}", key.0, key.1));
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        hpa: &HorizontalPodAutoscaler,
    ) -> Result<HorizontalPodAutoscaler, Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("update");
        let key = key_of(hpa);
        let current_version = match state.objects.get(&key) {
            Some(current) => current.metadata.resource_version.clone(),
            None => return Err(conflict(&key, "not found")),
        };
        if hpa.metadata.resource_version != current_version {
            return Err(conflict(&key, "the object has been modified"));
        }
        let mut stored = hpa.clone();
        stored.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }
}
