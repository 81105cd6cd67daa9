//! Record set representation used by the differ and conflict resolver.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use zonesync_provider::{ProviderRecord, RecordKey};

/// One value of a record set: payload plus per-record attributes.
///
/// TTL and priority participate in equality, so a TTL change alone counts as
/// a change to the set. Ordering is derived, keeping sets deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordValue {
    /// Record payload (address, target host, text).
    pub value: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Priority, for MX and SRV values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl From<&ProviderRecord> for RecordValue {
    fn from(record: &ProviderRecord) -> Self {
        Self {
            value: record.value.clone(),
            ttl: record.ttl,
            priority: record.priority,
        }
    }
}

/// Serialized form of one record set entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordSetEntry {
    key: RecordKey,
    values: Vec<RecordValue>,
}

/// A full zone snapshot: value sets grouped by (type, name) key.
///
/// Desired state, remote state and the last-known-common baseline are all
/// held in this shape. `BTreeMap` iteration order is what makes diff plans
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RecordSetEntry>", into = "Vec<RecordSetEntry>")]
pub struct RecordSet {
    sets: BTreeMap<RecordKey, BTreeSet<RecordValue>>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group flat provider records into value sets.
    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ProviderRecord>,
    {
        let mut set = Self::new();
        for record in records {
            set.insert(record.key(), RecordValue::from(&record));
        }
        set
    }

    /// Add one value to a key's set.
    pub fn insert(&mut self, key: RecordKey, value: RecordValue) {
        self.sets.entry(key).or_default().insert(value);
    }

    /// Replace a key's full value set. An empty set removes the key.
    pub fn set_values(&mut self, key: RecordKey, values: BTreeSet<RecordValue>) {
        if values.is_empty() {
            self.sets.remove(&key);
        } else {
            self.sets.insert(key, values);
        }
    }

    /// Remove a key entirely.
    pub fn remove_key(&mut self, key: &RecordKey) {
        self.sets.remove(key);
    }

    #[must_use]
    pub fn get(&self, key: &RecordKey) -> Option<&BTreeSet<RecordValue>> {
        self.sets.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.sets.contains_key(key)
    }

    /// Number of keys (not values).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.sets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &BTreeSet<RecordValue>)> {
        self.sets.iter()
    }

    /// Union of this set's keys and another's, in sorted order.
    #[must_use]
    pub fn key_union(&self, other: &Self) -> Vec<RecordKey> {
        let mut keys: BTreeSet<&RecordKey> = self.sets.keys().collect();
        keys.extend(other.sets.keys());
        keys.into_iter().cloned().collect()
    }

    /// Materialize a key's value set as flat provider records.
    #[must_use]
    pub fn records_for(key: &RecordKey, values: &BTreeSet<RecordValue>) -> Vec<ProviderRecord> {
        values
            .iter()
            .map(|v| ProviderRecord {
                record_type: key.record_type,
                name: key.name.clone(),
                value: v.value.clone(),
                ttl: v.ttl,
                priority: v.priority,
            })
            .collect()
    }
}

impl From<Vec<RecordSetEntry>> for RecordSet {
    fn from(entries: Vec<RecordSetEntry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.set_values(entry.key, entry.values.into_iter().collect());
        }
        set
    }
}

impl From<RecordSet> for Vec<RecordSetEntry> {
    fn from(set: RecordSet) -> Self {
        set.sets
            .into_iter()
            .map(|(key, values)| RecordSetEntry {
                key,
                values: values.into_iter().collect(),
            })
            .collect()
    }
}
