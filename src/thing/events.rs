use crate::notify::{Notifier, ThingEvent};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// One occurrence of a named event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Declared events of a Thing with a bounded history per name
pub struct EventRegistry {
    history: HashMap<String, Mutex<VecDeque<EventRecord>>>,
    capacity: usize,
    notifier: Notifier,
}

impl EventRegistry {
    pub fn new(names: Vec<String>, capacity: usize, notifier: Notifier) -> Self {
        let history = names
            .into_iter()
            .map(|name| (name, Mutex::new(VecDeque::new())))
            .collect();

        Self {
            history,
            capacity,
            notifier,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.history.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.history.keys().map(String::as_str)
    }

    /// Record an occurrence and publish it; None if the event is not declared
    pub fn raise(&self, name: &str, data: Value) -> Option<EventRecord> {
        let slot = self.history.get(name)?;
        let record = EventRecord::new(name, data);

        let mut history = slot.lock();
        if self.capacity > 0 {
            while history.len() >= self.capacity {
                history.pop_front();
            }
            history.push_back(record.clone());
        }
        self.notifier.publish(ThingEvent::EventRaised(record.clone()));

        Some(record)
    }

    /// Retained occurrences of one event, oldest first
    pub fn history(&self, name: &str) -> Option<Vec<EventRecord>> {
        self.history
            .get(name)
            .map(|slot| slot.lock().iter().cloned().collect())
    }

    /// Retained occurrences of every event, ordered by timestamp
    pub fn all(&self) -> Vec<EventRecord> {
        let mut records: Vec<EventRecord> = self
            .history
            .values()
            .flat_map(|slot| slot.lock().iter().cloned().collect::<Vec<_>>())
            .collect();
        records.sort_by_key(|record| record.timestamp);
        records
    }
}
