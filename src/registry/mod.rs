// Thing registry: resolves a route identifier to a Thing


use crate::thing::{Thing, ThingError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Collection of served Things
///
/// `Single` serves one Thing at the root of every route; `Multiple` serves an
/// ordered collection addressed by name or index.
pub enum ThingRegistry {
    Single {
        thing: Arc<Thing>,
        /// Only the Thing's own name resolves
        strict: bool,
    },
    Multiple(RwLock<Vec<Arc<Thing>>>),
}

impl ThingRegistry {
    /// Lenient single mode: any identifier resolves to the Thing
    pub fn single(thing: Arc<Thing>) -> Self {
        ThingRegistry::Single {
            thing,
            strict: false,
        }
    }

    pub fn single_strict(thing: Arc<Thing>) -> Self {
        ThingRegistry::Single {
            thing,
            strict: true,
        }
    }

    /// Multi mode; Thing names must be unique
    pub fn multiple(things: Vec<Arc<Thing>>) -> Result<Self, ThingError> {
        for (i, thing) in things.iter().enumerate() {
            if things[..i].iter().any(|other| other.name() == thing.name()) {
                return Err(ThingError::DuplicateName(thing.name().to_string()));
            }
        }
        Ok(ThingRegistry::Multiple(RwLock::new(things)))
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ThingRegistry::Single { .. })
    }

    /// Find the Thing an identifier refers to
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Thing>, ThingError> {
        match self {
            ThingRegistry::Single { thing, strict } => {
                if *strict && identifier != thing.name() {
                    return Err(ThingError::ThingNotFound(identifier.to_string()));
                }
                Ok(Arc::clone(thing))
            }
            ThingRegistry::Multiple(things) => {
                let things = things.read();
                things
                    .iter()
                    .find(|thing| thing.name() == identifier)
                    .or_else(|| {
                        identifier
                            .parse::<usize>()
                            .ok()
                            .and_then(|index| things.get(index))
                    })
                    .cloned()
                    .ok_or_else(|| ThingError::ThingNotFound(identifier.to_string()))
            }
        }
    }

    /// All served Things, in registration order
    pub fn things(&self) -> Vec<Arc<Thing>> {
        match self {
            ThingRegistry::Single { thing, .. } => vec![Arc::clone(thing)],
            ThingRegistry::Multiple(things) => things.read().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ThingRegistry::Single { .. } => 1,
            ThingRegistry::Multiple(things) => things.read().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a Thing in multi mode
    pub fn add(&self, thing: Arc<Thing>) -> Result<(), ThingError> {
        match self {
            ThingRegistry::Single { .. } => Err(ThingError::DuplicateName(thing.name().to_string())),
            ThingRegistry::Multiple(things) => {
                let mut things = things.write();
                if things.iter().any(|other| other.name() == thing.name()) {
                    return Err(ThingError::DuplicateName(thing.name().to_string()));
                }
                info!(thing = %thing.name(), "Thing added");
                things.push(thing);
                Ok(())
            }
        }
    }

    /// Remove a Thing in multi mode and tear it down
    pub fn remove(&self, name: &str) -> Result<Arc<Thing>, ThingError> {
        let ThingRegistry::Multiple(things) = self else {
            return Err(ThingError::ThingNotFound(name.to_string()));
        };

        let removed = {
            let mut things = things.write();
            let position = things
                .iter()
                .position(|thing| thing.name() == name)
                .ok_or_else(|| ThingError::ThingNotFound(name.to_string()))?;
            things.remove(position)
        };

        removed.close();
        info!(thing = %name, "Thing removed");

        Ok(removed)
    }

    /// Tear down every Thing
    pub fn close(&self) {
        for thing in self.things() {
            thing.close();
        }
    }
}
