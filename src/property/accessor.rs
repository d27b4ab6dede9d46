use crate::validation::ThingValue;
use parking_lot::RwLock;

/// Getter/setter pair bound to a property's backing storage
///
/// Accessors are chosen when the Thing is built; no lookup happens per call.
/// The setter only ever receives values that already passed validation.
pub trait PropertyAccessor: Send + Sync {
    fn get(&self) -> ThingValue;
    fn set(&self, value: ThingValue);
}

/// Default storage: the value lives in the property itself
pub struct ValueCell {
    value: RwLock<ThingValue>,
}

impl ValueCell {
    pub fn new(initial: ThingValue) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }
}

impl PropertyAccessor for ValueCell {
    fn get(&self) -> ThingValue {
        self.value.read().clone()
    }

    fn set(&self, value: ThingValue) {
        *self.value.write() = value;
    }
}

/// Accessor built from closures over external storage
pub struct FnAccessor<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnAccessor<G, S>
where
    G: Fn() -> ThingValue + Send + Sync,
    S: Fn(ThingValue) + Send + Sync,
{
    pub fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<G, S> PropertyAccessor for FnAccessor<G, S>
where
    G: Fn() -> ThingValue + Send + Sync,
    S: Fn(ThingValue) + Send + Sync,
{
    fn get(&self) -> ThingValue {
        (self.getter)()
    }

    fn set(&self, value: ThingValue) {
        (self.setter)(value)
    }
}
