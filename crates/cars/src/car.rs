use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use carhub_core::{Entity, EntityId};

/// Car identifier (assigned by the store on first save).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(pub EntityId);

impl CarId {
    pub fn new(id: i64) -> Self {
        Self(EntityId::new(id))
    }

    pub fn get(&self) -> i64 {
        self.0.get()
    }
}

impl core::fmt::Display for CarId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for CarId {
    type Err = carhub_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<EntityId>().map(Self)
    }
}

/// A car record.
///
/// Every attribute is optional: the same shape is used for request bodies
/// (where `id` may be absent), stored rows, and partial-update patches.
///
/// Equality is identity-based (see [`Entity::same_identity`]); compare
/// attributes explicitly when field values matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(default)]
    id: Option<CarId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::arbitrary_precision_option::serialize",
        deserialize_with = "deserialize_age"
    )]
    age: Option<Decimal>,
    #[serde(default)]
    is_broken: Option<bool>,
}

impl Car {
    /// A transient car with no attributes set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<CarId> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<CarId>) {
        self.id = id;
    }

    pub fn with_id(mut self, id: CarId) -> Self {
        self.set_id(Some(id));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(Some(name.into()));
        self
    }

    pub fn age(&self) -> Option<Decimal> {
        self.age
    }

    /// Sets the age, stripping trailing fractional zeros (`1.50` becomes `1.5`).
    pub fn set_age(&mut self, age: Option<Decimal>) {
        self.age = age.map(|a| a.normalize());
    }

    pub fn with_age(mut self, age: Decimal) -> Self {
        self.set_age(Some(age));
        self
    }

    pub fn is_broken(&self) -> Option<bool> {
        self.is_broken
    }

    pub fn set_is_broken(&mut self, is_broken: Option<bool>) {
        self.is_broken = is_broken;
    }

    pub fn with_is_broken(mut self, is_broken: bool) -> Self {
        self.set_is_broken(Some(is_broken));
        self
    }

    /// Copy every non-null attribute of `patch` onto `self`.
    ///
    /// The identifier is never touched; callers validate it beforehand.
    pub fn merge_from(&mut self, patch: &Car) {
        if let Some(name) = &patch.name {
            self.set_name(Some(name.clone()));
        }
        if let Some(age) = patch.age {
            self.set_age(Some(age));
        }
        if let Some(is_broken) = patch.is_broken {
            self.set_is_broken(Some(is_broken));
        }
    }
}

impl Entity for Car {
    type Id = CarId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

impl PartialEq for Car {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl core::fmt::Display for Car {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn or_null<T: core::fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "null".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "Car{{id={}, name='{}', age={}, isBroken='{}'}}",
            or_null(&self.id),
            or_null(&self.name),
            or_null(&self.age),
            or_null(&self.is_broken),
        )
    }
}

fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let age = rust_decimal::serde::arbitrary_precision_option::deserialize(deserializer)?;
    Ok(age.map(|a: Decimal| a.normalize()))
}
