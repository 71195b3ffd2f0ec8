use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;

use carhub_cars::{Car, CarId};

use super::query::{Direction, Order, Pageable};
use super::r#trait::{CarRepository, RepositoryError};

/// In-memory car store for tests/dev.
///
/// Identifiers come from a process-local sequence starting at 1.
#[derive(Debug)]
pub struct InMemoryCarRepository {
    inner: RwLock<BTreeMap<CarId, Car>>,
    next_id: AtomicI64,
}

impl InMemoryCarRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Database("in-memory store lock poisoned".to_string())
    }
}

impl Default for InMemoryCarRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CarRepository for InMemoryCarRepository {
    async fn save(&self, mut car: Car) -> Result<Car, RepositoryError> {
        let id = match car.id() {
            Some(id) => {
                // Keep the sequence ahead of explicitly supplied identifiers.
                self.next_id.fetch_max(id.get().saturating_add(1), AtomicOrdering::SeqCst);
                id
            }
            None => {
                let id = CarId::new(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
                car.set_id(Some(id));
                id
            }
        };

        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        map.insert(id, car.clone());
        Ok(car)
    }

    async fn find_by_id(&self, id: CarId) -> Result<Option<Car>, RepositoryError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: CarId) -> Result<bool, RepositoryError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.contains_key(&id))
    }

    async fn delete_by_id(&self, id: CarId) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        map.remove(&id);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.len() as u64)
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Vec<Car>, RepositoryError> {
        let mut cars: Vec<Car> = {
            let map = self.inner.read().map_err(|_| Self::poisoned())?;
            map.values().cloned().collect()
        };

        // BTreeMap iteration already yields id order; a stable sort keeps it as the tiebreaker.
        cars.sort_by(|a, b| compare(a, b, &pageable.sort));

        let offset = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
        Ok(cars
            .into_iter()
            .skip(offset)
            .take(pageable.size as usize)
            .collect())
    }
}

fn compare(a: &Car, b: &Car, sort: &[Order]) -> Ordering {
    for order in sort {
        let ord = match order.property.as_str() {
            "id" => a.id().cmp(&b.id()),
            "name" => a.name().cmp(&b.name()),
            "age" => a.age().cmp(&b.age()),
            "isBroken" => a.is_broken().cmp(&b.is_broken()),
            _ => Ordering::Equal,
        };
        let ord = match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
