use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cancellation::CancellationToken;
use crate::tile_coordinate::TileCoordinate;

/// Record of the tile requests currently in flight.
///
/// Every coordinate maps to the token of the latest accepted request for it. The registry is
/// used to route cancellation to the right task and to tell the latest task from a superseded
/// one when fetches complete.
#[derive(Debug, Default)]
pub struct TileRequestRegistry {
    entries: Mutex<HashMap<TileCoordinate, CancellationToken, ahash::RandomState>>,
}

impl TileRequestRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the token for the coordinate, returning the replaced one.
    pub fn put(
        &self,
        coordinate: TileCoordinate,
        token: CancellationToken,
    ) -> Option<CancellationToken> {
        self.entries.lock().insert(coordinate, token)
    }

    /// Token registered for the coordinate.
    pub fn get(&self, coordinate: TileCoordinate) -> Option<CancellationToken> {
        self.entries.lock().get(&coordinate).cloned()
    }

    /// Removes the entry for the coordinate if it holds exactly the given token.
    ///
    /// Returns `true` if the entry was removed.
    pub fn remove_if(&self, coordinate: TileCoordinate, token: &CancellationToken) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&coordinate) {
            Some(current) if current.same_as(token) => {
                entries.remove(&coordinate);
                true
            }
            _ => false,
        }
    }

    /// Sets the token for the coordinate and runs `submit` while no other thread can touch
    /// the registry.
    ///
    /// If `submit` fails, the previous entry (or its absence) is restored. On success returns
    /// the replaced token.
    pub fn register<E>(
        &self,
        coordinate: TileCoordinate,
        token: CancellationToken,
        submit: impl FnOnce() -> Result<(), E>,
    ) -> Result<Option<CancellationToken>, E> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(coordinate, token);
        match submit() {
            Ok(()) => Ok(previous),
            Err(err) => {
                match previous {
                    Some(previous) => entries.insert(coordinate, previous),
                    None => entries.remove(&coordinate),
                };
                Err(err)
            }
        }
    }

    /// Cancels all registered requests. Returns the number of tokens that were not cancelled
    /// before.
    pub fn cancel_all(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|token| token.cancel())
            .count()
    }

    /// Returns true if a request for the coordinate is registered and not cancelled.
    pub fn is_pending(&self, coordinate: TileCoordinate) -> bool {
        self.entries
            .lock()
            .get(&coordinate)
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Coordinates of registered requests that were not cancelled.
    pub fn pending(&self) -> Vec<TileCoordinate> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, token)| !token.is_cancelled())
            .map(|(coordinate, _)| *coordinate)
            .collect()
    }

    /// Coordinates of all registered requests, in no particular order.
    pub fn coordinates(&self) -> Vec<TileCoordinate> {
        self.entries.lock().keys().copied().collect()
    }

    /// Number of registered requests.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: TileCoordinate = TileCoordinate::new(5, 1, 1);

    #[test]
    fn put_replaces_entry() {
        let registry = TileRequestRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        assert!(registry.put(TILE, first.clone()).is_none());
        let replaced = registry.put(TILE, second.clone()).expect("entry exists");

        assert!(replaced.same_as(&first));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(TILE).expect("entry exists").same_as(&second));
    }

    #[test]
    fn remove_if_ignores_other_tokens() {
        let registry = TileRequestRegistry::new();
        let stale = CancellationToken::new();
        let current = CancellationToken::new();
        registry.put(TILE, stale.clone());
        registry.put(TILE, current.clone());

        assert!(!registry.remove_if(TILE, &stale));
        assert!(registry.get(TILE).is_some());
        assert!(registry.remove_if(TILE, &current));
        assert!(registry.is_empty());
        assert!(!registry.remove_if(TILE, &current));
    }

    #[test]
    fn register_restores_previous_entry_on_failure() {
        let registry = TileRequestRegistry::new();
        let previous = CancellationToken::new();
        registry.put(TILE, previous.clone());

        let result = registry.register(TILE, CancellationToken::new(), || Err("full"));
        assert_eq!(result.err(), Some("full"));
        assert!(registry.get(TILE).expect("entry exists").same_as(&previous));

        let other = TileCoordinate::new(1, 0, 0);
        let result = registry.register(other, CancellationToken::new(), || Err("full"));
        assert!(result.is_err());
        assert!(registry.get(other).is_none());
    }

    #[test]
    fn cancel_all_keeps_entries() {
        let registry = TileRequestRegistry::new();
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let pending = CancellationToken::new();
        registry.put(TILE, cancelled);
        registry.put(TileCoordinate::new(1, 1, 0), pending.clone());

        assert_eq!(registry.cancel_all(), 1);
        assert!(pending.is_cancelled());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn cancelled_entries_are_not_pending() {
        let registry = TileRequestRegistry::new();
        let cancelled = TileCoordinate::new(1, 1, 0);
        let token = CancellationToken::new();
        registry.put(TILE, CancellationToken::new());
        registry.put(cancelled, token.clone());
        token.cancel();

        assert!(registry.is_pending(TILE));
        assert!(!registry.is_pending(cancelled));
        assert!(!registry.is_pending(TileCoordinate::new(0, 0, 0)));
        assert_eq!(registry.pending(), vec![TILE]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn register_returns_replaced_token() {
        let registry = TileRequestRegistry::new();
        let previous = CancellationToken::new();
        registry.put(TILE, previous.clone());

        let replaced = registry
            .register(TILE, CancellationToken::new(), || Ok::<_, ()>(()))
            .expect("submission succeeds")
            .expect("entry existed");
        assert!(replaced.same_as(&previous));
    }
}
