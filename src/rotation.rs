//! Round-robin provider rotation with quota decay and refill
//!
//! Each provider carries a quota of misses it may still absorb. The cursor
//! advances on every selection step and skips providers whose quota is spent.
//! When every quota reaches zero at once, all providers that are still
//! healthy are refilled to their reset value. A provider classified fatal is
//! zeroed and never refilled, so it is never selected again in this process.

use crate::config::ProviderEntry;
use crate::provider::{ProviderId, ProviderKind};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised by provider selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    #[error("No providers configured")]
    NoProviders,

    #[error("All {0} providers have been disabled for this run")]
    NoHealthyProviders(usize),
}

/// Mutable bookkeeping for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSlot {
    pub kind: ProviderKind,
    /// Remaining misses before the provider is skipped
    pub quota: u32,
    /// Value the quota is refilled to
    pub reset_quota: u32,
    /// Cleared permanently once a fatal response is observed
    pub healthy: bool,
}

impl ProviderSlot {
    pub fn new(kind: ProviderKind, quota: u32, reset_quota: u32) -> Self {
        Self {
            kind,
            quota,
            reset_quota,
            healthy: true,
        }
    }

    pub fn from_entry(entry: &ProviderEntry) -> Self {
        Self::new(entry.kind, entry.initial_quota(), entry.reset_quota())
    }
}

/// Provider health at a point in time, for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub kind: ProviderKind,
    pub quota: u32,
    pub healthy: bool,
}

/// Quota, health and cursor state of the whole rotation
#[derive(Debug, Clone)]
pub struct RotationState {
    slots: Vec<ProviderSlot>,
    /// Last visited provider; `None` before the first step
    cursor: Option<usize>,
}

impl RotationState {
    pub fn new(slots: Vec<ProviderSlot>) -> Self {
        Self {
            slots,
            cursor: None,
        }
    }

    pub fn from_entries(entries: &[ProviderEntry]) -> Self {
        Self::new(entries.iter().map(ProviderSlot::from_entry).collect())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, id: ProviderId) -> Option<&ProviderSlot> {
        self.slots.get(id)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn total_quota(&self) -> u64 {
        self.slots.iter().map(|s| s.quota as u64).sum()
    }

    pub fn healthy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.healthy).count()
    }

    /// Picks the provider for the next page fetch
    ///
    /// Advances the cursor one position per step, refilling healthy
    /// providers whenever the quota sum is zero, until it lands on a provider
    /// with quota left.
    pub fn select(&mut self) -> Result<ProviderId, RotationError> {
        let n = self.slots.len();
        if n == 0 {
            return Err(RotationError::NoProviders);
        }
        if self.healthy_count() == 0 {
            return Err(RotationError::NoHealthyProviders(n));
        }

        // A healthy provider always has reset_quota >= 1, so after a refill
        // some slot is positive and one full lap finds it.
        for _ in 0..=n {
            let next = match self.cursor {
                Some(i) => (i + 1) % n,
                None => 0,
            };
            self.cursor = Some(next);

            if self.total_quota() == 0 {
                self.refill();
            }

            if self.slots[next].quota > 0 {
                return Ok(next);
            }
        }

        Err(RotationError::NoHealthyProviders(n))
    }

    /// Charges one miss to a provider
    pub fn record_miss(&mut self, id: ProviderId) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.quota = slot.quota.saturating_sub(1);
        }
    }

    /// Disables a provider for the rest of the run
    ///
    /// Returns true if the provider was healthy before the call.
    pub fn mark_fatal(&mut self, id: ProviderId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                let was_healthy = slot.healthy;
                slot.healthy = false;
                slot.quota = 0;
                was_healthy
            }
            None => false,
        }
    }

    fn refill(&mut self) {
        tracing::debug!("All provider quotas spent, refilling healthy providers");
        for slot in self.slots.iter_mut().filter(|s| s.healthy) {
            slot.quota = slot.reset_quota;
        }
    }

    pub fn snapshot(&self) -> Vec<ProviderSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(id, slot)| ProviderSnapshot {
                id,
                kind: slot.kind,
                quota: slot.quota,
                healthy: slot.healthy,
            })
            .collect()
    }
}

/// Shared handle to the rotation state
///
/// Cloned into every fetch worker; each operation holds the lock only for
/// the duration of the bookkeeping, never across a provider call.
#[derive(Debug, Clone)]
pub struct Rotation {
    state: Arc<Mutex<RotationState>>,
}

impl Rotation {
    pub fn new(state: RotationState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn from_entries(entries: &[ProviderEntry]) -> Self {
        Self::new(RotationState::from_entries(entries))
    }

    fn lock(&self) -> MutexGuard<'_, RotationState> {
        // The state stays consistent even if a holder panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn select(&self) -> Result<ProviderId, RotationError> {
        self.lock().select()
    }

    pub fn record_miss(&self, id: ProviderId) {
        self.lock().record_miss(id);
    }

    pub fn mark_fatal(&self, id: ProviderId) -> bool {
        self.lock().mark_fatal(id)
    }

    pub fn is_healthy(&self, id: ProviderId) -> bool {
        self.lock().slot(id).map(|s| s.healthy).unwrap_or(false)
    }

    pub fn snapshot(&self) -> Vec<ProviderSnapshot> {
        self.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(quotas: &[(u32, u32)]) -> RotationState {
        RotationState::new(
            quotas
                .iter()
                .map(|&(quota, reset)| ProviderSlot::new(ProviderKind::Direct, quota, reset))
                .collect(),
        )
    }

    #[test]
    fn test_round_robin_order() {
        let mut rotation = state(&[(10, 15), (10, 15), (5, 3), (5, 4)]);

        let picks: Vec<_> = (0..8).map(|_| rotation.select().unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_skips_zero_quota_providers() {
        let mut rotation = state(&[(1, 1), (0, 1), (1, 1)]);

        assert_eq!(rotation.select().unwrap(), 0);
        assert_eq!(rotation.select().unwrap(), 2);
        assert_eq!(rotation.select().unwrap(), 0);
    }

    #[test]
    fn test_cursor_advances_even_when_skipping() {
        let mut rotation = state(&[(1, 1), (0, 1), (0, 1), (1, 1)]);

        assert_eq!(rotation.select().unwrap(), 0);
        assert_eq!(rotation.select().unwrap(), 3);
        assert_eq!(rotation.cursor(), Some(3));
        assert_eq!(rotation.select().unwrap(), 0);
    }

    #[test]
    fn test_refill_only_when_sum_is_zero() {
        let mut rotation = state(&[(1, 15), (0, 3)]);

        // Sum is 1: no refill, provider 1 stays at zero
        assert_eq!(rotation.select().unwrap(), 0);
        assert_eq!(rotation.slot(1).unwrap().quota, 0);

        rotation.record_miss(0);
        assert_eq!(rotation.total_quota(), 0);

        // Sum is 0: refill to reset values, then continue from the cursor
        assert_eq!(rotation.select().unwrap(), 1);
        assert_eq!(rotation.slot(0).unwrap().quota, 15);
        assert_eq!(rotation.slot(1).unwrap().quota, 3);
    }

    #[test]
    fn test_refill_skips_unhealthy_providers() {
        let mut rotation = state(&[(0, 15), (0, 3), (0, 4)]);
        rotation.mark_fatal(1);

        let picked = rotation.select().unwrap();
        assert_eq!(picked, 0);
        assert_eq!(rotation.slot(0).unwrap().quota, 15);
        assert_eq!(rotation.slot(1).unwrap().quota, 0);
        assert_eq!(rotation.slot(2).unwrap().quota, 4);
    }

    #[test]
    fn test_fatal_provider_never_selected_again() {
        let mut rotation = state(&[(2, 2), (2, 2), (2, 2)]);
        assert!(rotation.mark_fatal(1));
        assert!(!rotation.mark_fatal(1));

        for _ in 0..50 {
            let id = rotation.select().unwrap();
            assert_ne!(id, 1);
            rotation.record_miss(id);
        }
    }

    #[test]
    fn test_all_unhealthy_is_an_error() {
        let mut rotation = state(&[(5, 5), (5, 5)]);
        rotation.mark_fatal(0);
        rotation.mark_fatal(1);

        assert_eq!(
            rotation.select(),
            Err(RotationError::NoHealthyProviders(2))
        );
    }

    #[test]
    fn test_empty_rotation_is_an_error() {
        let mut rotation = state(&[]);
        assert_eq!(rotation.select(), Err(RotationError::NoProviders));
    }

    #[test]
    fn test_record_miss_saturates() {
        let mut rotation = state(&[(1, 1)]);
        rotation.record_miss(0);
        rotation.record_miss(0);
        assert_eq!(rotation.slot(0).unwrap().quota, 0);
    }

    #[test]
    fn test_mark_fatal_zeroes_quota() {
        let mut rotation = state(&[(9, 9), (1, 1)]);
        rotation.mark_fatal(0);
        assert_eq!(rotation.slot(0).unwrap().quota, 0);
        assert!(!rotation.slot(0).unwrap().healthy);
    }

    #[test]
    fn test_shared_handle_across_threads() {
        let rotation = Rotation::new(state(&[(100, 100), (100, 100)]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rotation = rotation.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let id = rotation.select().unwrap();
                        rotation.record_miss(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let remaining: u32 = rotation.snapshot().iter().map(|s| s.quota).sum();
        assert_eq!(remaining, 100);
    }
}
