// Egg type service - shared registry with change notification
use crate::domain::egg_type::{EggTypeProfile, EggTypeRegistry, EggTypeUpdate, ProfileRow};
use parking_lot::RwLock;
use tokio::sync::watch;

/// Process-wide holder of the egg type registry.
///
/// Every mutation is visible to all readers as soon as it returns. Changes to
/// the selected profile are published on a watch channel so the controller
/// sync can mirror them.
pub struct EggTypeService {
    registry: RwLock<EggTypeRegistry>,
    selected_tx: watch::Sender<EggTypeProfile>,
}

impl EggTypeService {
    pub fn new(registry: EggTypeRegistry) -> Self {
        let (selected_tx, _) = watch::channel(registry.selected().clone());
        Self {
            registry: RwLock::new(registry),
            selected_tx,
        }
    }

    pub fn list_profiles(&self) -> Vec<EggTypeProfile> {
        self.registry.read().profiles().to_vec()
    }

    pub fn selected_id(&self) -> String {
        self.registry.read().selected_id().to_string()
    }

    pub fn selected(&self) -> EggTypeProfile {
        self.registry.read().selected().clone()
    }

    /// Selected profile together with the selection generation, read under
    /// one lock
    pub fn selection(&self) -> (EggTypeProfile, u64) {
        let registry = self.registry.read();
        (registry.selected().clone(), registry.selection_generation())
    }

    pub fn get(&self, id: &str) -> Option<EggTypeProfile> {
        self.registry.read().get(id).cloned()
    }

    pub fn select(&self, id: &str) -> EggTypeProfile {
        tracing::info!("Selecting egg type {}", id);
        self.mutate(|registry| registry.select(id));
        self.selected()
    }

    pub fn update_selected(&self, update: &EggTypeUpdate) -> EggTypeProfile {
        self.mutate(|registry| registry.update_selected(update));
        self.selected()
    }

    pub fn update_by_id(&self, id: &str, update: &EggTypeUpdate) -> bool {
        let updated = self.mutate(|registry| registry.update_by_id(id, update));
        if !updated {
            tracing::debug!("Ignoring update for unknown egg type {}", id);
        }
        updated
    }

    pub fn apply_rows(&self, rows: &[ProfileRow]) {
        self.mutate(|registry| registry.apply_rows(rows));
    }

    pub fn subscribe(&self) -> watch::Receiver<EggTypeProfile> {
        self.selected_tx.subscribe()
    }

    /// Publishes while the write lock is held so notifications follow the
    /// order of registry writes
    fn mutate<R>(&self, f: impl FnOnce(&mut EggTypeRegistry) -> R) -> R {
        let mut registry = self.registry.write();
        let result = f(&mut registry);

        let selected = registry.selected();
        self.selected_tx.send_if_modified(|current| {
            if *current == *selected {
                false
            } else {
                *current = selected.clone();
                true
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_publishes_new_profile() {
        let service = EggTypeService::new(EggTypeRegistry::default());
        let mut rx = service.subscribe();
        assert_eq!(rx.borrow_and_update().id, "chicken");

        service.select("duck");

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().id, "duck");
    }

    #[test]
    fn test_unchanged_selection_publishes_nothing() {
        let service = EggTypeService::new(EggTypeRegistry::default());
        let mut rx = service.subscribe();
        let _ = rx.borrow_and_update();

        service.select("chicken");
        service.update_by_id("quail", &EggTypeUpdate {
            target_humidity: Some(66.0),
            ..Default::default()
        });

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_update_selected_is_visible_and_published() {
        let service = EggTypeService::new(EggTypeRegistry::default());
        let mut rx = service.subscribe();
        let _ = rx.borrow_and_update();

        let updated = service.update_selected(&EggTypeUpdate {
            target_temperature: Some(37.9),
            ..Default::default()
        });

        assert_eq!(updated.target_temperature, 37.9);
        assert_eq!(service.selected().target_temperature, 37.9);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_stale_selection_resolves_to_first_profile() {
        let service = EggTypeService::new(EggTypeRegistry::default());
        let selected = service.select("emu");

        assert_eq!(service.selected_id(), "emu");
        assert_eq!(selected.id, "chicken");
        assert!(service.list_profiles().contains(&selected));
    }

    #[test]
    fn test_selection_generation_counts_changes() {
        let service = EggTypeService::new(EggTypeRegistry::default());
        let (_, start) = service.selection();

        service.select("duck");
        service.select("chicken");
        service.select("chicken");
        let (selected, generation) = service.selection();

        assert_eq!(selected.id, "chicken");
        assert_eq!(generation, start + 2);
    }

    #[test]
    fn test_concurrent_selects_publish_the_final_selection() {
        let service = std::sync::Arc::new(EggTypeService::new(EggTypeRegistry::default()));
        let rx = service.subscribe();

        let handles: Vec<_> = ["quail", "duck", "turkey", "chicken"]
            .into_iter()
            .map(|id| {
                let service = service.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        service.select(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(rx.borrow().id, service.selected().id);
    }
}
