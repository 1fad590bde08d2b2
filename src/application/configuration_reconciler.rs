// Configuration reconciler - merges store rows, registry and the edited draft
use crate::application::egg_type_service::EggTypeService;
use crate::application::error::{IncubatorError, Result};
use crate::application::profile_store::ProfileStore;
use crate::application::sync_dispatcher::SyncDispatcher;
use crate::domain::configuration::{ConfigurationDraft, DraftEdit, DraftMargins, DraftViolation};
use crate::domain::egg_type::{EggTypeProfile, default_rows};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Where the catalog currently in the registry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogSource {
    /// Rows read from the profile store
    Remote,
    /// Store was empty and has been seeded with the default rows
    Seeded,
    /// Store unavailable, built-in defaults in use
    Defaults,
}

/// Draft as presented to callers, with its validity re-evaluated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub egg_type: String,
    pub draft: ConfigurationDraft,
    pub valid: bool,
    pub violations: Vec<DraftViolation>,
}

struct DraftState {
    profile_id: String,
    /// Selection generation the draft was derived under
    generation: u64,
    draft: ConfigurationDraft,
}

impl DraftState {
    fn derive(profile: &EggTypeProfile, generation: u64, margins: DraftMargins) -> Self {
        Self {
            profile_id: profile.id.clone(),
            generation,
            draft: ConfigurationDraft::from_profile(profile, margins),
        }
    }
}

/// Outcome of a combined save, each half completing independently
#[derive(Debug)]
pub struct SaveOutcome {
    pub store: Result<()>,
    pub controller: Result<EggTypeProfile>,
}

pub struct ConfigurationReconciler {
    egg_types: Arc<EggTypeService>,
    store: Arc<dyn ProfileStore>,
    dispatcher: Arc<SyncDispatcher>,
    margins: DraftMargins,
    table: String,
    draft: Mutex<Option<DraftState>>,
    /// Source of the last catalog load; None until the first load
    catalog: tokio::sync::Mutex<Option<CatalogSource>>,
}

impl ConfigurationReconciler {
    pub fn new(
        egg_types: Arc<EggTypeService>,
        store: Arc<dyn ProfileStore>,
        dispatcher: Arc<SyncDispatcher>,
        margins: DraftMargins,
        table: String,
    ) -> Self {
        Self {
            egg_types,
            store,
            dispatcher,
            margins,
            table,
            draft: Mutex::new(None),
            catalog: tokio::sync::Mutex::new(None),
        }
    }

    pub fn draft_from_profile(&self, profile: &EggTypeProfile) -> ConfigurationDraft {
        ConfigurationDraft::from_profile(profile, self.margins)
    }

    pub fn validate(draft: &ConfigurationDraft) -> Result<()> {
        let violations = draft.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(IncubatorError::Validation(violations))
        }
    }

    /// Loads the catalog once. A failed load leaves the built-in defaults in
    /// place so edits can proceed.
    pub async fn ensure_catalog(&self) -> CatalogSource {
        let mut catalog = self.catalog.lock().await;
        if let Some(source) = *catalog {
            return source;
        }

        let source = match self.load_catalog().await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Falling back to built-in egg types: {}", e);
                CatalogSource::Defaults
            }
        };
        *catalog = Some(source);
        source
    }

    /// Re-reads the store on demand; errors are returned, not swallowed. A
    /// failed refresh keeps the previously recorded source.
    pub async fn refresh_catalog(&self) -> Result<CatalogSource> {
        let mut catalog = self.catalog.lock().await;
        let source = self.load_catalog().await?;
        *catalog = Some(source);
        self.draft.lock().take();
        Ok(source)
    }

    async fn load_catalog(&self) -> Result<CatalogSource> {
        let rows = self.store.select_all().await?;
        if !rows.is_empty() {
            tracing::info!("Loaded {} egg types from {}", rows.len(), self.table);
            self.egg_types.apply_rows(&rows);
            return Ok(CatalogSource::Remote);
        }

        tracing::info!("{} is empty, populating default egg types", self.table);
        if let Err(e) = self.store.insert_batch(&default_rows()).await {
            if e.is_permission() {
                tracing::error!("Row-level security rejected seeding {}: {:?}", self.table, e);
            }
            return Err(e.into());
        }

        let rows = self.store.select_all().await?;
        self.egg_types.apply_rows(&rows);
        Ok(CatalogSource::Seeded)
    }

    /// The live draft, discarded on every selection change since it was
    /// derived
    pub async fn current_draft(&self) -> DraftView {
        self.ensure_catalog().await;
        self.with_draft(|_| {})
    }

    /// Applies field edits in order and re-validates
    pub async fn edit_draft(&self, edit: &DraftEdit) -> DraftView {
        self.ensure_catalog().await;
        self.with_draft(|draft| draft.apply(edit))
    }

    fn with_draft(&self, f: impl FnOnce(&mut ConfigurationDraft)) -> DraftView {
        let (selected, generation) = self.egg_types.selection();
        let mut guard = self.draft.lock();

        let state = guard
            .get_or_insert_with(|| DraftState::derive(&selected, generation, self.margins));
        if state.generation != generation {
            tracing::debug!("Selection changed to {}, discarding draft", selected.id);
            *state = DraftState::derive(&selected, generation, self.margins);
        }
        f(&mut state.draft);

        let violations = state.draft.violations();
        DraftView {
            egg_type: state.profile_id.clone(),
            draft: state.draft.clone(),
            valid: violations.is_empty(),
            violations,
        }
    }

    /// Writes the draft to the store row for `profile_id`, then mirrors the
    /// saved targets into the registry
    pub async fn commit_to_store(&self, draft: &ConfigurationDraft, profile_id: &str) -> Result<()> {
        Self::validate(draft)?;

        let row = draft.to_row(profile_id);
        if let Err(e) = self.store.update_by_key(&row).await {
            tracing::error!("Failed to save configuration for {}: {}", profile_id, e);
            return Err(e.into());
        }

        tracing::info!("Saved configuration for {} to {}", profile_id, self.table);
        self.egg_types.update_by_id(profile_id, &draft.to_profile_update());
        Ok(())
    }

    /// Applies the draft to the selected profile and pushes it to the
    /// controller. The in-memory update stands even if the push fails.
    pub async fn commit_to_controller(&self, draft: &ConfigurationDraft) -> Result<EggTypeProfile> {
        Self::validate(draft)?;

        let profile = self.egg_types.update_selected(&draft.to_profile_update());
        self.dispatcher
            .push_egg_type(Some(&profile))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to send configuration for {}: {:#}", profile.id, e);
                IncubatorError::ControllerUnreachable(format!("{:#}", e))
            })?;

        tracing::info!("Sent configuration for {} to controller", profile.id);
        Ok(profile)
    }

    pub async fn save_current(&self) -> Result<()> {
        let view = self.current_draft().await;
        self.commit_to_store(&view.draft, &view.egg_type).await
    }

    pub async fn send_current(&self) -> Result<EggTypeProfile> {
        let view = self.current_draft().await;
        self.commit_to_controller(&view.draft).await
    }

    /// Store write and controller push run concurrently; neither waits on
    /// the other's outcome
    pub async fn save_and_send_current(&self) -> SaveOutcome {
        let view = self.current_draft().await;
        if let Err(e) = Self::validate(&view.draft) {
            return SaveOutcome {
                store: Err(e.clone()),
                controller: Err(e),
            };
        }

        let (store, controller) = tokio::join!(
            self.commit_to_store(&view.draft, &view.egg_type),
            self.commit_to_controller(&view.draft)
        );
        SaveOutcome { store, controller }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::StoreError;
    use crate::application::sync_dispatcher::SyncPolicies;
    use crate::application::testing::{InMemoryProfileStore, RecordingController};
    use crate::domain::egg_type::{EggTypeRegistry, ProfileRow};
    use std::sync::atomic::Ordering;

    struct Fixture {
        egg_types: Arc<EggTypeService>,
        store: Arc<InMemoryProfileStore>,
        controller: Arc<RecordingController>,
        reconciler: ConfigurationReconciler,
    }

    fn fixture(store: InMemoryProfileStore, controller: RecordingController) -> Fixture {
        let egg_types = Arc::new(EggTypeService::new(EggTypeRegistry::default()));
        let store = Arc::new(store);
        let controller = Arc::new(controller);
        let dispatcher = Arc::new(SyncDispatcher::new(controller.clone(), SyncPolicies::default()));
        let reconciler = ConfigurationReconciler::new(
            egg_types.clone(),
            store.clone(),
            dispatcher,
            DraftMargins::default(),
            "egg_info".to_string(),
        );
        Fixture {
            egg_types,
            store,
            controller,
            reconciler,
        }
    }

    fn inverted_temperature() -> DraftEdit {
        DraftEdit {
            min_temp: Some(36.0),
            max_temp: Some(35.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_seeded_before_edits() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());

        let view = f.reconciler.edit_draft(&DraftEdit::default()).await;

        assert_eq!(f.store.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(f.store.rows.lock().len(), 4);
        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Seeded);
        assert_eq!(view.egg_type, "chicken");
        assert!(view.valid);
    }

    #[tokio::test]
    async fn test_unreachable_store_keeps_defaults() {
        let f = fixture(
            InMemoryProfileStore::failing(StoreError::Access("timeout".to_string())),
            RecordingController::default(),
        );

        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Defaults);
        assert_eq!(f.egg_types.list_profiles().len(), 4);
        assert!(f.reconciler.current_draft().await.valid);
    }

    #[tokio::test]
    async fn test_seed_permission_error_is_distinct() {
        let store = InMemoryProfileStore::default();
        *store.insert_failure.lock() = Some(StoreError::Permission {
            table: "egg_info".to_string(),
            detail: "42501".to_string(),
        });
        let f = fixture(store, RecordingController::default());

        let err = f.reconciler.refresh_catalog().await.unwrap_err();

        assert_eq!(err.kind(), "store_permission");
        assert!(err.to_string().contains("row-level security"));
    }

    #[tokio::test]
    async fn test_remote_rows_override_defaults() {
        let store = InMemoryProfileStore::with_rows(vec![ProfileRow {
            egg_type: "quail".to_string(),
            min_temp: Some(37.0),
            max_temp: Some(38.8),
            min_hum: Some(60.0),
            max_hum: Some(80.0),
            target_hum: Some(68.0),
            target_temp: Some(37.9),
            rotation_interval: Some(45.0),
        }]);
        let f = fixture(store, RecordingController::default());
        f.egg_types.select("quail");

        let view = f.reconciler.current_draft().await;

        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Remote);
        assert_eq!(view.draft.max_temp, 37.9);
        assert_eq!(view.draft.max_humidity, 68.0);
        assert_eq!(view.draft.rotation_interval_minutes, 45);
    }

    #[tokio::test]
    async fn test_selecting_duck_derives_duck_draft() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.egg_types.select("duck");

        let draft = f.reconciler.draft_from_profile(&f.egg_types.selected());

        assert_eq!(draft.max_temp, 37.2);
        assert_eq!(draft.max_humidity, 70.0);
        assert_eq!(draft.rotation_interval_minutes, 180);
    }

    #[tokio::test]
    async fn test_draft_discarded_when_selection_changes() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());

        let edited = f
            .reconciler
            .edit_draft(&DraftEdit {
                heater_power_percent: Some(40),
                ..Default::default()
            })
            .await;
        assert_eq!(edited.draft.heater_power_percent, 40);
        assert_eq!(f.reconciler.current_draft().await.draft.heater_power_percent, 40);

        f.egg_types.select("turkey");
        let view = f.reconciler.current_draft().await;

        assert_eq!(view.egg_type, "turkey");
        assert_eq!(view.draft.heater_power_percent, 75);
    }

    #[tokio::test]
    async fn test_edits_apply_in_order() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());

        f.reconciler
            .edit_draft(&DraftEdit { max_temp: Some(38.0), ..Default::default() })
            .await;
        let view = f
            .reconciler
            .edit_draft(&DraftEdit { max_temp: Some(38.2), ..Default::default() })
            .await;

        assert_eq!(view.draft.max_temp, 38.2);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_network() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.reconciler.ensure_catalog().await;

        let view = f.reconciler.edit_draft(&inverted_temperature()).await;
        assert!(!view.valid);
        assert_eq!(view.violations, vec![DraftViolation::TemperatureRangeInverted]);

        let store_err = f.reconciler.save_current().await.unwrap_err();
        let send_err = f.reconciler.send_current().await.unwrap_err();
        let outcome = f.reconciler.save_and_send_current().await;

        for err in [store_err, send_err] {
            assert!(matches!(err, IncubatorError::Validation(_)));
        }
        assert!(outcome.store.is_err() && outcome.controller.is_err());
        assert!(f.store.updates.lock().is_empty());
        assert!(f.controller.calls().is_empty());
        assert_eq!(f.egg_types.selected().target_temperature, 37.5);
    }

    #[tokio::test]
    async fn test_commit_to_store_writes_targets_and_registry() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.reconciler.ensure_catalog().await;
        f.reconciler
            .edit_draft(&DraftEdit {
                max_temp: Some(37.8),
                max_humidity: Some(62.0),
                rotation_interval_minutes: Some(90),
                ..Default::default()
            })
            .await;

        f.reconciler.save_current().await.unwrap();

        let update = f.store.updates.lock()[0].clone();
        assert_eq!(update.egg_type, "chicken");
        assert_eq!(update.target_temp, Some(37.8));
        assert_eq!(update.max_temp, Some(37.8));
        assert_eq!(update.target_hum, Some(62.0));
        assert_eq!(update.rotation_interval, Some(90.0));
        assert_eq!(f.egg_types.selected().target_temperature, 37.8);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_validation_error() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.reconciler.ensure_catalog().await;
        *f.store.failure.lock() = Some(StoreError::Access("503".to_string()));

        let err = f.reconciler.save_current().await.unwrap_err();

        assert_eq!(err.kind(), "store_access");
        assert_eq!(f.egg_types.selected().target_temperature, 37.5);
    }

    #[tokio::test]
    async fn test_commit_to_controller_updates_registry_even_when_unreachable() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::unreachable());
        f.egg_types.select("quail");
        f.reconciler
            .edit_draft(&DraftEdit { max_temp: Some(38.1), ..Default::default() })
            .await;

        let err = f.reconciler.send_current().await.unwrap_err();

        assert_eq!(err.kind(), "controller_unreachable");
        assert_eq!(f.egg_types.selected().target_temperature, 38.1);
    }

    #[tokio::test]
    async fn test_save_and_send_complete_independently() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.reconciler.ensure_catalog().await;
        *f.store.failure.lock() = Some(StoreError::Access("503".to_string()));

        let outcome = f.reconciler.save_and_send_current().await;

        assert!(outcome.store.is_err());
        assert_eq!(outcome.controller.unwrap().id, "chicken");
        assert_eq!(f.controller.egg_type_pushes(), vec!["chicken".to_string()]);
    }

    #[tokio::test]
    async fn test_draft_discarded_after_round_trip_selection() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        f.reconciler
            .edit_draft(&DraftEdit {
                heater_power_percent: Some(40),
                ..Default::default()
            })
            .await;

        f.egg_types.select("duck");
        f.egg_types.select("chicken");
        let view = f.reconciler.current_draft().await;

        assert_eq!(view.egg_type, "chicken");
        assert_eq!(view.draft.heater_power_percent, 75);
    }

    #[tokio::test]
    async fn test_refresh_after_failed_startup_reports_remote() {
        let f = fixture(
            InMemoryProfileStore::failing(StoreError::Access("timeout".to_string())),
            RecordingController::default(),
        );
        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Defaults);

        *f.store.failure.lock() = None;
        f.store.rows.lock().extend(default_rows());

        assert_eq!(f.reconciler.refresh_catalog().await.unwrap(), CatalogSource::Remote);
        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Remote);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_source() {
        let f = fixture(InMemoryProfileStore::default(), RecordingController::default());
        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Seeded);

        *f.store.failure.lock() = Some(StoreError::Access("503".to_string()));

        assert!(f.reconciler.refresh_catalog().await.is_err());
        assert_eq!(f.reconciler.ensure_catalog().await, CatalogSource::Seeded);
    }
}
