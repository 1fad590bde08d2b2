// Sync dispatcher - mirrors mode and egg type changes to the controller
use crate::application::controller_gateway::{ControllerGateway, EggTypePayload};
use crate::application::dispatch_policy::DispatchPolicy;
use crate::domain::control_mode::ControlMode;
use crate::domain::egg_type::EggTypeProfile;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncPolicies {
    pub mode: DispatchPolicy,
    pub egg_type: DispatchPolicy,
}

/// Best-effort notifications: the controller applies last-write-wins, so
/// re-delivery and out-of-order arrival are harmless.
pub struct SyncDispatcher {
    controller: Arc<dyn ControllerGateway>,
    policies: SyncPolicies,
}

impl SyncDispatcher {
    pub fn new(controller: Arc<dyn ControllerGateway>, policies: SyncPolicies) -> Self {
        Self {
            controller,
            policies,
        }
    }

    pub async fn push_mode(&self, mode: ControlMode) -> anyhow::Result<()> {
        let controller = &self.controller;
        self.policies
            .mode
            .run("control mode push", move || controller.push_mode(mode))
            .await
    }

    /// Sends the profile, or the fallback id when none is resolvable
    pub async fn push_egg_type(&self, profile: Option<&EggTypeProfile>) -> anyhow::Result<()> {
        let payload = EggTypePayload::resolve(profile);
        let payload = &payload;
        let controller = &self.controller;
        self.policies
            .egg_type
            .run("egg type push", move || controller.push_egg_type(payload))
            .await
    }

    /// Pushes the current values once, then again on every change until
    /// either channel closes
    pub fn spawn(
        self: Arc<Self>,
        mode_rx: watch::Receiver<ControlMode>,
        egg_type_rx: watch::Receiver<EggTypeProfile>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(mode_rx, egg_type_rx).await })
    }

    async fn run(
        &self,
        mut mode_rx: watch::Receiver<ControlMode>,
        mut egg_type_rx: watch::Receiver<EggTypeProfile>,
    ) {
        let mode = *mode_rx.borrow_and_update();
        self.notify_mode(mode).await;
        let profile = egg_type_rx.borrow_and_update().clone();
        self.notify_egg_type(&profile).await;

        loop {
            tokio::select! {
                changed = mode_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let mode = *mode_rx.borrow_and_update();
                    self.notify_mode(mode).await;
                }
                changed = egg_type_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let profile = egg_type_rx.borrow_and_update().clone();
                    self.notify_egg_type(&profile).await;
                }
            }
        }

        tracing::debug!("Controller sync stopped");
    }

    async fn notify_mode(&self, mode: ControlMode) {
        match self.push_mode(mode).await {
            Ok(()) => tracing::debug!("Pushed control mode {} to controller", mode),
            Err(e) => tracing::warn!("Failed to push control mode {}: {:#}", mode, e),
        }
    }

    async fn notify_egg_type(&self, profile: &EggTypeProfile) {
        match self.push_egg_type(Some(profile)).await {
            Ok(()) => tracing::debug!("Pushed egg type {} to controller", profile.id),
            Err(e) => tracing::warn!("Failed to push egg type {}: {:#}", profile.id, e),
        }
    }
}
