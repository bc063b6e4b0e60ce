// SPDX-License-Identifier: MIT

//! Synchronization controller: canonical client state and its reconciliation
//! against the remote gateway.
//!
//! The controller owns the canonical copies of volunteers, schedules,
//! instances, and the leader password. Every mutation follows one pattern:
//! snapshot the collection being mutated, apply the change optimistically,
//! fire the remote call, then reconcile. Reconciliation is one of:
//!
//! - replace the temporary record with the server-assigned one (creates),
//! - replace the local guess with the server's authoritative echo
//!   (applicants and comments, where concurrent edits from other clients
//!   must be merged in),
//! - restore the snapshot (any failure).
//!
//! So after every operation settles, local state either reflects a confirmed
//! server result or is bit-identical to the state before the optimistic
//! change. Calls are single-attempt; the only cross-client consistency
//! mechanism is the background poll, which runs while a session is active
//! and unconditionally overwrites the canonical collections.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gateway::GatewayClient;
use crate::models::{
    schedule, Comment, Gender, ServiceForm, ServiceInstance, ServiceSchedule, Volunteer,
    MAX_INSTANCES_PER_DAY,
};
use crate::session::Session;
use chrono::{Datelike, NaiveDate, Utc};
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Canonical client-side copy of the remote store.
#[derive(Debug, Clone, Default)]
pub struct CanonicalState {
    pub volunteers: Vec<Volunteer>,
    pub schedules: Vec<ServiceSchedule>,
    pub instances: Vec<ServiceInstance>,
    pub leader_password: String,
    pub last_sync: Option<chrono::DateTime<Utc>>,
}

/// Shared handle to the canonical state and the gateway.
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct SyncController {
    gateway: Arc<GatewayClient>,
    state: Arc<RwLock<CanonicalState>>,
    session: Arc<RwLock<Option<Session>>>,
    poll_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    poll_interval: Duration,
    syncing: Arc<AtomicBool>,
    temp_seq: Arc<AtomicU64>,
}

impl SyncController {
    pub fn new(gateway: GatewayClient, poll_interval: Duration) -> Self {
        Self {
            gateway: Arc::new(gateway),
            state: Arc::new(RwLock::new(CanonicalState::default())),
            session: Arc::new(RwLock::new(None)),
            poll_task: Arc::new(Mutex::new(None)),
            poll_interval,
            syncing: Arc::new(AtomicBool::new(false)),
            temp_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GatewayClient::new(config.gateway_url.clone()),
            Duration::from_secs(config.poll_interval_secs),
        )
    }

    fn next_temp_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.temp_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// A full clone of the canonical state.
    pub async fn snapshot(&self) -> CanonicalState {
        self.state.read().await.clone()
    }

    /// True while a reload is in flight (the "syncing" indicator).
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Relaxed)
    }

    // ─── Reload & polling ────────────────────────────────────────────────────

    /// Fetch the full remote state and replace the canonical collections.
    ///
    /// `dayOfWeek` is normalized (7 → 0) on schedules and instances. On
    /// failure, a foreground reload surfaces the error (blocking error
    /// state with manual retry); a background reload keeps the previous
    /// state and only logs.
    pub async fn reload(&self, background: bool) -> Result<()> {
        self.syncing.store(true, Ordering::Relaxed);
        let result = self.gateway.fetch_data().await;
        self.syncing.store(false, Ordering::Relaxed);

        match result {
            Ok(mut snap) => {
                for s in &mut snap.service_schedule {
                    s.day_of_week = schedule::normalize_day_of_week(s.day_of_week);
                }
                for i in &mut snap.service_instances {
                    i.day_of_week = schedule::normalize_day_of_week(i.day_of_week);
                }

                let mut state = self.state.write().await;
                state.volunteers = snap.volunteers;
                state.schedules = snap.service_schedule;
                state.instances = snap.service_instances;
                state.leader_password = snap.leader_password;
                state.last_sync = Some(Utc::now());
                tracing::debug!(background, "Canonical state reloaded");
                Ok(())
            }
            Err(e) if background => {
                tracing::warn!(error = %e, "Background sync failed, keeping previous state");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Data reload failed");
                Err(e)
            }
        }
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Log in as a roster volunteer, looked up by name.
    pub async fn login_volunteer(&self, name: &str) -> Result<Session> {
        let user = {
            let state = self.state.read().await;
            state
                .volunteers
                .iter()
                .find(|v| v.name == name)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("no volunteer named {name:?}")))?
        };
        let session = Session::volunteer(user);
        self.begin_session(session.clone()).await;
        Ok(session)
    }

    /// Log in as the leader by password compare against the fetched
    /// canonical password.
    pub async fn login_leader(&self, password: &str) -> Result<Session> {
        {
            let state = self.state.read().await;
            if state.leader_password != password {
                return Err(AppError::Unauthorized("wrong leader password".to_string()));
            }
        }
        let session = Session::leader();
        self.begin_session(session.clone()).await;
        Ok(session)
    }

    async fn begin_session(&self, session: Session) {
        *self.session.write().await = Some(session);
        self.start_polling();
    }

    /// End the session and stop the background poll.
    pub async fn logout(&self) {
        *self.session.write().await = None;
        if let Some(handle) = self.poll_task.lock().expect("poll task lock").take() {
            handle.abort();
        }
    }

    /// Spawn the background poll loop. This is the sole mechanism for
    /// picking up edits made by other clients; failures are swallowed by
    /// `reload(background=true)`.
    fn start_polling(&self) {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(controller.poll_interval);
            interval.tick().await; // the first tick fires immediately
            loop {
                interval.tick().await;
                if controller.session().await.is_none() {
                    break;
                }
                let _ = controller.reload(true).await;
            }
        });
        let mut slot = self.poll_task.lock().expect("poll task lock");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    // ─── Volunteers ──────────────────────────────────────────────────────────

    pub async fn add_volunteer(
        &self,
        name: &str,
        gender: Gender,
        can_do_public_witnessing: bool,
    ) -> Result<()> {
        let temp_id = self.next_temp_id("temp_vol_");
        {
            let mut state = self.state.write().await;
            state.volunteers.push(Volunteer::new(
                temp_id.clone(),
                name,
                gender,
                can_do_public_witnessing,
            ));
        }

        match self
            .gateway
            .add_volunteer(name, gender, can_do_public_witnessing)
            .await
        {
            Ok(saved) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.volunteers.iter_mut().find(|v| v.id == temp_id) {
                    *slot = saved;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, name, "Adding volunteer failed");
                let mut state = self.state.write().await;
                state.volunteers.retain(|v| v.id != temp_id);
                Err(e)
            }
        }
    }

    /// Remove a volunteer. Refused for the active session's own identity.
    pub async fn remove_volunteer(&self, volunteer_id: &str) -> Result<()> {
        if let Some(session) = self.session().await {
            if session.user.id == volunteer_id {
                return Err(AppError::Refused(
                    "you cannot remove yourself".to_string(),
                ));
            }
        }

        let original = {
            let mut state = self.state.write().await;
            let original = state.volunteers.clone();
            state.volunteers.retain(|v| v.id != volunteer_id);
            original
        };

        if let Err(e) = self.gateway.remove_volunteer(volunteer_id).await {
            tracing::warn!(error = %e, volunteer_id, "Removing volunteer failed");
            self.state.write().await.volunteers = original;
            return Err(e);
        }
        Ok(())
    }

    // ─── Schedule templates ──────────────────────────────────────────────────

    /// Create or update a schedule template, branching on the presence of
    /// `id`.
    pub async fn save_schedule(&self, schedule: ServiceSchedule) -> Result<()> {
        schedule.validate()?;
        let is_update = schedule.id.is_some();
        let temp_id = self.next_temp_id("temp_sched_");

        let original = {
            let mut state = self.state.write().await;
            let original = state.schedules.clone();
            if is_update {
                if let Some(slot) = state.schedules.iter_mut().find(|s| s.id == schedule.id) {
                    *slot = schedule.clone();
                }
            } else {
                let mut temp = schedule.clone();
                temp.id = Some(temp_id.clone());
                state.schedules.push(temp);
            }
            original
        };

        match self.gateway.save_schedule(&schedule).await {
            Ok(saved) => {
                let mut state = self.state.write().await;
                let target = if is_update {
                    saved.id.clone()
                } else {
                    Some(temp_id)
                };
                if let Some(slot) = state.schedules.iter_mut().find(|s| s.id == target) {
                    *slot = saved;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Saving schedule failed");
                self.state.write().await.schedules = original;
                Err(e)
            }
        }
    }

    pub async fn remove_schedule(&self, schedule_id: &str) -> Result<()> {
        let original = {
            let mut state = self.state.write().await;
            let original = state.schedules.clone();
            state
                .schedules
                .retain(|s| s.id.as_deref() != Some(schedule_id));
            original
        };

        if let Err(e) = self.gateway.remove_schedule(schedule_id).await {
            tracing::warn!(error = %e, schedule_id, "Removing schedule failed");
            self.state.write().await.schedules = original;
            return Err(e);
        }
        Ok(())
    }

    // ─── Service instances ───────────────────────────────────────────────────

    /// Instances on a given date, sorted by start time.
    pub async fn instances_on(&self, date: &str) -> Vec<ServiceInstance> {
        let state = self.state.read().await;
        let mut list: Vec<ServiceInstance> = state
            .instances
            .iter()
            .filter(|i| i.date == date)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.time.cmp(&b.time));
        list
    }

    /// Create path: append the (temp-id) instance, then replace it with the
    /// server-assigned record.
    pub async fn add_service_instance(&self, instance: ServiceInstance) -> Result<()> {
        let temp_id = instance.id.clone();
        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            state.instances.push(instance.clone());
            original
        };

        match self.gateway.save_service_instance(&instance).await {
            Ok(saved) => {
                let mut state = self.state.write().await;
                if let Some(slot) = state.instances.iter_mut().find(|i| i.id == temp_id) {
                    *slot = saved;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Creating service instance failed");
                self.state.write().await.instances = original;
                Err(e)
            }
        }
    }

    /// Update path: replace in place. The server's returned copy is
    /// discarded since the client already holds the shape it sent.
    pub async fn update_service_instance(&self, instance: ServiceInstance) -> Result<()> {
        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            if let Some(slot) = state.instances.iter_mut().find(|i| i.id == instance.id) {
                *slot = instance.clone();
            }
            original
        };

        if let Err(e) = self.gateway.save_service_instance(&instance).await {
            tracing::warn!(error = %e, instance_id = %instance.id, "Updating service instance failed");
            self.state.write().await.instances = original;
            return Err(e);
        }
        Ok(())
    }

    pub async fn delete_service_instance(&self, instance_id: &str) -> Result<()> {
        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            state.instances.retain(|i| i.id != instance_id);
            original
        };

        if let Err(e) = self.gateway.delete_service_instance(instance_id).await {
            tracing::warn!(error = %e, instance_id, "Deleting service instance failed");
            self.state.write().await.instances = original;
            return Err(e);
        }
        Ok(())
    }

    /// Materialize instances for a date from schedule templates.
    ///
    /// Refused as a whole when the per-day cap would be exceeded. All saves
    /// run concurrently and settle as one batch: a single failure discards
    /// every temporary instance from the batch.
    pub async fn create_from_schedule(
        &self,
        date: NaiveDate,
        schedules: &[ServiceSchedule],
    ) -> Result<()> {
        let date_string = date.format("%Y-%m-%d").to_string();
        let day_of_week = date.weekday().num_days_from_sunday() as u8;

        let temp_instances = {
            let mut state = self.state.write().await;
            let existing = state
                .instances
                .iter()
                .filter(|i| i.date == date_string)
                .count();
            if existing >= MAX_INSTANCES_PER_DAY
                || existing + schedules.len() > MAX_INSTANCES_PER_DAY
            {
                return Err(AppError::Refused(format!(
                    "at most {MAX_INSTANCES_PER_DAY} services may exist per day"
                )));
            }

            let temp_instances: Vec<ServiceInstance> = schedules
                .iter()
                .map(|s| {
                    ServiceInstance::from_schedule(
                        s,
                        self.next_temp_id("temp_si_"),
                        date_string.clone(),
                        day_of_week,
                    )
                })
                .collect();
            state.instances.extend(temp_instances.iter().cloned());
            temp_instances
        };

        let saves = temp_instances
            .iter()
            .map(|i| self.gateway.save_service_instance(i));
        match try_join_all(saves).await {
            Ok(saved) => {
                let mut state = self.state.write().await;
                for (temp, saved) in temp_instances.iter().zip(saved) {
                    if let Some(slot) = state.instances.iter_mut().find(|i| i.id == temp.id) {
                        *slot = saved;
                    }
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, count = temp_instances.len(), "Batch create failed, discarding batch");
                let mut state = self.state.write().await;
                state
                    .instances
                    .retain(|i| !temp_instances.iter().any(|t| t.id == i.id));
                Err(e)
            }
        }
    }

    /// Create a single ad hoc instance from the service form, subject to the
    /// same per-day cap.
    pub async fn add_service_from_form(&self, date: NaiveDate, form: ServiceForm) -> Result<()> {
        form.validate()?;
        let date_string = date.format("%Y-%m-%d").to_string();
        {
            let state = self.state.read().await;
            let existing = state
                .instances
                .iter()
                .filter(|i| i.date == date_string)
                .count();
            if existing >= MAX_INSTANCES_PER_DAY {
                return Err(AppError::Refused(format!(
                    "at most {MAX_INSTANCES_PER_DAY} services may exist per day"
                )));
            }
        }

        let instance = ServiceInstance {
            id: self.next_temp_id("temp_si_"),
            date: date_string,
            day_of_week: date.weekday().num_days_from_sunday() as u8,
            time: form.time,
            leader: form.leader,
            phone_number: form.phone_number,
            service_type: form.service_type,
            location: form.location,
            deadline_day_offset: form.deadline_day_offset,
            deadline_time: form.deadline_time,
            applicants: Vec::new(),
            comments: Vec::new(),
            assignments: BTreeMap::new(),
            pairs: Vec::new(),
        };
        self.add_service_instance(instance).await
    }

    // ─── Applications ────────────────────────────────────────────────────────

    /// Apply or cancel for an instance.
    ///
    /// Refused once the instance's application deadline has passed. The
    /// optimistic guess only adds or removes the acting volunteer; the
    /// gateway's echo is the authoritative applicants list (it merges in
    /// concurrent applicants from other clients) and replaces the guess.
    pub async fn toggle_application(
        &self,
        service_id: &str,
        volunteer: &Volunteer,
        applying: bool,
    ) -> Result<()> {
        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) else {
                return Err(AppError::NotFound(format!("service {service_id}")));
            };
            if !instance.is_application_open(chrono::Local::now().naive_local()) {
                return Err(AppError::Refused(
                    "the application deadline has passed".to_string(),
                ));
            }
            if applying {
                instance.applicants.push(volunteer.clone());
            } else {
                instance.applicants.retain(|v| v.id != volunteer.id);
            }
            original
        };

        match self
            .gateway
            .toggle_application(service_id, volunteer, applying)
            .await
        {
            Ok(applicants) => {
                let mut state = self.state.write().await;
                if let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) {
                    instance.applicants = applicants;
                }
                state.last_sync = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, service_id, applying, "Application toggle failed");
                self.state.write().await.instances = original;
                Err(e)
            }
        }
    }

    // ─── Comments ────────────────────────────────────────────────────────────
    //
    // Same echo pattern as applications (comments are a shared append-only
    // log), but failures roll back silently: comment edits are lower stakes
    // than apply/cancel, so the rollback is logged, not surfaced.

    pub async fn add_comment(&self, service_id: &str, text: &str) -> Result<()> {
        let session = self
            .session()
            .await
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

        let comment = Comment {
            id: self.next_temp_id("c_"),
            author_id: session.user.id.clone(),
            author_name: session.user.name.clone(),
            text: text.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) else {
                return Err(AppError::NotFound(format!("service {service_id}")));
            };
            instance.comments.push(comment.clone());
            original
        };

        match self.gateway.add_comment(service_id, &comment).await {
            Ok(comments) => {
                self.apply_comment_echo(service_id, comments).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, service_id, "Adding comment failed, rolling back");
                self.state.write().await.instances = original;
                Ok(())
            }
        }
    }

    pub async fn update_comment(
        &self,
        service_id: &str,
        comment_id: &str,
        new_text: &str,
    ) -> Result<()> {
        self.check_comment_owner(service_id, comment_id).await?;

        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            if let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) {
                if let Some(c) = instance.comments.iter_mut().find(|c| c.id == comment_id) {
                    c.text = new_text.to_string();
                }
            }
            original
        };

        match self
            .gateway
            .update_comment(service_id, comment_id, new_text)
            .await
        {
            Ok(comments) => {
                self.apply_comment_echo(service_id, comments).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, service_id, comment_id, "Updating comment failed, rolling back");
                self.state.write().await.instances = original;
                Ok(())
            }
        }
    }

    pub async fn delete_comment(&self, service_id: &str, comment_id: &str) -> Result<()> {
        self.check_comment_owner(service_id, comment_id).await?;

        let original = {
            let mut state = self.state.write().await;
            let original = state.instances.clone();
            if let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) {
                instance.comments.retain(|c| c.id != comment_id);
            }
            original
        };

        match self.gateway.delete_comment(service_id, comment_id).await {
            Ok(comments) => {
                self.apply_comment_echo(service_id, comments).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, service_id, comment_id, "Deleting comment failed, rolling back");
                self.state.write().await.instances = original;
                Ok(())
            }
        }
    }

    /// Only the authoring user may edit or delete a comment.
    async fn check_comment_owner(&self, service_id: &str, comment_id: &str) -> Result<()> {
        let session = self
            .session()
            .await
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;
        let state = self.state.read().await;
        let comment = state
            .instances
            .iter()
            .find(|i| i.id == service_id)
            .and_then(|i| i.comments.iter().find(|c| c.id == comment_id))
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id}")))?;
        if comment.author_id != session.user.id {
            return Err(AppError::Refused(
                "only the author may change a comment".to_string(),
            ));
        }
        Ok(())
    }

    async fn apply_comment_echo(&self, service_id: &str, comments: Vec<Comment>) {
        let mut state = self.state.write().await;
        if let Some(instance) = state.instances.iter_mut().find(|i| i.id == service_id) {
            instance.comments = comments;
        }
    }

    // ─── Assignment persistence ──────────────────────────────────────────────

    /// Persist a pairing board's groups as the instance's `pairs`.
    pub async fn save_pairs(&self, service_id: &str, pairs: Vec<Vec<Volunteer>>) -> Result<()> {
        let mut instance = self.instance(service_id).await?;
        instance.pairs = pairs;
        self.update_service_instance(instance).await
    }

    /// Persist a spot grid's placements as the instance's `assignments`.
    pub async fn save_assignments(
        &self,
        service_id: &str,
        assignments: BTreeMap<String, Vec<Volunteer>>,
    ) -> Result<()> {
        let mut instance = self.instance(service_id).await?;
        instance.assignments = assignments;
        self.update_service_instance(instance).await
    }

    async fn instance(&self, service_id: &str) -> Result<ServiceInstance> {
        let state = self.state.read().await;
        state
            .instances
            .iter()
            .find(|i| i.id == service_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))
    }

    // ─── Leader password ─────────────────────────────────────────────────────

    /// Change the leader password.
    ///
    /// `current` must match the canonical in-memory password and `new` must
    /// be at least 4 characters; both are checked before any optimistic
    /// change or gateway call. On remote failure the exact previous value is
    /// restored and the error is raised to the caller.
    pub async fn update_leader_password(&self, current: &str, new: &str) -> Result<()> {
        let original = {
            let state = self.state.read().await;
            if state.leader_password != current {
                return Err(AppError::Validation(
                    "current password does not match".to_string(),
                ));
            }
            state.leader_password.clone()
        };
        if new.chars().count() < 4 {
            return Err(AppError::Validation(
                "new password must be at least 4 characters".to_string(),
            ));
        }

        self.state.write().await.leader_password = new.to_string();

        if let Err(e) = self.gateway.update_leader_password(new).await {
            tracing::warn!(error = %e, "Password update failed, restoring previous value");
            self.state.write().await.leader_password = original;
            return Err(e);
        }
        Ok(())
    }
}
