// SPDX-License-Identifier: MIT

//! Remote gateway client for the spreadsheet-backed API.
//!
//! The backend exposes a single POST endpoint speaking an RPC-style
//! envelope: requests are `{action, payload?}`, responses are
//! `{success, data?, message?}`. Non-2xx status or `success:false` both map
//! onto [`AppError::Gateway`] with the backend's message when present.
//!
//! All calls are single-attempt with no timeout or cancellation; retry is
//! the caller's (i.e. the user's) job.

use crate::error::AppError;
use crate::models::{Comment, ServiceInstance, ServiceSchedule, Volunteer};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

/// Uniform response envelope from the gateway.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Full canonical state returned by `fetchData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    pub volunteers: Vec<Volunteer>,
    pub service_schedule: Vec<ServiceSchedule>,
    pub service_instances: Vec<ServiceInstance>,
    pub leader_password: String,
}

/// Client for the remote gateway.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GatewayClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Perform one RPC call and decode the envelope.
    ///
    /// Returns the `data` field, which is `null` for actions that return
    /// nothing.
    async fn call(
        &self,
        action: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, AppError> {
        let body = json!({ "action": action, "payload": payload });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("request failed [{action}]: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(action, status = %status, "Gateway returned error status");
            return Err(AppError::Gateway(format!(
                "server responded {status} [{action}]"
            )));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("malformed envelope [{action}]: {e}")))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "internal API error".to_string());
            tracing::warn!(action, message = %message, "Gateway reported failure");
            return Err(AppError::Gateway(message));
        }

        Ok(envelope.data.unwrap_or(serde_json::Value::Null))
    }

    /// Call and decode `data` into a typed value.
    async fn call_typed<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<T, AppError> {
        let data = self.call(action, payload).await?;
        serde_json::from_value(data)
            .map_err(|e| AppError::Gateway(format!("unexpected payload [{action}]: {e}")))
    }

    /// Fetch the full canonical state.
    pub async fn fetch_data(&self) -> Result<RemoteSnapshot, AppError> {
        self.call_typed("fetchData", None).await
    }

    pub async fn update_leader_password(&self, new_password: &str) -> Result<(), AppError> {
        self.call("updateLeaderPassword", Some(json!({ "newPassword": new_password })))
            .await?;
        Ok(())
    }

    /// Create a volunteer; the gateway assigns the permanent id.
    pub async fn add_volunteer(
        &self,
        name: &str,
        gender: crate::models::Gender,
        can_do_public_witnessing: bool,
    ) -> Result<Volunteer, AppError> {
        self.call_typed(
            "addVolunteer",
            Some(json!({
                "name": name,
                "gender": gender,
                "canDoPublicWitnessing": can_do_public_witnessing,
            })),
        )
        .await
    }

    pub async fn remove_volunteer(&self, volunteer_id: &str) -> Result<(), AppError> {
        self.call("removeVolunteer", Some(json!({ "id": volunteer_id })))
            .await?;
        Ok(())
    }

    /// Create or update a schedule template; returns the canonical record.
    pub async fn save_schedule(
        &self,
        schedule: &ServiceSchedule,
    ) -> Result<ServiceSchedule, AppError> {
        let payload = serde_json::to_value(schedule).map_err(|e| anyhow::anyhow!(e))?;
        self.call_typed("saveSchedule", Some(payload)).await
    }

    pub async fn remove_schedule(&self, schedule_id: &str) -> Result<(), AppError> {
        self.call("removeSchedule", Some(json!({ "id": schedule_id })))
            .await?;
        Ok(())
    }

    /// Create or update an instance; returns the canonical record.
    pub async fn save_service_instance(
        &self,
        instance: &ServiceInstance,
    ) -> Result<ServiceInstance, AppError> {
        let payload = serde_json::to_value(instance).map_err(|e| anyhow::anyhow!(e))?;
        self.call_typed("saveServiceInstance", Some(payload)).await
    }

    pub async fn delete_service_instance(&self, instance_id: &str) -> Result<(), AppError> {
        self.call("deleteServiceInstance", Some(json!({ "id": instance_id })))
            .await?;
        Ok(())
    }

    /// Atomic apply/cancel on the backend; returns the authoritative
    /// post-mutation applicants list.
    pub async fn toggle_application(
        &self,
        service_id: &str,
        volunteer: &Volunteer,
        is_applying: bool,
    ) -> Result<Vec<Volunteer>, AppError> {
        self.call_typed(
            "toggleApplication",
            Some(json!({
                "serviceId": service_id,
                "volunteer": volunteer,
                "isApplying": is_applying,
            })),
        )
        .await
    }

    /// Returns the authoritative post-mutation comments list.
    pub async fn add_comment(
        &self,
        service_id: &str,
        comment: &Comment,
    ) -> Result<Vec<Comment>, AppError> {
        self.call_typed(
            "addComment",
            Some(json!({ "serviceId": service_id, "comment": comment })),
        )
        .await
    }

    pub async fn update_comment(
        &self,
        service_id: &str,
        comment_id: &str,
        new_text: &str,
    ) -> Result<Vec<Comment>, AppError> {
        self.call_typed(
            "updateComment",
            Some(json!({
                "serviceId": service_id,
                "commentId": comment_id,
                "newText": new_text,
            })),
        )
        .await
    }

    pub async fn delete_comment(
        &self,
        service_id: &str,
        comment_id: &str,
    ) -> Result<Vec<Comment>, AppError> {
        self.call_typed(
            "deleteComment",
            Some(json!({ "serviceId": service_id, "commentId": comment_id })),
        )
        .await
    }
}
