// SPDX-License-Identifier: MIT

//! Shared test harness: an in-process mock gateway speaking the
//! `{action, payload}` / `{success, data, message}` envelope protocol over a
//! real socket, with per-action failure injection and call recording.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use service_roster::gateway::GatewayClient;
use service_roster::models::{Comment, Gender, ServiceInstance, ServiceSchedule, ServiceType, Volunteer};
use service_roster::sync::SyncController;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory stand-in for the spreadsheet backend.
#[derive(Default)]
pub struct MockBackend {
    pub volunteers: Vec<Volunteer>,
    pub schedules: Vec<ServiceSchedule>,
    pub instances: Vec<ServiceInstance>,
    pub leader_password: String,
    pub calls: Vec<String>,
    pub fail_once: HashSet<String>,
    pub next_id: u64,
}

impl MockBackend {
    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// Handle to a running mock gateway.
pub struct MockGateway {
    pub backend: Arc<Mutex<MockBackend>>,
    pub url: String,
}

impl MockGateway {
    /// Make the next call with this action fail with `success:false`.
    pub fn fail_next(&self, action: &str) {
        self.backend
            .lock()
            .unwrap()
            .fail_once
            .insert(action.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.backend.lock().unwrap().calls.clone()
    }
}

/// Spin up the mock gateway on an ephemeral port.
pub async fn spawn_gateway(backend: MockBackend) -> MockGateway {
    let shared = Arc::new(Mutex::new(backend));
    let app = Router::new()
        .route("/", post(handle))
        .with_state(shared.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock gateway");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockGateway {
        backend: shared,
        url: format!("http://{addr}/"),
    }
}

/// A controller pointed at the mock gateway, with a short poll interval.
pub fn test_controller(gateway: &MockGateway) -> SyncController {
    SyncController::new(GatewayClient::new(gateway.url.clone()), Duration::from_millis(50))
}

async fn handle(
    State(backend): State<Arc<Mutex<MockBackend>>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let action = body["action"].as_str().unwrap_or_default().to_string();
    let payload = body["payload"].clone();

    let mut b = backend.lock().unwrap();
    b.calls.push(action.clone());

    if b.fail_once.remove(&action) {
        return Json(json!({ "success": false, "message": format!("injected failure [{action}]") }));
    }

    let data = match action.as_str() {
        "fetchData" => json!({
            "volunteers": b.volunteers,
            "serviceSchedule": b.schedules,
            "serviceInstances": b.instances,
            "leaderPassword": b.leader_password,
        }),
        "updateLeaderPassword" => {
            b.leader_password = payload["newPassword"].as_str().unwrap_or_default().to_string();
            Value::Null
        }
        "addVolunteer" => {
            let id = b.assign_id("srv_vol_");
            let volunteer = Volunteer {
                id,
                name: payload["name"].as_str().unwrap_or_default().to_string(),
                gender: serde_json::from_value(payload["gender"].clone()).unwrap(),
                can_do_public_witnessing: payload["canDoPublicWitnessing"]
                    .as_bool()
                    .unwrap_or_default(),
            };
            b.volunteers.push(volunteer.clone());
            serde_json::to_value(volunteer).unwrap()
        }
        "removeVolunteer" => {
            let id = payload["id"].as_str().unwrap_or_default().to_string();
            b.volunteers.retain(|v| v.id != id);
            Value::Null
        }
        "saveSchedule" => {
            let mut schedule: ServiceSchedule = serde_json::from_value(payload).unwrap();
            match &schedule.id {
                Some(id) => {
                    let id = id.clone();
                    if let Some(slot) = b.schedules.iter_mut().find(|s| s.id.as_deref() == Some(&id))
                    {
                        *slot = schedule.clone();
                    }
                }
                None => {
                    schedule.id = Some(b.assign_id("srv_sched_"));
                    b.schedules.push(schedule.clone());
                }
            }
            serde_json::to_value(schedule).unwrap()
        }
        "removeSchedule" => {
            let id = payload["id"].as_str().unwrap_or_default().to_string();
            b.schedules.retain(|s| s.id.as_deref() != Some(&id));
            Value::Null
        }
        "saveServiceInstance" => {
            let mut instance: ServiceInstance = serde_json::from_value(payload).unwrap();
            if instance.id.starts_with("temp_") {
                instance.id = b.assign_id("srv_si_");
                b.instances.push(instance.clone());
            } else if let Some(slot) = b.instances.iter_mut().find(|i| i.id == instance.id) {
                *slot = instance.clone();
            } else {
                b.instances.push(instance.clone());
            }
            serde_json::to_value(instance).unwrap()
        }
        "deleteServiceInstance" => {
            let id = payload["id"].as_str().unwrap_or_default().to_string();
            b.instances.retain(|i| i.id != id);
            Value::Null
        }
        "toggleApplication" => {
            let service_id = payload["serviceId"].as_str().unwrap_or_default().to_string();
            let volunteer: Volunteer = serde_json::from_value(payload["volunteer"].clone()).unwrap();
            let applying = payload["isApplying"].as_bool().unwrap_or_default();
            let Some(instance) = b.instances.iter_mut().find(|i| i.id == service_id) else {
                return Json(json!({ "success": false, "message": "no such service" }));
            };
            instance.applicants.retain(|v| v.id != volunteer.id);
            if applying {
                instance.applicants.push(volunteer);
            }
            serde_json::to_value(&instance.applicants).unwrap()
        }
        "addComment" => {
            let service_id = payload["serviceId"].as_str().unwrap_or_default().to_string();
            let mut comment: Comment = serde_json::from_value(payload["comment"].clone()).unwrap();
            comment.id = b.assign_id("srv_c_");
            let Some(instance) = b.instances.iter_mut().find(|i| i.id == service_id) else {
                return Json(json!({ "success": false, "message": "no such service" }));
            };
            instance.comments.push(comment);
            serde_json::to_value(&instance.comments).unwrap()
        }
        "updateComment" => {
            let service_id = payload["serviceId"].as_str().unwrap_or_default().to_string();
            let comment_id = payload["commentId"].as_str().unwrap_or_default().to_string();
            let new_text = payload["newText"].as_str().unwrap_or_default().to_string();
            let Some(instance) = b.instances.iter_mut().find(|i| i.id == service_id) else {
                return Json(json!({ "success": false, "message": "no such service" }));
            };
            if let Some(c) = instance.comments.iter_mut().find(|c| c.id == comment_id) {
                c.text = new_text;
            }
            serde_json::to_value(&instance.comments).unwrap()
        }
        "deleteComment" => {
            let service_id = payload["serviceId"].as_str().unwrap_or_default().to_string();
            let comment_id = payload["commentId"].as_str().unwrap_or_default().to_string();
            let Some(instance) = b.instances.iter_mut().find(|i| i.id == service_id) else {
                return Json(json!({ "success": false, "message": "no such service" }));
            };
            instance.comments.retain(|c| c.id != comment_id);
            serde_json::to_value(&instance.comments).unwrap()
        }
        other => {
            return Json(json!({ "success": false, "message": format!("unknown action {other}") }));
        }
    };

    Json(json!({ "success": true, "data": data }))
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn volunteer(id: &str, name: &str) -> Volunteer {
    Volunteer::new(id, name, Gender::Brother, true)
}

#[allow(dead_code)]
pub fn schedule(id: Option<&str>, day_of_week: u8) -> ServiceSchedule {
    ServiceSchedule {
        id: id.map(|s| s.to_string()),
        day_of_week,
        time: "09:30".to_string(),
        leader: "Dan".to_string(),
        phone_number: "010-1234".to_string(),
        service_type: ServiceType::DoorToDoor,
        location: "Hall".to_string(),
        deadline_day_offset: 1,
        deadline_time: "18:00".to_string(),
    }
}

#[allow(dead_code)]
pub fn instance(id: &str, date: &str) -> ServiceInstance {
    ServiceInstance::from_schedule(&schedule(Some("s1"), 2), id, date, 2)
}

/// A date far enough out that the application window is still open.
#[allow(dead_code)]
pub fn upcoming_date() -> String {
    (chrono::Local::now().date_naive() + chrono::Duration::days(7))
        .format("%Y-%m-%d")
        .to_string()
}

/// A date whose application deadline has long passed.
#[allow(dead_code)]
pub fn past_date() -> String {
    (chrono::Local::now().date_naive() - chrono::Duration::days(7))
        .format("%Y-%m-%d")
        .to_string()
}
