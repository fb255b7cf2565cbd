#![allow(dead_code)]

use async_trait::async_trait;
use sea_orm::ActiveValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use rollsync::api::wire::parse_snapshot;
use rollsync::api::{AttendanceApi, Participation, Snapshot};
use rollsync::connectivity::{NetworkProbe, NetworkState};
use rollsync::entities::attendance_event::{self, UploadStatus};
use rollsync::error::{AppError, Result};
use rollsync::repositories::{AttendanceRepository, SessionRepository};
use rollsync::storage::{LocalStorage, StoreHandle, StoreLocation};

pub const IDENTITY: &str = "0801199912345";

pub async fn memory_storage() -> LocalStorage {
    StoreHandle::new(StoreLocation::Memory).open().await.unwrap()
}

pub async fn seed_session(storage: &LocalStorage) {
    SessionRepository::replace(
        storage.connection(),
        IDENTITY,
        "Ana López",
        "Docente Activo",
        "2025-03-01 08:00:00",
        "2025-03-01 08:00:00",
    )
    .await
    .unwrap();
}

pub async fn insert_event(
    storage: &LocalStorage,
    activity_id: i64,
    student_id: &str,
    event_date: &str,
    status: UploadStatus,
) -> attendance_event::Model {
    let event = attendance_event::ActiveModel {
        id: ActiveValue::NotSet,
        client_ref: ActiveValue::Set(Uuid::new_v4()),
        activity_id: ActiveValue::Set(activity_id),
        student_id: ActiveValue::Set(student_id.to_string()),
        event_date: ActiveValue::Set(event_date.to_string()),
        period_label: ActiveValue::Set("Marzo".to_string()),
        signature: ActiveValue::Set("data:image/png;base64,iVBORw0KGgo=".to_string()),
        captured_at: ActiveValue::Set(format!("{event_date} 09:00:00")),
        coordinates: ActiveValue::Set("Sin GPS".to_string()),
        status: ActiveValue::Set(status),
    };
    AttendanceRepository::insert(storage.connection(), event).await.unwrap()
}

/// Insert `count` pending events for one activity, students S001, S002, ...
pub async fn seed_pending(storage: &LocalStorage, activity_id: i64, count: usize) -> Vec<attendance_event::Model> {
    let mut events = Vec::with_capacity(count);
    for n in 1..=count {
        let student_id = format!("S{n:03}");
        events.push(insert_event(storage, activity_id, &student_id, "2025-03-14", UploadStatus::Pending).await);
    }
    events
}

pub fn snapshot_json() -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "docente": {"nombre": "Ana López"},
        "asignaciones": [
            {"municipio": "Gracias", "centro": "CEB Lempira", "grado": "3"},
            {"municipio": "Gracias", "centro": "CEB Lempira", "grado": "4"}
        ],
        "estudiantes": [
            {"id_nnaj": "S001", "nombre_completo": "Luis Pérez", "genero": "M", "grado_actual": "3",
             "centro_educativo": " ceb lempira ", "municipio": "Gracias"},
            {"id_nnaj": "S002", "nombre_completo": "María Gómez", "genero": "F", "grado_actual": "3 ",
             "centro_educativo": "CEB LEMPIRA", "municipio": "Gracias"},
            {"id_nnaj": 3, "nombre_completo": "Carlos Díaz", "genero": null, "grado_actual": "4",
             "centro_educativo": "CEB Lempira"}
        ],
        "periodos": [
            {"id": 1, "nombre": "Febrero", "fecha_inicio": "2025-02-01", "fecha_fin": "2025-02-28",
             "lista_actividades": [
                {"id": 10, "nombre_actividad": "Taller", "tipo_actividad": "Formación", "marco_logico": "R1"}
             ]},
            {"id": "2", "nombre": "Marzo", "fecha_inicio": "2025-03-01", "fecha_fin": "2025-03-31",
             "lista_actividades": [
                {"id": 20, "nombre_actividad": "Feria", "tipo_actividad": "Evento", "marco_logico": null},
                {"id": 21, "nombre_actividad": "Charla"}
             ]}
        ]
    })
}

pub fn snapshot() -> Snapshot {
    parse_snapshot(&snapshot_json().to_string()).unwrap()
}

/// Probe whose answer is set by the test.
pub struct FakeProbe {
    connected: AtomicBool,
    reachable: AtomicBool,
}

impl FakeProbe {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(true),
            reachable: AtomicBool::new(true),
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            reachable: AtomicBool::new(false),
        })
    }

    pub fn set(&self, state: NetworkState) {
        self.connected.store(state.is_connected, Ordering::SeqCst);
        self.reachable.store(state.is_internet_reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkProbe for FakeProbe {
    async fn check(&self) -> NetworkState {
        NetworkState {
            is_connected: self.connected.load(Ordering::SeqCst),
            is_internet_reachable: self.reachable.load(Ordering::SeqCst),
        }
    }
}

/// In-process server double that records every batch it receives.
pub struct FakeApi {
    snapshot_body: String,
    batches: Mutex<Vec<Vec<Participation>>>,
    fail_on_batch: Option<usize>,
    hold: Option<Arc<Notify>>,
    started: Arc<Notify>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            snapshot_body: snapshot_json().to_string(),
            batches: Mutex::new(Vec::new()),
            fail_on_batch: None,
            hold: None,
            started: Arc::new(Notify::new()),
        }
    }

    pub fn with_snapshot_body(mut self, body: impl Into<String>) -> Self {
        self.snapshot_body = body.into();
        self
    }

    /// Reject the n-th batch (1-based) with a server error.
    pub fn failing_on_batch(mut self, batch: usize) -> Self {
        self.fail_on_batch = Some(batch);
        self
    }

    /// Block every batch until `hold` is notified.
    pub fn holding(mut self, hold: Arc<Notify>) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Notified when a batch starts.
    pub fn started(&self) -> Arc<Notify> {
        self.started.clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn uploaded_students(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|p| p.student_id.clone())
            .collect()
    }
}

#[async_trait]
impl AttendanceApi for FakeApi {
    async fn fetch_snapshot(&self, _identity: &str) -> Result<Snapshot> {
        parse_snapshot(&self.snapshot_body)
    }

    async fn submit_batch(&self, participations: &[Participation]) -> Result<()> {
        self.started.notify_one();
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        let number = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(participations.to_vec());
            batches.len()
        };
        if self.fail_on_batch == Some(number) {
            return Err(AppError::ServerRejected("lote rechazado".to_string()));
        }
        Ok(())
    }
}
