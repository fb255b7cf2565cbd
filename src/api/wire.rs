//! JSON shapes exchanged with the attendance server.
//!
//! The server is a PHP endpoint that is loose with types: identifiers arrive as
//! numbers or numeric strings and optional text fields may be `null`, numbers
//! or absent. Deserialization accepts all of these; placeholders for missing
//! values are applied later, when rows are written.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::{ERROR_DEFAULT_SERVER_MESSAGE, RESPONSE_EXCERPT_CHARS};
use crate::entities::attendance_event;
use crate::error::{AppError, Result};

/// Roster and calendar snapshot returned by the download endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, alias = "mensaje", deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, rename = "docente")]
    pub teacher: Option<WireTeacher>,
    #[serde(default, rename = "asignaciones")]
    pub assignments: Vec<WireAssignment>,
    #[serde(rename = "estudiantes")]
    pub students: Vec<WireStudent>,
    #[serde(default, rename = "periodos")]
    pub periods: Vec<WirePeriod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireTeacher {
    #[serde(default, rename = "nombre", deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireAssignment {
    #[serde(default, rename = "municipio", deserialize_with = "lenient_text")]
    pub municipality: Option<String>,
    #[serde(default, rename = "centro", deserialize_with = "lenient_text")]
    pub center: Option<String>,
    #[serde(default, rename = "grado", deserialize_with = "lenient_text")]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireStudent {
    #[serde(rename = "id_nnaj", deserialize_with = "required_text")]
    pub student_id: String,
    #[serde(default, rename = "nombre_completo", deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, rename = "genero", deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default, rename = "grado_actual", deserialize_with = "lenient_text")]
    pub grade: Option<String>,
    #[serde(default, rename = "centro_educativo", deserialize_with = "lenient_text")]
    pub center: Option<String>,
    #[serde(default, rename = "municipio", deserialize_with = "lenient_text")]
    pub municipality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePeriod {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, rename = "nombre", deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, rename = "fecha_inicio", deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(default, rename = "fecha_fin", deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    #[serde(default, rename = "lista_actividades")]
    pub activities: Vec<WireActivity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireActivity {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, rename = "nombre_actividad", deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, rename = "tipo_actividad", deserialize_with = "lenient_text")]
    pub activity_type: Option<String>,
    #[serde(default, rename = "marco_logico", deserialize_with = "lenient_text")]
    pub logframe_tag: Option<String>,
}

/// One attendance record as the upload endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participation {
    #[serde(rename = "id_nnaj")]
    pub student_id: String,
    #[serde(rename = "actividad_id")]
    pub activity_id: i64,
    #[serde(rename = "fecha")]
    pub event_date: String,
    #[serde(rename = "mes")]
    pub period_label: String,
    #[serde(rename = "firma")]
    pub signature: String,
    #[serde(rename = "timestamp_registro")]
    pub captured_at: String,
    #[serde(rename = "coordenadas")]
    pub coordinates: String,
    #[serde(rename = "uuid_registro")]
    pub client_ref: Uuid,
}

impl From<&attendance_event::Model> for Participation {
    fn from(event: &attendance_event::Model) -> Self {
        Self {
            student_id: event.student_id.clone(),
            activity_id: event.activity_id,
            event_date: event.event_date.clone(),
            period_label: event.period_label.clone(),
            signature: event.signature.clone(),
            captured_at: event.captured_at.clone(),
            coordinates: event.coordinates.clone(),
            client_ref: event.client_ref,
        }
    }
}

/// Request body of one upload batch.
#[derive(Debug, Serialize)]
pub struct UploadBatch<'a> {
    #[serde(rename = "participaciones")]
    pub participations: &'a [Participation],
}

/// Reply to an upload batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, alias = "mensaje", deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// First characters of an unexpected body, kept for diagnosis.
pub fn excerpt(body: &str) -> String {
    body.chars().take(RESPONSE_EXCERPT_CHARS).collect()
}

fn parse_json(body: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(AppError::MalformedResponse {
            excerpt: excerpt(body),
        }),
    }
}

fn is_error_status(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("error")
}

fn server_message(value: &Value) -> String {
    ["mensaje", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| ERROR_DEFAULT_SERVER_MESSAGE.to_string())
}

/// Parse and validate a download body.
///
/// The student list must be present and an array; anything else is rejected
/// before storage is touched.
pub fn parse_snapshot(body: &str) -> Result<Snapshot> {
    let value = parse_json(body)?;
    if is_error_status(&value) {
        return Err(AppError::ServerRejected(server_message(&value)));
    }
    match value.get("estudiantes") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(AppError::InvalidSnapshot("estudiantes is not a list".to_string())),
        None => return Err(AppError::InvalidSnapshot("estudiantes is missing".to_string())),
    }
    serde_json::from_value(value).map_err(|e| AppError::InvalidSnapshot(e.to_string()))
}

/// Parse an upload reply. `status = "error"` is a rejection even under HTTP 200.
pub fn parse_upload_reply(body: &str) -> Result<UploadReply> {
    let value = parse_json(body)?;
    if is_error_status(&value) {
        return Err(AppError::ServerRejected(server_message(&value)));
    }
    serde_json::from_value(value).map_err(|_| AppError::MalformedResponse {
        excerpt: excerpt(body),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_text(deserializer)? {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(de::Error::custom("missing required identifier")),
    }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("invalid identifier {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid identifier {s:?}"))),
        other => Err(de::Error::custom(format!("invalid identifier {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::attendance_event::UploadStatus;

    #[test]
    fn test_snapshot_accepts_string_and_numeric_ids() {
        let body = r#"{
            "status": "success",
            "docente": {"nombre": "Ana"},
            "asignaciones": [{"municipio": "Gracias", "centro": "CEB 1", "grado": "3"}],
            "estudiantes": [{"id_nnaj": 1001, "nombre_completo": "Luis", "genero": null}],
            "periodos": [{"id": "7", "nombre": "Marzo", "lista_actividades": [{"id": 12, "nombre_actividad": "Taller"}]}]
        }"#;

        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.students[0].student_id, "1001");
        assert_eq!(snapshot.students[0].gender, None);
        assert_eq!(snapshot.assignments[0].grade.as_deref(), Some("3"));
        assert_eq!(snapshot.periods[0].id, 7);
        assert_eq!(snapshot.periods[0].activities[0].id, 12);
        assert_eq!(snapshot.teacher.unwrap().name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_snapshot_without_students_is_invalid() {
        let err = parse_snapshot(r#"{"status": "success", "periodos": []}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidSnapshot(_)));

        let err = parse_snapshot(r#"{"estudiantes": {"id_nnaj": "1"}}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_snapshot_error_status_is_rejection() {
        let err = parse_snapshot(r#"{"status": "error", "mensaje": "Identidad no encontrada"}"#).unwrap_err();
        match err {
            AppError::ServerRejected(message) => assert_eq!(message, "Identidad no encontrada"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_html_body_is_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(400));
        match parse_upload_reply(&body).unwrap_err() {
            AppError::MalformedResponse { excerpt } => {
                assert_eq!(excerpt.chars().count(), RESPONSE_EXCERPT_CHARS);
                assert!(excerpt.starts_with("<html>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_upload_reply_reads_either_message_key() {
        let reply = parse_upload_reply(r#"{"status": "success", "mensaje": "ok"}"#).unwrap();
        assert_eq!(reply.message.as_deref(), Some("ok"));

        let err = parse_upload_reply(r#"{"status": "error", "message": "duplicado"}"#).unwrap_err();
        assert!(matches!(err, AppError::ServerRejected(m) if m == "duplicado"));
    }

    #[test]
    fn test_participation_uses_server_field_names() {
        let event = attendance_event::Model {
            id: 3,
            client_ref: Uuid::nil(),
            activity_id: 12,
            student_id: "1001".to_string(),
            event_date: "2025-03-14".to_string(),
            period_label: "Marzo".to_string(),
            signature: "data:image/png;base64,AAAA".to_string(),
            captured_at: "2025-03-14 09:30:00".to_string(),
            coordinates: "14.1,-87.2".to_string(),
            status: UploadStatus::Pending,
        };

        let json = serde_json::to_value(Participation::from(&event)).unwrap();
        assert_eq!(json["id_nnaj"], "1001");
        assert_eq!(json["actividad_id"], 12);
        assert_eq!(json["fecha"], "2025-03-14");
        assert_eq!(json["mes"], "Marzo");
        assert_eq!(json["timestamp_registro"], "2025-03-14 09:30:00");
        assert_eq!(json["coordenadas"], "14.1,-87.2");
        assert_eq!(json["uuid_registro"], Uuid::nil().to_string());
        assert!(json.get("status").is_none());
    }
}
