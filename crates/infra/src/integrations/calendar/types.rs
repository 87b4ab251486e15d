//! Google Calendar API wire types

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clinicsync_domain::Appointment;
use serde::{Deserialize, Serialize};

/// Event payload sent to the events API for insert and patch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

/// Timed event boundary. Google wants RFC 3339 plus the IANA zone name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

impl EventDateTime {
    fn render(instant: DateTime<Utc>, time_zone: &str) -> Self {
        // Unknown zone names degrade to UTC rather than failing the sync;
        // the instant itself is unambiguous either way.
        match time_zone.parse::<Tz>() {
            Ok(tz) => Self {
                date_time: instant.with_timezone(&tz).to_rfc3339(),
                time_zone: time_zone.to_string(),
            },
            Err(_) => Self {
                date_time: instant.to_rfc3339(),
                time_zone: "UTC".to_string(),
            },
        }
    }
}

impl EventPayload {
    /// Render an appointment as a calendar event in the professional's zone.
    #[must_use]
    pub fn from_appointment(appointment: &Appointment, time_zone: &str) -> Self {
        Self {
            summary: format!("{} - {}", appointment.service_type, appointment.patient_name),
            description: Self::describe(appointment),
            start: EventDateTime::render(appointment.start, time_zone),
            end: EventDateTime::render(appointment.end, time_zone),
        }
    }

    /// Event description carries the patient name, service type, and any
    /// free-text notes so the calendar entry is readable without the app.
    fn describe(appointment: &Appointment) -> String {
        let mut description = format!(
            "Patient: {}\nService: {}",
            appointment.patient_name, appointment.service_type
        );
        if let Some(notes) = &appointment.notes {
            description.push_str("\n\n");
            description.push_str(notes);
        }
        description
    }
}

/// Response body from event insert/patch. Only the id is load-bearing; a
/// success response without one is treated as a provider error upstream.
#[derive(Debug, Deserialize)]
pub struct RawEventResponse {
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn appointment() -> Appointment {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 13, 0, 0).single().expect("valid");
        Appointment {
            id: "appt-1".into(),
            professional_id: "prof-1".into(),
            patient_id: "patient-1".into(),
            patient_name: "Ana Souza".into(),
            service_type: "Consulta".into(),
            notes: Some("first visit".into()),
            start,
            end: start + chrono::Duration::hours(1),
            cancelled: false,
            confirmed: false,
            external_event_id: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn payload_renders_in_professional_zone() {
        let payload = EventPayload::from_appointment(&appointment(), "America/Sao_Paulo");

        assert_eq!(payload.summary, "Consulta - Ana Souza");
        assert_eq!(payload.start.time_zone, "America/Sao_Paulo");
        // 13:00 UTC is 10:00 in São Paulo (UTC-3).
        assert!(payload.start.date_time.starts_with("2026-03-10T10:00:00"));
        assert!(payload.end.date_time.starts_with("2026-03-10T11:00:00"));
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let payload = EventPayload::from_appointment(&appointment(), "Clinic/Nowhere");

        assert_eq!(payload.start.time_zone, "UTC");
        assert!(payload.start.date_time.starts_with("2026-03-10T13:00:00"));
    }

    #[test]
    fn description_carries_patient_service_and_notes() {
        let payload = EventPayload::from_appointment(&appointment(), "UTC");

        assert_eq!(
            payload.description,
            "Patient: Ana Souza\nService: Consulta\n\nfirst visit"
        );
    }

    #[test]
    fn description_present_without_notes() {
        let mut appointment = appointment();
        appointment.notes = None;

        let payload = EventPayload::from_appointment(&appointment, "UTC");

        assert_eq!(payload.description, "Patient: Ana Souza\nService: Consulta");
    }

    #[test]
    fn serialized_payload_uses_camel_case_keys() {
        let payload = EventPayload::from_appointment(&appointment(), "UTC");
        let json = serde_json::to_value(&payload).expect("serializes");

        assert!(json["start"]["dateTime"].is_string());
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert!(json["description"].as_str().expect("string").contains("Ana Souza"));
    }
}
