//! Appointment and contact message models.

use serde::{Deserialize, Serialize};

/// A patient appointment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub message: String,
    pub created_at: String,
}

/// Request body for booking an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub message: String,
}

impl NewAppointment {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("doctorId", &self.doctor_id),
            ("date", &self.date),
            ("time", &self.time),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", name));
            }
        }
        Ok(())
    }
}

/// Request body for the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl NewContactMessage {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err("Name and email are required".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        Ok(())
    }
}
