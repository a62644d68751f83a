//! Employee payload carried by `ATTENDANCE` events.
//!
//! Producers may broadcast any serializable value; this is the typed shape the
//! attendance dashboard reads (`data.name`, `data.department`).

use serde::{Deserialize, Serialize};

/// Employment status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    /// Currently employed.
    #[default]
    Active,
    /// No longer employed.
    Inactive,
}

/// An employee whose attendance was just recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    /// Employee id.
    pub id: u64,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Department name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Number of trainings attended so far.
    #[serde(default)]
    pub trainings_attended: u32,
    /// Employment status.
    #[serde(default)]
    pub status: EmployeeStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_skips_missing() {
        let employee = EmployeeRecord {
            id: 7,
            name: Some("Alice".into()),
            department: Some("Finance".into()),
            trainings_attended: 3,
            ..EmployeeRecord::default()
        };
        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "name": "Alice",
                "department": "Finance",
                "trainingsAttended": 3,
                "status": "active",
            })
        );
    }

    #[test]
    fn deserializes_minimal_record() {
        let employee: EmployeeRecord = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(employee.id, 1);
        assert!(employee.name.is_none());
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn inactive_status_is_lowercase() {
        let value = serde_json::to_value(EmployeeStatus::Inactive).unwrap();
        assert_eq!(value, "inactive");
    }
}
