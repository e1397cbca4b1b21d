//! Canned request bodies.

use serde_json::{Value, json};

pub fn patient_payload() -> Value {
    json!({
        "name": "test name",
        "phone_number": "0123456789",
        "birth_date": "2015-07-23",
    })
}

pub fn patient_detail_payload() -> Value {
    json!({
        "name": "patient name",
        "relative": "father",
        "relative_name": "test relative name",
        "phone_number": "0987654321",
        "birth_date": "2015-07-23",
    })
}

pub fn reservation_payload(patient_id: i32, doctor_id: i32) -> Value {
    json!({
        "patient": patient_id,
        "doctor": doctor_id,
        "date": "2024-07-23",
        "time": "15:00:00",
        "description": "teeth surgery",
        "requirements": "prepare the surgery tools",
        "patient_reminder": "10:00:00",
        "doctor_reminder": "14:30:00",
    })
}

pub fn user_payload(role_id: i32) -> Value {
    json!({
        "email": "staff@example.com",
        "name": "Staff Member",
        "password": "testpass123",
        "role": role_id,
    })
}
