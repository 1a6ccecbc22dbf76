use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    /// Booking id assigned by the external agenda system.
    pub external_id: String,
    pub patient_id: String,
    pub slot_id: String,
    pub specialty_id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Assigned,
    AttendanceConfirmed,
    Canceled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Assigned => "assigned",
            AppointmentStatus::AttendanceConfirmed => "attendance_confirmed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "attendance_confirmed" => AppointmentStatus::AttendanceConfirmed,
            "canceled" => AppointmentStatus::Canceled,
            "completed" => AppointmentStatus::Completed,
            "no_show" => AppointmentStatus::NoShow,
            _ => AppointmentStatus::Assigned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    OneDayBefore,
    OneHourBefore,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::OneDayBefore => "one_day_before",
            ReminderKind::OneHourBefore => "one_hour_before",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "one_hour_before" => ReminderKind::OneHourBefore,
            _ => ReminderKind::OneDayBefore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: String,
    pub appointment_id: String,
    pub kind: ReminderKind,
    pub scheduled_for: NaiveDateTime,
    pub sent: bool,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
