//! Data models for DSFix

pub mod admin;
pub mod enums;
pub mod equipment;
pub mod request;

// Re-export commonly used types
pub use admin::{Admin, AdminIdentity, AdminSession};
pub use enums::{RequestStatus, Urgency};
pub use equipment::{Equipment, EquipmentSummary};
pub use request::{MaintenanceRequest, RequestDetail, RequestSummary, StatusHistoryEntry};
