use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub fcm_token: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserRow,
    pub devices: Vec<Device>,
    pub events: Vec<Event>,
    pub caregivers: Vec<Caregiver>,
    pub patients: Vec<Patient>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_info: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub current_medications: Option<String>,
    pub past_surgeries: Option<String>,
    pub primary_physician: Option<String>,
    pub physician_contact: Option<String>,
    pub preferred_pharmacy: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy: Option<String>,
    pub vaccination_records: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Device {
    pub id: i64,
    pub mac: String,
    pub name: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRef {
    pub id: i64,
    pub mac: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AlertRecord {
    pub id: i64,
    pub message: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub device_id: i64,
    pub user_id: i64,
    pub handled: bool,
    pub created_at: DateTime<Utc>,
    pub device_mac: Option<String>,
    pub device_name: Option<String>,
    pub user_email: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub id: i64,
    pub message: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub device_id: i64,
    pub user_id: i64,
    pub handled: bool,
    pub created_at: DateTime<Utc>,
    pub device: Option<DeviceRef>,
    pub user: Option<UserRef>,
}

impl From<AlertRecord> for AlertView {
    fn from(row: AlertRecord) -> Self {
        let device = row.device_mac.map(|mac| DeviceRef {
            id: row.device_id,
            mac,
            name: row.device_name,
        });
        let user = row.user_email.map(|email| UserRef {
            id: row.user_id,
            email,
            first_name: row.user_first_name,
            last_name: row.user_last_name,
        });
        Self {
            id: row.id,
            message: row.message,
            lat: row.lat,
            lng: row.lng,
            device_id: row.device_id,
            user_id: row.user_id,
            handled: row.handled,
            created_at: row.created_at,
            device,
            user,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Caregiver {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Caregiver or patient row joined with its owning user.
#[derive(Debug, sqlx::FromRow)]
pub struct MemberRecord {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub user_email: String,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
}

impl From<MemberRecord> for MemberSummary {
    fn from(row: MemberRecord) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            user: UserRef {
                id: row.user_id,
                email: row.user_email,
                first_name: row.user_first_name,
                last_name: row.user_last_name,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CaregiverDetail {
    #[serde(flatten)]
    pub caregiver: MemberSummary,
    pub patients: Vec<MemberSummary>,
}

#[derive(Debug, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: MemberSummary,
    pub caregivers: Vec<MemberSummary>,
    pub medical_records: Vec<MedicalRecord>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CaregiverPatientLink {
    pub id: i64,
    pub caregiver_id: i64,
    pub patient_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan: String,
    pub status: String,
    pub renewal_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GpsLocation {
    pub id: i64,
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VoiceLog {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub response: String,
    pub error: Option<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Someone to notify when an alert fires.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Contact {
    pub user_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_info: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub current_medications: Option<String>,
    pub past_surgeries: Option<String>,
    pub primary_physician: Option<String>,
    pub physician_contact: Option<String>,
    pub preferred_pharmacy: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy: Option<String>,
    pub vaccination_records: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub mac: String,
    pub name: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RenameDeviceRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenameDeviceResponse {
    pub success: bool,
    pub device: Device,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub message: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub device_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertRequest {
    pub handled: bool,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct NotificationSummary {
    pub sent: u32,
    pub failed: u32,
}

#[derive(Debug, Serialize)]
pub struct AlertCreatedResponse {
    pub message: String,
    pub alert: AlertView,
    pub notifications: NotificationSummary,
}

#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LinkPatientRequest {
    pub patient_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: Option<i64>,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMedicalRecordRequest {
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    pub user_id: Option<i64>,
    pub plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub user_id: Option<i64>,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub renewal_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub plan: Option<String>,
    pub status: Option<String>,
    pub renewal_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceFallbackResponse {
    #[serde(flatten)]
    pub log: VoiceLog,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
