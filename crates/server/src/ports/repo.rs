use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    AlertView, Caregiver, CaregiverPatientLink, Contact, Device, Event, GpsLocation,
    MedicalRecord, MemberSummary, Patient, Profile, Subscription, UserCredentials, UserRow,
    VoiceLog,
};

pub type RepoResult<T> = Result<T, sqlx::Error>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub fcm_token: Option<String>,
}

/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_info: Option<String>,
    /// `Some(None)` clears the stored date.
    pub date_of_birth: Option<Option<NaiveDate>>,
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

#[derive(Debug, Clone)]
pub struct DeviceRegistration {
    pub mac: String,
    pub name: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub message: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub device_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedicalRecord {
    pub patient_id: i64,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicalRecordUpdate {
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: i64,
    pub plan: String,
    pub status: String,
    pub renewal_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub plan: Option<String>,
    pub status: Option<String>,
    pub renewal_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewVoiceLog {
    pub user_id: i64,
    pub message: String,
    pub response: String,
    pub error: Option<String>,
}

/// Storage used by the HTTP handlers. Missing rows surface as `None`/`false`,
/// never as `sqlx::Error::RowNotFound`.
#[async_trait::async_trait]
pub trait Repo: Send + Sync {
    async fn apply_schema(&self) -> RepoResult<()>;
    async fn reset(&self) -> RepoResult<()>;

    async fn list_users(&self) -> RepoResult<Vec<UserRow>>;
    async fn get_user(&self, id: i64) -> RepoResult<Option<UserRow>>;
    async fn find_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
    async fn create_user(&self, user: &NewUser) -> RepoResult<UserRow>;
    /// Inserts unless the email is taken; returns whether a row was written.
    async fn ensure_user(&self, user: &NewUser) -> RepoResult<bool>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> RepoResult<Option<UserRow>>;
    async fn delete_user(&self, id: i64) -> RepoResult<bool>;
    async fn get_profile(&self, user_id: i64) -> RepoResult<Option<Profile>>;
    async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> RepoResult<Option<Profile>>;

    async fn register_device(&self, device: &DeviceRegistration) -> RepoResult<Device>;
    async fn get_device(&self, id: i64) -> RepoResult<Option<Device>>;
    async fn get_device_by_mac(&self, mac: &str) -> RepoResult<Option<Device>>;
    async fn rename_device(&self, mac: &str, name: &str) -> RepoResult<Option<Device>>;
    async fn list_devices_for_user(&self, user_id: i64) -> RepoResult<Vec<Device>>;

    async fn list_alerts(&self, device_id: Option<i64>) -> RepoResult<Vec<AlertView>>;
    async fn get_alert(&self, id: i64) -> RepoResult<Option<AlertView>>;
    async fn create_alert(&self, alert: &NewAlert) -> RepoResult<AlertView>;
    async fn set_alert_handled(&self, id: i64, handled: bool) -> RepoResult<Option<AlertView>>;
    async fn delete_alert(&self, id: i64) -> RepoResult<bool>;
    /// Users of every caregiver linked to a patient record owned by `user_id`.
    async fn linked_caregiver_contacts(&self, user_id: i64) -> RepoResult<Vec<Contact>>;

    async fn list_caregivers(&self) -> RepoResult<Vec<MemberSummary>>;
    async fn get_caregiver(&self, id: i64) -> RepoResult<Option<MemberSummary>>;
    async fn create_caregiver(&self, user_id: i64) -> RepoResult<MemberSummary>;
    async fn delete_caregiver(&self, id: i64) -> RepoResult<bool>;
    async fn list_caregivers_for_user(&self, user_id: i64) -> RepoResult<Vec<Caregiver>>;
    async fn patients_of_caregiver(&self, caregiver_id: i64) -> RepoResult<Vec<MemberSummary>>;
    async fn link_patient(
        &self,
        caregiver_id: i64,
        patient_id: i64,
    ) -> RepoResult<CaregiverPatientLink>;
    async fn unlink_patient(&self, caregiver_id: i64, patient_id: i64) -> RepoResult<u64>;

    async fn list_patients(&self, user_id: Option<i64>) -> RepoResult<Vec<MemberSummary>>;
    async fn get_patient(&self, id: i64) -> RepoResult<Option<MemberSummary>>;
    async fn create_patient(&self, user_id: i64) -> RepoResult<MemberSummary>;
    async fn delete_patient(&self, id: i64) -> RepoResult<bool>;
    async fn list_patients_for_user(&self, user_id: i64) -> RepoResult<Vec<Patient>>;
    async fn caregivers_of_patient(&self, patient_id: i64) -> RepoResult<Vec<MemberSummary>>;

    async fn list_medical_records(
        &self,
        patient_id: Option<i64>,
    ) -> RepoResult<Vec<MedicalRecord>>;
    async fn create_medical_record(&self, record: &NewMedicalRecord) -> RepoResult<MedicalRecord>;
    async fn update_medical_record(
        &self,
        id: i64,
        update: &MedicalRecordUpdate,
    ) -> RepoResult<Option<MedicalRecord>>;
    async fn delete_medical_record(&self, id: i64) -> RepoResult<bool>;

    async fn list_events_for_user(&self, user_id: i64) -> RepoResult<Vec<Event>>;
    async fn get_event(&self, id: i64) -> RepoResult<Option<Event>>;
    async fn create_event(&self, event: &NewEvent) -> RepoResult<Event>;
    async fn update_event(&self, id: i64, update: &EventUpdate) -> RepoResult<Option<Event>>;
    async fn delete_event(&self, id: i64) -> RepoResult<bool>;

    async fn list_subscriptions(&self) -> RepoResult<Vec<Subscription>>;
    async fn get_subscription(&self, id: i64) -> RepoResult<Option<Subscription>>;
    async fn latest_subscription_for_user(&self, user_id: i64)
    -> RepoResult<Option<Subscription>>;
    async fn create_subscription(&self, sub: &NewSubscription) -> RepoResult<Subscription>;
    async fn update_subscription(
        &self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> RepoResult<Option<Subscription>>;
    async fn delete_subscription(&self, id: i64) -> RepoResult<bool>;
    /// Updates the user's latest subscription in place, or creates one.
    async fn activate_subscription(&self, sub: &NewSubscription) -> RepoResult<Subscription>;

    async fn list_locations(&self, device_id: i64) -> RepoResult<Vec<GpsLocation>>;
    async fn add_location(&self, device_id: i64, fix: &NewLocation) -> RepoResult<GpsLocation>;
    async fn latest_location(&self, device_id: i64) -> RepoResult<Option<GpsLocation>>;

    async fn list_voice_logs(&self, user_id: i64) -> RepoResult<Vec<VoiceLog>>;
    async fn insert_voice_log(&self, log: &NewVoiceLog) -> RepoResult<VoiceLog>;
}
