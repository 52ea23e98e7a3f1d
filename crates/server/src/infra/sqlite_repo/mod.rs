//! SQLite-backed repository. Each submodule owns the queries for one table group.
mod alerts;
mod connection;
mod devices;
mod events;
mod medical;
mod members;
mod subscriptions;
mod tracking;
mod users;

use std::path::Path;

use sqlx::SqlitePool;

use crate::models::{
    AlertView, Caregiver, CaregiverPatientLink, Contact, Device, Event, GpsLocation,
    MedicalRecord, MemberSummary, Patient, Profile, Subscription, UserCredentials, UserRow,
    VoiceLog,
};
use crate::ports::repo::{
    DeviceRegistration, EventUpdate, MedicalRecordUpdate, NewAlert, NewEvent, NewLocation,
    NewMedicalRecord, NewSubscription, NewUser, NewVoiceLog, ProfileUpdate, Repo, RepoResult,
    SubscriptionUpdate, UserUpdate,
};

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open(db_path: &Path) -> Result<Self, sqlx::Error> {
        let pool = connection::create_pool(db_path).await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = connection::create_memory_pool().await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Repo for SqliteRepo {
    async fn apply_schema(&self) -> RepoResult<()> {
        connection::apply_schema(&self.pool).await
    }

    async fn reset(&self) -> RepoResult<()> {
        connection::reset(&self.pool).await
    }

    async fn list_users(&self) -> RepoResult<Vec<UserRow>> {
        users::list_users(&self.pool).await
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<UserRow>> {
        users::get_user(&self.pool, id).await
    }

    async fn find_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        users::find_credentials(&self.pool, email).await
    }

    async fn create_user(&self, user: &NewUser) -> RepoResult<UserRow> {
        users::create_user(&self.pool, user).await
    }

    async fn ensure_user(&self, user: &NewUser) -> RepoResult<bool> {
        users::ensure_user(&self.pool, user).await
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> RepoResult<Option<UserRow>> {
        users::update_user(&self.pool, id, update).await
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        users::delete_user(&self.pool, id).await
    }

    async fn get_profile(&self, user_id: i64) -> RepoResult<Option<Profile>> {
        users::get_profile(&self.pool, user_id).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> RepoResult<Option<Profile>> {
        users::update_profile(&self.pool, user_id, update).await
    }

    async fn register_device(&self, device: &DeviceRegistration) -> RepoResult<Device> {
        devices::register_device(&self.pool, device).await
    }

    async fn get_device(&self, id: i64) -> RepoResult<Option<Device>> {
        devices::get_device(&self.pool, id).await
    }

    async fn get_device_by_mac(&self, mac: &str) -> RepoResult<Option<Device>> {
        devices::get_device_by_mac(&self.pool, mac).await
    }

    async fn rename_device(&self, mac: &str, name: &str) -> RepoResult<Option<Device>> {
        devices::rename_device(&self.pool, mac, name).await
    }

    async fn list_devices_for_user(&self, user_id: i64) -> RepoResult<Vec<Device>> {
        devices::list_devices_for_user(&self.pool, user_id).await
    }

    async fn list_alerts(&self, device_id: Option<i64>) -> RepoResult<Vec<AlertView>> {
        alerts::list_alerts(&self.pool, device_id).await
    }

    async fn get_alert(&self, id: i64) -> RepoResult<Option<AlertView>> {
        alerts::get_alert(&self.pool, id).await
    }

    async fn create_alert(&self, alert: &NewAlert) -> RepoResult<AlertView> {
        alerts::create_alert(&self.pool, alert).await
    }

    async fn set_alert_handled(&self, id: i64, handled: bool) -> RepoResult<Option<AlertView>> {
        alerts::set_alert_handled(&self.pool, id, handled).await
    }

    async fn delete_alert(&self, id: i64) -> RepoResult<bool> {
        alerts::delete_alert(&self.pool, id).await
    }

    async fn linked_caregiver_contacts(&self, user_id: i64) -> RepoResult<Vec<Contact>> {
        alerts::linked_caregiver_contacts(&self.pool, user_id).await
    }

    async fn list_caregivers(&self) -> RepoResult<Vec<MemberSummary>> {
        members::list_caregivers(&self.pool).await
    }

    async fn get_caregiver(&self, id: i64) -> RepoResult<Option<MemberSummary>> {
        members::get_caregiver(&self.pool, id).await
    }

    async fn create_caregiver(&self, user_id: i64) -> RepoResult<MemberSummary> {
        members::create_caregiver(&self.pool, user_id).await
    }

    async fn delete_caregiver(&self, id: i64) -> RepoResult<bool> {
        members::delete_caregiver(&self.pool, id).await
    }

    async fn list_caregivers_for_user(&self, user_id: i64) -> RepoResult<Vec<Caregiver>> {
        members::list_caregivers_for_user(&self.pool, user_id).await
    }

    async fn patients_of_caregiver(&self, caregiver_id: i64) -> RepoResult<Vec<MemberSummary>> {
        members::patients_of_caregiver(&self.pool, caregiver_id).await
    }

    async fn link_patient(
        &self,
        caregiver_id: i64,
        patient_id: i64,
    ) -> RepoResult<CaregiverPatientLink> {
        members::link_patient(&self.pool, caregiver_id, patient_id).await
    }

    async fn unlink_patient(&self, caregiver_id: i64, patient_id: i64) -> RepoResult<u64> {
        members::unlink_patient(&self.pool, caregiver_id, patient_id).await
    }

    async fn list_patients(&self, user_id: Option<i64>) -> RepoResult<Vec<MemberSummary>> {
        members::list_patients(&self.pool, user_id).await
    }

    async fn get_patient(&self, id: i64) -> RepoResult<Option<MemberSummary>> {
        members::get_patient(&self.pool, id).await
    }

    async fn create_patient(&self, user_id: i64) -> RepoResult<MemberSummary> {
        members::create_patient(&self.pool, user_id).await
    }

    async fn delete_patient(&self, id: i64) -> RepoResult<bool> {
        members::delete_patient(&self.pool, id).await
    }

    async fn list_patients_for_user(&self, user_id: i64) -> RepoResult<Vec<Patient>> {
        members::list_patients_for_user(&self.pool, user_id).await
    }

    async fn caregivers_of_patient(&self, patient_id: i64) -> RepoResult<Vec<MemberSummary>> {
        members::caregivers_of_patient(&self.pool, patient_id).await
    }

    async fn list_medical_records(
        &self,
        patient_id: Option<i64>,
    ) -> RepoResult<Vec<MedicalRecord>> {
        medical::list_medical_records(&self.pool, patient_id).await
    }

    async fn create_medical_record(&self, record: &NewMedicalRecord) -> RepoResult<MedicalRecord> {
        medical::create_medical_record(&self.pool, record).await
    }

    async fn update_medical_record(
        &self,
        id: i64,
        update: &MedicalRecordUpdate,
    ) -> RepoResult<Option<MedicalRecord>> {
        medical::update_medical_record(&self.pool, id, update).await
    }

    async fn delete_medical_record(&self, id: i64) -> RepoResult<bool> {
        medical::delete_medical_record(&self.pool, id).await
    }

    async fn list_events_for_user(&self, user_id: i64) -> RepoResult<Vec<Event>> {
        events::list_events_for_user(&self.pool, user_id).await
    }

    async fn get_event(&self, id: i64) -> RepoResult<Option<Event>> {
        events::get_event(&self.pool, id).await
    }

    async fn create_event(&self, event: &NewEvent) -> RepoResult<Event> {
        events::create_event(&self.pool, event).await
    }

    async fn update_event(&self, id: i64, update: &EventUpdate) -> RepoResult<Option<Event>> {
        events::update_event(&self.pool, id, update).await
    }

    async fn delete_event(&self, id: i64) -> RepoResult<bool> {
        events::delete_event(&self.pool, id).await
    }

    async fn list_subscriptions(&self) -> RepoResult<Vec<Subscription>> {
        subscriptions::list_subscriptions(&self.pool).await
    }

    async fn get_subscription(&self, id: i64) -> RepoResult<Option<Subscription>> {
        subscriptions::get_subscription(&self.pool, id).await
    }

    async fn latest_subscription_for_user(&self, user_id: i64) -> RepoResult<Option<Subscription>> {
        subscriptions::latest_subscription_for_user(&self.pool, user_id).await
    }

    async fn create_subscription(&self, sub: &NewSubscription) -> RepoResult<Subscription> {
        subscriptions::create_subscription(&self.pool, sub).await
    }

    async fn update_subscription(
        &self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> RepoResult<Option<Subscription>> {
        subscriptions::update_subscription(&self.pool, id, update).await
    }

    async fn delete_subscription(&self, id: i64) -> RepoResult<bool> {
        subscriptions::delete_subscription(&self.pool, id).await
    }

    async fn activate_subscription(&self, sub: &NewSubscription) -> RepoResult<Subscription> {
        subscriptions::activate_subscription(&self.pool, sub).await
    }

    async fn list_locations(&self, device_id: i64) -> RepoResult<Vec<GpsLocation>> {
        tracking::list_locations(&self.pool, device_id).await
    }

    async fn add_location(&self, device_id: i64, fix: &NewLocation) -> RepoResult<GpsLocation> {
        tracking::add_location(&self.pool, device_id, fix).await
    }

    async fn latest_location(&self, device_id: i64) -> RepoResult<Option<GpsLocation>> {
        tracking::latest_location(&self.pool, device_id).await
    }

    async fn list_voice_logs(&self, user_id: i64) -> RepoResult<Vec<VoiceLog>> {
        tracking::list_voice_logs(&self.pool, user_id).await
    }

    async fn insert_voice_log(&self, log: &NewVoiceLog) -> RepoResult<VoiceLog> {
        tracking::insert_voice_log(&self.pool, log).await
    }
}
