//! Alert notification fan-out: the alerting user first, then every linked caregiver.
use chrono::SecondsFormat;
use tracing::{info, warn};

use crate::app_state::Notifier;
use crate::models::{AlertView, Contact, NotificationSummary};
use crate::ports::integration::{OutgoingEmail, PushMessage};

pub const ALERT_SUBJECT: &str = "Emergency Alert Triggered";

pub fn alert_body(alert: &AlertView) -> String {
    let first = alert
        .user
        .as_ref()
        .and_then(|u| u.first_name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Unknown");
    let last = alert
        .user
        .as_ref()
        .and_then(|u| u.last_name.as_deref())
        .unwrap_or("");
    let name = format!("{first} {last}");

    let mut body = format!(
        "User {} triggered an emergency on device {} at {}",
        name.trim_end(),
        alert.device_id,
        alert.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    if let (Some(lat), Some(lng)) = (alert.lat, alert.lng) {
        body.push_str(&format!("\nLocation: https://maps.google.com/?q={lat},{lng}"));
    }
    body
}

/// Sends every notification in order. Failures are logged and counted, never returned.
pub async fn fan_out(
    notifier: &Notifier,
    alert: &AlertView,
    caregivers: &[Contact],
) -> NotificationSummary {
    let mut summary = NotificationSummary::default();
    let body = alert_body(alert);

    let owner = alert
        .user
        .as_ref()
        .map(|u| u.email.clone())
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| notifier.fallback_recipient.clone());
    send_email(notifier, &owner, &body, &mut summary).await;

    for contact in caregivers {
        send_email(notifier, &contact.email, &body, &mut summary).await;

        let Some(token) = contact.fcm_token.as_deref().filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let message = PushMessage {
            token: token.to_string(),
            title: ALERT_SUBJECT.to_string(),
            body: alert.message.clone(),
        };
        match notifier.push.send(&message).await {
            Ok(()) => summary.sent += 1,
            Err(err) => {
                summary.failed += 1;
                warn!(alert_id = alert.id, user_id = contact.user_id, error = %err, "push send failed");
            }
        }
    }

    info!(
        alert_id = alert.id,
        caregivers = caregivers.len(),
        sent = summary.sent,
        failed = summary.failed,
        "alert notifications dispatched"
    );
    summary
}

async fn send_email(notifier: &Notifier, to: &str, body: &str, summary: &mut NotificationSummary) {
    let email = OutgoingEmail {
        to: to.to_string(),
        subject: ALERT_SUBJECT.to_string(),
        text: body.to_string(),
    };
    match notifier.mailer.send(&email).await {
        Ok(()) => summary.sent += 1,
        Err(err) => {
            summary.failed += 1;
            warn!(to, error = %err, "alert email failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::UserRef;
    use crate::ports::integration::{IntegrationError, Mailer, PushSender};

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail_for: Option<String>,
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
            if self.fail_for.as_deref() == Some(email.to.as_str()) {
                return Err(IntegrationError::Malformed("mailbox full".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPush {
        sent: Mutex<Vec<PushMessage>>,
    }

    #[async_trait::async_trait]
    impl PushSender for RecordingPush {
        async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn alert(user: Option<UserRef>, lat: Option<f64>, lng: Option<f64>) -> AlertView {
        AlertView {
            id: 1,
            message: "Fall detected".into(),
            lat,
            lng,
            device_id: 9,
            user_id: 3,
            handled: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            device: None,
            user,
        }
    }

    fn contact(id: i64, email: &str, token: Option<&str>) -> Contact {
        Contact {
            user_id: id,
            email: email.into(),
            first_name: None,
            fcm_token: token.map(str::to_string),
        }
    }

    #[test]
    fn body_includes_location_only_with_both_coordinates() {
        let user = UserRef {
            id: 3,
            email: "pat@example.com".into(),
            first_name: Some("Pat".into()),
            last_name: Some("Lee".into()),
        };
        let with = alert_body(&alert(Some(user.clone()), Some(1.5), Some(-2.25)));
        assert_eq!(
            with,
            "User Pat Lee triggered an emergency on device 9 at 2024-05-01T08:30:00.000Z\n\
             Location: https://maps.google.com/?q=1.5,-2.25"
        );
        let without = alert_body(&alert(Some(user), Some(1.5), None));
        assert!(!without.contains("Location"));
    }

    #[test]
    fn missing_names_render_unknown() {
        let body = alert_body(&alert(None, None, None));
        assert!(body.starts_with("User Unknown triggered"), "{body}");
    }

    #[tokio::test]
    async fn notifies_owner_then_caregivers_and_counts_failures() {
        let mailer = Arc::new(RecordingMailer {
            fail_for: Some("broken@example.com".into()),
            ..Default::default()
        });
        let push = Arc::new(RecordingPush::default());
        let notifier = Notifier {
            mailer: mailer.clone(),
            push: push.clone(),
            fallback_recipient: "admin@example.com".into(),
        };

        let caregivers = vec![
            contact(10, "care@example.com", Some("tok-1")),
            contact(11, "broken@example.com", None),
        ];
        let summary = fan_out(&notifier, &alert(None, None, None), &caregivers).await;

        assert_eq!(summary.sent, 3);
        assert_eq!(summary.failed, 1);
        let recipients: Vec<_> = mailer.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect();
        assert_eq!(recipients, vec!["admin@example.com", "care@example.com"]);
        let pushes = push.sent.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].token, "tok-1");
    }
}
