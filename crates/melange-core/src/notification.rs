use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl Notification {
    pub fn to(recipient: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            to: vec![recipient.into()],
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn bcc(recipients: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            to: Vec::new(),
            bcc: recipients,
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.to.iter().chain(self.bcc.iter()).any(|r| r == email)
    }
}

/// Mail that would have been delivered, kept in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outbox {
    sent: Vec<Notification>,
}

impl Outbox {
    /// Notifications without any recipient are dropped.
    pub fn push(&mut self, notification: Notification) {
        if notification.to.is_empty() && notification.bcc.is_empty() {
            tracing::debug!(subject = %notification.subject, "dropping notification without recipients");
            return;
        }
        tracing::debug!(subject = %notification.subject, "queued notification");
        self.sent.push(notification);
    }

    pub fn sent(&self) -> &[Notification] {
        &self.sent
    }

    pub fn sent_to(&self, email: &str) -> Vec<&Notification> {
        self.sent.iter().filter(|n| n.is_addressed_to(email)).collect()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}
