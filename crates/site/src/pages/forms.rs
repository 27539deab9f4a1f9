//! Form state kept by a live session between renders.

/// Login or register form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    /// Last submitted email, kept so the user does not retype it.
    pub email: String,
    pub error: Option<String>,
    pub pending: bool,
}

impl AuthForm {
    /// Mark a submission in flight.
    pub fn submit(&mut self, email: &str) {
        self.email = email.trim().to_string();
        self.error = None;
        self.pending = true;
    }

    /// Show an inline error and allow retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.pending = false;
    }

    /// Clear after success.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Contact form submission status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContactStatus {
    #[default]
    Idle,
    Sending,
    Sent,
    Failed(String),
}

/// Contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: ContactStatus,
}

impl ContactForm {
    #[must_use]
    pub const fn is_sending(&self) -> bool {
        matches!(self.status, ContactStatus::Sending)
    }

    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self.status, ContactStatus::Sent)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ContactStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}
