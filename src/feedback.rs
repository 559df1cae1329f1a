//! Contact form and star rating, both posting to `feedback.submit`.
//! Failures are logged and reported as `false`; nothing is raised.

use serde_json::{json, Map, Value};

use crate::metrics;
use crate::rpc::types::FeedbackSubmission;
use crate::rpc::WidgetApi;

pub const KIND_CONTACT: &str = "contact";
pub const KIND_STARS: &str = "stars";
pub const DEFAULT_MAX_STARS: u8 = 5;

async fn submit(api: &WidgetApi, submission: FeedbackSubmission) -> bool {
    metrics::incr(metrics::FEEDBACK_SUBMIT);
    match api.submit_feedback(&submission).await {
        Ok(ack) => {
            if !ack.ok {
                tracing::warn!(kind = %submission.kind, "feedback rejected by backend");
            }
            ack.ok
        }
        Err(e) => {
            tracing::warn!(error = ?e, kind = %submission.kind, "feedback submit failed");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFormError {
    MissingName,
    MissingEmail,
    InvalidEmail,
    MissingMessage,
}

impl std::fmt::Display for ContactFormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::MissingName => "name is required",
            Self::MissingEmail => "email is required",
            Self::InvalidEmail => "email is not valid",
            Self::MissingMessage => "message is required",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ContactFormError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub component_id: Option<String>,
    pub name: String,
    pub email: String,
    pub message: String,
    submitting: bool,
}

impl ContactForm {
    pub fn new(component_id: Option<String>) -> Self {
        Self {
            component_id,
            ..Self::default()
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn validate(&self) -> Result<(), ContactFormError> {
        if self.name.trim().is_empty() {
            return Err(ContactFormError::MissingName);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ContactFormError::MissingEmail);
        }
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && !domain.is_empty() => {}
            _ => return Err(ContactFormError::InvalidEmail),
        }
        if self.message.trim().is_empty() {
            return Err(ContactFormError::MissingMessage);
        }
        Ok(())
    }

    fn data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("name".into(), json!(self.name));
        data.insert("email".into(), json!(self.email));
        data.insert("message".into(), json!(self.message));
        data
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.message.clear();
    }

    /// Submit the form. Invalid forms are not sent. Fields reset on `ok`.
    pub async fn submit(&mut self, api: &WidgetApi) -> Result<bool, ContactFormError> {
        self.validate()?;
        self.submitting = true;
        let ok = submit(
            api,
            FeedbackSubmission {
                kind: KIND_CONTACT.to_string(),
                component_id: self.component_id.clone(),
                data: self.data(),
            },
        )
        .await;
        self.submitting = false;
        if ok {
            self.clear();
        }
        Ok(ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarRating {
    pub component_id: Option<String>,
    max: u8,
    current: u8,
    submitting: bool,
}

impl Default for StarRating {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StarRating {
    pub fn new(component_id: Option<String>) -> Self {
        Self {
            component_id,
            max: DEFAULT_MAX_STARS,
            current: 0,
            submitting: false,
        }
    }

    pub fn with_max(mut self, max: u8) -> Self {
        self.max = max.max(1);
        self.current = self.current.min(self.max);
        self
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.current = value.min(self.max);
        self
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether star `idx` (1-based) renders filled.
    pub fn is_filled(&self, idx: u8) -> bool {
        self.current >= idx
    }

    /// Select `rating` and submit it. Out-of-range ratings are ignored (`None`).
    pub async fn select(&mut self, rating: u8, api: &WidgetApi) -> Option<bool> {
        if rating == 0 || rating > self.max {
            tracing::debug!(rating, max = self.max, "rating out of range");
            return None;
        }
        self.current = rating;
        self.submitting = true;
        let mut data = Map::new();
        data.insert("rating".into(), json!(rating));
        let ok = submit(
            api,
            FeedbackSubmission {
                kind: KIND_STARS.to_string(),
                component_id: self.component_id.clone(),
                data,
            },
        )
        .await;
        self.submitting = false;
        Some(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ContactForm {
        ContactForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "Hello".into(),
            ..ContactForm::default()
        }
    }

    #[test]
    fn contact_validation() {
        assert_eq!(filled().validate(), Ok(()));

        let mut f = filled();
        f.name = "  ".into();
        assert_eq!(f.validate(), Err(ContactFormError::MissingName));

        let mut f = filled();
        f.email = "nope".into();
        assert_eq!(f.validate(), Err(ContactFormError::InvalidEmail));

        let mut f = filled();
        f.email = "@example.com".into();
        assert_eq!(f.validate(), Err(ContactFormError::InvalidEmail));

        let mut f = filled();
        f.message = String::new();
        assert_eq!(f.validate(), Err(ContactFormError::MissingMessage));
    }

    #[test]
    fn star_bounds() {
        let r = StarRating::new(None).with_max(3).with_value(9);
        assert_eq!(r.current(), 3);
        assert!(r.is_filled(3));
        assert!(!StarRating::default().is_filled(1));
        assert_eq!(StarRating::default().max(), 5);
    }
}
