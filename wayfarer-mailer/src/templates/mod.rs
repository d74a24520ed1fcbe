mod engine;
mod recovery_templates;

pub use engine::{AskamaTemplateEngine, TemplateEngine};
pub use recovery_templates::{
    PasswordChangedTemplate, PasswordResetTemplate, TemplateContext, VerificationTemplate,
};

use std::time::Duration;

/// The message-specific part of a rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateData {
    Verification { link: String, expires_in: Duration },
    PasswordReset { link: String, expires_in: Duration },
    PasswordChanged,
}

impl TemplateData {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateData::Verification { .. } => "verification",
            TemplateData::PasswordReset { .. } => "password_reset",
            TemplateData::PasswordChanged => "password_changed",
        }
    }
}

/// "24 hours", "1 hour", "15 minutes".
pub(crate) fn describe_lifetime(lifetime: Duration) -> String {
    let minutes = lifetime.as_secs() / 60;
    let (amount, unit) = if minutes >= 60 && minutes % 60 == 0 {
        (minutes / 60, "hour")
    } else {
        (minutes.max(1), "minute")
    };

    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lifetime() {
        assert_eq!(describe_lifetime(Duration::from_secs(24 * 3600)), "24 hours");
        assert_eq!(describe_lifetime(Duration::from_secs(3600)), "1 hour");
        assert_eq!(describe_lifetime(Duration::from_secs(90 * 60)), "90 minutes");
        assert_eq!(describe_lifetime(Duration::from_secs(20)), "1 minute");
    }
}
