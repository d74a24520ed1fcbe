use crate::{
    MailerError,
    templates::{
        PasswordChangedTemplate, PasswordResetTemplate, TemplateContext, TemplateData,
        VerificationTemplate, describe_lifetime,
    },
};
use askama::Template;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<head>.*</head>").expect("valid regex"));

#[async_trait]
pub trait TemplateEngine: Send + Sync {
    async fn render_html(
        &self,
        context: &TemplateContext,
        data: &TemplateData,
    ) -> Result<String, MailerError>;

    async fn render_text(
        &self,
        context: &TemplateContext,
        data: &TemplateData,
    ) -> Result<String, MailerError>;
}

/// Renders the built-in templates compiled into this crate.
#[derive(Debug, Clone, Default)]
pub struct AskamaTemplateEngine;

impl AskamaTemplateEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateEngine for AskamaTemplateEngine {
    async fn render_html(
        &self,
        context: &TemplateContext,
        data: &TemplateData,
    ) -> Result<String, MailerError> {
        let TemplateContext {
            app_name,
            app_url,
            user_name,
        } = context.clone();

        let html = match data {
            TemplateData::Verification { link, expires_in } => VerificationTemplate {
                app_name,
                app_url,
                user_name,
                link: link.clone(),
                expires_in: describe_lifetime(*expires_in),
            }
            .render()?,
            TemplateData::PasswordReset { link, expires_in } => PasswordResetTemplate {
                app_name,
                app_url,
                user_name,
                link: link.clone(),
                expires_in: describe_lifetime(*expires_in),
            }
            .render()?,
            TemplateData::PasswordChanged => PasswordChangedTemplate {
                app_name,
                app_url,
                user_name,
            }
            .render()?,
        };

        Ok(html)
    }

    /// Plain-text alternative derived from the HTML body.
    async fn render_text(
        &self,
        context: &TemplateContext,
        data: &TemplateData,
    ) -> Result<String, MailerError> {
        let html = self.render_html(context, data).await?;

        let text = HEAD
            .replace(&html, "")
            .replace("<br>", "\n")
            .replace("</p>", "\n\n")
            .replace("</h2>", "\n\n")
            .replace("<hr", "\n<hr");
        let text = TAG.replace_all(&text, "");
        let text = BLANK_LINES.replace_all(&text, "\n\n");

        Ok(text
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context() -> TemplateContext {
        TemplateContext {
            app_name: "Test Admin".to_string(),
            app_url: "https://admin.test".to_string(),
            user_name: Some("Ada".to_string()),
        }
    }

    #[tokio::test]
    async fn test_render_verification() {
        let engine = AskamaTemplateEngine::new();
        let data = TemplateData::Verification {
            link: "https://admin.test/verify-email?token=abc123".to_string(),
            expires_in: Duration::from_secs(24 * 3600),
        };

        let html = engine.render_html(&context(), &data).await.unwrap();
        assert!(html.contains("token=abc123"));
        assert!(html.contains("Test Admin"));
        assert!(html.contains("Hi Ada,"));
        assert!(html.contains("24 hours"));
    }

    #[tokio::test]
    async fn test_render_text_strips_markup() {
        let engine = AskamaTemplateEngine::new();
        let data = TemplateData::PasswordReset {
            link: "https://admin.test/reset-password?token=xyz789".to_string(),
            expires_in: Duration::from_secs(3600),
        };

        let text = engine.render_text(&context(), &data).await.unwrap();
        assert!(!text.contains('<'));
        assert!(!text.contains("font-family"));
        assert!(text.contains("token=xyz789"));
        assert!(text.contains("stops working in 1 hour"));
    }

    #[tokio::test]
    async fn test_render_password_changed_without_name() {
        let engine = AskamaTemplateEngine::new();
        let context = TemplateContext {
            user_name: None,
            ..context()
        };

        let html = engine
            .render_html(&context, &TemplateData::PasswordChanged)
            .await
            .unwrap();
        assert!(html.contains("Hi,"));
        assert!(html.contains("password was just changed"));
    }
}
