use crate::{
    Body, Email, MailerError,
    templates::{TemplateContext, TemplateData, TemplateEngine},
};
use std::time::Duration;

async fn render<T: TemplateEngine>(
    engine: &T,
    from: &str,
    to: &str,
    subject: String,
    context: &TemplateContext,
    data: TemplateData,
) -> Result<Email, MailerError> {
    let body = Body::Alternative {
        text: engine.render_text(context, &data).await?,
        html: engine.render_html(context, &data).await?,
    };
    Email::new(from, to, subject, body)
}

pub struct VerificationEmail;

impl VerificationEmail {
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &str,
        to: &str,
        link: &str,
        expires_in: Duration,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let subject = format!("Verify your email for {}", context.app_name);
        let data = TemplateData::Verification {
            link: link.to_string(),
            expires_in,
        };
        render(engine, from, to, subject, &context, data).await
    }
}

pub struct PasswordResetEmail;

impl PasswordResetEmail {
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &str,
        to: &str,
        link: &str,
        expires_in: Duration,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let subject = format!("Reset your {} password", context.app_name);
        let data = TemplateData::PasswordReset {
            link: link.to_string(),
            expires_in,
        };
        render(engine, from, to, subject, &context, data).await
    }
}

pub struct PasswordChangedEmail;

impl PasswordChangedEmail {
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &str,
        to: &str,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let subject = format!("Your {} password has been changed", context.app_name);
        render(engine, from, to, subject, &context, TemplateData::PasswordChanged).await
    }
}
