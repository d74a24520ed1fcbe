use askama::Template;
use serde::{Deserialize, Serialize};

/// Values shared by every message: who is sending and to whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub app_name: String,
    pub app_url: String,
    pub user_name: Option<String>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            app_name: "Wayfarer Admin".to_string(),
            app_url: "http://localhost:3000".to_string(),
            user_name: None,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"
<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Confirm your email | {{ app_name }}</title>
</head>
<body style="margin:0;padding:24px;background:#eef1f4;font:15px/1.5 system-ui,sans-serif;color:#1f2933">
<main style="max-width:560px;margin:auto;background:#fff;border-top:4px solid #0b7285;padding:28px">
<h2 style="margin-top:0">{{ app_name }}</h2>
<p>{% match user_name %}{% when Some with (name) %}Hi {{ name }},{% when None %}Hi,{% endmatch %}</p>
<p>Confirm this address belongs to you:</p>
<p><a href="{{ link|safe }}" style="display:inline-block;padding:10px 20px;background:#0b7285;color:#fff;border-radius:3px;text-decoration:none">Confirm email</a></p>
<p style="font-size:13px">Link not working? Paste this address into your browser:<br><code style="word-break:break-all">{{ link|safe }}</code></p>
<p>This link works once and stops working in {{ expires_in }}.</p>
<hr style="border:0;border-top:1px solid #d9e2ec">
<small style="color:#627d98">Didn't sign up? Ignore this message. {{ app_url }}</small>
</main>
</body>
</html>
"#,
    ext = "html"
)]
pub struct VerificationTemplate {
    pub app_name: String,
    pub app_url: String,
    pub user_name: Option<String>,
    pub link: String,
    pub expires_in: String,
}

#[derive(Template)]
#[template(
    source = r#"
<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Password reset | {{ app_name }}</title>
</head>
<body style="margin:0;padding:24px;background:#eef1f4;font:15px/1.5 system-ui,sans-serif;color:#1f2933">
<main style="max-width:560px;margin:auto;background:#fff;border-top:4px solid #c92a2a;padding:28px">
<h2 style="margin-top:0">{{ app_name }}</h2>
<p>{% match user_name %}{% when Some with (name) %}Hi {{ name }},{% when None %}Hi,{% endmatch %}</p>
<p>Someone asked to reset the password on your account. Pick a new password here:</p>
<p><a href="{{ link|safe }}" style="display:inline-block;padding:10px 20px;background:#c92a2a;color:#fff;border-radius:3px;text-decoration:none">Choose a new password</a></p>
<p style="font-size:13px">Link not working? Paste this address into your browser:<br><code style="word-break:break-all">{{ link|safe }}</code></p>
<p>This link works once and stops working in {{ expires_in }}. Asking for another reset cancels it.</p>
<hr style="border:0;border-top:1px solid #d9e2ec">
<small style="color:#627d98">Didn't ask for this? Your current password still works. {{ app_url }}</small>
</main>
</body>
</html>
"#,
    ext = "html"
)]
pub struct PasswordResetTemplate {
    pub app_name: String,
    pub app_url: String,
    pub user_name: Option<String>,
    pub link: String,
    pub expires_in: String,
}

#[derive(Template)]
#[template(
    source = r#"
<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Password changed | {{ app_name }}</title>
</head>
<body style="margin:0;padding:24px;background:#eef1f4;font:15px/1.5 system-ui,sans-serif;color:#1f2933">
<main style="max-width:560px;margin:auto;background:#fff;border-top:4px solid #2b8a3e;padding:28px">
<h2 style="margin-top:0">{{ app_name }}</h2>
<p>{% match user_name %}{% when Some with (name) %}Hi {{ name }},{% when None %}Hi,{% endmatch %}</p>
<p><strong>Your password was just changed through a reset link.</strong></p>
<p>Nothing else to do if that was you. If it wasn't, tell your administrator now.</p>
<hr style="border:0;border-top:1px solid #d9e2ec">
<small style="color:#627d98">{{ app_name }} - {{ app_url }}</small>
</main>
</body>
</html>
"#,
    ext = "html"
)]
pub struct PasswordChangedTemplate {
    pub app_name: String,
    pub app_url: String,
    pub user_name: Option<String>,
}
