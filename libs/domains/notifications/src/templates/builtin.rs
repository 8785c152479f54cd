//! Templates compiled into the binary. Files in `EMAIL_TEMPLATES_DIR` with the
//! same name replace these.

pub const LAYOUT_PARTIAL: &str = "layout";

pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{subject}}</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 0; background-color: #f4f4f4; }
        .container { max-width: 600px; margin: 0 auto; background-color: #ffffff; padding: 20px; }
        .header { text-align: center; padding: 20px 0; border-bottom: 1px solid #e0e0e0; }
        .logo { font-size: 24px; font-weight: bold; color: #2196F3; }
        .content { padding: 30px 0; }
        .button { display: inline-block; background-color: #2196F3; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; margin: 20px 0; }
        .footer { text-align: center; padding: 20px 0; border-top: 1px solid #e0e0e0; color: #666; font-size: 12px; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div class="logo">{{site_name}}</div>
        </div>
        <div class="content">
            {{> @partial-block}}
        </div>
        <div class="footer">
            <p>&copy; {{year}} {{site_name}}. All rights reserved.</p>
            <p>If you no longer wish to receive these emails, you can <a href="{{unsubscribe_url}}">unsubscribe here</a>.</p>
        </div>
    </div>
</body>
</html>"#;

pub const DEFAULT: &str = r#"{{#> layout}}
{{{content}}}
{{/layout}}"#;

pub const WELCOME: &str = r#"{{#> layout}}
<h1>Welcome{{#if user_name}}, {{user_name}}{{/if}}!</h1>
<p>{{{content}}}</p>
{{#if verification_url}}
<p>Please confirm your email address to finish setting up your account.</p>
<a class="button" href="{{verification_url}}">Verify email</a>
{{/if}}
<p>Start exploring organizations at <a href="{{frontend_url}}">{{site_name}}</a>.</p>
{{/layout}}"#;

pub const EMAIL_VERIFICATION: &str = r#"{{#> layout}}
<h1>Verify your email</h1>
<p>Hello{{#if user_name}} {{user_name}}{{/if}},</p>
<p>{{{content}}}</p>
<a class="button" href="{{verify_url}}">Verify email</a>
<p>If you did not create an account, you can ignore this email.</p>
{{/layout}}"#;

pub const PASSWORD_RESET: &str = r#"{{#> layout}}
<h1>Password reset</h1>
<p>Hello{{#if user_name}} {{user_name}}{{/if}},</p>
<p>{{{content}}}</p>
<a class="button" href="{{reset_url}}">Reset password</a>
<p>If you did not request this, your password will stay the same.</p>
{{/layout}}"#;

pub const ORGANIZATION_APPROVED: &str = r#"{{#> layout}}
<h1>{{organization_name}} is live</h1>
<p>{{{content}}}</p>
<a class="button" href="{{dashboard_url}}">Open your dashboard</a>
{{/layout}}"#;

pub const ORGANIZATION_REJECTED: &str = r#"{{#> layout}}
<h1>Update on {{organization_name}}</h1>
<p>{{{content}}}</p>
<a class="button" href="{{dashboard_url}}">Review your application</a>
{{/layout}}"#;

pub const CONTACT_MESSAGE: &str = r#"{{#> layout}}
<h1>New message for {{organization_name}}</h1>
<p><strong>{{sender_name}}</strong> wrote: {{message_subject}}</p>
<p>{{{content}}}</p>
<a class="button" href="{{dashboard_url}}">Read the message</a>
{{/layout}}"#;

/// Plain-text alternative sent with every email.
pub const TEXT: &str = r#"{{subject}}

{{content}}

--
{{site_name}}
Unsubscribe: {{unsubscribe_url}}"#;

/// `(template name, source)` for every built-in HTML body.
pub const HTML_TEMPLATES: &[(&str, &str)] = &[
    ("default", DEFAULT),
    ("welcome", WELCOME),
    ("email_verification", EMAIL_VERIFICATION),
    ("password_reset", PASSWORD_RESET),
    ("organization_approved", ORGANIZATION_APPROVED),
    ("organization_rejected", ORGANIZATION_REJECTED),
    ("contact_message", CONTACT_MESSAGE),
];
