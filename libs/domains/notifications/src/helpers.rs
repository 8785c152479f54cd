//! Canned notifications for account, moderation and partnership events.

use chrono::{DateTime, Utc};
use domain_organizations::{Organization, OrganizationId};
use domain_users::{User, UserId};
use handlebars::html_escape;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{NotificationPriority, NotificationType};
use crate::outcome::DispatchReport;
use crate::providers::SentEmail;
use crate::service::{DispatchRequest, NotificationService};

/// A partnership request submitted through the advertising form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AdvertisingInquiry {
    #[validate(length(min = 1, max = 255))]
    pub organization_name: String,
    #[validate(length(min = 1, max = 255))]
    pub contact_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub organization_type: String,
    pub website: Option<String>,
    pub ad_package: String,
    pub budget: Option<String>,
    pub campaign_goals: Option<String>,
    pub target_audience: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl AdvertisingInquiry {
    /// Reference quoted back to the inquirer.
    pub fn reference(&self) -> String {
        format!("ADV-{}", self.submitted_at.format("%Y%m%d%H%M%S"))
    }
}

fn or_placeholder(value: &Option<String>, placeholder: &str) -> String {
    html_escape(value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(placeholder))
}

impl NotificationService {
    async fn require_user(&self, user_id: UserId) -> NotificationResult<User> {
        self.stores
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(NotificationError::UserNotFound(user_id))
    }

    async fn require_org_with_admin(&self, org_id: OrganizationId) -> NotificationResult<(Organization, UserId)> {
        let org = self
            .stores
            .organizations
            .get_by_id(org_id)
            .await?
            .ok_or(NotificationError::OrganizationNotFound(org_id))?;
        let admin = org
            .admin_user_id
            .ok_or(NotificationError::OrganizationWithoutAdmin(org_id))?;
        Ok((org, admin))
    }

    pub async fn send_welcome(&self, user_id: UserId, verification_token: Option<&str>) -> NotificationResult<DispatchReport> {
        let user = self.require_user(user_id).await?;
        let site = &self.config.site_name;

        let mut request = DispatchRequest::new(
            user_id,
            NotificationType::Welcome,
            format!("Welcome to {}!", site),
            format!("Welcome {}! Your account has been created successfully.", user.display_name()),
        )
        .priority(NotificationPriority::High)
        .var("user_name", user.display_name());

        if let Some(token) = verification_token {
            request = request.var("verification_url", self.config.link(&format!("/verify-email?token={}", token))?);
        } else {
            self.config.require_frontend_url()?;
        }

        self.dispatch_to(&user, &request).await
    }

    /// Tell an organization's admin about a moderation decision.
    pub async fn send_organization_decision(&self, org_id: OrganizationId, approved: bool) -> NotificationResult<DispatchReport> {
        let (org, admin) = self.require_org_with_admin(org_id).await?;
        let dashboard_url = self.config.link("/organization-dashboard")?;

        let (ty, subject, message) = if approved {
            (
                NotificationType::OrganizationApproved,
                format!("Congratulations! {} has been approved", org.name),
                format!(
                    "Your organization {} has been approved and is now live on {}!",
                    org.name, self.config.site_name
                ),
            )
        } else {
            (
                NotificationType::OrganizationRejected,
                format!("Update on {} application", org.name),
                format!(
                    "We regret to inform you that {} application needs revision. Please check your dashboard for details.",
                    org.name
                ),
            )
        };

        let request = DispatchRequest::new(admin, ty, subject, message)
            .priority(NotificationPriority::High)
            .var("organization_name", org.name.as_str())
            .var("dashboard_url", dashboard_url);

        self.send_notification(request).await
    }

    pub async fn send_contact_message(
        &self,
        org_id: OrganizationId,
        sender_name: &str,
        message_subject: &str,
    ) -> NotificationResult<DispatchReport> {
        let (org, admin) = self.require_org_with_admin(org_id).await?;
        let dashboard_url = self.config.link("/org-dashboard")?;

        let request = DispatchRequest::new(
            admin,
            NotificationType::ContactMessage,
            format!("New message for {}", org.name),
            format!("New contact message from {} for {}: {}", sender_name, org.name, message_subject),
        )
        .var("organization_name", org.name.as_str())
        .var("sender_name", sender_name)
        .var("message_subject", message_subject)
        .var("dashboard_url", dashboard_url);

        self.send_notification(request).await
    }

    /// Email only.
    pub async fn send_password_reset(&self, user_id: UserId, reset_token: &str) -> NotificationResult<DispatchReport> {
        let user = self.require_user(user_id).await?;
        let reset_url = self.config.link(&format!("/reset-password?token={}", reset_token))?;

        let request = DispatchRequest::new(
            user_id,
            NotificationType::PasswordReset,
            format!("Password Reset Request - {}", self.config.site_name),
            "You have requested to reset your password. Click the link in your email to continue.",
        )
        .send_in_app(false)
        .priority(NotificationPriority::High)
        .var("user_name", user.display_name())
        .var("reset_url", reset_url);

        self.dispatch_to(&user, &request).await
    }

    /// Email only.
    pub async fn send_email_verification(&self, user_id: UserId, verification_token: &str) -> NotificationResult<DispatchReport> {
        let user = self.require_user(user_id).await?;
        let verify_url = self.config.link(&format!("/verify-email?token={}", verification_token))?;

        let request = DispatchRequest::new(
            user_id,
            NotificationType::EmailVerification,
            format!("Verify your email - {}", self.config.site_name),
            "Please verify your email address to complete your registration.",
        )
        .send_in_app(false)
        .priority(NotificationPriority::High)
        .var("user_name", user.display_name())
        .var("verify_url", verify_url);

        self.dispatch_to(&user, &request).await
    }

    /// Forward an advertising inquiry to the partnerships mailbox.
    pub async fn send_advertising_inquiry(&self, inquiry: &AdvertisingInquiry) -> NotificationResult<SentEmail> {
        inquiry.validate()?;

        let subject = format!("New Advertising Inquiry from {}", inquiry.organization_name);
        let additional = inquiry
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(|m| format!("<h3>Additional Message:</h3><p>{}</p>", html_escape(m)))
            .unwrap_or_default();

        let content = format!(
            r#"<h2>New Advertising Inquiry Received</h2>
<p>A new advertising inquiry has been submitted through the website.</p>
<h3>Organization Details:</h3>
<ul>
    <li><strong>Organization Name:</strong> {org}</li>
    <li><strong>Contact Person:</strong> {contact}</li>
    <li><strong>Email:</strong> {email}</li>
    <li><strong>Phone:</strong> {phone}</li>
    <li><strong>Organization Type:</strong> {org_type}</li>
    <li><strong>Website:</strong> {website}</li>
</ul>
<h3>Advertising Details:</h3>
<ul>
    <li><strong>Package Interest:</strong> {package}</li>
    <li><strong>Budget Range:</strong> {budget}</li>
    <li><strong>Campaign Goals:</strong> {goals}</li>
    <li><strong>Target Audience:</strong> {audience}</li>
</ul>
{additional}
<p><strong>Submitted on:</strong> {submitted} UTC</p>
<p>Please respond to this inquiry within 2-3 business days.</p>"#,
            org = html_escape(&inquiry.organization_name),
            contact = html_escape(&inquiry.contact_name),
            email = html_escape(&inquiry.email),
            phone = or_placeholder(&inquiry.phone, "Not provided"),
            org_type = html_escape(&inquiry.organization_type),
            website = or_placeholder(&inquiry.website, "Not provided"),
            package = html_escape(&inquiry.ad_package),
            budget = or_placeholder(&inquiry.budget, "Not specified"),
            goals = or_placeholder(&inquiry.campaign_goals, "Not provided"),
            audience = or_placeholder(&inquiry.target_audience, "Not provided"),
            submitted = inquiry.submitted_at.format("%Y-%m-%d %H:%M:%S"),
        );

        let partnerships = self.config.partnerships_email.clone();
        self.send_direct(&partnerships, &subject, &content, Some(&inquiry.email)).await
    }

    /// Acknowledge an advertising inquiry to the person who sent it.
    pub async fn send_advertising_confirmation(&self, inquiry: &AdvertisingInquiry) -> NotificationResult<SentEmail> {
        inquiry.validate()?;

        let subject = "Your Advertising Inquiry - Confirmation Received";
        let content = format!(
            r#"<h2>Thank You for Your Advertising Inquiry!</h2>
<p>Dear {contact},</p>
<p>Thank you for your interest in advertising with {site}. Our partnerships team will review your inquiry carefully.</p>
<h3>Your Inquiry Summary:</h3>
<ul>
    <li><strong>Organization:</strong> {org}</li>
    <li><strong>Package Interest:</strong> {package}</li>
    <li><strong>Budget Range:</strong> {budget}</li>
    <li><strong>Inquiry ID:</strong> {reference}</li>
</ul>
<h3>What Happens Next?</h3>
<ul>
    <li>Our partnerships team will review your inquiry within 2-3 business days</li>
    <li>We will contact you by email to discuss your advertising needs</li>
    <li>We will send a proposal with pricing information</li>
</ul>
<p>If you have questions in the meantime, write to {partnerships}.</p>
<p>Best regards,<br>The {site} Partnerships Team</p>"#,
            contact = html_escape(&inquiry.contact_name),
            site = html_escape(&self.config.site_name),
            org = html_escape(&inquiry.organization_name),
            package = html_escape(&inquiry.ad_package),
            budget = or_placeholder(&inquiry.budget, "Not specified"),
            reference = inquiry.reference(),
            partnerships = html_escape(&self.config.partnerships_email),
        );

        self.send_direct(&inquiry.email, subject, &content, None).await
    }
}
