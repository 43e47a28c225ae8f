use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
    base_url: String,
    website_name: String,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig, base_url: &str, website_name: &str) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            website_name: website_name.to_string(),
        })
    }

    /// Sends the account-activation email with its one-shot token link.
    pub async fn send_activation_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        token: &str,
    ) -> ServiceResult<()> {
        let subject = format!("تفعيل حسابك في {}", self.website_name);
        let action_url = format!("{}/auth/activate?token={}", self.base_url, token);

        let html_content = self.build_action_html(
            recipient_name,
            "مرحباً بك! اضغط على الزر أدناه لتفعيل حسابك.",
            "تفعيل الحساب",
            &action_url,
            "تنتهي صلاحية هذا الرابط خلال 24 ساعة. إذا لم تقم بإنشاء هذا الحساب يمكنك تجاهل هذه الرسالة.",
        );
        let text_content = self.build_action_text(
            recipient_name,
            "اضغط على الرابط التالي لتفعيل حسابك:",
            &action_url,
        );

        self.send_email(recipient_email, &subject, &html_content, &text_content)
            .await
    }

    /// Sends the password-reset email with its one-shot token link.
    pub async fn send_password_reset_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        token: &str,
    ) -> ServiceResult<()> {
        let subject = format!("إعادة تعيين كلمة المرور في {}", self.website_name);
        // Lands on the site's update-password form, which posts the token.
        let action_url = format!("{}/update-password?token={}", self.base_url, token);

        let html_content = self.build_action_html(
            recipient_name,
            "وصلنا طلب لإعادة تعيين كلمة المرور الخاصة بحسابك.",
            "إعادة تعيين كلمة المرور",
            &action_url,
            "تنتهي صلاحية هذا الرابط خلال ساعة واحدة. إذا لم تطلب إعادة التعيين يمكنك تجاهل هذه الرسالة.",
        );
        let text_content = self.build_action_text(
            recipient_name,
            "اضغط على الرابط التالي لإعادة تعيين كلمة المرور:",
            &action_url,
        );

        self.send_email(recipient_email, &subject, &html_content, &text_content)
            .await
    }

    /// Sends a generic email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn build_action_html(
        &self,
        recipient_name: &str,
        intro: &str,
        button_label: &str,
        action_url: &str,
        footer: &str,
    ) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html dir="rtl" lang="ar">
            <head>
                <meta charset="UTF-8">
                <title>{}</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">{}</h2>

                    <p>أهلاً {}،</p>

                    <p>{}</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{}"
                           style="background-color: #3498db; color: white; padding: 12px 30px;
                                  text-decoration: none; border-radius: 5px; display: inline-block;">
                            {}
                        </a>
                    </div>

                    <p>أو انسخ الرابط التالي والصقه في المتصفح:</p>
                    <p style="word-break: break-all; color: #7f8c8d;">{}</p>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">{}</p>
                </div>
            </body>
            </html>
            "#,
            self.website_name,
            self.website_name,
            recipient_name,
            intro,
            action_url,
            button_label,
            action_url,
            footer
        )
    }

    fn build_action_text(&self, recipient_name: &str, intro: &str, action_url: &str) -> String {
        format!(
            r#"{}

أهلاً {}،

{}
{}
            "#,
            self.website_name, recipient_name, intro, action_url
        )
    }
}
