//! 邮件发送
//!
//! 只发送三类邮件：账号验证、密码重置与好友请求。
//! 投递通过 [`Mailer`] trait 完成；
//! 调用方记录失败后继续执行。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use ureq::Agent;

use crate::config::MailConfig;
use crate::errors::{Result, TalkError};

const HTTP_TIMEOUT_SECS: u64 = 5;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn verification(to: &str, z_id: &str, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "UNSWtalk Account Verification".to_string(),
            body: format!(
                "Hi {},\nWelcome to UNSWtalk! Click the link below to verify your account:\n{}",
                z_id, url
            ),
        }
    }

    pub fn password_reset(to: &str, z_id: &str, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "UNSWtalk Password Reset".to_string(),
            body: format!(
                "Hi {},\nClick the link below to reset your password:\n{}",
                z_id, url
            ),
        }
    }

    pub fn friend_request(to: &str, reference: &str, friend: &str, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "UNSWtalk Friend Request".to_string(),
            body: format!(
                "Hi {},\n{} wants to add you as a friend. Click the link below to accept:\n{}",
                friend, reference, url
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<()>;
}

/// 只把邮件写入日志，不真正发送
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail (not delivered):\n{}",
            message.body
        );
        Ok(())
    }
}

/// 把每封邮件以 JSON POST 到中继地址
pub struct WebhookMailer {
    url: String,
    sender: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    from: &'a str,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sender: sender.into(),
        }
    }

    fn post_sync(url: &str, sender: &str, message: &MailMessage) -> Result<()> {
        let payload = WebhookPayload {
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
            from: sender,
        };

        get_agent()
            .post(url)
            .send_json(&payload)
            .map(|_| ())
            .map_err(|e| TalkError::mail(format!("Webhook {} rejected mail: {}", url, e)))
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        let url = self.url.clone();
        let sender = self.sender.clone();
        let to = message.to.clone();

        tokio::task::spawn_blocking(move || Self::post_sync(&url, &sender, &message))
            .await
            .map_err(|e| TalkError::mail(format!("Mail task failed: {}", e)))??;

        info!("Mail sent to {}", to);
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.webhook_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            info!("Mail delivery via webhook {}", url);
            Arc::new(WebhookMailer::new(url, config.sender.clone()))
        }
        None => {
            warn!("No mail webhook configured; outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// 发送邮件，失败时只记日志
pub async fn deliver(mailer: &dyn Mailer, message: MailMessage) {
    let to = message.to.clone();
    if let Err(e) = mailer.send(message).await {
        warn!("Mail to {} failed: {}", to, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_text() {
        let m = MailMessage::password_reset("a@b.c", "z5000001", "http://x/reset/tok");
        assert_eq!(
            m.body,
            "Hi z5000001,\nClick the link below to reset your password:\nhttp://x/reset/tok"
        );
    }

    #[test]
    fn test_friend_request_text() {
        let m = MailMessage::friend_request("b@x", "z5000001", "z5000002", "http://x/addfriend/z5000001/z5000002");
        assert!(m.body.starts_with("Hi z5000002,\nz5000001 wants to add you as a friend."));
        assert!(m.body.ends_with("/addfriend/z5000001/z5000002"));
    }

    #[test]
    fn test_mailer_from_config_defaults_to_log() {
        let config = MailConfig::default();
        // 只检查构造；LogMailer 没有可观察的状态
        let _mailer = mailer_from_config(&config);
    }

    #[tokio::test]
    async fn test_webhook_failure_is_an_error_not_a_panic() {
        let mailer = WebhookMailer::new("http://127.0.0.1:9/unreachable", "noreply@test");
        let result = mailer
            .send(MailMessage::verification("a@b.c", "z5000001", "http://x"))
            .await;
        assert!(matches!(result, Err(TalkError::Mail(_))));
    }

    #[tokio::test]
    async fn test_deliver_swallows_errors() {
        let mailer = WebhookMailer::new("http://127.0.0.1:9/unreachable", "noreply@test");
        deliver(&mailer, MailMessage::verification("a@b.c", "z5000001", "http://x")).await;
    }
}
