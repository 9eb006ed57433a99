//! 共用测试夹具：临时 SQLite 数据库、组装好的服务，以及记录发送内容的邮件桩

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tempfile::TempDir;

use unswtalk::api::jwt::TokenService;
use unswtalk::config::{StaticConfig, get_config, replace_config};
use unswtalk::services::{AppServices, MailMessage, Mailer, SignupForm};
use unswtalk::storage::SeaOrmStorage;

pub const PUBLIC_URL: &str = "http://talk.test";
pub const PASSWORD: &str = "hunter22";

static INIT: Once = Once::new();

/// 整个测试二进制只安装一次配置
pub fn init_test_config() {
    INIT.call_once(|| {
        let mut config = StaticConfig::default();
        config.server.public_url = PUBLIC_URL.to_string();
        config.session.jwt_secret = "integration-test-secret".to_string();
        config.feed.items_per_page = 3;
        config.media.max_upload_bytes = 64 * 1024;
        replace_config(config);
    });
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 发给 `to` 的最新邮件中链接的路径部分
    pub fn last_link_to(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| m.body.lines().last().map(str::to_string))
            .and_then(|url| url.strip_prefix(PUBLIC_URL).map(str::to_string))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> unswtalk::errors::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub storage: Arc<SeaOrmStorage>,
    pub services: Arc<AppServices>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestEnv {
    pub async fn new() -> Self {
        init_test_config();

        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("talk.db").display());
        let storage = Arc::new(
            SeaOrmStorage::new(&db_url, "sqlite")
                .await
                .expect("Failed to open test database"),
        );

        let mut config = (*get_config()).clone();
        config.media.upload_dir = dir.path().join("uploads").display().to_string();
        std::fs::create_dir_all(&config.media.upload_dir).expect("Failed to create upload dir");

        let mailer = Arc::new(RecordingMailer::default());
        let services = Arc::new(AppServices::new(
            &config,
            storage.clone(),
            Arc::new(TokenService::from_config()),
            mailer.clone(),
        ));

        Self {
            dir,
            storage,
            services,
            mailer,
        }
    }

    /// 以 [`PASSWORD`] 注册并验证 `z_id`，姓名为 `name`
    pub async fn member(&self, z_id: &str, name: &str) {
        self.services
            .accounts
            .signup(SignupForm {
                z_id: z_id.to_string(),
                name: name.to_string(),
                email: email_of(z_id),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("signup failed");
        self.services
            .accounts
            .mark_verified(z_id)
            .await
            .expect("verify failed");
    }

    /// 让 `a` 与 `b` 成为好友
    pub async fn befriend(&self, a: &str, b: &str) {
        self.services.friends.send_request(a, b).await.unwrap();
        self.services.friends.accept(a, b, b).await.unwrap();
    }
}

pub fn email_of(z_id: &str) -> String {
    format!("{}@student.unsw.edu.au", z_id)
}
