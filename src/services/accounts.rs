//! 注册、邮箱验证、登录与密码重置

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::jwt::{TokenKind, TokenService};
use crate::errors::{Result, TalkError};
use crate::services::mail::{MailMessage, Mailer, deliver};
use crate::services::names::NameDirectory;
use crate::storage::{NewUser, SeaOrmStorage, User};
use crate::utils::{generate_secure_token, is_valid_zid};
use crate::utils::password::{PasswordCheck, check_password, hash_password};

pub const MIN_PASSWORD_LEN: usize = 6;

const BAD_LOGIN: &str = "Unknown username or password";

const BAD_RESET_LINK: &str = "This reset link is invalid or has expired";

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub z_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_zid(self.z_id.trim()) {
            return Err(TalkError::validation("zID must look like z1234567"));
        }
        if self.name.trim().is_empty() {
            return Err(TalkError::validation("Name is required"));
        }
        if !self.email.contains('@') {
            return Err(TalkError::validation("A valid e-mail address is required"));
        }
        validate_password(&self.password)
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TalkError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub struct AccountService {
    storage: Arc<SeaOrmStorage>,
    tokens: Arc<TokenService>,
    mailer: Arc<dyn Mailer>,
    names: NameDirectory,
    public_url: String,
}

impl AccountService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn Mailer>,
        names: NameDirectory,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            tokens,
            mailer,
            names,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }

    /// 创建未验证账号并发送验证邮件
    pub async fn signup(&self, form: SignupForm) -> Result<()> {
        form.validate()?;

        let z_id = form.z_id.trim().to_string();
        let new_user = NewUser {
            z_id: z_id.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash: hash_password(&form.password)?,
        };
        self.storage.insert_user(&new_user).await?;
        self.names.invalidate(&z_id).await;

        let token = self.tokens.issue(TokenKind::Verify, &z_id)?;
        let url = self.link(&format!("/verify/{}", token));
        deliver(
            self.mailer.as_ref(),
            MailMessage::verification(&new_user.email, &z_id, &url),
        )
        .await;

        Ok(())
    }

    /// 将验证令牌对应的账号标记为已验证
    pub async fn verify(&self, token: &str) -> Result<String> {
        let z_id = self
            .tokens
            .validate(TokenKind::Verify, token)
            .map_err(|_| TalkError::token("This verification link is invalid or has expired"))?;

        if !self.storage.mark_verified(&z_id).await? {
            return Err(TalkError::not_found("Unknown user"));
        }
        info!("Account verified: {}", z_id);
        Ok(z_id)
    }

    /// 校验凭据；导入数据中的明文密码会就地升级为哈希
    pub async fn login(&self, z_id: &str, password: &str) -> Result<User> {
        let z_id = z_id.trim();
        let user = self
            .storage
            .get_user(z_id)
            .await?
            .ok_or_else(|| TalkError::unauthorized(BAD_LOGIN))?;

        match check_password(password, &user.password)? {
            PasswordCheck::Rejected => return Err(TalkError::unauthorized(BAD_LOGIN)),
            PasswordCheck::Accepted => {}
            PasswordCheck::AcceptedLegacy => {
                let hash = hash_password(password)?;
                self.storage.set_password(z_id, &hash).await?;
                info!("Upgraded legacy password storage for {}", z_id);
            }
        }

        if !user.verified {
            return Err(TalkError::forbidden(
                "Please verify your account before logging in",
            ));
        }

        info!("User logged in: {}", z_id);
        Ok(user)
    }

    pub fn session_token(&self, z_id: &str) -> Result<String> {
        Ok(self.tokens.issue(TokenKind::Session, z_id)?)
    }

    /// 会话令牌仍有效时返回其所属 zID
    pub fn session_user(&self, token: &str) -> Option<String> {
        self.tokens.validate(TokenKind::Session, token).ok()
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.tokens.ttl(TokenKind::Session).num_seconds()
    }

    /// 发送密码重置邮件
    pub async fn request_reset(&self, z_id: &str) -> Result<()> {
        let z_id = z_id.trim();
        let user = self
            .storage
            .get_user(z_id)
            .await?
            .ok_or_else(|| TalkError::not_found("Unknown user"))?;

        // 每次申请都换新凭据，之前发出的链接随即失效
        let nonce = generate_secure_token();
        self.storage.set_reset_nonce(z_id, &nonce).await?;
        let token = self
            .tokens
            .issue_with_nonce(TokenKind::Reset, z_id, Some(&nonce))?;
        let url = self.link(&format!("/reset/{}", token));
        deliver(
            self.mailer.as_ref(),
            MailMessage::password_reset(&user.email, z_id, &url),
        )
        .await;
        Ok(())
    }

    /// 重置令牌对应的 zID，不消费令牌
    pub async fn reset_target(&self, token: &str) -> Result<String> {
        let (z_id, nonce) = self.reset_claims(token)?;
        match self.storage.reset_nonce_of(&z_id).await? {
            Some(current) if current == nonce => Ok(z_id),
            _ => Err(TalkError::token(BAD_RESET_LINK)),
        }
    }

    fn reset_claims(&self, token: &str) -> Result<(String, String)> {
        let claims = self
            .tokens
            .claims(TokenKind::Reset, token)
            .map_err(|_| TalkError::token(BAD_RESET_LINK))?;
        let nonce = claims.nonce.ok_or_else(|| TalkError::token(BAD_RESET_LINK))?;
        Ok((claims.sub, nonce))
    }

    /// 通过重置链接设置新密码，之后用户处于登录状态。
    /// 成功后链接作废。
    pub async fn reset(&self, token: &str, password: &str) -> Result<User> {
        let (z_id, nonce) = self.reset_claims(token)?;
        validate_password(password)?;

        if !self.storage.consume_reset_nonce(&z_id, &nonce).await? {
            warn!("Rejected spent or superseded reset link for {}", z_id);
            return Err(TalkError::token(BAD_RESET_LINK));
        }

        self.set_password(&z_id, password).await?;
        let user = self
            .storage
            .get_user(&z_id)
            .await?
            .ok_or_else(|| TalkError::not_found("Unknown user"))?;

        if !user.verified {
            // 能收到重置邮件即证明拥有该邮箱
            self.storage.mark_verified(&z_id).await?;
        }
        Ok(User {
            verified: true,
            ..user
        })
    }

    pub async fn set_password(&self, z_id: &str, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        if !self.storage.set_password(z_id, &hash).await? {
            return Err(TalkError::not_found("Unknown user"));
        }
        info!("Password changed for {}", z_id);
        Ok(())
    }

    pub async fn mark_verified(&self, z_id: &str) -> Result<()> {
        if !self.storage.mark_verified(z_id).await? {
            warn!("verify requested for unknown user {}", z_id);
            return Err(TalkError::not_found("Unknown user"));
        }
        Ok(())
    }
}
