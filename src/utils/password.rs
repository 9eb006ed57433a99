//! 密码哈希工具
//!
//! 新密码一律存为 Argon2id PHC 字符串。
//! 旧数据集导入的行可能仍是明文，见 [`check_password`]。

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;

#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

/// 登录密码与存储密码的比对结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Rejected,
    Accepted,
    /// 与旧明文匹配；调用方应改存哈希
    AcceptedLegacy,
}

pub fn check_password(password: &str, stored: &str) -> Result<PasswordCheck, PasswordError> {
    if is_argon2_hash(stored) {
        return Ok(if verify_password(password, stored)? {
            PasswordCheck::Accepted
        } else {
            PasswordCheck::Rejected
        });
    }

    if bool::from(password.as_bytes().ct_eq(stored.as_bytes())) {
        Ok(PasswordCheck::AcceptedLegacy)
    } else {
        Ok(PasswordCheck::Rejected)
    }
}
