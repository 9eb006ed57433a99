use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum TalkError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Serialization(String),
    Token(String),
    PasswordHash(String),
    Mail(String),
    PayloadTooLarge(String),
}

impl TalkError {
    /// 稳定的错误码，显示在错误页和日志中
    pub fn code(&self) -> &'static str {
        match self {
            TalkError::DatabaseConfig(_) => "E001",
            TalkError::DatabaseConnection(_) => "E002",
            TalkError::DatabaseOperation(_) => "E003",
            TalkError::FileOperation(_) => "E004",
            TalkError::Validation(_) => "E005",
            TalkError::NotFound(_) => "E006",
            TalkError::Unauthorized(_) => "E007",
            TalkError::Forbidden(_) => "E008",
            TalkError::Conflict(_) => "E009",
            TalkError::Serialization(_) => "E010",
            TalkError::Token(_) => "E011",
            TalkError::PasswordHash(_) => "E012",
            TalkError::Mail(_) => "E013",
            TalkError::PayloadTooLarge(_) => "E014",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            TalkError::DatabaseConfig(_) => "Database Configuration Error",
            TalkError::DatabaseConnection(_) => "Database Connection Error",
            TalkError::DatabaseOperation(_) => "Database Operation Error",
            TalkError::FileOperation(_) => "File Operation Error",
            TalkError::Validation(_) => "Validation Error",
            TalkError::NotFound(_) => "Not Found",
            TalkError::Unauthorized(_) => "Unauthorized",
            TalkError::Forbidden(_) => "Forbidden",
            TalkError::Conflict(_) => "Conflict",
            TalkError::Serialization(_) => "Serialization Error",
            TalkError::Token(_) => "Token Error",
            TalkError::PasswordHash(_) => "Password Hash Error",
            TalkError::Mail(_) => "Mail Delivery Error",
            TalkError::PayloadTooLarge(_) => "Payload Too Large",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TalkError::DatabaseConfig(msg)
            | TalkError::DatabaseConnection(msg)
            | TalkError::DatabaseOperation(msg)
            | TalkError::FileOperation(msg)
            | TalkError::Validation(msg)
            | TalkError::NotFound(msg)
            | TalkError::Unauthorized(msg)
            | TalkError::Forbidden(msg)
            | TalkError::Conflict(msg)
            | TalkError::Serialization(msg)
            | TalkError::Token(msg)
            | TalkError::PasswordHash(msg)
            | TalkError::Mail(msg)
            | TalkError::PayloadTooLarge(msg) => msg,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            TalkError::Validation(_) => StatusCode::BAD_REQUEST,
            TalkError::NotFound(_) => StatusCode::NOT_FOUND,
            TalkError::Unauthorized(_) | TalkError::Token(_) => StatusCode::UNAUTHORIZED,
            TalkError::Forbidden(_) => StatusCode::FORBIDDEN,
            TalkError::Conflict(_) => StatusCode::CONFLICT,
            TalkError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 用户可以修正后重新提交的错误，以提示消息展示
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TalkError::Validation(_)
                | TalkError::NotFound(_)
                | TalkError::Unauthorized(_)
                | TalkError::Forbidden(_)
                | TalkError::Conflict(_)
                | TalkError::Token(_)
                | TalkError::PayloadTooLarge(_)
        )
    }

    /// 服务端控制台的彩色输出
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TalkError {}

impl TalkError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TalkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TalkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TalkError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TalkError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TalkError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TalkError::NotFound(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        TalkError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        TalkError::Forbidden(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        TalkError::Conflict(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TalkError::Serialization(msg.into())
    }

    pub fn token<T: Into<String>>(msg: T) -> Self {
        TalkError::Token(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        TalkError::PasswordHash(msg.into())
    }

    pub fn mail<T: Into<String>>(msg: T) -> Self {
        TalkError::Mail(msg.into())
    }

    pub fn payload_too_large<T: Into<String>>(msg: T) -> Self {
        TalkError::PayloadTooLarge(msg.into())
    }
}

impl From<sea_orm::DbErr> for TalkError {
    fn from(err: sea_orm::DbErr) -> Self {
        TalkError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for TalkError {
    fn from(err: std::io::Error) -> Self {
        TalkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TalkError {
    fn from(err: serde_json::Error) -> Self {
        TalkError::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for TalkError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        TalkError::Token(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for TalkError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        TalkError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TalkError>;
