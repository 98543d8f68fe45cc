//! 认证能力：登录、JWT 生成与校验。

mod jwt;
mod password;

pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_password};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 目录中的用户条目。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u32,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

/// 内置用户目录：admin 与普通用户各一个，口令在启动时哈希入库。
pub struct UserDirectory {
    users: Vec<UserRecord>,
}

impl UserDirectory {
    /// 以两个内置账号构建目录。
    pub fn seed(
        admin_email: &str,
        admin_password: &str,
        user_email: &str,
        user_password: &str,
    ) -> Result<Self, AuthError> {
        let users = vec![
            UserRecord {
                id: 1,
                email: admin_email.to_string(),
                password_hash: hash_password(admin_password)?,
                role: "admin".to_string(),
                is_active: true,
            },
            UserRecord {
                id: 2,
                email: user_email.to_string(),
                password_hash: hash_password(user_password)?,
                role: "user".to_string(),
                is_active: true,
            },
        ];
        Ok(Self { users })
    }

    pub fn find(&self, email: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.email == email)
    }
}

/// 认证服务：目录校验 + JWT 签发。
pub struct AuthService {
    directory: UserDirectory,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(directory: UserDirectory, jwt: JwtManager) -> Self {
        Self { directory, jwt }
    }

    /// 登录校验并签发 access token。
    pub fn login(&self, email: &str, password: &str) -> Result<(UserRecord, String), AuthError> {
        let user = self
            .directory
            .find(email)
            .filter(|user| user.is_active)
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&user.password_hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }
        let token = self.jwt.issue(user)?;
        Ok((user.clone(), token))
    }

    /// 校验 access token 并取出 claims。
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt.decode(token)
    }
}
