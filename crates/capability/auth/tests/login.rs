use meterd_auth::{AuthError, AuthService, JwtManager, UserDirectory};

fn service() -> AuthService {
    let directory = UserDirectory::seed("admin@local", "admin1234", "user@local", "user1234")
        .expect("directory");
    AuthService::new(directory, JwtManager::new("secret".to_string(), 3600))
}

#[test]
fn login_issues_verifiable_token() {
    let auth = service();
    let (user, token) = auth.login("admin@local", "admin1234").expect("login");
    assert_eq!(user.role, "admin");
    let claims = auth.verify_access_token(&token).expect("claims");
    assert_eq!(claims.email, "admin@local");
    assert_eq!(claims.sub, "1");
}

#[test]
fn login_rejects_wrong_password() {
    let auth = service();
    assert!(matches!(
        auth.login("admin@local", "nope"),
        Err(AuthError::InvalidCredentials)
    ));
}

#[test]
fn login_rejects_unknown_email() {
    let auth = service();
    assert!(matches!(
        auth.login("ghost@local", "admin1234"),
        Err(AuthError::InvalidCredentials)
    ));
}

#[test]
fn second_seeded_user_can_login() {
    let auth = service();
    let (user, _token) = auth.login("user@local", "user1234").expect("login");
    assert_eq!(user.role, "user");
    assert_eq!(user.id, 2);
}
