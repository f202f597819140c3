//! Tests for the authentication service
//! These run against the in-memory store plus one failing fake per storage contract

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sso_core::config::{PasswordConfig, TokenConfig};
use sso_core::storage::StorageResult;
use sso_core::{
    App, AppProvider, AuthService, CredentialHasher, Error, MemoryStorage, StorageError,
    TokenClaims, TokenIssuer, User, UserProvider, UserSaver,
};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(900);

fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::new(&PasswordConfig {
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    })
    .unwrap()
}

fn issuer() -> TokenIssuer {
    TokenIssuer::new(&TokenConfig::default()).unwrap()
}

fn app(id: i32) -> App {
    App {
        id,
        name: format!("app-{}", id),
        secret: format!("secret-{}", id).into_bytes(),
    }
}

/// Service over a shared in-memory store that knows application 7
fn memory_service() -> (AuthService, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::with_first_user_id(42));
    store.save_app(app(7));

    let service = AuthService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        cheap_hasher(),
        issuer(),
        TTL,
    )
    .unwrap();

    (service, store)
}

fn decode_claims(token: &str, app_id: i32) -> TokenClaims {
    let secret = format!("secret-{}", app_id);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["sso"]);
    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .expect("token should verify with the app secret")
        .claims
}

// Fakes, one per contract

struct BrokenUserSaver;

#[async_trait]
impl UserSaver for BrokenUserSaver {
    async fn save_user(&self, _email: &str, _pass_hash: &[u8]) -> StorageResult<i64> {
        Err(StorageError::Other("connection reset".to_string()))
    }
}

struct BrokenUserProvider;

#[async_trait]
impl UserProvider for BrokenUserProvider {
    async fn find_user_by_email(&self, _email: &str) -> StorageResult<User> {
        Err(StorageError::Other("connection reset".to_string()))
    }

    async fn is_admin(&self, _user_id: i64) -> StorageResult<bool> {
        Err(StorageError::Other("connection reset".to_string()))
    }
}

struct BrokenAppProvider;

#[async_trait]
impl AppProvider for BrokenAppProvider {
    async fn find_app_by_id(&self, _app_id: i32) -> StorageResult<App> {
        Err(StorageError::Other("connection reset".to_string()))
    }
}

/// Returns a fixed user whose stored digest is corrupt
struct CorruptDigestProvider;

#[async_trait]
impl UserProvider for CorruptDigestProvider {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<User> {
        Ok(User {
            id: 1,
            email: email.to_string(),
            pass_hash: b"garbage".to_vec(),
        })
    }

    async fn is_admin(&self, _user_id: i64) -> StorageResult<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_register_login_scenario() {
    let (service, _store) = memory_service();

    let user_id = service.register_new_user("a@x.com", "secret1").await.unwrap();
    assert_eq!(user_id, 42);

    let token = service.login("a@x.com", "secret1", 7).await.unwrap();
    assert!(!token.is_empty());

    let wrong = service.login("a@x.com", "wrong", 7).await;
    assert!(matches!(wrong, Err(Error::InvalidCredentials)));

    let unknown_app = service.login("a@x.com", "secret1", 999).await;
    assert!(matches!(unknown_app, Err(Error::UnknownApplication(999))));

    assert!(!service.is_admin(42).await.unwrap());
}

#[tokio::test]
async fn test_token_claims() {
    let (service, _store) = memory_service();
    let user_id = service.register_new_user("a@x.com", "secret1").await.unwrap();

    let token = service.login("a@x.com", "secret1", 7).await.unwrap();
    let claims = decode_claims(&token, 7);

    assert_eq!(claims.uid, user_id);
    assert_eq!(claims.app_id, 7);
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.exp - claims.iat, TTL.as_secs() as i64);
}

#[tokio::test]
async fn test_token_scoped_to_requesting_app() {
    let (service, store) = memory_service();
    store.save_app(app(8));
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let token = service.login("a@x.com", "secret1", 8).await.unwrap();
    assert_eq!(decode_claims(&token, 8).app_id, 8);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["sso"]);
    let with_other_secret =
        decode::<TokenClaims>(&token, &DecodingKey::from_secret(b"secret-7"), &validation);
    assert!(with_other_secret.is_err());
}

#[tokio::test]
async fn test_unknown_email_indistinguishable_from_wrong_password() {
    let (service, _store) = memory_service();
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let wrong_password = service.login("a@x.com", "wrong", 7).await.unwrap_err();
    let unknown_email = service.login("nobody@x.com", "secret1", 7).await.unwrap_err();

    assert!(matches!(wrong_password, Error::InvalidCredentials));
    assert!(matches!(unknown_email, Error::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(wrong_password.code(), unknown_email.code());
}

#[tokio::test]
async fn test_credentials_checked_before_application() {
    let (service, _store) = memory_service();
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    // bad credentials win over a bad application
    let result = service.login("a@x.com", "wrong", 999).await;
    assert!(matches!(result, Err(Error::InvalidCredentials)));

    let result = service.login("nobody@x.com", "secret1", 999).await;
    assert!(matches!(result, Err(Error::InvalidCredentials)));
}

#[tokio::test]
async fn test_duplicate_registration() {
    let (service, store) = memory_service();
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let result = service.register_new_user("a@x.com", "other").await;
    assert!(matches!(result, Err(Error::UserAlreadyExists)));
    assert_eq!(store.user_count(), 1);

    // the first registration still holds
    service.login("a@x.com", "secret1", 7).await.unwrap();
    assert!(matches!(service.login("a@x.com", "other", 7).await, Err(Error::InvalidCredentials)));
}

#[tokio::test]
async fn test_password_stored_hashed() {
    let (service, store) = memory_service();
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let user = store.find_user_by_email("a@x.com").await.unwrap();
    let digest = String::from_utf8(user.pass_hash).unwrap();
    assert!(digest.starts_with("$argon2id$"));
    assert!(!digest.contains("secret1"));
}

#[tokio::test]
async fn test_is_admin() {
    let (service, store) = memory_service();
    let user_id = service.register_new_user("root@x.com", "secret1").await.unwrap();

    assert!(!service.is_admin(user_id).await.unwrap());
    store.set_admin(user_id, true).unwrap();
    assert!(service.is_admin(user_id).await.unwrap());

    // nonexistent users are a lookup failure, not a separate signal
    let missing = service.is_admin(1000).await;
    assert!(matches!(missing, Err(Error::Internal { op: "auth.is_admin", .. })));
}

#[tokio::test]
async fn test_arguments_revalidated() {
    let (service, _store) = memory_service();

    assert!(matches!(service.login("", "secret1", 7).await, Err(Error::InvalidArgument(_))));
    assert!(matches!(service.login("a@x.com", "", 7).await, Err(Error::InvalidArgument(_))));
    assert!(matches!(service.login("a@x.com", "secret1", 0).await, Err(Error::InvalidArgument(_))));
    assert!(matches!(service.register_new_user("", "secret1").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(service.register_new_user("a@x.com", "").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(service.is_admin(0).await, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn test_storage_failures_are_internal() {
    let store = Arc::new(MemoryStorage::new());
    store.save_app(app(7));

    let service = AuthService::new(
        Arc::new(BrokenUserSaver),
        Arc::new(BrokenUserProvider),
        store.clone(),
        cheap_hasher(),
        issuer(),
        TTL,
    )
    .unwrap();

    let err = service.register_new_user("a@x.com", "secret1").await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.register_new_user", .. }));

    let err = service.login("a@x.com", "secret1", 7).await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.login", .. }));

    let err = service.is_admin(1).await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.is_admin", .. }));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_app_lookup_failure_is_internal() {
    let store = Arc::new(MemoryStorage::new());
    let service = AuthService::new(
        store.clone(),
        store.clone(),
        Arc::new(BrokenAppProvider),
        cheap_hasher(),
        issuer(),
        TTL,
    )
    .unwrap();
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let err = service.login("a@x.com", "secret1", 7).await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.login", .. }));
}

#[tokio::test]
async fn test_corrupt_digest_is_internal_not_invalid_credentials() {
    let store = Arc::new(MemoryStorage::new());
    store.save_app(app(7));
    let service = AuthService::new(
        store.clone(),
        Arc::new(CorruptDigestProvider),
        store.clone(),
        cheap_hasher(),
        issuer(),
        TTL,
    )
    .unwrap();

    let err = service.login("a@x.com", "secret1", 7).await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.login", .. }));
}

#[tokio::test]
async fn test_app_without_secret_is_internal() {
    let (service, store) = memory_service();
    store.save_app(App { id: 9, name: "unsigned".to_string(), secret: Vec::new() });
    service.register_new_user("a@x.com", "secret1").await.unwrap();

    let err = service.login("a@x.com", "secret1", 9).await.unwrap_err();
    assert!(matches!(err, Error::Internal { op: "auth.login", .. }));
}

#[tokio::test]
async fn test_zero_ttl_rejected() {
    let store = Arc::new(MemoryStorage::new());
    let result = AuthService::new(
        store.clone(),
        store.clone(),
        store,
        cheap_hasher(),
        issuer(),
        Duration::ZERO,
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_concurrent_logins_share_one_service() {
    let (service, _store) = memory_service();
    let service = Arc::new(service);

    for i in 0..8 {
        service
            .register_new_user(&format!("user{}@x.com", i), &format!("pass{}", i))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.login(&format!("user{}@x.com", i), &format!("pass{}", i), 7).await
        }));
    }

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(decode_claims(&token, 7).app_id, 7);
    }
}
