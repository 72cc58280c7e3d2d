use rand::RngCore;
use tracing::{info, warn};

use sitedeck_core::{
    clock,
    ids::{SiteId, UserId},
    token::{Claims, TokenSigner},
};
use sitedeck_storage::{Storage, StorageError, UserRecord};

use crate::error::EngineError;

const PASSWORD_CONTEXT: &str = "sitedeck 2026-01 password hash";
const MIN_PASSWORD_LEN: usize = 8;

fn hash_password(salt: &[u8; 16], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

pub fn normalize_email(email: &str) -> Result<String, EngineError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::Validation(format!("invalid email address: {email:?}"))),
    }
}

/// Issues and checks bearer tokens for editor sessions.
pub struct AuthService {
    signer: TokenSigner,
    token_ttl_ms: u64,
}

impl AuthService {
    pub fn new(signer: TokenSigner, token_ttl_ms: u64) -> Self {
        Self {
            signer,
            token_ttl_ms,
        }
    }

    pub fn register(
        &self,
        storage: &mut impl Storage,
        site_id: SiteId,
        email: &str,
        password: &str,
    ) -> Result<UserId, EngineError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EngineError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let user = UserRecord {
            user_id: UserId::new(),
            site_id,
            email,
            password_hash: *hash_password(&salt, password).as_bytes(),
            salt,
            created_at_ms: clock::now_ms()?,
        };
        match storage.insert_user(&user) {
            Ok(()) => {}
            Err(StorageError::ConstraintViolation(_)) => {
                return Err(EngineError::Validation(format!(
                    "email already registered: {}",
                    user.email
                )));
            }
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %user.user_id, site_id = %site_id, "registered user");
        Ok(user.user_id)
    }

    pub fn login(
        &self,
        storage: &impl Storage,
        email: &str,
        password: &str,
    ) -> Result<String, EngineError> {
        let email = normalize_email(email)?;
        let Some(user) = storage.get_user_by_email(&email)? else {
            warn!(%email, "login for unknown email");
            return Err(EngineError::Unauthorized("invalid email or password".into()));
        };
        // blake3::Hash compares in constant time.
        if hash_password(&user.salt, password) != blake3::Hash::from(user.password_hash) {
            warn!(%email, "login with wrong password");
            return Err(EngineError::Unauthorized("invalid email or password".into()));
        }
        let now = clock::now_ms()?;
        let claims = Claims {
            user_id: user.user_id,
            site_id: user.site_id,
            issued_at_ms: now,
            expires_at_ms: now.saturating_add(self.token_ttl_ms),
        };
        info!(user_id = %user.user_id, "issued session token");
        Ok(self.signer.issue(&claims)?)
    }

    pub fn authorize(&self, token: &str) -> Result<Claims, EngineError> {
        let now = clock::now_ms()?;
        self.signer
            .verify(token, now)
            .map_err(|e| EngineError::Unauthorized(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitedeck_core::plan::Plan;
    use sitedeck_storage::{SiteRecord, SqliteStorage};

    fn setup() -> (AuthService, SqliteStorage, SiteId) {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let site_id = SiteId::new();
        storage
            .insert_site(&SiteRecord {
                site_id,
                name: "Demo".into(),
                plan: Plan::Basic,
            })
            .unwrap();
        (AuthService::new(TokenSigner::generate(), 60_000), storage, site_id)
    }

    #[test]
    fn register_login_authorize() {
        let (auth, mut storage, site_id) = setup();
        let user_id = auth
            .register(&mut storage, site_id, " Ed@Example.com ", "correct horse")
            .unwrap();
        let token = auth.login(&storage, "ed@example.com", "correct horse").unwrap();
        let claims = auth.authorize(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.site_id, site_id);
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let (auth, mut storage, site_id) = setup();
        auth.register(&mut storage, site_id, "ed@example.com", "correct horse")
            .unwrap();
        let err = auth.login(&storage, "ed@example.com", "wrong horse").unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
        let err = auth.login(&storage, "nobody@example.com", "x").unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }

    #[test]
    fn duplicate_and_weak_registrations_rejected() {
        let (auth, mut storage, site_id) = setup();
        auth.register(&mut storage, site_id, "ed@example.com", "correct horse")
            .unwrap();
        assert!(matches!(
            auth.register(&mut storage, site_id, "ED@example.com", "another one"),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            auth.register(&mut storage, site_id, "new@example.com", "short"),
            Err(EngineError::Validation(_))
        ));
        assert!(normalize_email("no-at-sign").is_err());
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let (auth, _, _) = setup();
        assert!(matches!(auth.authorize("nope"), Err(EngineError::Unauthorized(_))));
    }
}
