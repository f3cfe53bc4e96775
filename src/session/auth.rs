use tracing::{info, instrument, warn};

use crate::api::PosApi;
use crate::error::{PosError, Result};
use crate::models::{Credentials, RegisterRequest, UserProfile};
use crate::payments::is_valid_email;
use crate::session::{Session, SessionStore};

/// Exchange credentials for tokens and persist them.
///
/// The returned session has no role yet; call [`load_profile`] with a
/// client that carries the new token.
#[instrument(skip(api, store, credentials), fields(username = %credentials.username))]
pub async fn sign_in<A: PosApi + ?Sized>(
    api: &A,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<Session> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(PosError::Validation(
            "Please enter both username and password".to_string(),
        ));
    }

    let tokens = api.login(credentials).await?;
    if tokens.access.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(PosError::Auth(
            "Login failed: no access token returned.".to_string(),
        ));
    }

    let mut session = Session {
        username: Some(credentials.username.trim().to_string()),
        ..Session::default()
    };
    session.apply_tokens(tokens);
    store.save(&session)?;
    info!("Signed in");
    Ok(session)
}

/// Fetch `/user/` and store the username and role.
#[instrument(skip_all)]
pub async fn load_profile<A: PosApi + ?Sized>(
    api: &A,
    store: &SessionStore,
    session: &mut Session,
) -> Result<UserProfile> {
    let profile = api.current_user().await?;
    session.apply_profile(&profile);
    store.save(session)?;
    info!(role = %profile.role, "Profile loaded");
    Ok(profile)
}

/// Check a sign-up form before it is sent.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<RegisterRequest> {
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(PosError::Validation("Please fill in all fields".to_string()));
    }
    if !is_valid_email(email) {
        return Err(PosError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if password != confirm_password {
        return Err(PosError::Validation("Passwords do not match!".to_string()));
    }

    Ok(RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

#[instrument(skip_all, fields(username = %request.username))]
pub async fn register<A: PosApi + ?Sized>(api: &A, request: &RegisterRequest) -> Result<UserProfile> {
    let profile = api.register(request).await?;
    info!("Account registered");
    Ok(profile)
}

/// Trade the stored refresh token for a new access token.
#[instrument(skip_all)]
pub async fn refresh<A: PosApi + ?Sized>(api: &A, store: &SessionStore) -> Result<Session> {
    let mut session = store.load()?;
    let refresh_token = session
        .refresh_token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or(PosError::NotLoggedIn)?;

    let tokens = api.refresh(&refresh_token).await?;
    if tokens.access.is_none() {
        return Err(PosError::Auth(
            "Token refresh returned no access token".to_string(),
        ));
    }
    session.apply_tokens(tokens);
    store.save(&session)?;
    info!("Access token refreshed");
    Ok(session)
}

/// Tell the server, then clear the local session whatever it said.
#[instrument(skip_all)]
pub async fn sign_out<A: PosApi + ?Sized>(api: &A, store: &SessionStore) -> Result<()> {
    if let Err(err) = api.logout().await {
        warn!(error = %err, "Server logout failed, clearing session anyway");
    }
    store.clear()
}

/// Drop the session after the server rejected its token.
pub fn force_logout(store: &SessionStore) -> Result<()> {
    warn!("Session rejected by server, signing out");
    store.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, MockApi};
    use crate::models::{Role, TokenPair};
    use tempfile::tempdir;

    fn credentials() -> Credentials {
        Credentials {
            username: "kofi".to_string(),
            password: "secret".to_string(),
        }
    }

    fn tokens(access: Option<&str>, refresh: Option<&str>) -> TokenPair {
        TokenPair {
            access: access.map(str::to_string),
            refresh: refresh.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_sign_in_then_profile() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let api = MockApi::new()
            .with_tokens(tokens(Some("acc"), Some("ref")))
            .with_profile(UserProfile {
                id: Some(3),
                username: "kofi".to_string(),
                email: None,
                role: Role::Chef,
            });

        let mut session = sign_in(&api, &store, &credentials()).await.unwrap();
        assert_eq!(session.access_token.as_deref(), Some("acc"));
        assert!(store.load().unwrap().is_authenticated());

        load_profile(&api, &store, &mut session).await.unwrap();
        let saved = store.load().unwrap();
        assert_eq!(saved.role, Some(Role::Chef));
        assert_eq!(saved.role.unwrap().landing_command(), "kitchen");
    }

    #[tokio::test]
    async fn test_sign_in_without_access_token_fails() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let api = MockApi::new().with_tokens(tokens(None, Some("ref")));

        let err = sign_in(&api, &store, &credentials()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication required: Login failed: no access token returned."
        );
        assert!(!store.load().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store
            .save(&Session {
                access_token: Some("old".to_string()),
                refresh_token: Some("ref".to_string()),
                ..Session::default()
            })
            .unwrap();
        let api = MockApi::new().with_tokens(tokens(Some("new"), None));

        let session = refresh(&api, &store).await.unwrap();
        assert_eq!(session.access_token.as_deref(), Some("new"));
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));
        assert_eq!(api.calls(), vec![ApiCall::Refresh("ref".to_string())]);
    }

    #[tokio::test]
    async fn test_refresh_requires_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let api = MockApi::new();
        assert!(matches!(
            refresh(&api, &store).await,
            Err(PosError::NotLoggedIn)
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store
            .save(&Session {
                access_token: Some("acc".to_string()),
                ..Session::default()
            })
            .unwrap();

        sign_out(&MockApi::new(), &store).await.unwrap();
        assert_eq!(store.load().unwrap(), Session::default());
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration("ama", "ama@example.com", "pw", "pw").is_ok());
        assert_eq!(
            validate_registration("ama", "ama@example.com", "pw", "px")
                .unwrap_err()
                .to_string(),
            "Passwords do not match!"
        );
        assert!(validate_registration("ama", "not-an-email", "pw", "pw").is_err());
        assert!(validate_registration(" ", "ama@example.com", "pw", "pw").is_err());
    }
}
