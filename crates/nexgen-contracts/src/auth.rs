//! Demo-grade sign-in over the users collection.
//!
//! Passwords are compared in clear text. This keeps parity with the stored
//! demo accounts and is not a security boundary.

use chrono::Utc;

use crate::models::{User, UserRole};
use crate::store::{LocalDatabase, Repository, StorageBackend};

pub const GUEST_EMAIL: &str = "guest@nexgen.com";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Usuário não encontrado.")]
    UserNotFound,
    #[error("Senha incorreta.")]
    WrongPassword,
    #[error("As senhas não coincidem.")]
    PasswordMismatch,
    #[error("Este email já está cadastrado.")]
    EmailTaken,
    #[error("Preencha todos os campos obrigatórios.")]
    MissingField,
    #[error("Sessão iniciada necessária.")]
    NotSignedIn,
    #[error("Acesso restrito a administradores.")]
    NotAuthorized,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Email match is case-insensitive, password match is exact.
pub fn authenticate(users: &[User], email: &str, password: &str) -> Result<User, AuthError> {
    let email = email.trim();
    let user = users
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
        .ok_or(AuthError::UserNotFound)?;
    if user.password.as_deref() != Some(password) {
        return Err(AuthError::WrongPassword);
    }
    Ok(user.clone())
}

pub fn build_registration(users: &[User], form: &Registration) -> Result<User, AuthError> {
    let name = form.name.trim();
    let email = form.email.trim();
    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(AuthError::MissingField);
    }
    if form.password != form.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if users.iter().any(|user| user.email.eq_ignore_ascii_case(email)) {
        return Err(AuthError::EmailTaken);
    }
    Ok(User {
        id: format!("client-{}", uuid::Uuid::new_v4()),
        name: name.to_string(),
        email: email.to_string(),
        role: UserRole::Client,
        password: Some(form.password.clone()),
        phone: form
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string),
        avatar: None,
    })
}

pub fn guest_user(name: &str) -> Result<User, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingField);
    }
    Ok(User {
        id: format!("guest-{}", Utc::now().timestamp_millis()),
        name: name.to_string(),
        email: GUEST_EMAIL.to_string(),
        role: UserRole::Guest,
        password: None,
        phone: None,
        avatar: None,
    })
}

pub fn require_admin(user: Option<&User>) -> Result<&User, AuthError> {
    match user {
        None => Err(AuthError::NotSignedIn),
        Some(user) if user.is_admin() => Ok(user),
        Some(_) => Err(AuthError::NotAuthorized),
    }
}

/// Session-backed wrapper used by the command line.
pub struct SessionManager<'a, B> {
    db: &'a LocalDatabase<B>,
}

impl<'a, B: StorageBackend> SessionManager<'a, B> {
    pub fn new(db: &'a LocalDatabase<B>) -> Self {
        Self { db }
    }

    pub fn current(&self) -> Option<User> {
        self.db.session_user()
    }

    pub fn login(&self, email: &str, password: &str) -> anyhow::Result<User> {
        let user = authenticate(&self.db.users().list(), email, password)?;
        self.db.set_session_user(&user.public_view())?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "signed in");
        Ok(user.public_view())
    }

    pub fn register(&self, form: &Registration) -> anyhow::Result<User> {
        let user = build_registration(&self.db.users().list(), form)?;
        self.db.users().upsert(user.clone())?;
        self.db.set_session_user(&user.public_view())?;
        Ok(user.public_view())
    }

    /// Guests are never written to the users collection.
    pub fn continue_as_guest(&self, name: &str) -> anyhow::Result<User> {
        let user = guest_user(name)?;
        self.db.set_session_user(&user)?;
        Ok(user)
    }

    pub fn logout(&self) -> anyhow::Result<()> {
        self.db.clear_session()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        authenticate, build_registration, guest_user, require_admin, AuthError, Registration,
        SessionManager, GUEST_EMAIL,
    };
    use crate::models::UserRole;
    use crate::store::{seed_users, LocalDatabase, MemoryBackend, Repository};

    #[test]
    fn login_matches_email_case_insensitively_and_password_exactly() {
        let users = seed_users();
        let user = authenticate(&users, "  ADMIN@nexgen.com ", "123");
        assert_eq!(user.map(|user| user.id), Ok("admin-1".to_string()));
        assert_eq!(
            authenticate(&users, "admin@nexgen.com", "123 ").map(|user| user.id),
            Err(AuthError::WrongPassword)
        );
        assert_eq!(
            authenticate(&users, "ninguem@nexgen.com", "123").map(|user| user.id),
            Err(AuthError::UserNotFound)
        );
    }

    #[test]
    fn registration_rejects_mismatch_and_duplicates() {
        let users = seed_users();
        let mut form = Registration {
            name: "Rita".to_string(),
            email: "rita@example.com".to_string(),
            phone: Some("  ".to_string()),
            password: "abc".to_string(),
            confirm_password: "abd".to_string(),
        };
        assert_eq!(build_registration(&users, &form).err(), Some(AuthError::PasswordMismatch));

        form.confirm_password = "abc".to_string();
        let created = build_registration(&users, &form).expect("valid registration");
        assert_eq!(created.role, UserRole::Client);
        assert!(created.id.starts_with("client-"));
        assert!(created.phone.is_none());

        form.email = "JOAO@cliente.com".to_string();
        assert_eq!(build_registration(&users, &form).err(), Some(AuthError::EmailTaken));
    }

    #[test]
    fn guests_need_a_name() {
        assert_eq!(guest_user(" ").err(), Some(AuthError::MissingField));
        let guest = guest_user("Visitante").expect("guest");
        assert!(guest.id.starts_with("guest-"));
        assert_eq!(guest.email, GUEST_EMAIL);
    }

    #[test]
    fn admin_gate_distinguishes_anonymous_and_clients() {
        let users = seed_users();
        assert_eq!(require_admin(None).err(), Some(AuthError::NotSignedIn));
        let client = users.iter().find(|user| user.role == UserRole::Client);
        assert_eq!(require_admin(client).err(), Some(AuthError::NotAuthorized));
        assert!(require_admin(users.first()).is_ok());
    }

    #[test]
    fn session_manager_persists_without_password() -> anyhow::Result<()> {
        let db = LocalDatabase::new(MemoryBackend::new());
        db.init()?;
        let sessions = SessionManager::new(&db);
        sessions.login("joao@cliente.com", "123")?;
        let current = sessions.current().expect("session stored");
        assert_eq!(current.id, "client-1");
        assert!(current.password.is_none());

        sessions.continue_as_guest("Visitante")?;
        assert_eq!(db.users().list().len(), 4);

        sessions.logout()?;
        assert!(sessions.current().is_none());
        Ok(())
    }
}
