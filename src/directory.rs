use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{PartyRef, Principal, Role, User};

const UNKNOWN_PARTY: &str = "N/A";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Returned once, from registration. The token is the only bearer
/// credential for the user and is not recoverable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

/// Identities known to the service, keyed by id. Emails are unique. Bearer
/// tokens are indexed separately and resolve to an id.
#[derive(Default)]
pub struct UserDirectory {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    tokens: DashMap<String, Uuid>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, request: RegisterUserRequest) -> Result<Registration, AppError> {
        let name = request
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Validation("name cannot be empty".to_string()))?;

        let email = request
            .email
            .map(|email| email.trim().to_ascii_lowercase())
            .filter(|email| email.contains('@'))
            .ok_or_else(|| AppError::Validation("a valid email is required".to_string()))?;

        let role = request
            .role
            .ok_or_else(|| AppError::Validation("role is required".to_string()))?
            .parse::<Role>()
            .map_err(AppError::Validation)?;

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            role,
            created_at: Utc::now(),
        };

        self.insert(user)
    }

    fn insert(&self, user: User) -> Result<Registration, AppError> {
        match self.emails.entry(user.email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::InvalidState(format!(
                "email {} is already registered",
                user.email
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                let token = issue_token();
                self.tokens.insert(token.clone(), user.id);
                Ok(Registration { user, token })
            }
        }
    }

    /// Resolves a bearer token. User ids are never accepted as tokens.
    pub fn authenticate(&self, token: &str) -> Option<Principal> {
        let id = *self.tokens.get(token)?;
        self.get(id).map(|user| Principal::from(&user))
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolves `id` to a delivery agent or explains why it can't.
    pub fn require_agent(&self, id: Uuid) -> Result<User, AppError> {
        match self.get(id) {
            Some(user) if user.role == Role::DeliveryAgent => Ok(user),
            Some(user) => Err(AppError::Validation(format!(
                "user {id} is a {}, not a Delivery Agent",
                user.role
            ))),
            None => Err(AppError::Validation(format!(
                "agent {id} does not match any Delivery Agent"
            ))),
        }
    }

    pub fn party(&self, id: Uuid) -> PartyRef {
        self.get(id)
            .map(|user| PartyRef::from(&user))
            .unwrap_or_else(|| PartyRef {
                id,
                name: UNKNOWN_PARTY.to_string(),
            })
    }

    pub fn display_name(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).map(|entry| entry.name.clone())
    }
}

/// 244 random bits from two v4 uuids, hex encoded.
fn issue_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, role: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn register_normalizes_email_and_rejects_duplicates() {
        let directory = UserDirectory::new();
        let user = directory
            .register(request(" Ana ", "Ana@Example.com", "Customer"))
            .unwrap()
            .user;
        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@example.com");

        let err = directory
            .register(request("Ana 2", "ana@example.com", "Admin"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn register_validates_every_field() {
        let directory = UserDirectory::new();
        assert!(matches!(
            directory.register(request("", "a@b.c", "Admin")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            directory.register(request("Bo", "nope", "Admin")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            directory.register(request("Bo", "bo@b.c", "Courier")),
            Err(AppError::Validation(_))
        ));
        assert!(directory.is_empty());
    }

    #[test]
    fn require_agent_checks_role() {
        let directory = UserDirectory::new();
        let agent = directory
            .register(request("Dan", "dan@x.io", "Delivery Agent"))
            .unwrap()
            .user;
        let admin = directory
            .register(request("Root", "root@x.io", "Admin"))
            .unwrap()
            .user;

        assert_eq!(directory.require_agent(agent.id).unwrap().id, agent.id);
        assert!(matches!(
            directory.require_agent(admin.id),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            directory.require_agent(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_party_falls_back_to_placeholder_name() {
        let directory = UserDirectory::new();
        let id = Uuid::from_u128(5);
        assert_eq!(directory.party(id).name, "N/A");
        assert_eq!(directory.display_name(id), None);
    }

    #[test]
    fn tokens_resolve_but_user_ids_do_not() {
        let directory = UserDirectory::new();
        let registration = directory
            .register(request("Dan", "dan@x.io", "Delivery Agent"))
            .unwrap();
        let other = directory
            .register(request("Eve", "eve@x.io", "Delivery Agent"))
            .unwrap();

        let principal = directory.authenticate(&registration.token).unwrap();
        assert_eq!(principal.id, registration.user.id);
        assert_eq!(principal.role, Role::DeliveryAgent);

        assert_ne!(registration.token, other.token);
        assert!(directory
            .authenticate(&registration.user.id.to_string())
            .is_none());
        assert!(directory
            .authenticate(&registration.user.id.simple().to_string())
            .is_none());
        assert!(directory.authenticate("").is_none());
    }

    #[test]
    fn registration_serializes_user_fields_with_token() {
        let directory = UserDirectory::new();
        let registration = directory
            .register(request("Ana", "ana@x.io", "Customer"))
            .unwrap();

        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["id"], registration.user.id.to_string());
        assert_eq!(json["role"], "Customer");
        assert_eq!(json["token"], registration.token);

        let listed = serde_json::to_value(directory.list()).unwrap();
        assert!(!listed.to_string().contains(&registration.token));
    }
}
