use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HostError;

/// Roles a demo session can assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    /// All defined roles, in login-card order.
    pub const ALL: [Role; 2] = [Role::Customer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Dashboard subtitle shown in the host header for this role.
    pub fn portal_label(&self) -> &'static str {
        match self {
            Role::Customer => "Customer Portal",
            Role::Admin => "Admin Console",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(HostError::config(format!("unknown role '{}'", other))),
        }
    }
}

/// The authenticated session shared between the host and the mounted remote.
///
/// Host-local demo state; it is never validated against an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

/// Fixed demo identity for a role.
struct DemoIdentity {
    role: Role,
    id: &'static str,
    display_name: &'static str,
}

const DEMO_IDENTITIES: &[DemoIdentity] = &[
    DemoIdentity {
        role: Role::Customer,
        id: "cust-001",
        display_name: "Jane Customer",
    },
    DemoIdentity {
        role: Role::Admin,
        id: "admin-001",
        display_name: "Alex Admin",
    },
];

impl Session {
    /// Builds the deterministic demo session for `role`.
    ///
    /// Calling this twice with the same role yields equal sessions.
    pub fn for_role(role: Role) -> Self {
        match DEMO_IDENTITIES.iter().find(|identity| identity.role == role) {
            Some(identity) => Self {
                id: identity.id.to_string(),
                display_name: identity.display_name.to_string(),
                role,
            },
            // Every role has a table entry; this arm keeps the lookup total.
            None => Self {
                id: format!("{}-001", role.as_str()),
                display_name: role.as_str().to_string(),
                role,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_role_is_deterministic() {
        assert_eq!(Session::for_role(Role::Admin), Session::for_role(Role::Admin));
        assert_ne!(
            Session::for_role(Role::Admin).id,
            Session::for_role(Role::Customer).id
        );
    }

    #[test]
    fn test_every_role_has_an_identity() {
        for role in Role::ALL {
            let session = Session::for_role(role);
            assert_eq!(session.role, role);
            assert!(!session.display_name.is_empty());
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" customer ".parse::<Role>().unwrap(), Role::Customer);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let json = serde_json::to_value(Session::for_role(Role::Customer)).unwrap();
        assert_eq!(json["displayName"], "Jane Customer");
        assert_eq!(json["role"], "customer");
    }
}
