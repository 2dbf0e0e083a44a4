use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::Role;

/// Identifier of an exposed remote module, `<scope>/<module>`.
///
/// e.g. `remote1/DashboardShell`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The remote container name, the part before the first `/`.
    ///
    /// Empty when the id itself is empty.
    pub fn scope(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// The exposed module name, the part after the first `/`, if any.
    pub fn module(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, module)| module)
    }

    /// Human-readable name of the remote, from the descriptor table.
    ///
    /// Falls back to the scope, then to `"remote"`.
    pub fn display_name(&self) -> String {
        match RemoteDescriptor::by_scope(self.scope()) {
            Some(descriptor) => descriptor.display_name.to_string(),
            None if !self.scope().is_empty() => self.scope().to_string(),
            None => "remote".to_string(),
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Static description of one of the host-known remotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// Container name, used as the id scope and as the config key.
    pub scope: &'static str,
    /// Name shown in loading placeholders and failure notices.
    pub display_name: &'static str,
    /// Module the host mounts as the dashboard.
    pub dashboard_module: &'static str,
    /// Environment variable overriding the remote's base URL.
    pub url_env: &'static str,
    /// Role whose dashboard this remote provides.
    pub role: Role,
}

/// The fixed, exhaustive set of remotes this host composes.
pub const REMOTES: &[RemoteDescriptor] = &[
    RemoteDescriptor {
        scope: "remote1",
        display_name: "Customer App (remote1)",
        dashboard_module: "DashboardShell",
        url_env: "REMOTE1_URL",
        role: Role::Customer,
    },
    RemoteDescriptor {
        scope: "remote2",
        display_name: "Admin App (remote2)",
        dashboard_module: "DashboardShell",
        url_env: "REMOTE2_URL",
        role: Role::Admin,
    },
];

impl RemoteDescriptor {
    pub fn by_scope(scope: &str) -> Option<&'static RemoteDescriptor> {
        REMOTES.iter().find(|descriptor| descriptor.scope == scope)
    }

    pub fn for_role(role: Role) -> Option<&'static RemoteDescriptor> {
        REMOTES.iter().find(|descriptor| descriptor.role == role)
    }

    pub fn dashboard_id(&self) -> RemoteId {
        RemoteId::new(format!("{}/{}", self.scope, self.dashboard_module))
    }
}

/// Dashboard remote mounted for `role`.
pub fn remote_for_role(role: Role) -> Option<RemoteId> {
    RemoteDescriptor::for_role(role).map(RemoteDescriptor::dashboard_id)
}
