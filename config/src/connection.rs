use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionMode {
    Local,
    Network,
}

impl ConnectionMode {
    pub const ALL: [ConnectionMode; 2] = [ConnectionMode::Local, ConnectionMode::Network];

    pub fn label(self) -> &'static str {
        match self {
            ConnectionMode::Local => "Use SQLite 3 database - student.db",
            ConnectionMode::Network => "Connect to MySQL database",
        }
    }
}

/// Raw values typed into the network connection form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetworkInput {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for NetworkInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkInput")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl NetworkInput {
    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("host", self.host.trim().is_empty()),
            ("user", self.user.trim().is_empty()),
            ("password", self.password.is_empty()),
            ("database", self.database.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    Local,
    Network(NetworkConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Please provide all MySQL connection details (missing: {}).", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error("MySQL host must be only a hostname or IP address, got {0:?}.")]
    InvalidHost(String),
}

impl ConnectionError {
    /// Whether the session has to end. Incomplete input can be fixed by asking again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectionError::InvalidHost(_))
    }
}

pub fn resolve(mode: ConnectionMode, input: &NetworkInput) -> Result<ConnectionConfig, ConnectionError> {
    match mode {
        ConnectionMode::Local => Ok(ConnectionConfig::Local),
        ConnectionMode::Network => {
            let missing = input.missing_fields();
            if !missing.is_empty() {
                return Err(ConnectionError::Incomplete { missing });
            }

            let host = input.host.trim();
            if host.contains('@') || host.contains(':') {
                return Err(ConnectionError::InvalidHost(host.to_string()));
            }

            Ok(ConnectionConfig::Network(NetworkConfig {
                host: host.to_string(),
                user: input.user.trim().to_string(),
                password: input.password.clone(),
                database: input.database.trim().to_string(),
            }))
        }
    }
}
