use std::time::Duration;
use tether_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use tether_core::{IceServerConfig, UserId};
use uuid::Uuid;

pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `ws://host:port/ws` of the relay.
    pub server_url: String,
    pub user_id: UserId,
    pub display_name: String,
    /// Used until the relay sends its own `ice_config`.
    pub ice_servers: Vec<IceServerConfig>,
    /// How long a session may wait on its peer before it is torn down.
    pub negotiation_timeout: Duration,
}

impl ClientConfig {
    /// Config with a freshly generated user id.
    pub fn new(server_url: impl Into<String>) -> Self {
        let user_id = UserId::new(Uuid::new_v4().to_string());
        Self {
            server_url: server_url.into(),
            display_name: user_id.to_string(),
            user_id,
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = timeout;
        self
    }
}
