use std::time::Duration;

use reqwest::{Client, Error};

const DEFAULT_USER_AGENT: &str = concat!("airwave/", env!("CARGO_PKG_VERSION"), " (+radio relay)");

pub struct HttpClient;

impl HttpClient {
    pub fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    /// Client used for radio inputs. Live streams never finish, so only the
    /// connect phase is bounded.
    pub fn for_streams() -> Result<Client, Error> {
        Client::builder()
            .user_agent(Self::default_user_agent())
            .connect_timeout(Duration::from_secs(10))
            .build()
    }
}
