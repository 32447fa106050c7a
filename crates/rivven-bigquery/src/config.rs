//! Connection configuration
//!
//! A [`Config`] names the project, default dataset and processing location a
//! connection runs against, plus the [`ClientOptions`] handed verbatim to the
//! [`ClientFactory`](crate::client::ClientFactory). It can be built in code or
//! parsed from a connection string:
//!
//! ```text
//! bigquery://<project>[/<location>]/<dataset>?apiKey=..&credentials=..&scopes=..
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use url::Url;

use crate::error::{Error, Result};

/// Connection string scheme
pub const DSN_SCHEME: &str = "bigquery";

/// Options forwarded to the client factory (credentials, endpoint, scopes)
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// API key
    pub api_key: Option<String>,
    /// Inline service-account credentials (JSON)
    pub credentials_json: Option<Vec<u8>>,
    /// Path to a credentials file
    pub credentials_file: Option<String>,
    /// OAuth scopes
    pub scopes: Vec<String>,
    /// API endpoint override
    pub endpoint: Option<String>,
    /// User agent override
    pub user_agent: Option<String>,
    /// Skip authentication entirely (emulators, tests)
    pub disable_auth: bool,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field(
                "credentials_json",
                &self.credentials_json.as_ref().map(|_| "***"),
            )
            .field("credentials_file", &self.credentials_file)
            .field("scopes", &self.scopes)
            .field("endpoint", &self.endpoint)
            .field("user_agent", &self.user_agent)
            .field("disable_auth", &self.disable_auth)
            .finish()
    }
}

/// Configuration shared by every connection of a connector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Project the jobs run in
    pub project_id: String,
    /// Dataset used for unqualified table names
    pub dataset: Option<String>,
    /// Processing location
    pub location: Option<String>,
    /// Client options
    pub options: ClientOptions,
}

impl Config {
    /// Create configuration for a project
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Set the default dataset
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Set the processing location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set an API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.options.api_key = Some(api_key.into());
        self
    }

    /// Set the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.options.endpoint = Some(endpoint.into());
        self
    }

    /// Add an OAuth scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.options.scopes.push(scope.into());
        self
    }

    /// Disable authentication
    pub fn without_auth(mut self) -> Self {
        self.options.disable_auth = true;
        self
    }

    /// Parse a `bigquery://` connection string
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let url = Url::parse(dsn).map_err(|e| Error::invalid_connection_string(e.to_string()))?;

        if url.scheme() != DSN_SCHEME {
            return Err(Error::invalid_connection_string(format!(
                "invalid scheme: expected '{DSN_SCHEME}://', received: '{}'",
                url.scheme()
            )));
        }

        let project_id = url.host_str().unwrap_or_default().to_string();
        if project_id.is_empty() {
            return Err(Error::invalid_connection_string("missing project id"));
        }

        let (location, dataset) = parse_location_dataset(&url)?;
        let options = parse_options(&url)?;

        Ok(Self {
            project_id,
            dataset,
            location,
            options,
        })
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dsn(s)
    }
}

fn parse_location_dataset(url: &Url) -> Result<(Option<String>, Option<String>)> {
    let path = url.path().trim_matches('/');
    if path.is_empty() {
        return Ok((None, None));
    }

    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [dataset] => Ok((None, Some((*dataset).to_string()))),
        [location, dataset] => Ok((Some((*location).to_string()), Some((*dataset).to_string()))),
        _ => Err(Error::invalid_connection_string(format!(
            "too many path segments: {}",
            url.path()
        ))),
    }
}

fn parse_options(url: &Url) -> Result<ClientOptions> {
    let mut options = ClientOptions::default();

    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "apiKey" => options.api_key = Some(value.into_owned()),
            "credentials" => {
                let decoded = URL_SAFE_NO_PAD.decode(value.as_bytes()).map_err(|e| {
                    Error::invalid_connection_string(format!("invalid credentials: {e}"))
                })?;
                options.credentials_json = Some(decoded);
            }
            "credentialsFile" => options.credentials_file = Some(value.into_owned()),
            "scopes" => options.scopes.push(value.into_owned()),
            "endpoint" => options.endpoint = Some(value.into_owned()),
            "userAgent" => options.user_agent = Some(value.into_owned()),
            "disableAuth" => options.disable_auth = value == "true",
            _ => {}
        }
    }

    Ok(options)
}
