use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Fathom API base URL used when `FATHOM_BASE_URL` is not set.
pub const DEFAULT_FATHOM_BASE_URL: &str = "https://api.fathom.ai";

/// Default Airtable API base URL used when `AIRTABLE_BASE_URL` is not set.
pub const DEFAULT_AIRTABLE_BASE_URL: &str = "https://api.airtable.com";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The API key sent as `X-Api-Key` when calling the Fathom API.
    #[arg(long, env)]
    fathom_api_key: Option<String>,

    /// The base URL of the Fathom API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_FATHOM_BASE_URL)]
    fathom_base_url: String,

    /// Request transcripts when listing meetings and store them on the meeting record.
    #[arg(long, env, default_value_t = false)]
    pub fathom_include_transcript: bool,

    /// Only accept a meeting whose calendar invitees contain this name or email.
    #[arg(long, env)]
    fathom_participant_filter: Option<String>,

    /// The personal access token used when calling the Airtable API.
    #[arg(long, env)]
    airtable_api_key: Option<String>,

    /// The base URL of the Airtable API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_AIRTABLE_BASE_URL)]
    airtable_base_url: String,

    /// The Airtable base that holds the meetings, action items and people tables.
    #[arg(long, env)]
    airtable_base_id: Option<String>,

    /// Name of the Airtable table meetings are written to.
    #[arg(long, env, default_value = "Meetings")]
    airtable_meetings_table: String,

    /// Name of the Airtable table action items are written to.
    #[arg(long, env, default_value = "Action Items")]
    airtable_action_items_table: String,

    /// Name of the Airtable table holding people (participants and assignees).
    #[arg(long, env, default_value = "People")]
    airtable_participants_table: String,

    /// Field of the people table holding the person's display name.
    #[arg(long, env, default_value = "Name")]
    airtable_people_name_field: String,

    /// Field of the people table holding the person's email. Emails are neither
    /// written nor matched when unset.
    #[arg(long, env)]
    airtable_people_email_field: Option<String>,

    /// Timeout in seconds for establishing a connection to either external API
    #[arg(long, env, default_value_t = 5)]
    pub http_connect_timeout_secs: u64,

    /// Timeout in seconds for receiving a complete response from either external API
    #[arg(long, env, default_value_t = 30)]
    pub http_read_timeout_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Returns the Fathom API key, if configured.
    pub fn fathom_api_key(&self) -> Option<String> {
        self.fathom_api_key.clone()
    }

    /// Returns the Fathom API base URL.
    pub fn fathom_base_url(&self) -> &str {
        &self.fathom_base_url
    }

    pub fn fathom_participant_filter(&self) -> Option<String> {
        self.fathom_participant_filter
            .as_ref()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
    }

    /// Returns the Airtable API key, if configured.
    pub fn airtable_api_key(&self) -> Option<String> {
        self.airtable_api_key.clone()
    }

    /// Returns the Airtable API base URL.
    pub fn airtable_base_url(&self) -> &str {
        &self.airtable_base_url
    }

    pub fn airtable_base_id(&self) -> Option<String> {
        self.airtable_base_id.clone()
    }

    pub fn airtable_meetings_table(&self) -> &str {
        &self.airtable_meetings_table
    }

    pub fn airtable_action_items_table(&self) -> &str {
        &self.airtable_action_items_table
    }

    pub fn airtable_participants_table(&self) -> &str {
        &self.airtable_participants_table
    }

    pub fn airtable_people_name_field(&self) -> &str {
        &self.airtable_people_name_field
    }

    pub fn airtable_people_email_field(&self) -> Option<String> {
        self.airtable_people_email_field
            .as_ref()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
    }

    pub fn http_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http_connect_timeout_secs)
    }

    pub fn http_read_timeout(&self) -> Duration {
        Duration::from_secs(self.http_read_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}
