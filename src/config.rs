use clap::{Parser, ValueEnum};
use database::{
    consts::consts::PARTICIPANT_TABLE,
    persistence::storage::{dynamodb::DynamoDBOptions, StorageEngine},
};

use crate::auth::AdminCredentials;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageEngineKind {
    /// AWS DynamoDB, or any endpoint speaking its API
    Dynamodb,
    /// In process tables, lost on shutdown
    Memory,
}

/// 📀 Participants Server, a REST interface for managing participant records
#[derive(Parser, Debug)]
pub struct ServerConfig {
    /// Port the HTTP server will run on
    #[clap(short, long, default_value = "3000")]
    pub port: u16,

    /// Address the HTTP server will run on
    #[clap(short, long, default_value = "0.0.0.0")]
    pub address: String,

    /// Log every HTTP request
    #[clap(long)]
    pub log_http: bool,

    #[clap(long, default_value_t = 2)]
    pub http_workers: usize,

    /// Allow cross origin requests from anywhere
    #[clap(long)]
    pub permissive_cors: bool,

    #[clap(long, value_enum, default_value_t = StorageEngineKind::Dynamodb)]
    pub storage_engine: StorageEngineKind,

    /// Table holding the participant records
    #[clap(long, default_value = PARTICIPANT_TABLE)]
    pub table: String,

    /// Create the table on startup if it does not exist. Always on for the memory engine
    #[clap(long)]
    pub create_table: bool,

    #[clap(long, env = "MY_AWS_REGION")]
    pub region: Option<String>,

    #[clap(long, env = "MY_AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[clap(long, env = "MY_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Overrides the DynamoDB endpoint, e.g. http://localhost:8000 for DynamoDB local
    #[clap(long, env = "DYNAMODB_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    #[clap(long, env = "ADMIN_USERNAME")]
    pub admin_username: String,

    #[clap(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,
}

impl ServerConfig {
    pub fn storage(&self) -> StorageEngine {
        match self.storage_engine {
            StorageEngineKind::Memory => StorageEngine::Memory,
            StorageEngineKind::Dynamodb => StorageEngine::DynamoDB(
                DynamoDBOptions::default()
                    .set_region(self.region.clone())
                    .set_credentials(self.access_key_id.clone(), self.secret_access_key.clone())
                    .set_endpoint_url(self.endpoint_url.clone()),
            ),
        }
    }

    pub fn should_create_table(&self) -> bool {
        self.create_table || self.storage_engine == StorageEngineKind::Memory
    }

    pub fn admin_credentials(&self) -> AdminCredentials {
        AdminCredentials::new(&self.admin_username, &self.admin_password)
    }
}
