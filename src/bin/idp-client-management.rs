//! IdP OIDC Client Management CLI Tool
//!
//! A command-line interface for registering and maintaining OIDC clients through
//! the IdP client management API (`/client-mgmt/oidc-client`). The server must be
//! started with `ENABLE_CLIENT_API=true`.
//!
//! ## Usage Examples
//!
//! ### Register a new client
//! ```bash
//! idp-client-management --base-url http://localhost:8080 create \
//!   --client-id "mock_id_v1" \
//!   --name "Service Portal" \
//!   --relying-party-id "RELYING_PARTY_ID" \
//!   --logo-uri "http://service.com/logo.png" \
//!   --public-key-file ./client-key.jwk.json \
//!   --redirect-uri "http://service.com/home" \
//!   --grant-type authorization_code \
//!   --auth-method private_key_jwt
//! ```
//!
//! ### Update a client
//! ```bash
//! idp-client-management --base-url http://localhost:8080 update \
//!   --client-id "mock_id_v1" \
//!   --name "Service Portal" \
//!   --logo-uri "http://service.com/logo.png" \
//!   --redirect-uri "http://service.com/home" \
//!   --status inactive
//! ```
//!
//! Update replaces every list field; the registered public key is kept.
//!
//! ### Get the active client view
//! ```bash
//! idp-client-management --base-url http://localhost:8080 get --client-id "mock_id_v1"
//! ```
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error (network, parsing, etc.)
//! - 2: Client management error reported by the server

use clap::{Args, Parser, Subcommand, ValueEnum};
use idp::oauth::types::{ClientCreateRequest, ClientResponse, ClientUpdateRequest};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use url::Url;

/// Main CLI application structure
#[derive(Parser)]
#[command(
    name = "idp-client-management",
    about = "IdP OIDC Client Management CLI Tool",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Base URL of the IdP server
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output for debugging")]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// Human-readable table format
    Table,
}

/// Client status accepted by the update route
#[derive(Debug, Clone, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
}

impl StatusArg {
    fn as_str(&self) -> &'static str {
        match self {
            StatusArg::Active => "active",
            StatusArg::Inactive => "inactive",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Register a new OIDC client
    Create(CreateArgs),
    /// Overwrite the mutable fields of an existing client
    Update(UpdateArgs),
    /// Get the active view of a client
    Get(GetArgs),
}

/// Client list fields shared by create and update
#[derive(Args)]
struct ClientListArgs {
    /// Redirect URIs (can be specified multiple times)
    #[arg(long = "redirect-uri")]
    redirect_uris: Vec<String>,

    /// User claims (can be specified multiple times)
    #[arg(long = "claim")]
    claims: Vec<String>,

    /// Authentication context references (can be specified multiple times)
    #[arg(long = "acr-value")]
    acr_values: Vec<String>,

    /// Grant types (can be specified multiple times)
    #[arg(long = "grant-type")]
    grant_types: Vec<String>,

    /// Client authentication methods (can be specified multiple times)
    #[arg(long = "auth-method")]
    auth_methods: Vec<String>,
}

/// Arguments for client registration
#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    client_id: String,

    /// Human-readable name for the client
    #[arg(long)]
    name: String,

    #[arg(long)]
    relying_party_id: String,

    #[arg(long)]
    logo_uri: String,

    /// Path to a file holding the client's RSA public key as a JWK
    #[arg(long)]
    public_key_file: PathBuf,

    #[command(flatten)]
    lists: ClientListArgs,
}

/// Arguments for client updates
#[derive(Args)]
struct UpdateArgs {
    #[arg(long)]
    client_id: String,

    /// Human-readable name for the client
    #[arg(long)]
    name: String,

    #[arg(long)]
    logo_uri: String,

    #[arg(long, value_enum, default_value = "active")]
    status: StatusArg,

    #[command(flatten)]
    lists: ClientListArgs,
}

/// Arguments for client retrieval
#[derive(Args)]
struct GetArgs {
    #[arg(long)]
    client_id: String,
}

/// Application errors
#[derive(Debug)]
enum AppError {
    /// Network or HTTP client errors
    Network(reqwest::Error),
    /// JSON parsing or serialization errors
    Json(serde_json::Error),
    /// Client management errors reported by the server
    ClientManagement(String),
    /// General application errors
    General(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::ClientManagement(_) => 2,
            AppError::Network(_) | AppError::Json(_) | AppError::General(_) => 1,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::ClientManagement(msg) => write!(f, "Client management error: {}", msg),
            AppError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Main application entry point
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Create(args) => create_client(&cli, args).await,
        Commands::Update(args) => update_client(&cli, args).await,
        Commands::Get(args) => get_client(&cli, args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(err.exit_code());
    }
}

fn optional_list(values: &[String]) -> Vec<Option<String>> {
    values.iter().cloned().map(Some).collect()
}

fn client_url(base_url: &str, client_id: Option<&str>) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::General(format!("Invalid base URL {}: {}", base_url, e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AppError::General(format!("Invalid base URL {}", base_url)))?;
        segments.pop_if_empty().extend(["client-mgmt", "oidc-client"]);
        if let Some(client_id) = client_id {
            segments.push(client_id);
        }
    }
    Ok(url)
}

/// Register a new OIDC client
async fn create_client(cli: &Cli, args: &CreateArgs) -> Result<(), AppError> {
    let key_text = std::fs::read_to_string(&args.public_key_file).map_err(|e| {
        AppError::General(format!(
            "Failed to read {}: {}",
            args.public_key_file.display(),
            e
        ))
    })?;
    let public_key = match serde_json::from_str::<Value>(&key_text)? {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::General(
                "Public key file must contain a JSON object".to_string(),
            ));
        }
    };

    let request = ClientCreateRequest {
        client_id: args.client_id.clone(),
        client_name: args.name.clone(),
        relying_party_id: args.relying_party_id.clone(),
        logo_uri: args.logo_uri.clone(),
        public_key,
        redirect_uris: optional_list(&args.lists.redirect_uris),
        user_claims: optional_list(&args.lists.claims),
        auth_context_refs: optional_list(&args.lists.acr_values),
        grant_types: optional_list(&args.lists.grant_types),
        client_auth_methods: optional_list(&args.lists.auth_methods),
    };

    if cli.verbose {
        eprintln!("Create request: {}", serde_json::to_string_pretty(&request)?);
    }

    let response = Client::new()
        .post(client_url(&cli.base_url, None)?)
        .json(&request)
        .send()
        .await?;

    let created: ClientResponse = handle_response(cli, response, "create client").await?;
    output_response(&cli.format, &created)
}

/// Overwrite the mutable fields of an existing client
async fn update_client(cli: &Cli, args: &UpdateArgs) -> Result<(), AppError> {
    let request = ClientUpdateRequest {
        client_name: args.name.clone(),
        logo_uri: args.logo_uri.clone(),
        redirect_uris: optional_list(&args.lists.redirect_uris),
        user_claims: optional_list(&args.lists.claims),
        auth_context_refs: optional_list(&args.lists.acr_values),
        grant_types: optional_list(&args.lists.grant_types),
        client_auth_methods: optional_list(&args.lists.auth_methods),
        status: args.status.as_str().to_string(),
    };

    if cli.verbose {
        eprintln!("Update request: {}", serde_json::to_string_pretty(&request)?);
    }

    let response = Client::new()
        .put(client_url(&cli.base_url, Some(&args.client_id))?)
        .json(&request)
        .send()
        .await?;

    let updated: ClientResponse = handle_response(cli, response, "update client").await?;
    output_response(&cli.format, &updated)
}

/// Get the active view of a client
async fn get_client(cli: &Cli, args: &GetArgs) -> Result<(), AppError> {
    if cli.verbose {
        eprintln!("Getting client information for: {}", args.client_id);
    }

    let response = Client::new()
        .get(client_url(&cli.base_url, Some(&args.client_id))?)
        .send()
        .await?;

    let client_view: Value = handle_response(cli, response, "get client").await?;
    output_response(&cli.format, &client_view)
}

async fn handle_response<T>(cli: &Cli, response: Response, action: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        StatusCode::NOT_FOUND => {
            let body = response.text().await?;
            if body.is_empty() {
                Err(AppError::ClientManagement(
                    "Client management API is not enabled on this server".to_string(),
                ))
            } else {
                Err(AppError::ClientManagement(describe_error(&body)))
            }
        }
        status => {
            let body = response.text().await?;
            Err(AppError::ClientManagement(format!(
                "Failed to {} with status {}: {}",
                action,
                status,
                describe_error(&body)
            )))
        }
    }
}

/// Render an `{"error", "error_description"}` body, or the raw text otherwise
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match (value["error"].as_str(), value["error_description"].as_str()) {
            (Some(error), Some(description)) => format!("{} ({})", description, error),
            (Some(error), None) => error.to_string(),
            _ => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

/// Output response data in the requested format
fn output_response<T: Serialize>(format: &OutputFormat, data: &T) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(data)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Table => {
            let json_value: Value = serde_json::to_value(data)?;
            print_table(&json_value, 0);
        }
    }
    Ok(())
}

/// Print data in table format (recursive for nested objects)
fn print_table(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) => {
                        println!("{}{}:", prefix, key);
                        print_table(val, indent + 1);
                    }
                    Value::Array(arr) => {
                        println!("{}{}:", prefix, key);
                        for item in arr {
                            println!("{}  - {}", prefix, format_value(item));
                        }
                    }
                    _ => {
                        println!("{}{}: {}", prefix, key, format_value(val));
                    }
                }
            }
        }
        _ => {
            println!("{}{}", prefix, format_value(value));
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_else(|_| "invalid".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url() {
        assert_eq!(
            client_url("http://localhost:8080", None).unwrap().as_str(),
            "http://localhost:8080/client-mgmt/oidc-client"
        );
        assert_eq!(
            client_url("http://localhost:8080/idp/", Some("mock_id_v1"))
                .unwrap()
                .as_str(),
            "http://localhost:8080/idp/client-mgmt/oidc-client/mock_id_v1"
        );
    }

    #[test]
    fn test_client_url_encodes_client_id() {
        let url = client_url("http://localhost:8080", Some("a/b?c#d")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/client-mgmt/oidc-client/a%2Fb%3Fc%23d"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_client_url_rejects_invalid_base() {
        assert!(client_url("not a url", None).is_err());
        assert!(client_url("mailto:admin@example.com", Some("x")).is_err());
    }
}
