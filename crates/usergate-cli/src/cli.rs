use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "usergate")]
#[command(about = "usergate CLI: issue, inspect and revoke OAuth2 tokens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to usergate.toml)
    #[arg(short, long, global = true, env = "USERGATE_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations, seeding reference clients on a fresh database
    Migrate,
    /// Issue a token through one of the supported grants
    IssueToken(IssueTokenArgs),
    /// Resolve the principal behind a bearer token
    Authenticate(AuthenticateArgs),
    /// Revoke the token carrying a refresh token
    Revoke(RevokeArgs),
    /// Read user records
    Users(UsersArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GrantArg {
    Password,
    ClientCredentials,
    RefreshToken,
}

#[derive(clap::Args)]
pub struct IssueTokenArgs {
    /// Grant to use
    #[arg(long, default_value = "password")]
    pub grant: GrantArg,
    /// OAuth client id
    #[arg(long)]
    pub client_id: String,
    /// OAuth client secret
    #[arg(long, env = "USERGATE_CLIENT_SECRET")]
    pub client_secret: Option<String>,
    /// Username (password grant)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (password grant)
    #[arg(long, env = "USERGATE_PASSWORD")]
    pub password: Option<String>,
    /// Refresh token (refresh_token grant)
    #[arg(long)]
    pub refresh_token: Option<String>,
    /// Requested scope, space separated
    #[arg(long)]
    pub scope: Option<String>,
}

#[derive(clap::Args)]
pub struct AuthenticateArgs {
    /// Bearer token, with or without the "Bearer " prefix
    pub token: String,
    /// Scope the token must cover
    #[arg(long)]
    pub scope: Option<String>,
    /// Return an unauthenticated context instead of failing
    #[arg(long)]
    pub continue_on_failure: bool,
}

#[derive(clap::Args)]
pub struct RevokeArgs {
    /// Refresh token to revoke
    pub refresh_token: String,
}

#[derive(clap::Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users, one page at a time
    List(ListUsersArgs),
    /// Show one user by id, or "me" for the owner of --token
    Get(GetUserArgs),
}

#[derive(clap::Args)]
pub struct ListUsersArgs {
    /// Users per page
    #[arg(long, default_value_t = 10)]
    pub per_page: i64,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: i64,
}

#[derive(clap::Args)]
pub struct GetUserArgs {
    /// Numeric user id or "me"
    pub id: String,
    /// Bearer token, required for "me"
    #[arg(long, env = "USERGATE_TOKEN")]
    pub token: Option<String>,
}
