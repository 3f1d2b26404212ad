use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use jobly::{
    ApiError, ApplyOutcome, AuthErrors, ClientConfig, FileTokenStore, HttpJoblyApi, IssuerConfig, JobId, LoginData,
    Resolution, Session, SessionError, SignupData, TokenError, TokenIssuer, TokenSubject,
};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("request refused: {0}")]
    Auth(#[from] AuthErrors),
    #[error("stored session is unusable: {0}")]
    Unresolved(SessionError),
    #[error("not logged in; run `jobly login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "jobly", about = "Jobly session and token CLI")]
struct Cli {
    /// API base URL. Overrides `JOBLY_API_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Token storage file. Overrides `JOBLY_STORAGE_PATH`.
    #[arg(long)]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Token(TokenCommand),
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "JOBLY_PASSWORD")]
        password: String,
    },
    Signup(SignupArgs),
    Logout,
    Whoami,
    Apply {
        job_id: JobId,
    },
}

#[derive(Args, Debug)]
struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Subcommand, Debug)]
enum TokenSubcommand {
    /// Sign a token with `SECRET_KEY`.
    Issue {
        #[arg(long)]
        username: String,
        #[arg(long)]
        admin: bool,
    },
    /// Check a token's signature with `SECRET_KEY`.
    Verify { token: String },
    /// Print a token's claims without checking the signature.
    Decode { token: String },
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    username: String,
    #[arg(long, env = "JOBLY_PASSWORD")]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(storage_path) = cli.storage_path {
        config.storage_path = storage_path;
    }

    match cli.command {
        Command::Token(command) => run_token(command),
        Command::Login { username, password } => {
            let mut session = open_session(&config)?;
            let resolution = session.login(&LoginData { username, password }).await?;
            print_resolved_user(&session, resolution)
        }
        Command::Signup(args) => {
            let mut session = open_session(&config)?;
            let data = SignupData {
                username: args.username,
                password: args.password,
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
            };
            let resolution = session.signup(&data).await?;
            print_resolved_user(&session, resolution)
        }
        Command::Logout => {
            let mut session = open_session(&config)?;
            session.logout().await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let mut session = open_session(&config)?;
            let resolution = session.restore().await?;
            print_resolved_user(&session, resolution)
        }
        Command::Apply { job_id } => {
            let mut session = open_session(&config)?;
            let resolution = session.restore().await?;
            require_user(resolution)?;
            match session.apply_to_job(job_id).await? {
                ApplyOutcome::Applied => println!("applied to job {job_id}"),
                ApplyOutcome::AlreadyApplied => println!("already applied to job {job_id}"),
            }
            Ok(())
        }
    }
}

fn run_token(command: TokenCommand) -> Result<(), CliError> {
    match command.command {
        TokenSubcommand::Issue { username, admin } => {
            let issuer = TokenIssuer::from_config(&IssuerConfig::from_env());
            println!("{}", issuer.create_token(&TokenSubject::new(username, Some(admin)))?);
            Ok(())
        }
        TokenSubcommand::Verify { token } => {
            let issuer = TokenIssuer::from_config(&IssuerConfig::from_env());
            print_json(&serde_json::to_value(issuer.verify(&token)?)?)
        }
        TokenSubcommand::Decode { token } => {
            print_json(&serde_json::to_value(jobly::token::decode_claims(&token)?)?)
        }
    }
}

fn open_session(config: &ClientConfig) -> Result<Session, CliError> {
    let api = HttpJoblyApi::new(config)?;
    let store = FileTokenStore::new(config.storage_path.clone());
    tracing::debug!(base_url = api.base_url(), storage = %store.path().display(), "session opened");
    Ok(Session::new(Arc::new(api), Arc::new(store)))
}

fn require_user(resolution: Resolution) -> Result<(), CliError> {
    match resolution {
        Resolution::Authenticated => Ok(()),
        Resolution::NoSession => Err(CliError::NotLoggedIn),
        Resolution::Invalid(e) => Err(CliError::Unresolved(e)),
    }
}

fn print_resolved_user(session: &Session, resolution: Resolution) -> Result<(), CliError> {
    require_user(resolution)?;
    let Some(user) = session.current_user() else {
        return Err(CliError::NotLoggedIn);
    };
    print_json(&serde_json::to_value(user)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
