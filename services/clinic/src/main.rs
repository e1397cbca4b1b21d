use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use clinic::config::{ClinicConfig, SeedConfig};
use clinic::router::build_router;
use clinic::state::AppState;
use clinic::usecase::seed::{SeedUseCase, SuperuserInput};
use clinic_core::config::Config;
use clinic_core::tracing::init_tracing;

#[derive(Parser)]
#[command(name = "clinic", about = "Clinic administration backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create roles, groups, group permissions and the superuser
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);
    init_tracing(matches!(command, Command::Serve));

    let config = ClinicConfig::from_env()?;
    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let state = AppState {
        db,
        bcrypt_cost: config.bcrypt_cost,
    };

    match command {
        Command::Serve => serve(state, config.clinic_port).await,
        Command::Seed => seed(state).await,
    }
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("clinic service listening on {addr}");
    axum::serve(listener, router).await.context("server error")
}

async fn seed(state: AppState) -> anyhow::Result<()> {
    let config = SeedConfig::from_env()?;
    let usecase = SeedUseCase {
        access: state.access_repo(),
        users: state.user_repo(),
        hasher: state.hasher(),
    };
    let report = usecase
        .execute(SuperuserInput {
            email: config.superuser_email,
            password: config.superuser_password,
            name: config.superuser_name,
        })
        .await?;

    info!(
        roles_created = report.roles_created,
        groups_created = report.groups_created,
        grants_added = report.grants_added,
        superuser = ?report.superuser,
        "seed finished"
    );
    Ok(())
}
