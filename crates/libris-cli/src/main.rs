use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use libris::logging::init_tracing;
use libris::provisioning::provisioner_from_config;
use libris_cli::seeder::{self, AccountSpec};
use libris_config::{DatabaseConfig, PasswordConfig, ProvisioningConfig, SeedConfig};
use libris_db::{PgUserStore, init_db_pool, run_migrations};
use libris_models::UserRole;

#[derive(Parser)]
#[command(name = "libris-cli")]
#[command(about = "Libris CLI - Administrative tools for the Libris auth service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the initial accounts from INITIAL_ADMIN_* and INITIAL_USER_*
    Seed,
    /// Create a single account
    CreateUser {
        #[arg(short = 'u', long)]
        username: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// `user` or `admin`
        #[arg(short = 'r', long, default_value = "user")]
        role: UserRole,
    },
    /// Change the role of an existing account
    SetRole {
        #[arg(short = 'u', long)]
        username: String,

        #[arg(short = 'r', long)]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let database_config = DatabaseConfig::from_env()?;
    let pool = init_db_pool(&database_config)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => {
            run_migrations(&pool).await?;
            println!("✅ Migrations applied");
        }
        Commands::Seed => {
            let password_config = PasswordConfig::from_env()?;
            let provisioner = provisioner_from_config(&ProvisioningConfig::from_env()?)?;
            let users = PgUserStore::new(pool);

            let report = seeder::seed_accounts(
                &users,
                provisioner.as_ref(),
                &SeedConfig::from_env(),
                password_config.bcrypt_cost,
            )
            .await?;

            println!(
                "✅ Seeding done: {} created, {} skipped",
                report.created.len(),
                report.skipped.len()
            );
        }
        Commands::CreateUser {
            username,
            email,
            password,
            role,
        } => {
            let spec = AccountSpec {
                username: prompt_or(username, "Username")?,
                email: prompt_or(email, "Email address")?,
                password: match password {
                    Some(password) => password,
                    None => Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords don't match")
                        .interact()?,
                },
                role,
            };

            let password_config = PasswordConfig::from_env()?;
            let user = seeder::create_account(
                &PgUserStore::new(pool),
                &spec,
                password_config.bcrypt_cost,
            )
            .await?;

            println!("\n✅ Account created");
            println!("   Id: {}", user.id);
            println!("   Username: {}", user.username);
            println!("   Role: {}", user.role);
        }
        Commands::SetRole { username, role } => {
            let user = seeder::set_role(&PgUserStore::new(pool), &username, role).await?;
            println!("✅ {} is now {}", user.username, user.role);
        }
    }

    Ok(())
}

fn prompt_or(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}
