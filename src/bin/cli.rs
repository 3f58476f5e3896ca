use clap::{Parser, Subcommand};
use parcelmap::{
    config::AppConfig,
    db,
    repositories::{SqliteCadastraRepository, SqliteUserRepository},
    services::{CadastraService, RegisterRequest, UserService},
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "parcelmap-cli")]
#[command(about = "Administration tool for the parcel map backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Cadastral entries captured from the map
    Cadastra {
        #[command(subcommand)]
        command: CadastraCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        #[arg(short, long)]
        username: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List {
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },
}

#[derive(Subcommand)]
enum CadastraCommands {
    /// List stored entries
    List,

    /// Write one entry to a standalone shapefile
    Export {
        #[arg(long)]
        id: i64,

        /// Output directory (defaults to CADASTRA_EXPORT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => {
            let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

            match command {
                UserCommands::Create { username, password } => {
                    let (password, confirm_password) = match password {
                        Some(pw) => (pw.clone(), pw),
                        None => (get_password("Password")?, get_password("Confirm password")?),
                    };

                    let request = RegisterRequest {
                        username,
                        password,
                        confirm_password,
                    };

                    match user_service.register(request).await {
                        Ok(user) => {
                            println!("✅ User created successfully!");
                            println!("  ID: {}", user.id);
                            println!("  Username: {}", user.username);
                        }
                        Err(err) => {
                            eprintln!("❌ Failed to create user: {}", err);
                            std::process::exit(1);
                        }
                    }
                }

                UserCommands::List { limit, offset } => {
                    let users = user_service.list_users(Some(limit), Some(offset)).await?;
                    if users.is_empty() {
                        println!("No users found.");
                    } else {
                        println!("{:<5} {:<40} {:<20}", "ID", "Username", "Created");
                        println!("{}", "-".repeat(65));
                        for user in users {
                            println!(
                                "{:<5} {:<40} {:<20}",
                                user.id,
                                user.username,
                                format_timestamp(user.created_at)
                            );
                        }
                    }
                }
            }
        }

        Commands::Cadastra { command } => {
            let service = CadastraService::new(Arc::new(SqliteCadastraRepository::new(pool)));

            match command {
                CadastraCommands::List => {
                    let entries = service.list_cadastra().await?;
                    if entries.is_empty() {
                        println!("No cadastra entries found.");
                    } else {
                        println!(
                            "{:<5} {:<15} {:<30} {:>12} {:<15}",
                            "ID", "Plot", "Owner", "Area (m²)", "Status"
                        );
                        println!("{}", "-".repeat(81));
                        for entry in entries {
                            println!(
                                "{:<5} {:<15} {:<30} {:>12.2} {:<15}",
                                entry.id,
                                entry.plot_number,
                                entry.owner_name,
                                entry.area_sqm,
                                entry.compliance_status
                            );
                        }
                    }
                }

                CadastraCommands::Export { id, out } => {
                    let dir = out.unwrap_or(config.cadastra_export_dir);
                    match service.export_shapefile(id, &dir).await {
                        Ok(path) => println!("✅ Exported cadastra {} to {}", id, path.display()),
                        Err(err) => {
                            eprintln!("❌ Export failed: {}", err);
                            std::process::exit(1);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
