use clap::{Parser, Subcommand};
use mcphub::{
    config::AppConfig,
    db,
    models::{ConfigDocument, CreateServerRequest, Server, UpdateServerRequest},
    AppState,
};

#[derive(Parser)]
#[command(name = "mcphub-cli")]
#[command(about = "CLI tool for managing the MCP server catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Server catalog commands
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// User commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum ServerCommands {
    /// List servers
    List {
        /// Only show servers that can be claimed
        #[arg(long)]
        available: bool,
    },

    /// Create a new server
    Create {
        #[arg(short, long)]
        name: String,

        /// Category tag, e.g. "filesystem"
        #[arg(short = 't', long = "type")]
        server_type: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Base configuration as a JSON object
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Update fields of an existing server
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short = 't', long = "type")]
        server_type: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Base configuration as a JSON object
        #[arg(short, long)]
        config: Option<String>,

        /// Set the active flag
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a server and its connection history
    Delete { id: String },

    /// Insert the sample servers if the catalog is empty
    Seed,
}

#[derive(Subcommand)]
enum UserCommands {
    /// List known users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Show a user and the servers they own
    Show { user_id: String },
}

fn parse_config(raw: &str) -> anyhow::Result<ConfigDocument> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Configuration must be a JSON object"),
    }
}

fn print_servers(servers: &[Server]) {
    if servers.is_empty() {
        println!("No servers found.");
        return;
    }

    println!(
        "{:<38} {:<26} {:<14} {:<7} {:<20} {:<9}",
        "ID", "Name", "Type", "Active", "Owner", "Connected"
    );
    println!("{}", "-".repeat(118));
    for server in servers {
        println!(
            "{:<38} {:<26} {:<14} {:<7} {:<20} {:<9}",
            server.id,
            server.name,
            server.server_type,
            if server.is_active { "Yes" } else { "No" },
            server.user_id.as_deref().unwrap_or("-"),
            if server.is_connected { "Yes" } else { "No" },
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let state = AppState::new(pool, config.admin_token);
    let registry = state.registry;

    match cli.command {
        Commands::Server { command } => match command {
            ServerCommands::List { available } => {
                let servers = if available {
                    registry.list_available().await?
                } else {
                    registry.list_all().await?
                };
                print_servers(&servers);
            }

            ServerCommands::Create {
                name,
                server_type,
                description,
                config,
            } => {
                let base_config = config
                    .as_deref()
                    .map(parse_config)
                    .transpose()?
                    .unwrap_or_default();

                let server = registry
                    .create(CreateServerRequest {
                        name,
                        server_type,
                        description,
                        base_config,
                    })
                    .await?;

                println!("✅ Server created successfully!");
                println!("  ID: {}", server.id);
                println!("  Name: {}", server.name);
                println!("  Type: {}", server.server_type);
            }

            ServerCommands::Update {
                id,
                name,
                server_type,
                description,
                config,
                active,
            } => {
                let request = UpdateServerRequest {
                    name,
                    server_type,
                    description,
                    base_config: config.as_deref().map(parse_config).transpose()?,
                    is_active: active,
                };

                if request.is_empty() {
                    eprintln!("❌ Nothing to update");
                    std::process::exit(1);
                }

                match registry.update(&id, request).await {
                    Ok(server) => {
                        println!("✅ Server '{}' updated successfully!", server.id);
                        print_servers(&[server]);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to update server: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            ServerCommands::Delete { id } => match registry.delete(&id).await {
                Ok(()) => println!("✅ Server '{}' deleted successfully!", id),
                Err(err) => {
                    eprintln!("❌ Failed to delete server: {}", err);
                    std::process::exit(1);
                }
            },

            ServerCommands::Seed => match registry.seed_sample_servers().await? {
                0 => println!("ℹ️  Catalog already has servers, nothing seeded"),
                count => println!("✅ Created {} sample servers", count),
            },
        },

        Commands::User { command } => match command {
            UserCommands::List { limit, offset } => {
                let users = state
                    .user_service
                    .list_users(Some(limit), Some(offset))
                    .await?;
                if users.is_empty() {
                    println!("No users found.");
                } else {
                    println!("{:<30} {:<30} {:<30} {:<25}", "ID", "Name", "Email", "Created");
                    println!("{}", "-".repeat(118));
                    for user in users {
                        println!(
                            "{:<30} {:<30} {:<30} {:<25}",
                            user.user_id,
                            user.name,
                            user.email,
                            user.created_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }

            UserCommands::Show { user_id } => match state.user_service.get_user(&user_id).await {
                Ok(user) => {
                    println!("User: {} ({})", user.name, user.user_id);
                    println!(
                        "Email: {}",
                        if user.email.is_empty() { "-" } else { &user.email }
                    );
                    print_servers(&registry.list_claimed_by(&user.user_id).await?);
                }
                Err(err) => {
                    eprintln!("❌ Failed to find user '{}': {}", user_id, err);
                    std::process::exit(1);
                }
            },
        },
    }

    Ok(())
}
