//! roster-users - Manage the local user directory
//!
//! Unix-style tool for CRUD against the roster database, with a live watch
//! mode over the reactive pipeline and a remote profile lookup.

use clap::{Parser, Subcommand};
use libroster::logging::{LogFormat, LoggingConfig};
use libroster::remote::ProfileSource;
use libroster::service::RosterService;
use libroster::types::User;
use libroster::{util, Config, Result, RosterError};

#[derive(Parser, Debug)]
#[command(name = "roster-users")]
#[command(version)]
#[command(about = "Manage the local user directory")]
#[command(long_about = "\
roster-users - Manage the local user directory

DESCRIPTION:
    roster-users is a Unix-style tool for the roster user database. Use it to
    list, add, update, or remove users, follow the live user list as it
    changes, and look up remote profiles.

USAGE EXAMPLES:
    # List all users
    roster-users list

    # List users in JSON format
    roster-users list --format json

    # Add a user (the store assigns the id)
    roster-users add \"Alice\" a@x.com 30

    # Replace the fields of user 1
    roster-users update 1 \"Alice\" alice@y.com 31

    # Remove user 1, or everyone
    roster-users delete 1
    roster-users clear --force

    # Follow the live user list (one snapshot per write)
    roster-users watch

    # Fetch a remote profile
    roster-users fetch octocat

CONFIGURATION:
    Configuration file: ~/.config/roster/config.toml
    Database location:  ~/.local/share/roster/users.db

    Override with environment variables:
        ROSTER_CONFIG      - Path to config file
        ROSTER_LOG_FORMAT  - Log format: text, json, pretty
        ROSTER_LOG_LEVEL   - Log level: error..trace

EXIT CODES:
    0 - Success
    1 - Remote operation failed
    2 - Database or configuration error
    3 - Invalid input (bad id, malformed email, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all users
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a single user by id
    Get {
        id: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a user; the store assigns the id
    Add {
        name: String,
        email: String,
        age: i64,
    },

    /// Replace the fields of an existing user
    Update {
        id: i64,
        name: String,
        email: String,
        age: i64,
    },

    /// Remove a user by id
    Delete { id: i64 },

    /// Remove every user
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Follow the live user list; prints a snapshot after every write
    Watch {
        /// Stop after this many snapshots (0 = run until interrupted)
        #[arg(short = 'n', long, default_value_t = 0)]
        limit: u64,
    },

    /// Fetch a remote profile by username
    Fetch {
        username: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the stored preferences
    Show,
    /// Set a preference value
    Set { key: String, value: String },
    /// Remove every stored preference
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        libroster::logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default()?;
    let service = RosterService::from_config(config).await?;

    match cli.command {
        Commands::List { format } => cmd_list(&service, &format).await,
        Commands::Get { id, format } => cmd_get(&service, id, &format).await,
        Commands::Add { name, email, age } => cmd_add(&service, &name, &email, age).await,
        Commands::Update {
            id,
            name,
            email,
            age,
        } => cmd_update(&service, id, &name, &email, age).await,
        Commands::Delete { id } => cmd_delete(&service, id).await,
        Commands::Clear { force } => cmd_clear(&service, force).await,
        Commands::Watch { limit } => cmd_watch(&service, limit).await,
        Commands::Fetch { username, format } => cmd_fetch(&service, &username, &format).await,
        Commands::Prefs { action } => cmd_prefs(&service, action).await,
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(RosterError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn validate_user_fields(name: &str, email: &str, age: i64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RosterError::InvalidInput("name must not be empty".to_string()));
    }
    if !util::is_valid_email(email) {
        return Err(RosterError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    if age < 0 {
        return Err(RosterError::InvalidInput("age must be non-negative".to_string()));
    }
    Ok(())
}

async fn cmd_list(service: &RosterService, format: &str) -> Result<()> {
    validate_format(format)?;
    let users = service.database().list_users().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&users).unwrap());
    } else {
        output_users_text(&users);
    }
    Ok(())
}

async fn cmd_get(service: &RosterService, id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    match service.repository().get(id).await? {
        Some(user) => {
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&user).unwrap());
            } else {
                println!("{}", user);
            }
        }
        None => println!("No user with id {}", id),
    }
    Ok(())
}

async fn cmd_add(service: &RosterService, name: &str, email: &str, age: i64) -> Result<()> {
    validate_user_fields(name, email, age)?;

    let state = service.user_list().await?;
    state.add(name, email, age).await?;

    let count = service.database().list_users().await?.len();
    println!("Added {} <{}> ({} users total)", name, email, count);
    Ok(())
}

async fn cmd_update(
    service: &RosterService,
    id: i64,
    name: &str,
    email: &str,
    age: i64,
) -> Result<()> {
    validate_user_fields(name, email, age)?;

    if service.repository().get(id).await?.is_none() {
        println!("No user with id {}; nothing updated", id);
        return Ok(());
    }

    let state = service.user_list().await?;
    state
        .update(&User::new(name, email, age).with_id(id))
        .await?;
    println!("Updated user {}", id);
    Ok(())
}

async fn cmd_delete(service: &RosterService, id: i64) -> Result<()> {
    match service.repository().get(id).await? {
        Some(user) => {
            let state = service.user_list().await?;
            state.delete(&user).await?;
            println!("Deleted user {}", id);
        }
        None => println!("No user with id {}; nothing deleted", id),
    }
    Ok(())
}

async fn cmd_clear(service: &RosterService, force: bool) -> Result<()> {
    if !force {
        let count = service.database().list_users().await?.len();
        eprintln!(
            "This removes all {} users. Re-run with --force to confirm.",
            count
        );
        return Ok(());
    }

    let state = service.user_list().await?;
    state.clear().await?;
    println!("Cleared all users");
    Ok(())
}

async fn cmd_watch(service: &RosterService, limit: u64) -> Result<()> {
    let state = service.user_list().await?;
    let mut rx = state.subscribe();

    let mut printed: u64 = 0;
    // The cell is seeded; print the current snapshot first
    print_snapshot(&rx.borrow_and_update());
    printed += 1;

    while limit == 0 || printed < limit {
        if rx.changed().await.is_err() {
            break;
        }
        print_snapshot(&rx.borrow_and_update());
        printed += 1;
    }
    Ok(())
}

async fn cmd_fetch(service: &RosterService, username: &str, format: &str) -> Result<()> {
    validate_format(format)?;

    let remote = service.remote()?;
    let profile = remote.fetch(username).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&profile).unwrap());
    } else {
        let display_name = profile
            .name
            .clone()
            .unwrap_or_else(|| util::capitalize_first(&profile.login));
        println!("{} (#{})", display_name, profile.id);
        println!("  login: {}", profile.login);
        if let Some(email) = &profile.email {
            println!("  email: {}", email);
        }
        if let Some(bio) = &profile.bio {
            println!("  bio:   {}", bio);
        }
    }
    Ok(())
}

async fn cmd_prefs(service: &RosterService, action: PrefsAction) -> Result<()> {
    let prefs = service.preferences();

    match action {
        PrefsAction::Show => {
            let name = prefs.user_name().await?.unwrap_or_else(|| "-".to_string());
            let email = prefs.user_email().await?.unwrap_or_else(|| "-".to_string());
            println!("user.name:  {}", name);
            println!("user.email: {}", email);
        }
        PrefsAction::Set { key, value } => {
            prefs.set(&key, &value).await?;
            println!("Set {}", key);
        }
        PrefsAction::Clear => {
            prefs.clear_all().await?;
            println!("Cleared preferences");
        }
    }
    Ok(())
}

fn output_users_text(users: &[User]) {
    if users.is_empty() {
        return;
    }
    for user in users {
        println!(
            "{} | {} | {} | {}",
            user.id.map_or("-".to_string(), |id| id.to_string()),
            user.name,
            user.email,
            user.age
        );
    }
}

fn print_snapshot(users: &[User]) {
    println!("-- {} users @ {}", users.len(), util::format_current_time());
    output_users_text(users);
}
