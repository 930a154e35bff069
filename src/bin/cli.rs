//! Gibson CLI Client
//!
//! Command-line interface for talking to a Gibson cache server.

use clap::{Parser, Subcommand};
use gibson::{Client, Command, Config, Endpoint, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// Gibson CLI
#[derive(Parser, Debug)]
#[command(name = "gibson-cli")]
#[command(about = "CLI for the Gibson cache server")]
#[command(version)]
struct Args {
    /// Server endpoint (host:port, tcp://host:port, unix:///path or /path)
    #[arg(short, long, default_value = gibson::config::DEFAULT_ENDPOINT)]
    endpoint: Endpoint,

    /// Socket read timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Time to live in seconds (0 = forever)
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Change the time to live of a key
    Ttl {
        key: String,
        ttl: u32,
    },

    /// Increment a numeric value
    Inc { key: String },

    /// Decrement a numeric value
    Dec { key: String },

    /// Lock a key for some seconds
    Lock { key: String, seconds: u32 },

    /// Unlock a key
    Unlock { key: String },

    /// Get every value whose key starts with a prefix
    Mget { prefix: String },

    /// List keys starting with a prefix
    Keys { prefix: String },

    /// Count keys starting with a prefix
    Count { prefix: String },

    /// Read a metadata field of a key
    Meta { key: String, field: String },

    /// Server statistics
    Stats,

    /// Ping the server
    Ping,

    /// Send any command by name with raw arguments
    Raw {
        /// Command name, e.g. MSET
        name: String,

        /// Arguments, joined by spaces
        args: Vec<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gibson=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("Gibson CLI v{}", gibson::VERSION);
    tracing::debug!("Endpoint: {}", args.endpoint);

    let config = Config::builder()
        .endpoint(args.endpoint)
        .read_timeout_ms(args.timeout_ms)
        .build();

    let client = match Client::connect(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    match run(&client, args.command) {
        Ok(value) => print_value(&value),
        Err(e) => {
            eprintln!("(error) {}", e);
            std::process::exit(1);
        }
    }
}

fn run(client: &Client, command: Commands) -> gibson::Result<Value> {
    match command {
        Commands::Set { key, value, ttl } => client.set(&key, &value, ttl),
        Commands::Get { key } => client.get(&key),
        Commands::Del { key } => client.del(&key),
        Commands::Ttl { key, ttl } => client.ttl(&key, ttl),
        Commands::Inc { key } => client.inc(&key),
        Commands::Dec { key } => client.dec(&key),
        Commands::Lock { key, seconds } => client.lock(&key, seconds),
        Commands::Unlock { key } => client.unlock(&key),
        Commands::Mget { prefix } => client.mget(&prefix),
        Commands::Keys { prefix } => client.keys(&prefix),
        Commands::Count { prefix } => client.count(&prefix),
        Commands::Meta { key, field } => client.meta(&key, &field),
        Commands::Stats => client.stats(),
        Commands::Ping => client.ping(),
        Commands::Raw { name, args } => {
            let command = Command::from_name(&name).ok_or_else(|| {
                gibson::GibsonError::Config(format!("unknown command '{}'", name))
            })?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            client.execute(command, &args)
        }
    }
}

fn print_value(value: &Value) {
    match value {
        Value::Bytes(b) if b.is_empty() => println!("OK"),
        Value::Map(m) if m.is_empty() => println!("(empty)"),
        other => println!("{}", other),
    }
}
