//! EmberKV CLI Client
//!
//! Command-line interface for interacting with EmberKV.

use clap::{Parser, Subcommand};
use emberkv::network::Client;
use emberkv::Value;

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server, optionally echoing a message
    Ping {
        message: Option<String>,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get one field of a hash
    Hget { key: String, field: String },

    /// Set one field of a hash
    Hset {
        key: String,
        field: String,
        value: String,
    },

    /// Get every field of a hash
    Hgetall { key: String },

    /// Expire a key after the given number of seconds
    Expire {
        key: String,
        #[arg(allow_hyphen_values = true)]
        seconds: i64,
    },

    /// Seconds left before a key expires
    Ttl { key: String },

    /// Send any command verbatim
    Raw {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        parts: Vec<String>,
    },
}

impl Commands {
    fn into_parts(self) -> Vec<String> {
        match self {
            Commands::Ping { message } => {
                let mut parts = vec!["PING".to_string()];
                parts.extend(message);
                parts
            }
            Commands::Get { key } => vec!["GET".into(), key],
            Commands::Set { key, value } => vec!["SET".into(), key, value],
            Commands::Hget { key, field } => vec!["HGET".into(), key, field],
            Commands::Hset { key, field, value } => vec!["HSET".into(), key, field, value],
            Commands::Hgetall { key } => vec!["HGETALL".into(), key],
            Commands::Expire { key, seconds } => vec!["EXPIRE".into(), key, seconds.to_string()],
            Commands::Ttl { key } => vec!["TTL".into(), key],
            Commands::Raw { parts } => parts,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match client.call(args.command.into_parts()) {
        Ok(reply) => {
            println!("{}", reply);
            if let Value::Error(_) = reply {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
