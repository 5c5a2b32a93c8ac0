//! memwire CLI
//!
//! Command-line interface for talking to a memcached server.

use clap::{Parser, Subcommand};
use memwire::{Client, Compression, Config, StatValue, StatsKind, StatsMap};
use tracing_subscriber::{fmt, EnvFilter};

/// memwire CLI
#[derive(Parser, Debug)]
#[command(name = "memwire-cli")]
#[command(about = "CLI for memcached servers")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = memwire::DEFAULT_PORT)]
    port: u16,

    /// Connect timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Compress stored values (smaz or lzw)
    #[arg(short, long)]
    compression: Option<Compression>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get { key: String },

    /// Store a value
    Set {
        key: String,
        value: String,
        #[arg(short, long, default_value_t = 0)]
        exptime: u32,
    },

    /// Store a value if the key is absent
    Add {
        key: String,
        value: String,
        #[arg(short, long, default_value_t = 0)]
        exptime: u32,
    },

    /// Store a value if the key exists
    Replace {
        key: String,
        value: String,
        #[arg(short, long, default_value_t = 0)]
        exptime: u32,
    },

    /// Append raw data to a value
    Append { key: String, data: String },

    /// Prepend raw data to a value
    Prepend { key: String, data: String },

    /// Delete a key
    Del { key: String },

    /// Increment a counter
    Incr {
        key: String,
        #[arg(default_value_t = 1)]
        delta: u64,
    },

    /// Decrement a counter
    Decr {
        key: String,
        #[arg(default_value_t = 1)]
        delta: u64,
    },

    /// Update the expiration time of a key
    Touch { key: String, exptime: u32 },

    /// Show statistics (general, settings, items, slabs, sizes, conns, reset
    /// or cachedump:<slab>:<limit>)
    Stats {
        #[arg(default_value = "general")]
        kind: StatsKind,
    },

    /// Show the server version
    Version,

    /// Invalidate every item
    Flush,

    /// Run a counter walkthrough: set 1, +2, +2, +2, -3, +1
    Demo {
        #[arg(default_value = "memwire:demo:counter")]
        key: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,memwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().host(&args.host).port(args.port);
    if let Some(ms) = args.timeout_ms {
        builder = builder.connect_timeout(std::time::Duration::from_millis(ms));
    }
    if let Some(compression) = args.compression {
        builder = builder.compression(compression);
    }
    let mut client = Client::new(builder.build());

    if let Err(e) = run(&mut client, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(client: &mut Client, command: Commands) -> memwire::Result<()> {
    match command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(not found)"),
        },
        Commands::Set { key, value, exptime } => {
            let stored = client.set(&key, value, exptime)?;
            report(client, stored)
        }
        Commands::Add { key, value, exptime } => {
            let stored = client.add(&key, value, exptime)?;
            report(client, stored)
        }
        Commands::Replace { key, value, exptime } => {
            let stored = client.replace(&key, value, exptime)?;
            report(client, stored)
        }
        Commands::Append { key, data } => {
            let stored = client.append(&key, data)?;
            report(client, stored)
        }
        Commands::Prepend { key, data } => {
            let stored = client.prepend(&key, data)?;
            report(client, stored)
        }
        Commands::Del { key } => {
            let deleted = client.delete(&key)?;
            report(client, deleted)
        }
        Commands::Incr { key, delta } => print_counter(client.incr(&key, delta)?),
        Commands::Decr { key, delta } => print_counter(client.decr(&key, delta)?),
        Commands::Touch { key, exptime } => {
            let touched = client.touch(&key, exptime)?;
            report(client, touched)
        }
        Commands::Stats { kind } => {
            for (addr, stats) in client.stats(kind)? {
                println!("{}", addr);
                print_stats(&stats, 1);
            }
        }
        Commands::Version => match client.version()? {
            Some(version) => println!("{}", version),
            None => println!("(no version)"),
        },
        Commands::Flush => {
            let flushed = client.flush()?;
            report(client, flushed)
        }
        Commands::Demo { key } => demo(client, &key)?,
    }
    Ok(())
}

fn report(client: &Client, ok: bool) {
    if ok {
        println!("OK");
    } else {
        println!("FAILED ({:?})", client.last_result());
    }
}

fn print_counter(counter: Option<u64>) {
    match counter {
        Some(value) => println!("{}", value),
        None => println!("(not found)"),
    }
}

fn print_stats(stats: &StatsMap, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in stats {
        match value {
            StatValue::Value(value) => println!("{}{}: {}", indent, key, value),
            StatValue::Map(children) => {
                println!("{}{}:", indent, key);
                print_stats(children, depth + 1);
            }
        }
    }
}

fn demo(client: &mut Client, key: &str) -> memwire::Result<()> {
    client.set(key, 1i64, 0)?;
    println!("set {} = {:?}", key, client.get(key)?);

    for delta in [2, 2, 2] {
        println!("incr {} -> {:?}", delta, client.incr(key, delta)?);
    }
    println!("decr 3 -> {:?}", client.decr(key, 3)?);
    println!("incr 1 -> {:?}", client.incr(key, 1)?);

    client.delete(key)?;
    Ok(())
}
