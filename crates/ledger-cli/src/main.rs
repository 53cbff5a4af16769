use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{block_digest, payload::canonical_json, Block, Chain, ChainConfig};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Build, mine and verify a hash-chained proof-of-work ledger")]
struct Cli {
    /// Leading zero hex characters required of mined hashes
    #[arg(long, global = true, env = "LEDGER_DIFFICULTY", default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Give up mining a block after this many nonces (default: never)
    #[arg(long, global = true, env = "LEDGER_MAX_ATTEMPTS")]
    max_attempts: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the two-block sample chain, print it and check it
    Demo {
        /// Rewrite block 1's payload afterwards and report what validation finds
        #[arg(long)]
        tamper: bool,
    },
    /// Mine a single block and print it as JSON
    Mine {
        #[arg(long)]
        index: u64,
        #[arg(long)]
        timestamp: String,
        /// Payload as JSON text, e.g. '{"amount":4}'
        #[arg(long)]
        data: String,
        #[arg(long, default_value = ledger_core::constants::GENESIS_PREVIOUS_HASH)]
        previous_hash: String,
    },
    /// Print the digest of the given block fields
    Hash {
        #[arg(long)]
        index: u64,
        #[arg(long)]
        timestamp: String,
        /// Payload as JSON text
        #[arg(long)]
        data: String,
        #[arg(long, default_value = ledger_core::constants::GENESIS_PREVIOUS_HASH)]
        previous_hash: String,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
}

fn parse_data(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("--data is not valid JSON: {raw}"))
}

fn demo(config: &ChainConfig, tamper: bool) -> Result<()> {
    let mut chain = Chain::from_config(config)?;
    chain.add_block(Block::new(1, "10/01/2018", &json!({ "amount": 4 }))?)?;
    chain.add_block(Block::new(2, "12/01/2018", &json!({ "amount": 10 }))?)?;

    println!("{}", chain.to_pretty_json()?);
    println!("valid: {}", chain.is_chain_valid());

    if tamper {
        if let Some(block) = chain.block_mut(1) {
            block.data = json!({ "amount": 100 });
        }
        info!("rewrote block 1 payload without remining");
        println!("valid after tamper: {}", chain.is_chain_valid());
        for finding in chain.audit() {
            println!("{finding}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChainConfig {
        difficulty: cli.difficulty,
        max_attempts: cli.max_attempts,
    };

    match cli.cmd {
        Command::Demo { tamper } => demo(&config, tamper)?,
        Command::Mine {
            index,
            timestamp,
            data,
            previous_hash,
        } => {
            let data = parse_data(&data)?;
            let mut block = Block::from_value(index, timestamp, data, previous_hash, 0);
            let report = block.mine_with(config.difficulty, &config.search_limit())?;
            info!(attempts = report.attempts, elapsed = ?report.elapsed, "search finished");
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Command::Hash {
            index,
            timestamp,
            data,
            previous_hash,
            nonce,
        } => {
            let data = parse_data(&data)?;
            let digest = block_digest(index, &timestamp, &canonical_json(&data), &previous_hash, nonce);
            println!("{}", hex::encode(digest));
        }
    }
    Ok(())
}
