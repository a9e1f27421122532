use anyhow::{bail, Context, Result};
use chainviz_core::{
    audit_chain, hash, is_chain_valid, Block, BlockEdit, BlockReport, Chain, Difficulty,
    MiningControl, MiningReport,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chainviz")]
#[command(about = "Mine, inspect and tamper with a toy proof-of-work chain")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the genesis block
    Genesis,
    /// Digest a set of block fields
    Hash {
        #[arg(long, default_value_t = 0)]
        index: u64,
        #[arg(long, default_value = "0")]
        previous_hash: String,
        #[arg(long, default_value_t = 0)]
        timestamp: u64,
        #[arg(long, default_value = "")]
        data: String,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
    /// Mine blocks onto a fresh chain and print it
    Mine {
        /// Leading zero hex characters required per block
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(0..=64))]
        difficulty: u32,
        /// Payload of a block to mine (repeatable)
        #[arg(long)]
        data: Vec<String>,
        /// Additionally auto-mine this many blocks (2-10)
        #[arg(long)]
        auto: Option<usize>,
    },
    /// Validate a chain read from stdin (a block array or a mined chain)
    Validate,
    /// Mine a chain, overwrite one block's fields, and report what validation sees
    Tamper {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=64))]
        difficulty: u32,
        /// Blocks to mine after genesis
        #[arg(long, default_value_t = 3)]
        blocks: usize,
        /// Index of the block to overwrite
        #[arg(long)]
        index: u64,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        timestamp: Option<u64>,
        #[arg(long)]
        previous_hash: Option<String>,
        #[arg(long)]
        nonce: Option<u64>,
        #[arg(long)]
        hash: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChainInput {
    Blocks(Vec<Block>),
    Chain {
        blocks: Vec<Block>,
        difficulty: Option<Difficulty>,
    },
}

#[derive(Serialize)]
struct MineOutput<'a> {
    chain: &'a Chain,
    reports: Vec<MiningReport>,
}

#[derive(Serialize)]
struct ValidationOutput {
    valid: bool,
    length: usize,
    issues: Vec<BlockReport>,
}

impl ValidationOutput {
    fn new(blocks: &[Block], difficulty: Option<Difficulty>) -> Self {
        Self {
            valid: is_chain_valid(blocks),
            length: blocks.len(),
            issues: audit_chain(blocks, difficulty)
                .into_iter()
                .filter(|r| !r.is_ok())
                .collect(),
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn mine(difficulty: Difficulty, data: Vec<String>, auto: Option<usize>) -> Result<(Chain, Vec<MiningReport>)> {
    let mut chain = Chain::new(difficulty);
    let control = MiningControl::new();
    let mut reports = Vec::new();
    for payload in data {
        reports.push(chain.mine_next(payload, &control)?);
    }
    if let Some(count) = auto {
        let mined = chain.auto_mine(count, &control, |done, total, r| {
            info!(done, total, index = r.index, elapsed_ms = r.elapsed_ms, "auto-mine progress");
        })?;
        reports.extend(mined);
    }
    Ok((chain, reports))
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Genesis => print_json(&chainviz_core::create_genesis_block(), cli.pretty)?,
        Command::Hash {
            index,
            previous_hash,
            timestamp,
            data,
            nonce,
        } => {
            println!("{}", hash::digest(index, &previous_hash, timestamp, &data, nonce));
        }
        Command::Mine {
            difficulty,
            data,
            auto,
        } => {
            let (chain, reports) = mine(Difficulty::new(difficulty)?, data, auto)?;
            print_json(
                &MineOutput {
                    chain: &chain,
                    reports,
                },
                cli.pretty,
            )?;
        }
        Command::Validate => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading chain from stdin")?;
            let (blocks, difficulty) = match serde_json::from_str::<ChainInput>(&input)
                .context("expected a JSON array of blocks or a chain object")?
            {
                ChainInput::Blocks(blocks) => (blocks, None),
                ChainInput::Chain { blocks, difficulty } => (blocks, difficulty),
            };
            let output = ValidationOutput::new(&blocks, difficulty);
            print_json(&output, cli.pretty)?;
            if !output.valid {
                bail!("chain is invalid");
            }
        }
        Command::Tamper {
            difficulty,
            blocks,
            index,
            data,
            timestamp,
            previous_hash,
            nonce,
            hash,
        } => {
            let edit = BlockEdit {
                data,
                timestamp,
                previous_hash,
                nonce,
                hash,
            };
            if edit.is_empty() {
                bail!("nothing to overwrite: pass at least one of --data, --timestamp, --previous-hash, --nonce, --hash");
            }
            let difficulty = Difficulty::new(difficulty)?;
            let payloads = (1..=blocks).map(|i| format!("Block {i} data")).collect();
            let (mut chain, _) = mine(difficulty, payloads, None)?;
            chain.overwrite_block(index, edit)?;
            print_json(&ValidationOutput::new(chain.blocks(), Some(difficulty)), cli.pretty)?;
        }
    }
    Ok(())
}
