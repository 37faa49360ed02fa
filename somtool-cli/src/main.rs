use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use somtool_core::{Archive, SomFile};
use tabled::{Table, Tabled};

/// HP-UX SOM object and archive inspection CLI
#[derive(Parser)]
#[command(
    name = "somtool",
    about = "Inspect SOM binaries and ar/LST archives (attributes, symbols, members)",
    version,
    author
)]
struct Cli {
    /// Path to a SOM object or archive
    #[arg(required = true)]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show classified attributes of a SOM object
    Info {
        /// Byte offset of the SOM within the file
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the symbol table of a SOM object
    Symbols {
        /// Byte offset of the SOM within the file
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// List the members of an archive
    Members,
    /// Extract archive members into a directory
    Extract {
        /// Directory to write members into
        out_dir: PathBuf,
        /// Only extract the member with this name
        #[arg(long)]
        member: Option<String>,
    },
}

#[derive(Serialize)]
struct InfoSummary {
    cpu: String,
    kind: String,
    debug: bool,
    endian: String,
    symbol_total: u32,
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Type")]
    symbol_type: u32,
    #[tabled(rename = "Scope")]
    scope: u32,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Offset")]
    offset: u64,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Mode")]
    mode: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { offset, json } => {
            let som = SomFile::open_at(&cli.path, offset)?;
            let attr = som.attributes();
            let summary = InfoSummary {
                cpu: attr.cpu.to_string(),
                kind: attr.kind.to_string(),
                debug: attr.debug,
                endian: if attr.little_endian { "little" } else { "big" }.to_string(),
                symbol_total: som.header().symbol_total,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("cpu:     {}", summary.cpu);
                println!("kind:    {}", summary.kind);
                println!("debug:   {}", summary.debug);
                println!("endian:  {}", summary.endian);
                println!("symbols: {}", summary.symbol_total);
            }
        }

        Command::Symbols { offset } => {
            let mut som = SomFile::open_at(&cli.path, offset)?;
            let names = som.symbol_names()?;
            let symbols = som.symbols()?;
            if symbols.is_empty() {
                println!("No symbols (symbol table absent or empty).");
                return Ok(());
            }
            let rows: Vec<SymbolRow> = symbols
                .iter()
                .zip(names)
                .map(|(sym, name)| {
                    let kind = if sym.is_function() {
                        "func".green().to_string()
                    } else if sym.is_variable() {
                        "var".blue().to_string()
                    } else {
                        String::new()
                    };
                    SymbolRow {
                        name,
                        kind,
                        symbol_type: sym.symbol_type,
                        scope: sym.symbol_scope,
                        value: format!("{:#010x}", sym.symbol_value),
                    }
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Command::Members => {
            let mut archive = Archive::open(&cli.path)?;
            let rows: Vec<MemberRow> = archive
                .member_headers()?
                .iter()
                .enumerate()
                .map(|(index, m)| MemberRow {
                    index,
                    name: m.name.clone(),
                    offset: m.som_offset,
                    size: m.som_size,
                    date: m.date.clone(),
                    mode: m.mode.clone(),
                })
                .collect();
            println!("{}", Table::new(rows));
            for warning in archive.warnings() {
                eprintln!("{} {}", "warning:".yellow(), warning);
            }
        }

        Command::Extract { out_dir, member } => {
            let mut archive = Archive::open(&cli.path)?;
            let written = archive.extract_members(&out_dir, member.as_deref())?;
            for name in &written {
                println!("{}", name);
            }
            println!("{} member(s) written to {}", written.len(), out_dir.display());
        }
    }

    Ok(())
}
