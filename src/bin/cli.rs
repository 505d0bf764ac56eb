use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use lifelog_store::engine::{ops, Collection, FileStore, SecureCollection, SortOrder};
use lifelog_store::{DurableStore, Record};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the collection files.
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a collection, optionally sorted and filtered.
    List {
        collection: String,
        /// Field to sort by.
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction: asc or desc.
        #[arg(long, default_value = "asc")]
        order: String,
        /// Filter as FIELD=VALUE; string values match by substring.
        #[arg(long, value_name = "FIELD=VALUE")]
        filter: Option<String>,
        /// Decrypt FIELD while listing (reads LIFELOG_MASTER_KEY).
        #[arg(long, value_name = "FIELD")]
        secret: Option<String>,
    },
    /// Add a record built from FIELD=VALUE pairs.
    Add {
        collection: String,
        #[arg(short, long = "field", value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
        /// Encrypt FIELD at rest (reads LIFELOG_MASTER_KEY).
        #[arg(long, value_name = "FIELD")]
        secret: Option<String>,
    },
    /// Update the given fields of one record; other fields are kept.
    Edit {
        collection: String,
        id: String,
        #[arg(short, long = "field", value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
        /// Encrypt FIELD at rest (reads LIFELOG_MASTER_KEY).
        #[arg(long, value_name = "FIELD")]
        secret: Option<String>,
    },
    /// Delete one record by id.
    Delete { collection: String, id: String },
    /// List the collections present in the store.
    Collections,
    /// Write a collection as pretty-printed JSON, exactly as stored.
    Export {
        collection: String,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let store = FileStore::new(&cli.data_dir)?;

    match cli.command {
        Commands::List {
            collection,
            sort,
            order,
            filter,
            secret,
        } => {
            let records = match secret {
                Some(field) => {
                    let key = master_key()?;
                    SecureCollection::open(&store, &collection, &field, &key)?
                        .records()
                        .to_vec()
                }
                None => Collection::open(&store, &collection).records().to_vec(),
            };

            let mut view = records;
            if let Some(pair) = filter {
                let (field, value) = parse_pair(&pair)?;
                view = ops::filter_by(&view, &field, &value);
            }
            if let Some(field) = sort {
                let order: SortOrder = order.parse()?;
                view = ops::sort_by(&view, &field, order);
            }
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Add {
            collection,
            fields,
            secret,
        } => {
            let record = Record::new(parse_pairs(&fields)?);
            let id = record.id.clone();
            match secret {
                Some(field) => {
                    let key = master_key()?;
                    SecureCollection::open(&store, &collection, &field, &key)?.add(record)?;
                }
                None => Collection::open(&store, &collection).add(record)?,
            }
            println!("OK {}", id);
        }
        Commands::Edit {
            collection,
            id,
            fields,
            secret,
        } => {
            let updates = parse_pairs(&fields)?;
            match secret {
                Some(field) => {
                    let key = master_key()?;
                    let mut handle = SecureCollection::open(&store, &collection, &field, &key)?;
                    let merged = merge_fields(handle.get(&id), &id, updates)?;
                    handle.update(&id, merged)?;
                }
                None => {
                    let mut handle = Collection::open(&store, &collection);
                    let merged = merge_fields(handle.get(&id), &id, updates)?;
                    handle.update(&id, merged)?;
                }
            }
            println!("OK");
        }
        Commands::Delete { collection, id } => {
            Collection::open(&store, &collection).remove(&id)?;
            println!("OK");
        }
        Commands::Collections => {
            println!("{}", serde_json::to_string_pretty(&store.keys())?);
        }
        Commands::Export { collection, output } => {
            let records = store.load(&collection);
            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("could not write {}", path.display()))?;
                    println!("OK {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

/// Splits `FIELD=VALUE`, parsing the value as JSON where possible and
/// falling back to a plain string.
fn parse_pair(pair: &str) -> anyhow::Result<(String, Value)> {
    let (field, value) = pair
        .split_once('=')
        .with_context(|| format!("expected FIELD=VALUE, got '{}'", pair))?;
    let value: Value = serde_json::from_str(value).unwrap_or(Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in pairs {
        let (field, value) = parse_pair(pair)?;
        fields.insert(field, value);
    }
    Ok(fields)
}

/// Overlays `updates` onto the record's current fields.
fn merge_fields(
    current: Option<&Record>,
    id: &str,
    updates: Map<String, Value>,
) -> anyhow::Result<Map<String, Value>> {
    let record = current.with_context(|| format!("record not found: {}", id))?;
    let mut merged = record.fields.clone();
    merged.extend(updates);
    Ok(merged)
}

/// Reads the codec key from `LIFELOG_MASTER_KEY` (hex-encoded, 32 bytes).
fn master_key() -> anyhow::Result<Vec<u8>> {
    let hex_key = env::var("LIFELOG_MASTER_KEY")
        .context("LIFELOG_MASTER_KEY must be set to use --secret")?;
    let key = hex::decode(hex_key.trim()).context("LIFELOG_MASTER_KEY must be hex-encoded")?;
    if key.len() != 32 {
        bail!("LIFELOG_MASTER_KEY must decode to 32 bytes, got {}", key.len());
    }
    Ok(key)
}
