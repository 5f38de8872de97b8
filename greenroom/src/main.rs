use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use greenroom_core::{AssetRecord, AssetStore, project};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Greenroom - a media asset store
#[derive(Parser)]
#[command(name = "greenroom")]
#[command(about = "Media asset store with per-kind XML metadata projection", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to GREENROOM_ROOT env var or ./greenroom-store)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Log filter (defaults to RUST_LOG or "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an asset payload with metadata
    Add {
        /// Payload file path, or "-" to read stdin
        path: PathBuf,

        /// Extension for the new id (defaults to the payload file's extension)
        #[arg(long)]
        ext: Option<String>,

        /// Metadata field as key=value (repeatable; values parsed as JSON when possible)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Companion thumbnail file to store alongside the payload
        #[arg(long)]
        thumb: Option<PathBuf>,
    },

    /// Print an asset's metadata record as JSON
    Get {
        /// Asset id
        id: String,
    },

    /// List asset records, optionally filtered
    List {
        /// Filter as key=value (repeatable; values parsed as JSON when possible)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Print the raw records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Output an asset's payload bytes to stdout
    Cat {
        /// Asset id
        id: String,
    },

    /// Merge fields into an asset's record
    Update {
        /// Asset id
        id: String,

        /// Metadata field as key=value (repeatable; values parsed as JSON when possible)
        #[arg(long = "field", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Delete an asset, its record and (sometimes) its thumbnail
    Rm {
        /// Asset id
        id: String,
    },

    /// Print an asset's XML projection (prints nothing for kinds without one)
    Xml {
        /// Asset id
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    // Determine store root: CLI arg > GREENROOM_ROOT env var > ./greenroom-store default
    let root = cli
        .root
        .or_else(|| std::env::var("GREENROOM_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./greenroom-store"));
    debug!(root = %root.display(), "store root resolved");

    match cli.command {
        Commands::Add {
            path,
            ext,
            fields,
            thumb,
        } => cmd_add(&root, &path, ext, &fields, thumb),
        Commands::Get { id } => cmd_get(&root, &id),
        Commands::List { filters, json } => cmd_list(&root, &filters, json),
        Commands::Cat { id } => cmd_cat(&root, &id),
        Commands::Update { id, fields } => cmd_update(&root, &id, &fields),
        Commands::Rm { id } => cmd_rm(&root, &id),
        Commands::Xml { id } => cmd_xml(&root, &id),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn open_store(root: &Path) -> Result<AssetStore> {
    AssetStore::open(root).with_context(|| format!("Failed to open store at {}", root.display()))
}

/// Parse repeated key=value arguments into a field map. Values that parse as
/// JSON keep their parsed type; everything else stays a string.
fn parse_fields(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected key=value, got: {}", pair))?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn cmd_add(
    root: &Path,
    path: &Path,
    ext: Option<String>,
    fields: &[String],
    thumb: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(root)?;
    let info = AssetRecord::from(parse_fields(fields)?);
    let from_stdin = path == Path::new("-");

    let ext = match ext {
        Some(ext) => ext,
        None if from_stdin => anyhow::bail!("--ext is required when reading from stdin"),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
            .with_context(|| format!("No extension on {}; pass --ext", path.display()))?,
    };
    debug!(ext = %ext, from_stdin, "adding asset payload");

    let id = if from_stdin {
        if atty::is(atty::Stream::Stdin) {
            anyhow::bail!("Refusing to read a payload from a terminal; pipe data or pass a file");
        }
        store.save(io::stdin(), &ext, info)?
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open payload file: {}", path.display()))?;
        store.save(file, &ext, info)?
    };

    if let Some(thumb) = thumb {
        let file = std::fs::File::open(&thumb)
            .with_context(|| format!("Failed to open thumbnail file: {}", thumb.display()))?;
        store
            .save_thumbnail(&id, file)
            .with_context(|| format!("Failed to write thumbnail for {}", id))?;
    }

    store
        .flush()
        .with_context(|| format!("Payload write failed for {}", id))?;

    println!("{}", id);

    Ok(())
}

fn cmd_get(root: &Path, id: &str) -> Result<()> {
    let store = open_store(root)?;

    let record = store
        .get(id)
        .with_context(|| format!("Failed to get asset {}", id))?;

    println!("{}", serde_json::to_string_pretty(record.as_map())?);

    Ok(())
}

fn cmd_list(root: &Path, filters: &[String], json: bool) -> Result<()> {
    let store = open_store(root)?;
    let records = store.list(&parse_fields(filters)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No assets");
    } else {
        for record in records {
            println!(
                "{} {} {}",
                record.id().unwrap_or("-"),
                record.str_field("type").unwrap_or("-"),
                record.str_field("title").unwrap_or("")
            );
        }
    }

    Ok(())
}

fn cmd_cat(root: &Path, id: &str) -> Result<()> {
    let store = open_store(root)?;

    let bytes = store
        .load(id)
        .with_context(|| format!("Failed to read payload {}", id))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(&bytes)?;

    Ok(())
}

fn cmd_update(root: &Path, id: &str, fields: &[String]) -> Result<()> {
    let store = open_store(root)?;
    let info = AssetRecord::from(parse_fields(fields)?);

    store
        .update(id, info)
        .with_context(|| format!("Failed to update asset {}", id))?;

    println!("Updated {}", id);

    Ok(())
}

fn cmd_rm(root: &Path, id: &str) -> Result<()> {
    let store = open_store(root)?;

    store
        .delete(id)
        .with_context(|| format!("Failed to delete asset {}", id))?;

    println!("Deleted {}", id);

    Ok(())
}

fn cmd_xml(root: &Path, id: &str) -> Result<()> {
    let store = open_store(root)?;

    let record = store
        .get(id)
        .with_context(|| format!("Failed to get asset {}", id))?;

    // Kinds without a projection render nothing at all.
    if let Some(xml) = project(&record) {
        println!("{}", xml);
    } else {
        debug!(id = %id, "record kind has no projection");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fields_json_and_string_values() {
        let pairs = vec![
            "type=sound".to_string(),
            "duration=300".to_string(),
            "loop=true".to_string(),
            "title=My Song".to_string(),
        ];
        let map = parse_fields(&pairs).unwrap();

        assert_eq!(map["type"], json!("sound"));
        assert_eq!(map["duration"], json!(300));
        assert_eq!(map["loop"], json!(true));
        assert_eq!(map["title"], json!("My Song"));
    }

    #[test]
    fn test_parse_fields_keeps_equals_in_value() {
        let map = parse_fields(&["note=a=b".to_string()]).unwrap();
        assert_eq!(map["note"], json!("a=b"));
    }

    #[test]
    fn test_parse_fields_rejects_bare_key() {
        assert!(parse_fields(&["nokey".to_string()]).is_err());
    }
}
