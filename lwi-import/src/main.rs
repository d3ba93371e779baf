//! lwi-import - Legacy work import
//!
//! Reads a directory of exported item directories, normalizes each one into
//! a canonical record and stores it in the object database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lwi_common::config::{
    default_config_path, read_toml_config, resolve_database_path, resolve_log_level,
    resolve_value, CompiledDefaults,
};
use lwi_common::logging::init_tracing;
use tracing::{debug, info, warn};

use lwi_import::{run_import, ImportSettings, ItemFamily, RecordAssembler, RunOptions, SqliteStore};

const MODULE_NAME: &str = "lwi-import";

/// Command-line arguments for lwi-import
#[derive(Parser, Debug)]
#[command(name = "lwi-import")]
#[command(about = "Import legacy work exports into the object store")]
#[command(version)]
struct Args {
    /// Directory holding one sub-directory per item [env: LWI_IMPORT_DIR]
    #[arg(long = "importdir")]
    import_dir: Option<PathBuf>,

    /// Namespace for created objects [env: LWI_NAMESPACE]
    #[arg(long)]
    namespace: Option<String>,

    /// Kind of export being imported
    #[arg(long, value_enum, default_value_t = ItemFamily::Open, env = "LWI_KIND")]
    kind: ItemFamily,

    /// SQLite database path [env: LWI_DATABASE]
    #[arg(long)]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "LWI_CONFIG")]
    config: Option<PathBuf>,

    /// Do not import attachment files
    #[arg(long = "nofiles")]
    no_files: bool,

    /// Process but do not actually import
    #[arg(long = "dryrun")]
    dry_run: bool,

    /// Number of items to import, 0 for no limit
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Logging level (D|I|W|E) [env: LWI_LOG_LEVEL]
    #[arg(long = "loglevel")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists; its outcome is logged below
    let config_path = args.config.clone().or_else(|| default_config_path(MODULE_NAME));
    let loaded = match &config_path {
        Some(path) => read_toml_config(path)?,
        None => None,
    };
    let config_found = loaded.is_some();
    let toml_config = loaded.unwrap_or_default();

    let log_level = resolve_log_level(args.log_level.as_deref(), "LWI_LOG_LEVEL", &toml_config)
        .context("logging level must be D|I|W|E")?;
    init_tracing(log_level, toml_config.logging.file.as_deref())?;

    info!("Starting lwi-import {}", env!("CARGO_PKG_VERSION"));
    match (&config_path, config_found) {
        (Some(path), true) => debug!("Loaded config from {}", path.display()),
        (Some(path), false) => warn!("Config file {} not found, using defaults", path.display()),
        (None, _) => warn!("No config directory on this platform, using defaults"),
    }

    let import_dir = resolve_value(
        args.import_dir.as_ref().map(|p| p.to_string_lossy()).as_deref(),
        "LWI_IMPORT_DIR",
        toml_config.import_dir.as_ref().map(|p| p.to_string_lossy()).as_deref(),
    )
    .map(PathBuf::from)
    .context("must specify import dir")?;

    std::fs::read_dir(&import_dir).with_context(|| {
        format!(
            "import dir does not exist or is not readable ({})",
            import_dir.display()
        )
    })?;

    let namespace = resolve_value(
        args.namespace.as_deref(),
        "LWI_NAMESPACE",
        toml_config.namespace.as_deref(),
    )
    .unwrap_or_default();

    let defaults = CompiledDefaults::for_current_platform();
    let mut settings = ImportSettings::new(namespace, args.kind);
    settings.exclude_files = args.no_files;
    settings.institutional_label = toml_config
        .institutional_visibility
        .clone()
        .filter(|label| !label.trim().is_empty())
        .unwrap_or(defaults.institutional_visibility);
    // An explicitly empty suffix disables stripping
    settings.email_suffix = toml_config
        .institution_email_suffix
        .clone()
        .unwrap_or(defaults.institution_email_suffix);

    info!(
        "Importing {} items from {} into namespace [{}]",
        settings.family,
        import_dir.display(),
        settings.namespace
    );

    let db_path = resolve_database_path(args.database.as_deref(), "LWI_DATABASE", &toml_config);
    info!("Database: {}", db_path.display());
    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open object store at {}", db_path.display()))?;

    let assembler = RecordAssembler::new(settings);
    let options = RunOptions {
        import_dir,
        limit: args.limit,
        dry_run: args.dry_run,
    };

    run_import(&assembler, &store, &options).await?;

    Ok(())
}
