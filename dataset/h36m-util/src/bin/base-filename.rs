use std::path::PathBuf;

use clap::Parser;
use eyre::Context;

use h36m_metadata::SequenceMetadataIndex;
use h36m_util::{BaseFilenameRow, ToolConfig};

#[derive(Debug, Parser)]
#[command(name = "base-filename", version)]
struct Opt {
    /// Human3.6M metadata.xml file
    input: PathBuf,
    /// Subject, e.g. S1
    subject: String,
    /// Action id, e.g. 2
    action: String,
    /// Subaction id, e.g. 1
    subaction: String,
    /// Camera id, appended after a dot
    camera: String,
    /// TOML file overriding the dataset layout
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> eyre::Result<()> {
    let _tracing_guard = env_tracing_logger::init_with_default("info");
    let opt = Opt::parse();

    let cfg = ToolConfig::load(opt.config.as_ref())?;
    let index = SequenceMetadataIndex::from_path_with_layout(&opt.input, &cfg.metadata)
        .with_context(|| format!("while reading metadata at {}", opt.input.display()))?;

    let row = BaseFilenameRow::resolve(
        &index,
        &opt.subject,
        &opt.action,
        &opt.subaction,
        &opt.camera,
    )?;
    if opt.json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        if let Some(name) = row.action_name {
            tracing::info!("action {} is \"{name}\"", opt.action);
        }
        println!("{}", row.base_filename);
    }
    Ok(())
}
