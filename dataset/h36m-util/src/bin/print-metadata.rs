use std::path::PathBuf;

use clap::Parser;
use eyre::Context;

use h36m_metadata::SequenceMetadataIndex;
use h36m_util::{MetadataSummary, ToolConfig};

#[derive(Debug, Parser)]
#[command(name = "print-metadata", version)]
struct Opt {
    /// Human3.6M metadata.xml file
    #[arg(default_value = "metadata.xml")]
    input: PathBuf,
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

    let summary = MetadataSummary::new(&index);
    if opt.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
