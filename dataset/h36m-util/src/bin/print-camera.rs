#[macro_use]
extern crate pretty_print_nalgebra;

use std::path::PathBuf;

use clap::Parser;
use eyre::Context;
use nalgebra::Point3;

use h36m_camcal::CalibrationBlob;
use h36m_util::ToolConfig;

#[derive(Debug, Parser)]
#[command(name = "print-camera", version)]
struct Opt {
    /// Human3.6M metadata.xml file holding the `w0` calibration
    input: PathBuf,
    /// Subject, e.g. S9
    sequence: String,
    /// Camera serial number, e.g. 55011271
    camera: String,
    /// TOML file overriding the dataset layout
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also project this world point (X Y Z) into the camera
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    project: Option<Vec<f64>>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> eyre::Result<()> {
    let _tracing_guard = env_tracing_logger::init_with_default("info");
    let opt = Opt::parse();

    let cfg = ToolConfig::load(opt.config.as_ref())?;
    let blob = CalibrationBlob::from_path(&opt.input, cfg.calibration)
        .with_context(|| format!("while reading calibration at {}", opt.input.display()))?;
    let bundle = blob
        .camera_bundle(&opt.sequence, &opt.camera)
        .with_context(|| format!("camera {} of {}", opt.camera, opt.sequence))?;

    let projected = opt
        .project
        .as_ref()
        .map(|v| {
            let world = Point3::new(v[0], v[1], v[2]);
            (world, bundle.project(&world))
        });

    if opt.json {
        let mut value = serde_json::to_value(&bundle)?;
        if let Some((_, pixel)) = &projected {
            value["projected"] = serde_json::json!([pixel.x, pixel.y]);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("# ----- {} camera {} ----- ", opt.sequence, opt.camera);
    println!("K {}", pretty_print!(bundle.k));
    println!("R {}", pretty_print!(bundle.r));
    println!("T {}", pretty_print!(bundle.t));
    println!("dist {}", pretty_print!(bundle.dist));
    if let Some((world, pixel)) = projected {
        println!(
            "({}, {}, {}) -> ({}, {})",
            world.x, world.y, world.z, pixel.x, pixel.y
        );
    }
    Ok(())
}
