use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use harmonia::cli::{commands, parse_rating};
use harmonia::config::ServiceConfig;

#[derive(Parser)]
#[command(name = "harmonia")]
#[command(about = "Harmonia - Visual Calibration\nTurn image ratings into a personal visual preference vector")]
#[command(version)]
struct Cli {
  /// Configuration file (defaults to harmonia.json or .harmonia/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Data directory holding profiles and calibration images
  #[arg(long, global = true, env = "HARMONIA_DATA_DIR")]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Calibrate a user from image ratings
  Calibrate {
    /// User the visual vector belongs to
    #[arg(short, long)]
    user: String,
    /// Rating as IMAGE_ID=STARS (1-5); repeat for every rated image
    #[arg(short, long = "rate", value_parser = parse_rating, required = true)]
    rates: Vec<(String, i64)>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    preference_target: Option<String>,
  },
  /// Show a user's stored visual vector
  Show {
    #[arg(short, long)]
    user: String,
    /// Print the raw JSON artifact
    #[arg(long)]
    json: bool,
  },
  /// List calibration images
  Images {
    /// Number of images to list
    #[arg(short, long)]
    count: Option<usize>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut config = ServiceConfig::load(cli.config.as_deref())?;
  if let Some(data_dir) = cli.data_dir {
    config.data_dir = data_dir;
  }

  match cli.command {
    Command::Calibrate { user, rates, gender, preference_target } => {
      commands::calibrate(&config, &user, rates, gender.as_deref(), preference_target.as_deref())
    }
    Command::Show { user, json } => commands::show(&config, &user, json),
    Command::Images { count } => commands::images(&config, count),
  }
}
