use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use heartpredict::TrainConfig;

/// Settings shared by every command: the dataset path and the training
/// configuration after command line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub csv: PathBuf,
    pub train: TrainConfig,
}

impl RunConfig {
    /// Read `--config` if given, then apply `--output-dir`, `--seed` and `--csv`.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut train = match matches.get_one::<PathBuf>("config") {
            Some(path) => {
                log::debug!("Reading training configuration from {:?}", path);
                TrainConfig::from_json_file(path)
                    .with_context(|| format!("Failed to load config file: {:?}", path))?
            }
            None => TrainConfig::default(),
        };

        if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
            train.output_dir = output_dir.clone();
        }
        if let Ok(Some(seed)) = matches.try_get_one::<u64>("seed") {
            train.seed = *seed;
        }
        train.validate()?;

        let csv = matches
            .get_one::<PathBuf>("csv")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(heartpredict::data_handling::DEFAULT_CSV));

        Ok(Self { csv, train })
    }
}
