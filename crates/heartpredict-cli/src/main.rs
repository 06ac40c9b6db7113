use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use std::path::PathBuf;

use heartpredict::survival::Stratification;
use heartpredict::{CorrelationMethod, Task};
use heartpredict_cli::commands::{inference, statistics, survival, train};
use heartpredict_cli::config::RunConfig;
use heartpredict_cli::util::{death_event_label, parse_log_level, parse_where};

fn seed_arg() -> Arg {
    Arg::new("seed")
        .long("seed")
        .help("Random seed for the train/validation split and the models")
        .value_parser(clap::value_parser!(u64))
}

fn method_arg() -> Arg {
    Arg::new("method")
        .short('m')
        .long("method")
        .help("Correlation coefficient")
        .value_parser(["pearson", "kendall", "spearman"])
        .default_value("pearson")
}

fn cli() -> Command {
    Command::new("heartpredict")
        .version(clap::crate_version!())
        .about("Statistics, model training and survival analysis for heart-failure clinical records")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("csv")
                .long("csv")
                .global(true)
                .help("Path to the clinical records CSV file")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(heartpredict::data_handling::DEFAULT_CSV)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .global(true)
                .help("Log level")
                .value_parser(["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])
                .ignore_case(true)
                .default_value("INFO"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a JSON training configuration. Command line flags override its values.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .global(true)
                .help("Directory for trained models, scalers and plots [default: results]")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .subcommand(Command::new("version").about("Print the package version"))
        .subcommand(
            Command::new("train-classification")
                .about("Train the classifier families and report the most accurate one")
                .arg(seed_arg()),
        )
        .subcommand(
            Command::new("train-regression")
                .about("Train the regressor families and report the one with the lowest error")
                .arg(seed_arg()),
        )
        .subcommand(
            Command::new("predict-death-event")
                .about("Predict the death event for new patients")
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("CSV file with the feature columns and no DEATH_EVENT column")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .help("Path to a trained model (*.json)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("scaler")
                        .long("scaler")
                        .help("Path to the fitted scaler [default: <output-dir>/scalers/used_scaler.json]")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("kmplot")
                .about("Plot Kaplan-Meier survival curves of the validation patients")
                .arg(seed_arg())
                .arg(
                    Arg::new("regressor")
                        .long("regressor")
                        .help("Trained model to stratify by. Trains the regressor families if omitted.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("stratify")
                        .long("stratify")
                        .help("'risk' for a median split of the predicted risk, or a binary column")
                        .default_value("risk"),
                ),
        )
        .subcommand(
            Command::new("cc")
                .about("Correlation of a column with DEATH_EVENT")
                .arg(
                    Arg::new("column")
                        .short('c')
                        .long("column")
                        .required(true),
                )
                .arg(method_arg()),
        )
        .subcommand(
            Command::new("cm")
                .about("Correlation matrix of all columns")
                .arg(method_arg()),
        )
        .subcommand(
            Command::new("bstat")
                .about("Share of 0 and 1 in a boolean column")
                .arg(Arg::new("bool_col").long("bool-col").required(true)),
        )
        .subcommand(
            Command::new("dstat")
                .about("Summary statistics of a discrete column")
                .arg(Arg::new("disc_col").long("disc-col").required(true)),
        )
        .subcommand(
            Command::new("dist")
                .about("Value counts of a column")
                .arg(Arg::new("column").short('c').long("column").required(true))
                .arg(
                    Arg::new("where")
                        .long("where")
                        .help("Only count rows where COLUMN RELATION VALUE holds, e.g. --where age '>=' 60")
                        .num_args(3)
                        .value_names(["COLUMN", "RELATION", "VALUE"]),
                )
                .arg(
                    Arg::new("plot")
                        .long("plot")
                        .help("Write a bar plot of the counts to this HTML file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log_level")
        .map(|l| parse_log_level(l))
        .transpose()?
        .unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::default()
        .filter_level(level)
        .parse_env(env_logger::Env::default().filter("HEARTPREDICT_LOG"))
        .init();

    let (name, sub_matches) = match matches.subcommand() {
        Some(sub) => sub,
        None => unreachable!("Subcommand is required by CLI configuration"),
    };
    match run(name, sub_matches) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("{} failed: {:#}", name, e);
            std::process::exit(1)
        }
    }
}

fn run(name: &str, matches: &ArgMatches) -> Result<()> {
    if name == "version" {
        println!("heartpredict {}", clap::crate_version!());
        return Ok(());
    }
    let config = RunConfig::from_arguments(matches)?;

    match name {
        "train-classification" | "train-regression" => {
            let task = if name == "train-classification" {
                Task::Classification
            } else {
                Task::Regression
            };
            let summary = train::run_training(&config, task)?;
            println!("{}", train::format_summary(&summary));
        }
        "predict-death-event" => {
            let input: &PathBuf = matches.get_one("input").unwrap();
            let model: &PathBuf = matches.get_one("model").unwrap();
            let scaler = matches
                .get_one::<PathBuf>("scaler")
                .cloned()
                .unwrap_or_else(|| config.train.scaler_path());
            let predictions = inference::run_inference(input, model, &scaler)?;
            for (row, prediction) in predictions.iter().enumerate() {
                println!("{}\t{}", row, death_event_label(*prediction));
            }
        }
        "kmplot" => {
            let regressor = matches.get_one::<PathBuf>("regressor");
            let stratification: Stratification = matches
                .get_one::<String>("stratify")
                .map(|s| s.as_str())
                .unwrap_or("risk")
                .parse()?;
            let (path, strata) = survival::run_kmplot(&config, regressor.map(|p| p.as_path()), &stratification)?;
            for stratum in &strata {
                let median = stratum
                    .curve
                    .median_survival()
                    .map_or_else(|| "not reached".to_string(), |m| format!("{}", m));
                println!(
                    "{}: {} patients, {} deaths, median survival {}",
                    stratum.label,
                    stratum.rows.len(),
                    stratum.curve.total_events(),
                    median
                );
            }
            println!("Kaplan-Meier plot written to {}", path.display());
        }
        "cc" => {
            let column: &String = matches.get_one("column").unwrap();
            let method: CorrelationMethod = matches.get_one::<String>("method").unwrap().parse()?;
            println!("{}", statistics::correlation_to_label(&config.csv, column, method)?);
        }
        "cm" => {
            let method: CorrelationMethod = matches.get_one::<String>("method").unwrap().parse()?;
            print!("{}", statistics::correlation_matrix(&config.csv, method)?);
        }
        "bstat" => {
            let column: &String = matches.get_one("bool_col").unwrap();
            println!("{}", statistics::boolean_statistics(&config.csv, column)?);
        }
        "dstat" => {
            let column: &String = matches.get_one("disc_col").unwrap();
            println!("{}", statistics::discrete_statistics(&config.csv, column)?);
        }
        "dist" => {
            let column: &String = matches.get_one("column").unwrap();
            let filter = match matches.get_many::<String>("where") {
                Some(values) => Some(parse_where(&values.cloned().collect::<Vec<_>>())?),
                None => None,
            };
            let plot = matches.get_one::<PathBuf>("plot");
            let distribution =
                statistics::distribution(&config.csv, column, filter, plot.map(|p| p.as_path()))?;
            println!("{}", distribution);
        }
        _ => unreachable!(),
    }
    Ok(())
}
