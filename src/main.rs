//! Sales Forecast - Main Entry Point
//!
//! Trains the sales pipeline and serves predictions from the command line.

use clap::Parser;
use sales_forecast::cli::{cmd_info, cmd_predict, cmd_train, load_config, Cli, Commands};
use sales_forecast::reporting::RecordFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_forecast=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Train { data, output, n_estimators, seed } => {
            if let Some(data) = data {
                config.data_path = data;
            }
            if let Some(output) = output {
                config.artifact_path = output;
            }
            if let Some(n) = n_estimators {
                config.training.booster.n_estimators = n;
            }
            if let Some(seed) = seed {
                config.training.split_seed = seed;
                config.training.booster.random_state = Some(seed);
            }
            cmd_train(&config)?;
        }
        Commands::Predict {
            model,
            data,
            group_by,
            city,
            category,
            month,
            payment_method,
            summary,
        } => {
            if let Some(model) = model {
                config.artifact_path = model;
            }
            if let Some(data) = data {
                config.data_path = data;
            }
            let filter = RecordFilter {
                city,
                category,
                month,
                payment_method,
            };
            cmd_predict(&config, group_by, &filter, summary)?;
        }
        Commands::Info { data, model } => {
            if data.is_none() && model.is_none() {
                cmd_info(&config.columns, Some(&config.data_path), Some(&config.artifact_path))?;
            } else {
                cmd_info(&config.columns, data.as_deref(), model.as_deref())?;
            }
        }
    }

    Ok(())
}
