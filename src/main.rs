// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use warp_pipe::common::error::WarpError;
use warp_pipe::warp::bundle::BundleStore;
use warp_pipe::warp::nodes::NodeRegistry;
use warp_pipe::warp::pipeline::{PipelineLoader, PipelineRunner};
use warp_pipe::warp::samplers::remap_scheduler;

use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the descriptors of every registered node as JSON
    Nodes,
    /// Run a pipeline script
    Run {
        /// Path to the pipeline file
        #[arg(short, long)]
        file: String,

        /// Number of copies to run concurrently against the shared store
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,
    },
    /// Map a scheduler name onto the base vocabulary
    Remap {
        /// Scheduler name to map
        scheduler: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let registry = NodeRegistry::with_builtin();

    match args.command {
        Commands::Nodes => {
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.descriptors())?
            );
        }
        Commands::Run { file, repeat } => {
            if repeat == 0 {
                return Err(WarpError::config("--repeat must be at least 1").into());
            }

            let def = Arc::new(PipelineLoader::load(&file)?);
            log::info!(
                "Loaded pipeline '{}' with {} steps",
                def.name,
                def.steps.len()
            );

            let runner = Arc::new(PipelineRunner::new(registry, BundleStore::global()));
            let reports = Arc::clone(&runner).run_concurrent(def, repeat).await?;
            log::info!("Store holds {} bundle(s)", runner.store().len());

            if reports.len() == 1 {
                println!("{}", serde_json::to_string_pretty(&reports[0])?);
            } else {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        Commands::Remap { scheduler } => {
            println!("{}", remap_scheduler(&scheduler));
        }
    }

    Ok(())
}
