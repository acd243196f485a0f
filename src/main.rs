/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use clap::Parser;
use donpedro::{
    ConfigurationProvider, CycleOutcome, ServiceContainer, TomlConfigurationProvider,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "donpedro", version, about = "Windows hardware inventory agent")]
struct Opt {
    /// Configuration file
    #[arg(long, default_value = "donpedro.toml")]
    config: PathBuf,

    /// Run a single reporting cycle and exit
    #[arg(long)]
    once: bool,

    /// Write the payload to this file instead of posting it
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Inventory server API key, overrides the configuration file
    #[arg(long, env = "DONPEDRO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::parse();

    let default_level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = TomlConfigurationProvider::new(&opt.config)
        .load_config()
        .await?;
    if let Some(api_key) = opt.api_key {
        config.server.api_key = api_key;
    }

    let mut container = ServiceContainer::new(config)?;
    if let Some(output) = opt.output {
        container = container.with_output(output);
    }

    let service = container.create_reporting_service().await?;

    if opt.once {
        return match service.run_cycle().await {
            CycleOutcome::Delivered { .. } => Ok(()),
            CycleOutcome::GaveUp { attempts } => {
                Err(format!("Report not delivered after {attempts} attempt(s)").into())
            }
        };
    }

    log::info!(
        "Reporting to {}",
        container.config().publish_target().endpoint()
    );
    let cycles = container.create_scheduler(service).run().await;
    log::info!("Stopped after {cycles} cycle(s)");
    Ok(())
}
