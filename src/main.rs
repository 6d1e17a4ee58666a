mod config;
mod envelope;
mod error;
mod runner;
mod tls;
mod transport;

use config::RunConfig;
use envelope::add_request_item;
use error::Result;
use log::info;
use runner::Runner;
use std::process::ExitCode;
use transport::HyperTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    pretty_env_logger::init();

    let config = RunConfig::from_args(std::env::args())?;
    info!("{:?} run against {}", config.mode, config.url);

    let transport = HyperTransport::new(config.url.clone(), config.verify_tls);
    let mut runner = Runner::new(config, Box::new(add_request_item), std::io::stdout().lock());
    let report = runner.run(&transport).await?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
