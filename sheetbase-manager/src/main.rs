//! sheetbase entry point.

use sheetbase_core::{LogFormat, SheetbaseConfig};
use sheetbase_manager::cli::{parse_args, Command, USAGE};
use sheetbase_manager::logging::init_logging;
use sheetbase_manager::{App, ManagerError};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ManagerError> {
    let cli = parse_args(std::env::args().skip(1))?;
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = SheetbaseConfig::load(cli.config.clone())?;
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.log_format
    };
    init_logging(format)?;

    let mut app = App::from_config(config)?;
    let result = app.execute(cli.command).await;

    for notification in app.notifications().drain() {
        eprintln!("{}", notification);
    }
    for line in result? {
        println!("{}", line);
    }
    Ok(())
}
