// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::net::SocketAddr;

use clap::Parser;
use log::{LevelFilter, info};
use report_sql_adapter::{
    app::{AppConfig, AppState, router},
    error::AppError,
};

#[derive(Debug, Parser)]
#[command(author, version, about, disable_help_subcommand = true)]
struct Args {
    /// HTTP bind address for the adapter server
    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0:3200")]
    bind: SocketAddr,
    /// Skip validation of report filter keys and values before they are
    /// interpolated into report SQL
    #[arg(long = "allow-raw-filters", env = "ALLOW_RAW_FILTERS")]
    allow_raw_filters: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let args = Args::parse();
    info!(
        "starting report-sql-adapter (bind={}, allow_raw_filters={})",
        args.bind, args.allow_raw_filters
    );
    let state = AppState::new(AppConfig {
        allow_raw_filters: args.allow_raw_filters,
    });
    let app = router(state);

    info!("binding TCP listener on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind listener: {err}")))?;
    info!("report-sql-adapter listening on {}", args.bind);
    axum::serve(listener, app)
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;
    Ok(())
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
    } else {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter_module("report_sql_adapter", LevelFilter::Info)
            .init();
    }
}
