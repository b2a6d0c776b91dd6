//! riverboat server binary.
//!
//! Configuration comes from flags or the environment; see `--help`.

use clap::Parser;

#[tokio::main]
async fn main() {
    rvb_core::log();
    let config = rvb_server::Config::parse();
    rvb_server::run(config).await.expect("server run");
}
