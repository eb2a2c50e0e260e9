use clap::Parser;
use userdb::config::Cli;

fn main() -> anyhow::Result<()> {
    userdb::init_tracing();
    userdb::run(Cli::parse())
}
