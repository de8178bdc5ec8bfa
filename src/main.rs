use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser)]
#[command(
    name = "taxcn",
    version,
    about = "Estimate Chinese individual income tax on overseas brokerage cash flows"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Per-market tax report over a date window
    Report(cmd::report::ReportCommand),
    /// Record-level view of classified cash flows
    Flows(cmd::flows::FlowsCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(cmd) => cmd.exec(),
        Command::Flows(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
