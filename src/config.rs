use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Market insights service: historical crop supply/demand and next-year forecasts.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// CSV export of the dataset's `Data` sheet.
    #[arg(
        long,
        env = "INSIGHTS_DATA_PATH",
        default_value = "data/Agri_Demand_Supply_Sabaragamuwa_Expanded_2022_2025.csv",
        global = true
    )]
    pub data_path: PathBuf,

    /// Address the HTTP API binds to.
    #[arg(long, env = "INSIGHTS_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Port the HTTP API listens on.
    #[arg(long, env = "INSIGHTS_PORT", default_value_t = 3000, global = true)]
    pub port: u16,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Print the default aggregate and forecast, and export them to files.
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory for the CSV and JSON outputs.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Rows shown per table in the console preview.
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from([
            "agri_insights",
            "--data-path",
            "d.csv",
            "serve",
            "--port",
            "8081",
        ])
        .expect("parse");
        assert_eq!(cli.data_path, PathBuf::from("d.csv"));
        assert_eq!(cli.port, 8081);
        assert!(matches!(cli.command, Some(Command::Serve)));

        let cli =
            Cli::try_parse_from(["agri_insights", "report", "--out-dir", "out"]).expect("parse");
        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.out_dir, PathBuf::from("out"));
                assert_eq!(args.preview_rows, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn command_is_optional() {
        let cli = Cli::try_parse_from(["agri_insights"]).expect("parse");
        assert!(cli.command.is_none());
    }
}
