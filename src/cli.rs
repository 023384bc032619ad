use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "webcam-tiler",
    version,
    about = "Capture webcam stills and publish them as zoomable tile pyramids",
    long_about = "Captures still images from Raspberry Pi, USB and network cameras, falls back to an offline placeholder when a camera stops responding, and writes a zoomable tile pyramid per camera"
)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, global = true, default_value = "webcams.json")]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture once and rebuild the tile pyramids
    Update {
        /// Only update the webcam with this id
        #[arg(short, long)]
        id: Option<String>,
        /// Keep tiles in memory instead of writing them
        #[arg(long)]
        dry_run: bool,
        /// Print the metadata of the updated webcams as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP API and tile server; every webcam is captured once at startup, later updates are triggered over HTTP
    Serve {
        /// Port to bind the web server to
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Host to bind the web server to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update() {
        let cli = Cli::parse_from(["webcam-tiler", "update", "--id", "garden", "--dry-run", "-c", "cams.json"]);
        assert_eq!(cli.config, PathBuf::from("cams.json"));
        match cli.command {
            Commands::Update { id, dry_run, json } => {
                assert_eq!(id.as_deref(), Some("garden"));
                assert!(dry_run);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_update_json_flag() {
        let cli = Cli::parse_from(["webcam-tiler", "update", "--json"]);
        assert!(matches!(cli.command, Commands::Update { json: true, .. }));
        assert!(Cli::try_parse_from(["webcam-tiler", "list"]).is_err());
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["webcam-tiler", "serve"]);
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, 8080);
                assert_eq!(host, "0.0.0.0");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
