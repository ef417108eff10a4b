use crate::domain::stage::Stage;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "wizard")]
#[command(about = "A staged stock research wizard with a persistent result cache.")]
#[command(version)]
pub struct Cli {
    /// Jump to a stage (market-scan, day-trading, financials, sentiment,
    /// peer-screen, legends, strategy)
    #[arg(short = 's', long, value_parser = parse_stage)]
    pub stage: Option<Stage>,

    /// Run the current stage
    #[arg(short = 'r', long)]
    pub run: bool,

    /// Advance to the next stage after running
    #[arg(short = 'a', long)]
    pub advance: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Choose color theme
    #[arg(short = 'T', long)]
    pub theme: Option<String>,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Edit configuration file
    #[arg(long)]
    pub edit_config: bool,

    /// Show cache status
    #[arg(long)]
    pub status: bool,

    /// Ticker or exchange code to research
    pub subject: Option<String>,
}

fn parse_stage(s: &str) -> Result<Stage, String> {
    s.parse::<Stage>().map_err(|e| e.to_string())
}
