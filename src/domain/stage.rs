use crate::domain::error::WizardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of the research pipeline.
///
/// `MarketScan` and `DayTradingScan` are global and can be entered at any
/// time. The other five are scoped to the active subject and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    MarketScan,
    DayTradingScan,
    Financials,
    Sentiment,
    PeerScreen,
    LegendPanel,
    Strategy,
}

impl Stage {
    /// Navigation order.
    pub const ALL: [Stage; 7] = [
        Stage::MarketScan,
        Stage::DayTradingScan,
        Stage::Financials,
        Stage::Sentiment,
        Stage::PeerScreen,
        Stage::LegendPanel,
        Stage::Strategy,
    ];

    /// Where every subject selection lands.
    pub const FIRST_SUBJECT_STAGE: Stage = Stage::Financials;

    pub fn is_global(self) -> bool {
        matches!(self, Stage::MarketScan | Stage::DayTradingScan)
    }

    /// The following subject-scoped stage. Global stages and `Strategy` have none.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Financials => Some(Stage::Sentiment),
            Stage::Sentiment => Some(Stage::PeerScreen),
            Stage::PeerScreen => Some(Stage::LegendPanel),
            Stage::LegendPanel => Some(Stage::Strategy),
            Stage::Strategy | Stage::MarketScan | Stage::DayTradingScan => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Stage::MarketScan => "market-scan",
            Stage::DayTradingScan => "day-trading",
            Stage::Financials => "financials",
            Stage::Sentiment => "sentiment",
            Stage::PeerScreen => "peer-screen",
            Stage::LegendPanel => "legends",
            Stage::Strategy => "strategy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::MarketScan => "Market Scan",
            Stage::DayTradingScan => "Day-Trading Scan",
            Stage::Financials => "Financials",
            Stage::Sentiment => "Sentiment & News",
            Stage::PeerScreen => "Peer Screen",
            Stage::LegendPanel => "Legend Panel",
            Stage::Strategy => "Strategy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.slug() == wanted)
            .ok_or_else(|| WizardError::UnknownStage(s.to_string()))
    }
}
