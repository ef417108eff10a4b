use crate::domain::stage::Stage;
use serde::{Deserialize, Deserializer, Serialize};

/// Score shown before any sentiment has been measured.
pub const NEUTRAL_SCORE: u8 = 50;

/// Rounds and clamps an incoming score into 0..=100.
pub fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn de_score_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.map(clamp_score))
}

fn de_neutral_score<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    Ok(de_score_opt(d)?.unwrap_or(NEUTRAL_SCORE))
}

fn de_zero_score<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    Ok(de_score_opt(d)?.unwrap_or(0))
}

// 거장 위원회 점수; total comes from the panel, not the mean of the three
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendScores {
    #[serde(deserialize_with = "de_zero_score")]
    pub buffett: u8,
    #[serde(deserialize_with = "de_zero_score")]
    pub lynch: u8,
    #[serde(deserialize_with = "de_zero_score")]
    pub oneil: u8,
    #[serde(deserialize_with = "de_zero_score")]
    pub total: u8,
}

/// Working state for one subject. One field per subject-scoped stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRecord {
    pub ticker: String,
    pub financial_analysis: String,
    pub sentiment_analysis: String,
    #[serde(deserialize_with = "de_neutral_score")]
    pub sentiment_score: u8,
    pub peer_comparison: String,
    pub legend_analysis: String,
    pub legend_scores: LegendScores,
    pub insider_summary: String,
    pub final_strategy: String,
    pub day_trading_result: Option<DayTradingResult>,
}

impl AnalysisRecord {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }
}

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            financial_analysis: String::new(),
            sentiment_analysis: String::new(),
            sentiment_score: NEUTRAL_SCORE,
            peer_comparison: String::new(),
            legend_analysis: String::new(),
            legend_scores: LegendScores::default(),
            insider_summary: String::new(),
            final_strategy: String::new(),
            day_trading_result: None,
        }
    }
}

/// A single-field mutation of the active record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    FinancialAnalysis(String),
    SentimentAnalysis(String),
    SentimentScore(u8),
    PeerComparison(String),
    LegendAnalysis(String),
    LegendScores(LegendScores),
    InsiderSummary(String),
    FinalStrategy(String),
    DayTradingResult(DayTradingResult),
}

impl FieldUpdate {
    /// Persisted field name, as it appears in the snapshot.
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldUpdate::FinancialAnalysis(_) => "financialAnalysis",
            FieldUpdate::SentimentAnalysis(_) => "sentimentAnalysis",
            FieldUpdate::SentimentScore(_) => "sentimentScore",
            FieldUpdate::PeerComparison(_) => "peerComparison",
            FieldUpdate::LegendAnalysis(_) => "legendAnalysis",
            FieldUpdate::LegendScores(_) => "legendScores",
            FieldUpdate::InsiderSummary(_) => "insiderSummary",
            FieldUpdate::FinalStrategy(_) => "finalStrategy",
            FieldUpdate::DayTradingResult(_) => "dayTradingResult",
        }
    }

    /// The day-trading result lives under the global key, not the subject's.
    pub fn is_global(&self) -> bool {
        matches!(self, FieldUpdate::DayTradingResult(_))
    }

    pub fn apply(self, record: &mut AnalysisRecord) {
        match self {
            FieldUpdate::FinancialAnalysis(text) => record.financial_analysis = text,
            FieldUpdate::SentimentAnalysis(text) => record.sentiment_analysis = text,
            FieldUpdate::SentimentScore(score) => record.sentiment_score = score.min(100),
            FieldUpdate::PeerComparison(text) => record.peer_comparison = text,
            FieldUpdate::LegendAnalysis(text) => record.legend_analysis = text,
            FieldUpdate::LegendScores(scores) => record.legend_scores = scores,
            FieldUpdate::InsiderSummary(text) => record.insider_summary = text,
            FieldUpdate::FinalStrategy(text) => record.final_strategy = text,
            FieldUpdate::DayTradingResult(result) => record.day_trading_result = Some(result),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    BlueChip, // 우량주 (시총 4000억 이상)
    Growth,   // 유망주 (급등)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicators {
    pub bollinger: String,
    pub macd: String,
    pub rsi: String,
    pub ma: String,
}

/// Larry Williams volatility breakout setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakoutSetup {
    pub range: String, // 전일고가 - 전일저가
    pub k_value: f64,
    pub breakout_price: String, // 시가 + range * k
    pub status: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FakeBreakoutFilters {
    pub noise_ratio: f64,
    pub ma_trend: bool,
    pub volume_spike: bool,
    pub disparity: String,
    pub pin_bar_warning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTradingStock {
    pub ticker: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub current_price: String,
    #[serde(default)]
    pub target_price: String,
    #[serde(default)]
    pub stop_loss: String,
    #[serde(default)]
    pub technical_analysis: String,
    #[serde(default)]
    pub momentum: String,
    #[serde(default)]
    pub indicators: Indicators,
    #[serde(default)]
    pub larry_williams: BreakoutSetup,
    #[serde(default)]
    pub fake_breakout_filters: FakeBreakoutFilters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayTradingResult {
    pub summary: String,
    pub recommendations: Vec<DayTradingStock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexColor {
    Red,
    Blue,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndex {
    pub name: String,
    pub value: String,
    pub change: String,
    pub color: IndexColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPick {
    pub ticker: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub current_price: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketScanResult {
    pub market_status: String,
    #[serde(deserialize_with = "de_neutral_score")]
    pub timing_score: u8,
    pub liquidity_comment: String,
    pub summary: String,
    pub indices: Vec<MarketIndex>,
    pub leading_sectors: Vec<String>,
    pub recommendations: Vec<ScanPick>,
}

impl Default for MarketScanResult {
    fn default() -> Self {
        Self {
            market_status: String::new(),
            timing_score: NEUTRAL_SCORE,
            liquidity_comment: String::new(),
            summary: String::new(),
            indices: Vec::new(),
            leading_sectors: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentReport {
    pub summary: String,
    #[serde(deserialize_with = "de_neutral_score")]
    pub score: u8,
}

impl Default for SentimentReport {
    fn default() -> Self {
        Self {
            summary: String::new(),
            score: NEUTRAL_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegendReport {
    pub analysis: String,
    pub scores: LegendScores,
    pub insider_summary: String,
}

/// What an external research call hands back, shaped per stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    MarketScan(MarketScanResult),
    DayTrading(DayTradingResult),
    Financials(String),
    Sentiment(SentimentReport),
    PeerScreen(String),
    Legends(LegendReport),
    Strategy(String),
}

impl StageResult {
    pub fn stage(&self) -> Stage {
        match self {
            StageResult::MarketScan(_) => Stage::MarketScan,
            StageResult::DayTrading(_) => Stage::DayTradingScan,
            StageResult::Financials(_) => Stage::Financials,
            StageResult::Sentiment(_) => Stage::Sentiment,
            StageResult::PeerScreen(_) => Stage::PeerScreen,
            StageResult::Legends(_) => Stage::LegendPanel,
            StageResult::Strategy(_) => Stage::Strategy,
        }
    }

    /// Rejects responses that carry nothing usable for their stage.
    pub fn check_usable(&self) -> Result<(), String> {
        let blank = |text: &str| text.trim().is_empty();
        match self {
            StageResult::MarketScan(scan) => {
                if scan.indices.is_empty() && scan.recommendations.is_empty() {
                    return Err("no indices and no recommendations".to_string());
                }
            }
            StageResult::DayTrading(result) => {
                if blank(&result.summary) && result.recommendations.is_empty() {
                    return Err("no summary and no recommendations".to_string());
                }
            }
            StageResult::Sentiment(report) if blank(&report.summary) => {
                return Err("empty summary".to_string());
            }
            StageResult::Legends(report) if blank(&report.analysis) => {
                return Err("empty analysis".to_string());
            }
            StageResult::Financials(text)
            | StageResult::PeerScreen(text)
            | StageResult::Strategy(text)
                if blank(text) =>
            {
                return Err("empty text".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    /// Record mutations for a subject-scoped or day-trading result, in the
    /// order they are applied. A market scan has none; it is stored as is.
    pub fn into_updates(self) -> Vec<FieldUpdate> {
        match self {
            StageResult::MarketScan(_) => Vec::new(),
            StageResult::DayTrading(result) => vec![FieldUpdate::DayTradingResult(result)],
            StageResult::Financials(text) => vec![FieldUpdate::FinancialAnalysis(text)],
            StageResult::Sentiment(report) => vec![
                FieldUpdate::SentimentAnalysis(report.summary),
                FieldUpdate::SentimentScore(report.score),
            ],
            StageResult::PeerScreen(text) => vec![FieldUpdate::PeerComparison(text)],
            StageResult::Legends(report) => vec![
                FieldUpdate::LegendAnalysis(report.analysis),
                FieldUpdate::LegendScores(report.scores),
                FieldUpdate::InsiderSummary(report.insider_summary),
            ],
            StageResult::Strategy(text) => vec![FieldUpdate::FinalStrategy(text)],
        }
    }
}

/// Real-time quote used to enrich research requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub code: String,
    pub name: String,
    pub price: i64,
    pub change_amount: i64,
    pub change_rate: f64,
}
