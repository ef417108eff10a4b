//! Record and stage result tests

use research_wizard::domain::cache::CacheKey;
use research_wizard::domain::model::{
    clamp_score, AnalysisRecord, DayTradingResult, FieldUpdate, LegendReport, MarketScanResult,
    SentimentReport, StageResult,
};
use research_wizard::domain::stage::Stage;

#[test]
fn test_scores_clamped_and_rounded() {
    assert_eq!(clamp_score(-4.0), 0);
    assert_eq!(clamp_score(64.6), 65);
    assert_eq!(clamp_score(250.0), 100);
}

#[test]
fn test_missing_scores_take_defaults() {
    let report: SentimentReport = serde_json::from_str(r#"{ "summary": "Calm" }"#).unwrap();
    assert_eq!(report.score, 50);

    let report: SentimentReport =
        serde_json::from_str(r#"{ "summary": "Calm", "score": null }"#).unwrap();
    assert_eq!(report.score, 50);

    let legends: LegendReport =
        serde_json::from_str(r#"{ "analysis": "x", "scores": { "buffett": 90 } }"#).unwrap();
    assert_eq!(legends.scores.buffett, 90);
    assert_eq!(legends.scores.total, 0);
}

#[test]
fn test_record_field_names_match_snapshot() {
    let value = serde_json::to_value(AnalysisRecord::new("AAPL")).unwrap();
    for update in [
        FieldUpdate::FinancialAnalysis(String::new()),
        FieldUpdate::SentimentAnalysis(String::new()),
        FieldUpdate::SentimentScore(0),
        FieldUpdate::PeerComparison(String::new()),
        FieldUpdate::LegendAnalysis(String::new()),
        FieldUpdate::LegendScores(Default::default()),
        FieldUpdate::InsiderSummary(String::new()),
        FieldUpdate::FinalStrategy(String::new()),
        FieldUpdate::DayTradingResult(DayTradingResult::default()),
    ] {
        assert!(
            value.get(update.field_name()).is_some(),
            "{}",
            update.field_name()
        );
    }
}

#[test]
fn test_only_day_trading_update_is_global() {
    assert!(FieldUpdate::DayTradingResult(DayTradingResult::default()).is_global());
    assert!(!FieldUpdate::FinalStrategy("Buy".to_string()).is_global());
}

#[test]
fn test_applied_score_capped() {
    let mut record = AnalysisRecord::new("AAPL");
    FieldUpdate::SentimentScore(180).apply(&mut record);
    assert_eq!(record.sentiment_score, 100);
}

#[test]
fn test_unusable_results_rejected() {
    assert!(StageResult::Financials("  \n".to_string()).check_usable().is_err());
    assert!(StageResult::Strategy(String::new()).check_usable().is_err());
    assert!(StageResult::MarketScan(MarketScanResult::default())
        .check_usable()
        .is_err());
    assert!(StageResult::DayTrading(DayTradingResult::default())
        .check_usable()
        .is_err());
    assert!(StageResult::Legends(LegendReport::default())
        .check_usable()
        .is_err());

    let summary_only = DayTradingResult {
        summary: "Nothing breaks out today".to_string(),
        recommendations: Vec::new(),
    };
    assert!(StageResult::DayTrading(summary_only).check_usable().is_ok());
}

#[test]
fn test_legend_result_expands_to_three_updates() {
    let result = StageResult::Legends(LegendReport {
        analysis: "Panel agrees".to_string(),
        scores: Default::default(),
        insider_summary: "Quiet".to_string(),
    });
    assert_eq!(result.stage(), Stage::LegendPanel);

    let names: Vec<&str> = result
        .into_updates()
        .iter()
        .map(FieldUpdate::field_name)
        .collect();
    assert_eq!(names, vec!["legendAnalysis", "legendScores", "insiderSummary"]);
}

#[test]
fn test_subject_key_normalization() {
    assert_eq!(
        CacheKey::subject(" tsla ").unwrap(),
        CacheKey::Subject("TSLA".to_string())
    );
    assert_eq!(CacheKey::from_stored("GLOBAL_MARKET"), CacheKey::GlobalMarket);
    assert_eq!(CacheKey::GlobalDayTrading.as_str(), "GLOBAL_DAY_TRADING");
    assert!(CacheKey::subject("global_day_trading").is_err());
}
