//! End-to-end pipeline tests against fake research and quote services

mod common;

use common::*;
use research_wizard::application::run::is_quote_code;
use research_wizard::application::wizard::{Completion, RunTicket, StageStatus, Wizard};
use research_wizard::domain::cache::CacheKey;
use research_wizard::domain::error::WizardError;
use research_wizard::domain::stage::Stage;
use std::time::Duration;

async fn run(h: &mut Harness, stage: Stage) -> Completion {
    h.wizard
        .run_stage(stage, &h.research, &h.quotes)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_market_scan_runs_once_per_scan_window() {
    let mut h = Harness::new().await;

    assert_eq!(run(&mut h, Stage::MarketScan).await, Completion::Applied);
    assert_eq!(run(&mut h, Stage::MarketScan).await, Completion::Cached);
    assert_eq!(h.research.calls("market_scan"), 1);
    assert_eq!(h.wizard.market_scan().unwrap().timing_score, 72);

    h.clock.advance(SCAN_WINDOW);
    assert_eq!(run(&mut h, Stage::MarketScan).await, Completion::Applied);
    assert_eq!(h.research.calls("market_scan"), 2);
}

#[tokio::test]
async fn test_scans_run_without_subject() {
    let mut h = Harness::new().await;

    assert_eq!(run(&mut h, Stage::DayTradingScan).await, Completion::Applied);
    assert!(h.wizard.active_subject().is_none());
    assert!(h.wizard.has_result(Stage::DayTradingScan));
}

#[tokio::test]
async fn test_day_trading_result_visible_under_every_subject() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    run(&mut h, Stage::DayTradingScan).await;

    h.wizard.select_subject("MSFT").unwrap();
    assert_eq!(
        h.wizard.day_trading().unwrap().recommendations[0].ticker,
        "000660"
    );

    // Still shared after a restart
    h.reload().await;
    h.wizard.select_subject("TSLA").unwrap();
    assert!(h.wizard.day_trading().is_some());
}

#[tokio::test]
async fn test_subject_stage_requires_subject() {
    let mut h = Harness::new().await;

    let err = h
        .wizard
        .run_stage(Stage::Financials, &h.research, &h.quotes)
        .await
        .unwrap_err();

    assert!(matches!(err, WizardError::NoSubject));
    assert_eq!(h.research.calls("financials"), 0);
}

#[tokio::test]
async fn test_busy_stage_rejects_second_run() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();

    let first = h.wizard.begin_run(Stage::Financials).unwrap();
    assert!(matches!(first, RunTicket::Pending(_)));
    assert_eq!(h.wizard.view().status, StageStatus::Busy);

    let second = h.wizard.begin_run(Stage::Financials);
    assert!(matches!(second, Err(WizardError::StageBusy(Stage::Financials))));

    let RunTicket::Pending(request) = first else {
        unreachable!()
    };
    let outcome = request.execute(&h.research, &h.quotes).await;
    assert_eq!(h.wizard.complete(outcome).await, Completion::Applied);
    assert_eq!(h.research.calls("financials"), 1);
    assert_eq!(h.wizard.view().status, StageStatus::Ready);
}

#[tokio::test]
async fn test_failure_keeps_previous_result_and_clears_on_retry() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    run(&mut h, Stage::Financials).await;

    h.research.set_fail(true);
    let failed = run(&mut h, Stage::Financials).await;
    assert!(matches!(failed, Completion::Failed(_)));
    assert_eq!(h.wizard.record().financial_analysis, "financials for AAPL");
    assert!(matches!(h.wizard.view().status, StageStatus::Failed(_)));

    h.research.set_fail(false);
    assert_eq!(run(&mut h, Stage::Financials).await, Completion::Applied);
    assert_eq!(h.wizard.view().status, StageStatus::Ready);
    assert!(h.wizard.stages().error(Stage::Financials).is_none());
}

#[tokio::test]
async fn test_malformed_response_is_a_failure() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.research.set_blank(true);

    match run(&mut h, Stage::Sentiment).await {
        Completion::Failed(message) => assert!(message.contains("Malformed")),
        other => panic!("unexpected completion: {:?}", other),
    }
    assert_eq!(h.wizard.record().sentiment_score, 50);
    assert!(h.wizard.store().get(&CacheKey::Subject("AAPL".to_string())).is_none());

    match run(&mut h, Stage::MarketScan).await {
        Completion::Failed(_) => {}
        other => panic!("unexpected completion: {:?}", other),
    }
    assert!(h.wizard.market_scan().is_none());
}

#[tokio::test]
async fn test_result_for_previous_subject_lands_in_background() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    let RunTicket::Pending(request) = h.wizard.begin_run(Stage::Financials).unwrap() else {
        panic!("expected a pending run");
    };

    h.wizard.select_subject("MSFT").unwrap();
    let outcome = request.execute(&h.research, &h.quotes).await;

    assert_eq!(
        h.wizard.complete(outcome).await,
        Completion::AppliedInBackground
    );
    assert_eq!(h.wizard.record().ticker, "MSFT");
    assert!(h.wizard.record().financial_analysis.is_empty());

    let back = h.wizard.select_subject("AAPL").unwrap();
    assert!(back.cache_hit);
    assert_eq!(h.wizard.record().financial_analysis, "financials for AAPL");
}

#[tokio::test]
async fn test_sentiment_and_legend_results_fill_every_field() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("NVDA").unwrap();

    run(&mut h, Stage::Sentiment).await;
    run(&mut h, Stage::LegendPanel).await;

    let record = h.wizard.record();
    assert_eq!(record.sentiment_analysis, "sentiment for NVDA");
    assert_eq!(record.sentiment_score, 64);
    assert_eq!(record.legend_analysis, "legends for NVDA");
    assert_eq!(record.legend_scores.total, 72);
    assert_eq!(record.insider_summary, "No insider selling");
}

#[tokio::test]
async fn test_advance_follows_results() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    assert_eq!(h.wizard.current_stage(), Stage::Financials);

    assert!(matches!(
        h.wizard.advance_stage(),
        Err(WizardError::CannotAdvance(Stage::Financials))
    ));
    assert!(!h.wizard.view().can_advance);

    run(&mut h, Stage::Financials).await;
    assert!(h.wizard.view().can_advance);
    assert_eq!(h.wizard.advance_stage().unwrap(), Stage::Sentiment);
}

#[tokio::test]
async fn test_strategy_auto_runs_once_with_captured_context() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    run(&mut h, Stage::Financials).await;

    assert!(h.wizard.take_auto_run().is_none());

    h.wizard.set_stage(Stage::Strategy);
    let request = h.wizard.take_auto_run().expect("strategy run owed");
    assert_eq!(request.stage, Stage::Strategy);
    let outcome = request.execute(&h.research, &h.quotes).await;
    assert_eq!(h.wizard.complete(outcome).await, Completion::Applied);

    let context = h.research.strategy_context().unwrap();
    assert_eq!(context.financial_analysis, "financials for AAPL");
    assert_eq!(h.wizard.record().final_strategy, "strategy for AAPL");

    h.wizard.set_stage(Stage::LegendPanel);
    h.wizard.set_stage(Stage::Strategy);
    assert!(h.wizard.take_auto_run().is_none());
    assert_eq!(h.research.calls("strategy"), 1);
}

#[tokio::test]
async fn test_no_auto_run_when_strategy_cached() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.wizard.set_stage(Stage::Strategy);
    run(&mut h, Stage::Strategy).await;

    h.wizard.select_subject("AAPL").unwrap();
    h.wizard.set_stage(Stage::Strategy);
    assert!(h.wizard.take_auto_run().is_none());
}

#[tokio::test]
async fn test_quote_lookup_only_for_exchange_codes() {
    let mut h = Harness::new().await;

    h.wizard.select_subject("005930").unwrap();
    run(&mut h, Stage::Financials).await;
    run(&mut h, Stage::Sentiment).await;
    assert_eq!(h.quotes.lookups(), 1);

    h.wizard.select_subject("AAPL").unwrap();
    run(&mut h, Stage::Financials).await;
    assert_eq!(h.quotes.lookups(), 1);

    let seen = h.research.quotes_seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].as_ref().unwrap().price, 71_000);
    assert!(seen[1].is_none());
}

#[tokio::test]
async fn test_quote_failure_does_not_fail_stage() {
    let mut h = Harness::new().await;
    h.quotes.set_fail(true);
    h.wizard.select_subject("005930").unwrap();

    assert_eq!(run(&mut h, Stage::LegendPanel).await, Completion::Applied);
    assert_eq!(h.quotes.lookups(), 1);
    assert_eq!(h.research.quotes_seen(), vec![None]);
}

#[tokio::test]
async fn test_unpersisted_result_still_shown() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.blobs.set_fail_writes(true);

    let completion = run(&mut h, Stage::PeerScreen).await;

    assert!(matches!(completion, Completion::Unpersisted(_)));
    assert_eq!(h.wizard.record().peer_comparison, "peer_screen for AAPL");
    assert!(!h
        .wizard
        .stages()
        .is_busy(Stage::PeerScreen, h.wizard.active_subject()));
}

#[tokio::test]
async fn test_view_reports_scan_expiry() {
    let mut h = Harness::new().await;
    run(&mut h, Stage::MarketScan).await;

    let view = h.wizard.view();
    assert_eq!(view.stage, Stage::MarketScan);
    assert_eq!(view.status, StageStatus::Ready);
    assert_eq!(view.cached_at, Some(START_MILLIS));
    assert_eq!(
        view.expires_at,
        Some(START_MILLIS + SCAN_WINDOW.as_millis() as i64)
    );
    assert!(!view.can_advance);
}

#[tokio::test]
async fn test_subject_restored_after_restart() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    run(&mut h, Stage::Financials).await;
    run(&mut h, Stage::Sentiment).await;
    let before = h.wizard.record().clone();

    h.clock.advance(Duration::from_secs(5 * 60));
    h.reload().await;
    let selection = h.wizard.select_subject("AAPL").unwrap();

    assert!(selection.cache_hit);
    assert_eq!(h.wizard.record(), &before);
    assert_eq!(h.research.calls("financials"), 1);
}

#[test]
fn test_quote_code_shape() {
    assert!(is_quote_code("005930"));
    assert!(!is_quote_code("00593"));
    assert!(!is_quote_code("0059300"));
    assert!(!is_quote_code("AAPL12"));
    assert!(!is_quote_code(""));
}

#[tokio::test]
async fn test_unpersisted_legend_result_applied_whole() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.blobs.set_fail_writes(true);

    let completion = run(&mut h, Stage::LegendPanel).await;

    assert!(matches!(completion, Completion::Unpersisted(_)));
    let record = h.wizard.record();
    assert_eq!(record.legend_analysis, "legends for AAPL");
    assert_eq!(record.legend_scores.total, 72);
    assert_eq!(record.legend_scores.buffett, 80);
    assert_eq!(record.insider_summary, "No insider selling");
}

#[tokio::test]
async fn test_unpersisted_sentiment_keeps_both_fields() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.blobs.set_fail_writes(true);

    run(&mut h, Stage::Sentiment).await;

    assert_eq!(h.wizard.record().sentiment_analysis, "sentiment for AAPL");
    assert_eq!(h.wizard.record().sentiment_score, 64);
}

#[tokio::test]
async fn test_run_for_previous_subject_does_not_touch_current_view() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    let RunTicket::Pending(request) = h.wizard.begin_run(Stage::Financials).unwrap() else {
        panic!("expected a pending run");
    };

    h.wizard.select_subject("TSLA").unwrap();
    assert_eq!(h.wizard.view().status, StageStatus::Empty);

    h.research.set_fail(true);
    let outcome = request.execute(&h.research, &h.quotes).await;
    assert!(matches!(
        h.wizard.complete(outcome).await,
        Completion::Failed(_)
    ));

    assert_eq!(h.wizard.view().status, StageStatus::Empty);
    assert!(h.wizard.stages().error(Stage::Financials).is_none());
}

#[tokio::test]
async fn test_background_success_keeps_current_subject_error() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    let RunTicket::Pending(request) = h.wizard.begin_run(Stage::Financials).unwrap() else {
        panic!("expected a pending run");
    };

    h.wizard.select_subject("TSLA").unwrap();
    h.research.set_fail(true);
    run(&mut h, Stage::Financials).await;
    assert!(matches!(h.wizard.view().status, StageStatus::Failed(_)));

    h.research.set_fail(false);
    let outcome = request.execute(&h.research, &h.quotes).await;
    assert_eq!(
        h.wizard.complete(outcome).await,
        Completion::AppliedInBackground
    );

    assert!(matches!(h.wizard.view().status, StageStatus::Failed(_)));
}

#[tokio::test]
async fn test_current_subject_can_run_while_previous_is_pending() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    let first = h.wizard.begin_run(Stage::Financials).unwrap();
    assert!(matches!(first, RunTicket::Pending(_)));

    h.wizard.select_subject("TSLA").unwrap();
    assert_eq!(run(&mut h, Stage::Financials).await, Completion::Applied);
    assert_eq!(h.wizard.record().financial_analysis, "financials for TSLA");
}

#[tokio::test]
async fn test_advance_onto_strategy_owes_auto_run() {
    let mut h = Harness::new().await;
    h.wizard.select_subject("AAPL").unwrap();
    h.wizard.set_stage(Stage::LegendPanel);
    run(&mut h, Stage::LegendPanel).await;

    assert_eq!(h.wizard.advance_stage().unwrap(), Stage::Strategy);

    let request = h.wizard.take_auto_run().expect("strategy run owed");
    let outcome = request.execute(&h.research, &h.quotes).await;
    assert_eq!(h.wizard.complete(outcome).await, Completion::Applied);
    assert_eq!(h.wizard.record().final_strategy, "strategy for AAPL");
}

#[tokio::test]
async fn test_scan_expiry_saturates_for_unbounded_window() {
    let h = Harness::new().await;
    let store = load_store(&h.blobs, &h.clock).await;
    let mut wizard = Wizard::new(store, SUBJECT_WINDOW, Duration::MAX);

    wizard
        .run_stage(Stage::MarketScan, &h.research, &h.quotes)
        .await
        .unwrap();

    assert_eq!(wizard.view().expires_at, Some(i64::MAX));
}
