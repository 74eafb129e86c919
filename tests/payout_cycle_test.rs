//! Full ingest -> aggregate -> payout flow, driven through the public
//! pipeline types with mock venue and executor doubles.

use liquidlab_revenue::db::init_db;
use liquidlab_revenue::pipeline::{
    CycleOutcome, IngestionLoop, MockPayoutExecutor, PayoutExecutor, PayoutPreparer,
    RevenueAggregator,
};
use liquidlab_revenue::venue::MockVenue;
use liquidlab_revenue::{
    Address, Coin, DbPlatformRegistry, Decimal, FeeSchedule, Fill, PayoutStatus, Period, Platform,
    PlatformId, Repository, RevenueSplitPolicy, Side, TimeMs,
};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

struct TestStack {
    ingestion: IngestionLoop,
    venue: Arc<MockVenue>,
    repo: Arc<Repository>,
    registry: Arc<DbPlatformRegistry>,
    _temp: TempDir,
}

async fn setup_stack() -> TestStack {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let registry = Arc::new(DbPlatformRegistry::new(repo.clone()));
    let venue = Arc::new(MockVenue::new());
    let aggregator = RevenueAggregator::new(repo.clone());

    let ingestion = IngestionLoop::new(
        venue.clone(),
        registry.clone(),
        repo.clone(),
        aggregator,
        FeeSchedule::new(
            Decimal::from_str("0.002").unwrap(),
            Decimal::from_str("0.001").unwrap(),
            Decimal::from_str("0.0005").unwrap(),
        ),
        RevenueSplitPolicy::new(
            Decimal::from_str("0.7").unwrap(),
            Decimal::from_str("0.5").unwrap(),
        ),
        4,
    );

    TestStack {
        ingestion,
        venue,
        repo,
        registry,
        _temp: temp_dir,
    }
}

fn preparer(
    stack: &TestStack,
    executor: Option<Arc<dyn PayoutExecutor>>,
    min_payout: &str,
) -> PayoutPreparer {
    PayoutPreparer::new(
        stack.repo.clone(),
        stack.registry.clone(),
        executor,
        Decimal::from_str(min_payout).unwrap(),
        "USDC".to_string(),
        Period::AllTime,
    )
}

async fn register_platform(repo: &Repository, id: &str, wallet: &str) -> Platform {
    let platform = Platform {
        id: PlatformId::new(id),
        name: format!("{} terminal", id),
        owner_user_id: format!("user-{}", id),
        owner_wallet: Some(Address::new(wallet)),
    };
    repo.upsert_platform(&platform).await.unwrap();
    platform
}

fn taker_fill(wallet: &str, tid: i64, time_ms: i64, px: &str, sz: &str) -> Fill {
    Fill::new(
        TimeMs::new(time_ms),
        Address::new(wallet),
        Coin::new("ETH"),
        Side::Sell,
        Decimal::from_str(px).unwrap(),
        Decimal::from_str(sz).unwrap(),
        true,
        Some(tid),
        None,
    )
}

async fn run_ingest(stack: &TestStack) {
    match stack.ingestion.run_cycle().await.unwrap() {
        CycleOutcome::Ran(_) => {}
        CycleOutcome::AlreadyRunning => panic!("cycle unexpectedly skipped"),
    }
}

#[tokio::test]
async fn test_end_to_end_ingest_aggregate_payout() {
    let stack = setup_stack().await;
    let platform = register_platform(&stack.repo, "plat-1", "0xaaa").await;

    // 100k notional at the 0.001 taker rate: 100 in fees, 70 to the platform.
    stack
        .venue
        .push_fill(taker_fill("0xaaa", 1, 1000, "50000", "1"));
    stack
        .venue
        .push_fill(taker_fill("0xaaa", 2, 2000, "25000", "2"));
    run_ingest(&stack).await;

    let executor = Arc::new(MockPayoutExecutor::succeeding("0xfeedbeef"));
    let p = preparer(&stack, Some(executor.clone()), "10");

    let record = p.prepare(&platform).await.unwrap().expect("payout record");
    assert_eq!(record.status, PayoutStatus::Completed);
    assert_eq!(record.amount, Decimal::from_str("70").unwrap());
    assert_eq!(record.tx_hash.as_deref(), Some("0xfeedbeef"));
    assert_eq!(record.currency, "USDC");
    assert_eq!(record.recipient_address, Address::new("0xaaa"));
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_payout_non_double_pay_across_cycles() {
    let stack = setup_stack().await;
    let platform = register_platform(&stack.repo, "plat-1", "0xaaa").await;

    stack
        .venue
        .push_fill(taker_fill("0xaaa", 1, 1000, "50000", "2"));
    run_ingest(&stack).await;

    let executor = Arc::new(MockPayoutExecutor::succeeding("0xhash1"));
    let p = preparer(&stack, Some(executor.clone()), "10");

    let first = p.prepare(&platform).await.unwrap().expect("first payout");
    assert_eq!(first.amount, Decimal::from_str("70").unwrap());

    // Nothing new traded; the window is fully covered, so no second payout.
    let second = p.prepare(&platform).await.unwrap();
    assert!(second.is_none());
    assert_eq!(executor.call_count(), 1);

    // New volume arrives; only the delta is owed.
    stack
        .venue
        .push_fill(taker_fill("0xaaa", 2, 3000, "50000", "1"));
    run_ingest(&stack).await;

    let third = p.prepare(&platform).await.unwrap().expect("delta payout");
    assert_eq!(third.amount, Decimal::from_str("35").unwrap());
    assert_eq!(executor.call_count(), 2);
}

#[tokio::test]
async fn test_failed_payout_recomputed_fresh_next_cycle() {
    let stack = setup_stack().await;
    let platform = register_platform(&stack.repo, "plat-1", "0xaaa").await;

    stack
        .venue
        .push_fill(taker_fill("0xaaa", 1, 1000, "50000", "2"));
    run_ingest(&stack).await;

    let failing = Arc::new(MockPayoutExecutor::failing("executor offline"));
    let p = preparer(&stack, Some(failing.clone()), "10");

    let failed = p.prepare(&platform).await.unwrap().expect("failed record");
    assert_eq!(failed.status, PayoutStatus::Failed);

    // The failed record stays terminal; a fresh record covers the amount.
    let retry = Arc::new(MockPayoutExecutor::succeeding("0xsecond"));
    let p2 = preparer(&stack, Some(retry.clone()), "10");
    let recovered = p2.prepare(&platform).await.unwrap().expect("fresh record");
    assert_ne!(recovered.id, failed.id);
    assert_eq!(recovered.status, PayoutStatus::Completed);
    assert_eq!(recovered.amount, Decimal::from_str("70").unwrap());

    let history = stack
        .repo
        .query_payouts(&PlatformId::new("plat-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_minimum_threshold_suppresses_small_payouts() {
    let stack = setup_stack().await;
    let platform = register_platform(&stack.repo, "plat-1", "0xaaa").await;

    // 1000 notional -> 1 in fees -> 0.7 owed, below the 10 minimum.
    stack
        .venue
        .push_fill(taker_fill("0xaaa", 1, 1000, "1000", "1"));
    run_ingest(&stack).await;

    let executor = Arc::new(MockPayoutExecutor::succeeding("0xhash"));
    let p = preparer(&stack, Some(executor.clone()), "10");

    let record = p.prepare(&platform).await.unwrap();
    assert!(record.is_none());
    assert_eq!(executor.call_count(), 0);

    let pending = p
        .pending_amounts(&PlatformId::new("plat-1"))
        .await
        .unwrap();
    let all_time = pending
        .iter()
        .find(|pp| pp.period == Period::AllTime)
        .expect("all-time entry");
    assert_eq!(all_time.amount, Decimal::from_str("0.7").unwrap());
}

#[tokio::test]
async fn test_run_cycle_isolates_platforms() {
    let stack = setup_stack().await;
    register_platform(&stack.repo, "plat-1", "0xaaa").await;
    // plat-2 has earnings but no wallet to pay to; it must not block plat-1.
    stack
        .repo
        .upsert_platform(&Platform {
            id: PlatformId::new("plat-2"),
            name: "walletless".to_string(),
            owner_user_id: "user-plat-2".to_string(),
            owner_wallet: None,
        })
        .await
        .unwrap();

    stack
        .venue
        .push_fill(taker_fill("0xaaa", 1, 1000, "50000", "2"));
    run_ingest(&stack).await;

    let executor = Arc::new(MockPayoutExecutor::succeeding("0xhash"));
    let p = preparer(&stack, Some(executor.clone()), "10");
    p.run_cycle().await.unwrap();

    let history = stack
        .repo
        .query_payouts(&PlatformId::new("plat-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, PayoutStatus::Completed);
}
