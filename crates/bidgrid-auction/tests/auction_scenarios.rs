//! End-to-end auction scenarios.
//!
//! Runs whole auctions over in-process reps with in-memory delegates:
//! placement quality (spread, tie-breaks), the reserve race, stop-auction
//! reconciliation, and the fleet-wide accounting invariants.

use std::sync::Arc;

use bidgrid_auction::{AuctionRunner, InProcessClient, RepPoolClient};
use bidgrid_core::{
    Algorithm, AuctionRules, Instance, PoolTuning, Resources, StartAuctionRequest,
    StopAuctionRequest,
};
use bidgrid_rep::{AuctionRep, InMemoryRepDelegate};

fn make_rep(guid: &str, total: Resources) -> Arc<AuctionRep> {
    Arc::new(AuctionRep::new(guid, Box::new(InMemoryRepDelegate::new(total, 0))).unwrap())
}

fn standard_rep(guid: &str) -> Arc<AuctionRep> {
    make_rep(guid, Resources::new(100, 100, 100))
}

fn copy_of(pg: &str, ig: &str, index: u32) -> Instance {
    Instance {
        process_guid: pg.into(),
        instance_guid: ig.into(),
        index,
        memory_mb: 1,
        disk_mb: 1,
    }
}

/// `count` one-MB filler instances of a private process, to dial a rep's
/// remaining resources to a known value.
fn fillers(tag: &str, count: usize) -> Vec<Instance> {
    (0..count)
        .map(|i| copy_of(&format!("filler-{tag}"), &format!("filler-{tag}-{i}"), 0))
        .collect()
}

fn start_request(pg: &str, ig: &str, memory_mb: i64, disk_mb: i64) -> StartAuctionRequest {
    StartAuctionRequest {
        process_guid: pg.into(),
        instance_guid: ig.into(),
        index: 0,
        memory_mb,
        disk_mb,
        desired_instances: 1,
        num_azs: 1,
    }
}

fn runner_over(reps: Vec<Arc<AuctionRep>>) -> (Arc<InProcessClient>, Vec<String>, AuctionRunner) {
    let client = Arc::new(InProcessClient::new(reps, PoolTuning::default()));
    let universe = client.rep_guids();
    let runner = AuctionRunner::new(
        client.clone(),
        AuctionRules::default().with_max_bidding_pool_fraction(1.0),
    )
    .with_seed(0xb1d);
    (client, universe, runner)
}

// ── Start auctions ─────────────────────────────────────────────

#[tokio::test]
async fn cold_start_goes_to_the_lexicographically_smaller_rep() {
    let (client, universe, runner) = runner_over(vec![
        standard_rep("rep-b"),
        standard_rep("rep-a"),
    ]);

    let result = runner
        .run_start_auction(&universe, &start_request("pg", "ig-1", 10, 1))
        .await;

    // Both reps bid zero; the tie goes to the smaller guid.
    assert_eq!(result.winner.as_deref(), Some("rep-a"));
    assert_eq!(result.num_rounds, 1);
    assert!(result.error.is_none());

    let winner = client.rep("rep-a").unwrap();
    assert_eq!(winner.remaining_resources().unwrap(), Resources::new(90, 99, 99));
    assert_eq!(winner.simulated_instances().len(), 1);
    assert!(client.rep("rep-b").unwrap().simulated_instances().is_empty());
}

#[tokio::test]
async fn co_location_penalty_beats_resource_headroom() {
    let rep_a = standard_rep("rep-a");
    rep_a.set_simulated_instances(vec![
        copy_of("pg", "existing-1", 0),
        copy_of("pg", "existing-2", 1),
    ]);
    let rep_b = standard_rep("rep-b");

    let (client, universe, runner) = runner_over(vec![rep_a, rep_b]);

    let result = runner
        .run_start_auction(&universe, &start_request("pg", "ig-new", 10, 1))
        .await;

    // rep-a already runs two copies of pg: ε + 2 vs rep-b's ε + 0.
    assert_eq!(result.winner.as_deref(), Some("rep-b"));
    assert_eq!(client.rep("rep-b").unwrap().simulated_instances().len(), 1);
}

#[tokio::test]
async fn emptier_rep_wins_the_resource_tie_break() {
    // Neither rep runs pg; rep-a sits at half capacity, rep-b at a tenth.
    let rep_a = standard_rep("rep-a");
    rep_a.set_simulated_instances(fillers("a", 50));
    let rep_b = standard_rep("rep-b");
    rep_b.set_simulated_instances(fillers("b", 10));

    let (_client, universe, runner) = runner_over(vec![rep_a, rep_b]);

    let result = runner
        .run_start_auction(&universe, &start_request("pg", "ig-1", 10, 1))
        .await;

    // Scores 0.5 vs 0.1.
    assert_eq!(result.winner.as_deref(), Some("rep-b"));
}

#[tokio::test]
async fn algorithm_choice_changes_the_winner() {
    // rep-a runs one copy of pg on an otherwise empty host; rep-b runs
    // none but sits at half capacity. For a ten-instance process the raw
    // count penalizes rep-a by 1.0, the fractional variant by only 0.1,
    // so the two algorithms pick different winners.
    let fleet = || {
        let rep_a = standard_rep("rep-a");
        rep_a.set_simulated_instances(vec![copy_of("pg", "existing", 0)]);
        let rep_b = standard_rep("rep-b");
        rep_b.set_simulated_instances(fillers("b", 50));
        vec![rep_a, rep_b]
    };
    let req = StartAuctionRequest {
        process_guid: "pg".into(),
        instance_guid: "ig-new".into(),
        index: 1,
        memory_mb: 1,
        disk_mb: 1,
        desired_instances: 10,
        num_azs: 1,
    };

    // Raw count: rep-a ≈ 0.01 + 1, rep-b ≈ 0.5 + 0.
    let client = Arc::new(InProcessClient::new(fleet(), PoolTuning::default()));
    let runner = AuctionRunner::new(
        client.clone(),
        AuctionRules::default().with_max_bidding_pool_fraction(1.0),
    )
    .with_seed(5);
    let result = runner.run_start_auction(&client.rep_guids(), &req).await;
    assert_eq!(result.winner.as_deref(), Some("rep-b"));

    // Fractional penalty: rep-a ≈ 0.01 + 0.1, rep-b ≈ 0.5.
    let client = Arc::new(InProcessClient::new(fleet(), PoolTuning::default()));
    let runner = AuctionRunner::new(
        client.clone(),
        AuctionRules::default()
            .with_algorithm(Algorithm::CoLocationFraction)
            .with_max_bidding_pool_fraction(1.0),
    )
    .with_seed(5);
    let result = runner.run_start_auction(&client.rep_guids(), &req).await;
    assert_eq!(result.winner.as_deref(), Some("rep-a"));
}

#[tokio::test]
async fn reserve_race_admits_exactly_one() {
    // One rep with 70MB free faces two concurrent 60MB requests. The
    // first reservation wins; the rebid sees 10MB and declines.
    let rep = make_rep("rep-a", Resources::new(100, 100, 100));
    rep.set_simulated_instances(vec![Instance {
        process_guid: "squatter".into(),
        instance_guid: "squatter-1".into(),
        index: 0,
        memory_mb: 30,
        disk_mb: 1,
    }]);

    let (client, universe, runner) = runner_over(vec![rep]);

    let req1 = start_request("pg-1", "ig-1", 60, 1);
    let req2 = start_request("pg-2", "ig-2", 60, 1);
    let (first, second) = tokio::join!(
        runner.run_start_auction(&universe, &req1),
        runner.run_start_auction(&universe, &req2),
    );

    let placed = [&first, &second].iter().filter(|r| r.succeeded()).count();
    assert_eq!(placed, 1, "exactly one of the racing requests lands");

    let remaining = client.rep("rep-a").unwrap().remaining_resources().unwrap();
    assert_eq!(remaining.memory_mb, 10);
    assert!(remaining.is_non_negative());
}

#[tokio::test]
async fn batch_placement_upholds_capacity_invariant() {
    // More demand than the fleet can hold: everything that places must
    // fit, everything else fails cleanly, and no rep over-commits.
    let reps: Vec<Arc<AuctionRep>> = (0..5)
        .map(|i| make_rep(&format!("rep-{i}"), Resources::new(100, 100, 4)))
        .collect();
    let (client, universe, runner) = runner_over(reps);

    let requests: Vec<StartAuctionRequest> = (0..40)
        .map(|i| start_request(&format!("pg-{}", i % 4), &format!("ig-{i}"), 20, 5))
        .collect();

    let results = runner.run_start_auctions(&universe, requests).await;

    let placed = results.iter().filter(|r| r.succeeded()).count();
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    assert_eq!(placed + failed, 40);
    // 5 reps × min(100/20 memory, 4 containers) = 20 instances fit.
    assert!(placed <= 20);

    for guid in &universe {
        let rep = client.rep(guid).unwrap();
        let remaining = rep.remaining_resources().unwrap();
        assert!(
            remaining.is_non_negative(),
            "rep {guid} over-committed: {remaining:?}"
        );
    }
}

#[tokio::test]
async fn placed_instance_lives_on_exactly_one_rep() {
    let (client, universe, runner) = runner_over(vec![
        standard_rep("rep-a"),
        standard_rep("rep-b"),
        standard_rep("rep-c"),
    ]);

    let results = runner
        .run_start_auctions(
            &universe,
            (0..6)
                .map(|i| start_request("pg", &format!("ig-{i}"), 10, 1))
                .collect(),
        )
        .await;

    for result in results.iter().filter(|r| r.succeeded()) {
        let holders: Vec<&String> = universe
            .iter()
            .filter(|guid| {
                client
                    .rep(guid)
                    .unwrap()
                    .simulated_instances()
                    .iter()
                    .any(|i| i.instance_guid == result.instance_guid)
            })
            .collect();
        assert_eq!(holders.len(), 1, "{} on one rep", result.instance_guid);
        assert_eq!(Some(holders[0].as_str()), result.winner.as_deref());
    }
}

// ── Stop auctions ──────────────────────────────────────────────

#[tokio::test]
async fn stop_auction_keeps_the_least_loaded_copy() {
    // Three reps each run one copy of (pg, 0) at different loads:
    // remaining {50,50,50}, {70,70,70}, {30,30,30} → scores 1.5, 1.3, 1.7.
    let rep_0 = standard_rep("rep-0");
    let mut load = fillers("r0", 49);
    load.push(copy_of("pg", "ig-r0", 0));
    rep_0.set_simulated_instances(load);

    let rep_1 = standard_rep("rep-1");
    let mut load = fillers("r1", 29);
    load.push(copy_of("pg", "ig-r1", 0));
    rep_1.set_simulated_instances(load);

    let rep_2 = standard_rep("rep-2");
    let mut load = fillers("r2", 69);
    load.push(copy_of("pg", "ig-r2", 0));
    rep_2.set_simulated_instances(load);

    let (client, universe, runner) = runner_over(vec![rep_0, rep_1, rep_2]);

    let result = runner
        .run_stop_auction(
            &universe,
            &StopAuctionRequest {
                process_guid: "pg".into(),
                index: 0,
            },
        )
        .await;

    assert_eq!(result.winner.as_deref(), Some("rep-1"));
    assert!(result.error.is_none());

    let survivors: Vec<String> = universe
        .iter()
        .flat_map(|guid| {
            client
                .rep(guid)
                .unwrap()
                .simulated_instances()
                .into_iter()
                .filter(|i| i.process_guid == "pg")
                .map(|i| i.instance_guid)
        })
        .collect();
    assert_eq!(survivors, vec!["ig-r1".to_string()]);
}

#[tokio::test]
async fn stop_auction_prunes_extra_copies_on_the_winner() {
    // rep-a runs two copies of (pg, 0), rep-b one. rep-b wins on the
    // co-location term and keeps its single copy; both of rep-a's go.
    let rep_a = standard_rep("rep-a");
    rep_a.set_simulated_instances(vec![
        copy_of("pg", "ig-a1", 0),
        copy_of("pg", "ig-a2", 0),
    ]);
    let rep_b = standard_rep("rep-b");
    rep_b.set_simulated_instances(vec![copy_of("pg", "ig-b1", 0)]);

    let (client, universe, runner) = runner_over(vec![rep_a, rep_b]);

    let result = runner
        .run_stop_auction(
            &universe,
            &StopAuctionRequest {
                process_guid: "pg".into(),
                index: 0,
            },
        )
        .await;

    assert_eq!(result.winner.as_deref(), Some("rep-b"));
    assert!(client.rep("rep-a").unwrap().simulated_instances().is_empty());

    let survivors = client.rep("rep-b").unwrap().simulated_instances();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].instance_guid, "ig-b1");
}

#[tokio::test]
async fn stop_auctions_leave_at_most_one_copy_per_index() {
    // A messy fleet: several indices with several redundant copies each.
    let reps: Vec<Arc<AuctionRep>> = (0..4)
        .map(|i| standard_rep(&format!("rep-{i}")))
        .collect();
    for (r, rep) in reps.iter().enumerate() {
        let mut instances = Vec::new();
        for index in 0..3u32 {
            instances.push(copy_of("pg", &format!("ig-{r}-{index}"), index));
        }
        rep.set_simulated_instances(instances);
    }

    let (client, universe, runner) = runner_over(reps);

    let requests: Vec<StopAuctionRequest> = (0..3u32)
        .map(|index| StopAuctionRequest {
            process_guid: "pg".into(),
            index,
        })
        .collect();
    let results = runner.run_stop_auctions(&universe, requests).await;
    assert_eq!(results.len(), 3);

    for index in 0..3u32 {
        let copies: usize = universe
            .iter()
            .map(|guid| {
                client
                    .rep(guid)
                    .unwrap()
                    .simulated_instances()
                    .iter()
                    .filter(|i| i.process_guid == "pg" && i.index == index)
                    .count()
            })
            .sum();
        assert_eq!(copies, 1, "index {index} reconciled to one copy");
    }
}

#[tokio::test]
async fn stop_auction_with_nothing_running_is_a_clean_no_op() {
    let (_client, universe, runner) = runner_over(vec![standard_rep("rep-a")]);

    let result = runner
        .run_stop_auction(
            &universe,
            &StopAuctionRequest {
                process_guid: "pg-unknown".into(),
                index: 0,
            },
        )
        .await;

    assert_eq!(result.winner, None);
    assert!(result.error.is_none());
}

// ── Pool sampling against the live client ──────────────────────

#[tokio::test]
async fn fractional_pool_still_places_somewhere() {
    let reps: Vec<Arc<AuctionRep>> = (0..10)
        .map(|i| standard_rep(&format!("rep-{i}")))
        .collect();
    let client = Arc::new(InProcessClient::new(reps, PoolTuning::default()));
    let universe = client.rep_guids();
    let runner = AuctionRunner::new(
        client.clone(),
        AuctionRules::default().with_max_bidding_pool_fraction(0.2),
    )
    .with_seed(11);

    let result = runner
        .run_start_auction(&universe, &start_request("pg", "ig-1", 10, 1))
        .await;

    assert!(result.succeeded());
    // Only the sampled reps were contacted in round one: 2 bids + reserve + run.
    assert_eq!(result.num_communications, 4);
}

// ── Direct client surface ──────────────────────────────────────

#[tokio::test]
async fn released_reservation_restores_the_ledger() {
    let rep = standard_rep("rep-a");
    let client = InProcessClient::new(vec![rep.clone()], PoolTuning::default());
    let req = start_request("pg", "ig-1", 40, 10);

    let before = rep.remaining_resources().unwrap();
    client
        .rebid_then_reserve("rep-a", &req, Algorithm::CoLocationCount)
        .await
        .unwrap();
    assert_ne!(rep.remaining_resources().unwrap(), before);

    client.release_reservation("rep-a", &req).await.unwrap();
    assert_eq!(rep.remaining_resources().unwrap(), before);
}
