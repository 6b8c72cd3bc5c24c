//! Whole-run tests for `carafe_agent`.
//!
//! Runs use tokio's paused clock, so fifteen simulated seconds take
//! milliseconds and the event stream can be replayed exactly.

use core::time::Duration;
use std::collections::BTreeSet;
use std::sync::Arc;

use carafe_agent::{
    AgentStatsSnapshot, DelayRange, Pacing, Simulation, SimulationConfig, SimulationReport,
};
use carafe_core::{
    AgentId, AgentState, ChannelSink, Event, OwnershipSnapshot, RecordingSink, ResourceId,
};

fn seeded(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

fn parse_needs(message: &str) -> Option<BTreeSet<ResourceId>> {
    let list = message.strip_prefix("Needs resources: ")?;
    Some(
        list.split(", ")
            .filter(|item| !item.is_empty())
            .map(|item| ResourceId::new(item.parse().unwrap()))
            .collect(),
    )
}

async fn record_run(config: &SimulationConfig) -> (SimulationReport, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let simulation = Simulation::new(config, sink.clone()).unwrap();
    let report = simulation.run_for(config.duration()).await;
    (report, sink)
}

/// Test that every snapshot shows each agent holding all of its chosen
/// resources or none of them.
#[tokio::test(start_paused = true)]
async fn holdings_always_match_whole_requests() {
    let config = seeded(17);
    let (report, sink) = record_run(&config).await;
    let topology = config.validate().unwrap();

    let mut needs = vec![BTreeSet::new(); config.agents];
    let mut snapshots = 0;
    for timed in sink.events() {
        match timed.event {
            Event::Transition { agent, message, .. } => {
                if let Some(wanted) = parse_needs(&message) {
                    needs[agent.index()] = wanted;
                }
            }
            Event::PoolSnapshot(snapshot) => {
                snapshots += 1;
                for (index, wanted) in needs.iter().enumerate() {
                    let agent = AgentId::new(index);
                    let held: BTreeSet<ResourceId> = snapshot.held_by(agent).into_iter().collect();
                    assert!(
                        held.is_empty() || held == *wanted,
                        "{agent} holds {held:?} but wanted {wanted:?} in {snapshot}"
                    );
                    assert!(held.iter().all(|r| topology.is_adjacent(agent, *r)));
                }
            }
        }
    }

    assert!(snapshots > 0);
    assert_eq!(report.final_snapshot.sequence, snapshots);
    assert!(report.failures.is_empty());
}

/// Test that each agent walks its cycle in order.
#[tokio::test(start_paused = true)]
async fn agents_follow_the_cycle() {
    let config = seeded(3);
    let (report, sink) = record_run(&config).await;

    for index in 0..config.agents {
        let agent = AgentId::new(index);
        let transitions = sink.transitions_of(agent);
        assert!(!transitions.is_empty());

        let mut previous = AgentState::Idle;
        for (state, message) in &transitions {
            assert!(
                *state == previous || *state == previous.next(),
                "{agent} jumped from {previous} to {state} at {message:?}"
            );
            previous = *state;
        }

        let acquired = transitions
            .iter()
            .filter(|(_, message)| message == "Acquired resources")
            .count() as u64;
        let released = transitions
            .iter()
            .filter(|(_, message)| message == "Released resources")
            .count() as u64;
        let stats = report.stats[index];
        assert_eq!(stats.agent, agent);
        assert_eq!(stats.cycles, released);
        assert!(acquired == released || acquired == released + 1);
    }

    assert!(report.total_cycles() >= config.agents as u64);
}

/// Test that the first choice of each agent depends only on the seed.
#[tokio::test(start_paused = true)]
async fn same_seed_same_first_requests() {
    let first_needs = |sink: &RecordingSink| -> Vec<String> {
        (0..5)
            .map(|index| {
                sink.transitions_of(AgentId::new(index))
                    .into_iter()
                    .map(|(_, message)| message)
                    .find(|message| message.starts_with("Needs resources: "))
                    .unwrap()
            })
            .collect()
    };

    let config = SimulationConfig {
        duration_secs: 2,
        ..seeded(99)
    };
    let (_, first) = record_run(&config).await;
    let (_, second) = record_run(&config).await;

    assert_eq!(first_needs(&first), first_needs(&second));
}

/// Test that a ring run delivers its events over a channel.
#[tokio::test(start_paused = true)]
async fn channel_sink_receives_the_stream() {
    let config = SimulationConfig {
        duration_secs: 5,
        seed: Some(5),
        pacing: Pacing {
            think: DelayRange::new(10, 50),
            drink: DelayRange::new(10, 50),
            backoff: DelayRange::new(1, 5),
            max_request: 2,
        },
        ..SimulationConfig::ring(6).unwrap()
    };
    let (sink, mut receiver) = ChannelSink::new();
    let simulation = Simulation::new(&config, Arc::new(sink)).unwrap();
    assert_eq!(simulation.agent_count(), 6);

    let report = simulation.run_for(config.duration()).await;

    let mut last_at = Duration::ZERO;
    let mut snapshots: Vec<OwnershipSnapshot> = Vec::new();
    while let Ok(timed) = receiver.try_recv() {
        assert!(timed.at >= last_at);
        last_at = timed.at;
        if let Event::PoolSnapshot(snapshot) = timed.event {
            snapshots.push(snapshot);
        }
    }

    assert!(last_at <= config.duration() + Duration::from_millis(10));
    assert_eq!(snapshots.len() as u64, report.final_snapshot.sequence);
    assert!(report.total_cycles() > 6 * 10);
}

/// Test the report helpers.
#[test]
fn report_summarises_stats() {
    let report = SimulationReport {
        final_snapshot: OwnershipSnapshot::new(4, vec![None, None]),
        stats: vec![
            AgentStatsSnapshot {
                agent: AgentId::new(0),
                cycles: 3,
                failed_attempts: 1,
            },
            AgentStatsSnapshot {
                agent: AgentId::new(1),
                cycles: 0,
                failed_attempts: 12,
            },
        ],
        failures: Vec::new(),
    };

    assert_eq!(report.total_cycles(), 3);
    assert_eq!(report.starved(), vec![AgentId::new(1)]);
}

/// Test that an invalid configuration is refused up front.
#[test]
fn invalid_config_is_rejected() {
    let config = SimulationConfig {
        resources: 2,
        ..SimulationConfig::default()
    };
    let error = Simulation::new(&config, Arc::new(RecordingSink::new())).unwrap_err();
    assert!(error.to_string().starts_with("invalid topology: "));
}
