//! Property tests for pool acquisition semantics.
//!
//! Random sequences of acquire and release calls are applied both to a
//! `ResourcePool` and to a plain ownership vector; the two must agree after
//! every step.

use std::sync::Arc;

use carafe_core::{AgentId, NoopSink, ResourceId};
use carafe_pool::ResourcePool;
use proptest::prelude::*;

const AGENTS: usize = 5;
const RESOURCES: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Acquire(usize, Vec<usize>),
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..AGENTS, prop::collection::vec(0..RESOURCES, 0..4))
            .prop_map(|(agent, resources)| Op::Acquire(agent, resources)),
        1 => (0..AGENTS).prop_map(Op::Release),
    ]
}

fn ids(resources: &[usize]) -> Vec<ResourceId> {
    resources.iter().copied().map(ResourceId::new).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn pool_matches_all_or_nothing_model(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let pool = ResourcePool::new(RESOURCES, Arc::new(NoopSink));
        let mut model: Vec<Option<AgentId>> = vec![None; RESOURCES];

        for op in ops {
            match op {
                Op::Acquire(agent, resources) => {
                    let agent = AgentId::new(agent);
                    let before = pool.snapshot();
                    let available = resources
                        .iter()
                        .all(|&r| model[r].is_none() || model[r] == Some(agent));

                    let granted = pool.try_acquire(agent, &ids(&resources)).unwrap();
                    prop_assert_eq!(granted, available);

                    if granted {
                        for &r in &resources {
                            model[r] = Some(agent);
                        }
                    } else {
                        prop_assert_eq!(pool.snapshot(), before);
                    }
                }
                Op::Release(agent) => {
                    let agent = AgentId::new(agent);
                    let expected = model.iter().filter(|owner| **owner == Some(agent)).count();
                    for owner in &mut model {
                        if *owner == Some(agent) {
                            *owner = None;
                        }
                    }

                    prop_assert_eq!(pool.release(agent), expected);
                    prop_assert!(pool.held_by(agent).is_empty());
                }
            }
            prop_assert_eq!(&pool.snapshot().owners, &model);
        }
    }

    #[test]
    fn granted_request_is_fully_owned(
        held in prop::collection::vec(0..RESOURCES, 0..3),
        request in prop::collection::vec(0..RESOURCES, 1..4),
    ) {
        let pool = ResourcePool::new(RESOURCES, Arc::new(NoopSink));
        let other = AgentId::new(0);
        let agent = AgentId::new(1);
        pool.try_acquire(other, &ids(&held)).unwrap();

        if pool.try_acquire(agent, &ids(&request)).unwrap() {
            for r in ids(&request) {
                prop_assert_eq!(pool.owner_of(r), Some(Some(agent)));
            }
        } else {
            prop_assert!(pool.held_by(agent).is_empty());
            prop_assert!(request.iter().any(|r| held.contains(r)));
        }
    }

    #[test]
    fn reacquire_after_grant_always_succeeds(request in prop::collection::vec(0..RESOURCES, 1..4)) {
        let pool = ResourcePool::new(RESOURCES, Arc::new(NoopSink));
        let agent = AgentId::new(2);
        prop_assert!(pool.try_acquire(agent, &ids(&request)).unwrap());
        let owners = pool.snapshot().owners;

        prop_assert!(pool.try_acquire(agent, &ids(&request)).unwrap());
        prop_assert_eq!(pool.snapshot().owners, owners);
    }
}
