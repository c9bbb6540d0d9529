//! Unit tests for des-resource.

use des_core::{EventId, ProcessId, RequestId, ResourceId};

use crate::{Admission, Request, Resource, ResourcePool};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn req(n: u64) -> Request {
    Request {
        id:       RequestId(n),
        resource: ResourceId(0),
        owner:    ProcessId(n as u32),
        event:    EventId(100 + n),
    }
}

fn resource(capacity: usize) -> Resource {
    Resource::new(ResourceId(0), capacity).unwrap()
}

// ── Resource ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod resource {
    use des_core::DesError;

    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = Resource::new(ResourceId(0), 0).unwrap_err();
        assert_eq!(err, DesError::InvalidCapacity(0));
    }

    #[test]
    fn grants_until_full_then_queues() {
        // Capacity 2, five requests at the same instant.
        let mut r = resource(2);
        let admissions: Vec<Admission> = (0..5).map(|n| r.request(req(n))).collect();
        assert_eq!(
            admissions,
            vec![
                Admission::Granted,
                Admission::Granted,
                Admission::Queued { position: 0 },
                Admission::Queued { position: 1 },
                Admission::Queued { position: 2 },
            ]
        );
        assert_eq!(r.in_use(), 2);
        assert_eq!(r.queue_len(), 3);
        assert_eq!(r.available(), 0);
    }

    #[test]
    fn release_promotes_head_of_queue() {
        let mut r = resource(2);
        for n in 0..5 {
            r.request(req(n));
        }
        let promoted = r.release(RequestId(1)).unwrap();
        assert_eq!(promoted, vec![req(2)]);
        assert!(r.is_granted(RequestId(2)));
        assert_eq!(r.in_use(), 2);
        assert_eq!(r.queue_len(), 2);

        let promoted = r.release(RequestId(0)).unwrap();
        assert_eq!(promoted, vec![req(3)]);
    }

    #[test]
    fn release_without_waiters_frees_slot() {
        let mut r = resource(1);
        r.request(req(0));
        assert!(r.release(RequestId(0)).unwrap().is_empty());
        assert_eq!(r.in_use(), 0);
        assert_eq!(r.available(), 1);
    }

    #[test]
    fn release_of_unknown_request_leaves_state_unchanged() {
        let mut r = resource(1);
        r.request(req(0));
        r.request(req(1));

        let err = r.release(RequestId(7)).unwrap_err();
        assert_eq!(err, DesError::InvalidRelease { resource: ResourceId(0), request: RequestId(7) });
        assert_eq!(r.in_use(), 1);
        assert_eq!(r.queue_len(), 1);
        assert!(r.is_granted(RequestId(0)));
    }

    #[test]
    fn release_of_queued_request_is_invalid() {
        let mut r = resource(1);
        r.request(req(0));
        r.request(req(1));
        assert!(r.release(RequestId(1)).is_err());
        assert!(r.is_queued(RequestId(1)));
    }

    #[test]
    fn double_release_is_invalid() {
        let mut r = resource(1);
        r.request(req(0));
        r.release(RequestId(0)).unwrap();
        assert!(r.release(RequestId(0)).is_err());
    }

    #[test]
    fn withdraw_removes_waiting_request() {
        let mut r = resource(1);
        for n in 0..3 {
            r.request(req(n));
        }
        assert_eq!(r.withdraw(RequestId(1)).unwrap(), req(1));
        let order: Vec<RequestId> = r.waiting().map(|q| q.id).collect();
        assert_eq!(order, vec![RequestId(2)]);

        // Withdrawn request is skipped on promotion.
        assert_eq!(r.release(RequestId(0)).unwrap(), vec![req(2)]);
    }

    #[test]
    fn withdraw_of_granted_request_fails() {
        let mut r = resource(1);
        r.request(req(0));
        assert!(matches!(r.withdraw(RequestId(0)), Err(DesError::NotQueued { .. })));
        assert!(r.is_granted(RequestId(0)));
    }

    #[test]
    fn same_owner_requests_are_independent() {
        let mut r = resource(2);
        let mut a = req(0);
        let mut b = req(1);
        a.owner = ProcessId(9);
        b.owner = ProcessId(9);
        r.request(a);
        r.request(b);
        assert_eq!(r.in_use(), 2);
        assert_eq!(r.granted_to(ProcessId(9)).count(), 2);
    }

    #[test]
    fn owner_lookups() {
        let mut r = resource(1);
        r.request(req(0));
        r.request(req(1));
        assert_eq!(r.granted_to(ProcessId(0)).count(), 1);
        assert_eq!(r.queued_for(ProcessId(1)).count(), 1);
        assert_eq!(r.queued_for(ProcessId(0)).count(), 0);
    }

    #[test]
    fn total_grants_counts_promotions() {
        let mut r = resource(1);
        r.request(req(0));
        r.request(req(1));
        r.release(RequestId(0)).unwrap();
        assert_eq!(r.total_grants(), 2);
    }
}

// ── ResourcePool ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod pool {
    use des_core::DesError;

    use super::*;

    #[test]
    fn ids_follow_creation_order() {
        let mut pool = ResourcePool::new();
        assert_eq!(pool.add(1).unwrap(), ResourceId(0));
        assert_eq!(pool.add(3).unwrap(), ResourceId(1));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(ResourceId(1)).unwrap().capacity(), 3);
    }

    #[test]
    fn unknown_resource() {
        let pool = ResourcePool::new();
        assert_eq!(
            pool.get(ResourceId(4)).unwrap_err(),
            DesError::UnknownResource(ResourceId(4))
        );
    }

    #[test]
    fn zero_capacity_is_not_added() {
        let mut pool = ResourcePool::new();
        assert!(pool.add(0).is_err());
        assert!(pool.is_empty());
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Under any interleaving of requests and releases, capacity is never
        /// exceeded and grants happen in arrival order.
        #[test]
        fn capacity_and_fifo_hold(
            capacity in 1usize..5,
            ops in proptest::collection::vec(any::<bool>(), 1..200),
        ) {
            let mut r = resource(capacity);
            let mut next = 0u64;
            let mut grant_order = Vec::new();

            for is_request in ops {
                if is_request {
                    if r.request(req(next)) == Admission::Granted {
                        grant_order.push(next);
                    }
                    next += 1;
                } else if let Some(oldest) = r.users().first().map(|u| u.id) {
                    for promoted in r.release(oldest).unwrap() {
                        grant_order.push(promoted.id.0);
                    }
                }
                prop_assert!(r.in_use() <= r.capacity());
                prop_assert!(r.queue_len() == 0 || r.in_use() == r.capacity());
            }

            let mut sorted = grant_order.clone();
            sorted.sort_unstable();
            prop_assert_eq!(grant_order, sorted);
        }
    }
}
