//! No two live reservations of a property ever overlap, whatever the
//! interleaving of requests.

#![allow(clippy::unwrap_used)]

use estate_core::availability::StayDates;
use estate_core::inputs::{ChangeStatusInput, UpdateReservationInput};
use estate_core::types::{Reservation, ReservationStatus};
use estate_core::{Actor, DomainError};
use estate_testing::properties::{dates_from, stay_offsets};
use estate_testing::{TestWorld, june};
use proptest::prelude::*;

fn assert_no_live_overlap(reservations: &[Reservation]) {
    let live: Vec<&Reservation> = reservations.iter().filter(|r| r.is_live()).collect();
    for (i, a) in live.iter().enumerate() {
        for b in &live[i + 1..] {
            if a.property_id == b.property_id {
                assert!(
                    !StayDates::from(*a).overlaps(&StayDates::from(*b)),
                    "{}..{} overlaps {}..{}",
                    a.check_in,
                    a.check_out,
                    b.check_in,
                    b.check_out
                );
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_creations_one_wins() {
    let world = TestWorld::new().await;

    let first = {
        let world = world.clone();
        tokio::spawn(async move {
            world
                .reservations
                .create(&world.guest, world.booking(june(10), june(15)))
                .await
        })
    };
    let second = {
        let world = world.clone();
        tokio::spawn(async move {
            world
                .reservations
                .create(&world.other_guest, world.booking(june(12), june(18)))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(DomainError::Unavailable)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_no_live_overlap(&world.store.all_reservations().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_identical_requests_book_once() {
    let world = TestWorld::new().await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let world = world.clone();
        handles.push(tokio::spawn(async move {
            let actor = if i % 2 == 0 { world.guest } else { world.other_guest };
            world
                .reservations
                .create(&actor, world.booking(june(1), june(8)))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[derive(Debug, Clone)]
enum Step {
    Create { guest: usize, offsets: (i64, i64) },
    Move { target: usize, offsets: (i64, i64) },
    Cancel { target: usize },
    Confirm { target: usize },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0..2usize, stay_offsets(30, 6)).prop_map(|(guest, offsets)| Step::Create { guest, offsets }),
        2 => (0..8usize, stay_offsets(30, 6)).prop_map(|(target, offsets)| Step::Move { target, offsets }),
        1 => (0..8usize).prop_map(|target| Step::Cancel { target }),
        1 => (0..8usize).prop_map(|target| Step::Confirm { target }),
    ]
}

async fn run_steps(steps: Vec<Step>) {
    let world = TestWorld::new().await;
    let guests: [Actor; 2] = [world.guest, world.other_guest];
    let mut booked: Vec<(Actor, Reservation)> = Vec::new();

    for step in steps {
        match step {
            Step::Create { guest, offsets } => {
                let (check_in, check_out) = dates_from(june(1), offsets);
                if let Ok(r) = world
                    .reservations
                    .create(&guests[guest], world.booking(check_in, check_out))
                    .await
                {
                    booked.push((guests[guest], r));
                }
            }
            Step::Move { target, offsets } => {
                if let Some((actor, r)) = booked.get(target) {
                    let (check_in, check_out) = dates_from(june(1), offsets);
                    let _ = world
                        .reservations
                        .update(
                            actor,
                            r.id,
                            UpdateReservationInput {
                                check_in_date: check_in,
                                check_out_date: check_out,
                                guests: None,
                                special_requests: None,
                            },
                        )
                        .await;
                }
            }
            Step::Cancel { target } => {
                if let Some((actor, r)) = booked.get(target) {
                    let _ = world.reservations.cancel(actor, r.id).await;
                }
            }
            Step::Confirm { target } => {
                if let Some((_, r)) = booked.get(target) {
                    let _ = world
                        .reservations
                        .change_status(
                            &world.owner,
                            r.id,
                            ChangeStatusInput {
                                status: ReservationStatus::Confirmed,
                            },
                        )
                        .await;
                }
            }
        }
        assert_no_live_overlap(&world.store.all_reservations().await);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_sequences_never_double_book(steps in prop::collection::vec(step(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(run_steps(steps));
    }
}
