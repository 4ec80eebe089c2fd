//! Background jobs.

use estate_core::services::ReservationService;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically mark confirmed stays whose check-out has passed as
/// `completed`, until `shutdown` flips to `true` or its sender is dropped.
///
/// The first sweep runs immediately.
pub fn spawn_completion_sweep(
    reservations: ReservationService,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = reservations.complete_past_stays().await {
                        tracing::warn!(%error, "Completion sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Completion sweep stopped");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use estate_core::store::ReservationStore;
    use estate_core::types::ReservationStatus;
    use estate_testing::helpers::reservation;
    use estate_testing::{TestWorld, june};

    #[tokio::test]
    async fn test_sweep_completes_elapsed_stays_and_stops() {
        let world = TestWorld::new().await;
        let guest = world.guest.user_id;
        world.clock.set(june(20).and_hms_opt(12, 0, 0).unwrap().and_utc());

        let past = reservation(&world.property, guest, june(1), june(4), ReservationStatus::Confirmed);
        let future = reservation(&world.property, guest, june(25), june(28), ReservationStatus::Confirmed);
        world.store.insert_if_available(&past).await.unwrap();
        world.store.insert_if_available(&future).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_completion_sweep(
            world.reservations.clone(),
            Duration::from_secs(3600),
            shutdown_rx,
        );

        // The first tick fires immediately
        let mut attempts = 0;
        while ReservationStore::get(&*world.store, past.id).await.unwrap().status
            != ReservationStatus::Completed
        {
            attempts += 1;
            assert!(attempts < 100, "sweep never ran");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(
            ReservationStore::get(&*world.store, future.id).await.unwrap().status,
            ReservationStatus::Confirmed
        );

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
