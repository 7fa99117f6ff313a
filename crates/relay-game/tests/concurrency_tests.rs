//! Commands racing each other on a multi-threaded runtime.

mod common;

use chrono::TimeDelta;
use common::{HarnessBuilder, choose_cmd, register_cmd, start_cmd, submit_cmd};
use relay_core::error::RelayError;
use relay_game::application::outcomes::{Registration, Submission};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_choice_racing_expiry_records_exactly_one_hop() {
    for _ in 0..32 {
        // Arrange
        let h = HarnessBuilder::new().build();
        h.register_all(&[1, 2, 3]).await;
        h.service.start(&start_cmd(1)).await.unwrap();
        let Submission::Offered { .. } = h.service.submit(&submit_cmd(1, 1)).await.unwrap() else {
            panic!("two receivers are waiting");
        };
        h.clock.advance(TimeDelta::hours(12) + TimeDelta::seconds(1));

        // Act
        let chooser = {
            let service = h.service.clone();
            tokio::spawn(async move { service.choose(&choose_cmd(1, 2)).await })
        };
        let expirer = {
            let service = h.service.clone();
            tokio::spawn(async move { service.expire_overdue_turn().await })
        };
        let chosen = chooser.await.unwrap();
        let expired = expirer.await.unwrap().unwrap();

        // Assert: whichever ran second saw the other's transition.
        assert!(chosen.is_ok() != expired.is_some());
        let state = h.service.snapshot().await;
        state.check_invariants().unwrap();
        assert_eq!(h.ledger.hops().len(), 1);
        assert_eq!(h.ledger.hops(), state.chain());
        assert!(state.pending().is_none());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_choices_pass_the_artifact_once() {
    for _ in 0..32 {
        // Arrange
        let h = HarnessBuilder::new().build();
        h.register_all(&[1, 2, 3]).await;
        h.service.start(&start_cmd(1)).await.unwrap();
        h.service.submit(&submit_cmd(1, 1)).await.unwrap();

        // Act
        let handles: Vec<_> = [2, 3]
            .into_iter()
            .map(|receiver| {
                let service = h.service.clone();
                tokio::spawn(async move { service.choose(&choose_cmd(1, receiver)).await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        // Assert
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let state = h.service.snapshot().await;
        state.check_invariants().unwrap();
        assert_eq!(h.ledger.hops().len(), 1);
        assert_eq!(h.ledger.hops(), state.chain());
        let winner = h.ledger.hops()[0].receiver.id;
        assert_eq!(state.holder().map(|p| p.id), Some(winner));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_registrations_join_once() {
    // Arrange
    let h = HarnessBuilder::new().build();

    // Act
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move { service.register(&register_cmd(7)).await })
        })
        .collect();
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    // Assert
    let joined = results
        .iter()
        .filter(|r| matches!(r, Ok(Registration::Joined)))
        .count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(RelayError::AlreadyWaiting(_))))
        .count();
    assert_eq!(joined, 1);
    assert_eq!(rejected, 15);
    assert_eq!(h.service.snapshot().await.participants().count(), 1);
}
