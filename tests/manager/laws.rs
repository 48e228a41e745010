//! The invariants the state machine promises.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::support::*;
use sqltx::{
    Delay, Error, ExponentialJitter, NoBackoff, Operation, RetryPolicy, Sleeper,
    TransactionManager,
};

fn transient_failures(n: usize) -> VecDeque<Result<u64, Error>> {
    (0..n).map(|i| Err(deadlock_numbered(i))).collect()
}

fn deadlock_numbered(i: usize) -> Error {
    Error::from(
        sqltx::DbError::new(format!("deadlock #{i}")).with_sql_state("40001"),
    )
}

#[tokio::test]
async fn budget_law_bounds_begin_invocations() {
    for max_retries in 0..4usize {
        let conn = MockConn {
            execute_script: transient_failures(max_retries + 1),
            ..MockConn::default()
        };
        let log = conn.log();

        let mut manager = TransactionManager::builder(conn)
            .default_policy(RetryPolicy::new(max_retries, Arc::new(NoBackoff)))
            .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
            .build();

        let _ = manager
            .run(vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>])
            .await
            .unwrap_err();

        let calls = log.lock().unwrap();
        assert_eq!(
            count(&calls, is_begin),
            max_retries + 1,
            "max_retries = {max_retries}"
        );
    }
}

#[tokio::test]
async fn budget_law_grants_one_extra_begin_for_the_free_reconnect() {
    let max_retries = 2usize;
    let conn = MockConn {
        begin_script: VecDeque::from([Err(gone_away())]),
        execute_script: transient_failures(max_retries + 1),
        ..MockConn::default()
    };
    let log = conn.log();

    let mut manager = TransactionManager::builder(conn)
        .default_policy(RetryPolicy::new(max_retries, Arc::new(NoBackoff)))
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .build();

    let _ = manager
        .run(vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>])
        .await
        .unwrap_err();

    let calls = log.lock().unwrap();
    assert_eq!(count(&calls, is_begin), max_retries + 1 + 1);
}

#[tokio::test]
async fn sleep_law_pairs_each_retry_with_its_attempt_index() {
    let conn = MockConn {
        execute_script: transient_failures(4),
        ..MockConn::default()
    };
    let sleeper = RecordingSleeper::handle();

    let backoff = Arc::new(ExponentialJitter::new(100, 5_000, 2.0, 0).unwrap());
    let mut manager = TransactionManager::builder(conn)
        .default_policy(RetryPolicy::new(3, backoff))
        .sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>)
        .build();

    let _ = manager
        .run(vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>])
        .await
        .unwrap_err();

    // Attempts 0..3 retried and slept; the final attempt only raised.
    assert_eq!(
        sleeper.slept(),
        vec![
            Delay::from_millis(100),
            Delay::from_millis(200),
            Delay::from_millis(400),
        ]
    );
}

#[tokio::test]
async fn plan_once_law_eager_builds_once_deferred_builds_per_attempt() {
    let conn = MockConn {
        execute_script: VecDeque::from([
            Err(deadlock_numbered(0)),
            Ok(1),
            Err(deadlock_numbered(1)),
        ]),
        ..MockConn::default()
    };
    let version = conn.version_handle();

    let eager = Statement::new("INSERT INTO t VALUES (1)", true);
    let eager_builds = eager.build_count();
    let deferred = VersionedUpdate::new(version);
    let deferred_builds = deferred.build_count();

    let mut manager = TransactionManager::builder(conn)
        .default_policy(RetryPolicy::new(2, Arc::new(NoBackoff)))
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .build();

    // Attempt 0 fails on the eager step; attempt 1 survives it and fails
    // on the deferred step's execute; attempt 2 commits.
    let result = manager
        .run(vec![
            Arc::new(eager) as Arc<dyn Operation>,
            Arc::new(deferred) as Arc<dyn Operation>,
        ])
        .await
        .unwrap();
    assert_eq!(result.affected_rows(), 2);

    assert_eq!(eager_builds.load(Ordering::SeqCst), 1);
    // The deferred step was reached on attempts 1 and 2 only (attempt 0
    // died on the eager step before it).
    assert_eq!(deferred_builds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn deferred_steps_observe_io_from_the_current_attempt() {
    let conn = MockConn {
        commit_script: VecDeque::from([Err(deadlock_numbered(0))]),
        ..MockConn::default()
    };
    let log = conn.log();
    let version = conn.version_handle();

    let deferred = VersionedUpdate::new(version);
    let mut manager = TransactionManager::builder(conn)
        .default_policy(RetryPolicy::new(1, Arc::new(NoBackoff)))
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .build();

    let result = manager
        .run(vec![
            Arc::new(Statement::new("INSERT INTO t VALUES (1)", true)) as Arc<dyn Operation>,
            Arc::new(deferred) as Arc<dyn Operation>,
        ])
        .await
        .unwrap();
    assert_eq!(result.affected_rows(), 2);

    let calls = log.lock().unwrap();
    let sql = executed_sql(&calls);
    // Attempt 1: the deferred build ran after one execute. Attempt 2: after
    // three (two from the failed attempt, one from this one).
    assert_eq!(
        sql,
        vec![
            "INSERT INTO t VALUES (1)".to_owned(),
            "UPDATE agg SET total = 1".to_owned(),
            "INSERT INTO t VALUES (1)".to_owned(),
            "UPDATE agg SET total = 3".to_owned(),
        ]
    );
}

#[tokio::test]
async fn rollback_failures_never_change_the_outcome() {
    // Identical runs except one's rollback also fails; both succeed on the
    // second attempt with the same result.
    for rollback_fails in [false, true] {
        let conn = MockConn {
            execute_script: VecDeque::from([Err(deadlock_numbered(0))]),
            rollback_script: if rollback_fails {
                VecDeque::from([Err(Error::from(sqltx::DbError::new("rollback refused")))])
            } else {
                VecDeque::new()
            },
            ..MockConn::default()
        };

        let mut manager = TransactionManager::builder(conn)
            .default_policy(RetryPolicy::new(1, Arc::new(NoBackoff)))
            .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
            .build();

        let result = manager
            .run(vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>])
            .await
            .unwrap();
        assert_eq!(result.affected_rows(), 1, "rollback_fails = {rollback_fails}");
    }
}

#[tokio::test]
async fn row_accounting_ignores_failed_attempts() {
    let conn = MockConn {
        execute_script: VecDeque::from([Ok(2), Err(deadlock_numbered(0)), Ok(2), Ok(3)]),
        ..MockConn::default()
    };

    let mut manager = TransactionManager::builder(conn)
        .default_policy(RetryPolicy::new(1, Arc::new(NoBackoff)))
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .build();

    let result = manager
        .run(vec![
            Arc::new(Statement::new("UPDATE a SET x = 1", true)) as Arc<dyn Operation>,
            Arc::new(Statement::new("UPDATE b SET y = 2", true)) as Arc<dyn Operation>,
        ])
        .await
        .unwrap();

    // The failed attempt's 2 rows are discarded; only 2 + 3 count.
    assert_eq!(result.affected_rows(), 5);
}

#[tokio::test]
async fn per_run_policy_overrides_the_manager_default() {
    let conn = MockConn {
        execute_script: transient_failures(1),
        ..MockConn::default()
    };
    let log = conn.log();

    // Manager default would give up immediately.
    let mut manager = TransactionManager::builder(conn)
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .build();

    let result = manager
        .run_with(
            vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>],
            sqltx::TxOptions::new().with_retry_policy(RetryPolicy::new(1, Arc::new(NoBackoff))),
        )
        .await
        .unwrap();

    assert_eq!(result.affected_rows(), 1);
    assert_eq!(count(&log.lock().unwrap(), is_begin), 2);
}

#[tokio::test]
async fn eager_build_failures_surface_before_any_begin() {
    struct Broken;

    impl Operation for Broken {
        fn build(&self) -> Result<sqltx::Query, Error> {
            Err(Error::from(sqltx::DbError::new("cannot render statement")))
        }

        fn is_idempotent(&self) -> bool {
            true
        }
    }

    let conn = MockConn::default();
    let log = conn.log();

    let mut manager = TransactionManager::new(conn);
    let error = manager
        .run(vec![Arc::new(Broken) as Arc<dyn Operation>])
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "cannot render statement");
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn event_hooks_observe_the_run() {
    let retries = Arc::new(AtomicUsize::new(0));
    let successes = Arc::new(AtomicUsize::new(0));
    let retries_hook = Arc::clone(&retries);
    let successes_hook = Arc::clone(&successes);

    let conn = MockConn {
        execute_script: transient_failures(2),
        ..MockConn::default()
    };

    let mut manager = TransactionManager::builder(conn)
        .name("laws")
        .default_policy(RetryPolicy::new(2, Arc::new(NoBackoff)))
        .sleeper(RecordingSleeper::handle() as Arc<dyn Sleeper>)
        .on_retry(move |_attempt, _delay| {
            retries_hook.fetch_add(1, Ordering::SeqCst);
        })
        .on_success(move |attempts, rows| {
            assert_eq!(attempts, 3);
            assert_eq!(rows, 1);
            successes_hook.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let result = manager
        .run(vec![Arc::new(Statement::new("UPDATE t SET x = 1", true)) as Arc<dyn Operation>])
        .await
        .unwrap();

    assert_eq!(result.affected_rows(), 1);
    assert_eq!(retries.load(Ordering::SeqCst), 2);
    assert_eq!(successes.load(Ordering::SeqCst), 1);
}
