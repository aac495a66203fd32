mod common;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use member_tx::core::domain::command::CommandError;
use member_tx::core::domain::entity::member::{Member, MemberRepository};
use member_tx::core::domain::execution::{ExecutionContext, ExecutionMode};
use member_tx::core::domain::transaction::{ConnectionError, TransactionError};
use member_tx::core::domain::transaction_manager::{TransactionManager, TransactionManagerError};
use member_tx::core::domain::transaction_operation::{
    BoxedTransactionOperation, TransactionOperationError,
};

use common::setup;

/// Moves `amount` from one member to another; a target of "ex" fails the
/// business rule after the withdrawal has already been written.
async fn transfer(
    repository: &dyn MemberRepository,
    ctx: &ExecutionContext,
    from: &str,
    to: &str,
    amount: i64,
) -> Result<(), CommandError> {
    repository.update_by(ctx, from, -amount).await?;
    if to == "ex" {
        return Err(CommandError::ValidationError {
            details: "transfer to ex is not allowed".to_string(),
        });
    }
    repository.update_by(ctx, to, amount).await?;
    Ok(())
}

fn explode() {
    panic!("business logic panicked");
}

#[tokio::test]
async fn test_reads_see_own_uncommitted_writes() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let repository = app.repository();

    let found = app
        .manager()
        .run_transactional(&ExecutionContext::new(), |ctx| async move {
            repository.save(&ctx, Member::new("memberA", 10_000)).await?;
            repository.update(&ctx, "memberA", 7_000).await?;
            repository.find_by_id(&ctx, "memberA").await
        })
        .await
        .unwrap();

    assert_eq!(found, Member::new("memberA", 7_000));
    let stats = app.stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(app.balance("memberA").await, Some(7_000));
}

#[tokio::test]
async fn test_transfer_commits_both_sides() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    app.seed(&[("memberA", 10_000), ("memberB", 10_000)]).await;
    let repository = app.repository();

    app.manager()
        .run_transactional(&ExecutionContext::new(), |ctx| async move {
            transfer(repository, &ctx, "memberA", "memberB", 2_000).await
        })
        .await
        .unwrap();

    assert_eq!(app.balance("memberA").await, Some(8_000));
    assert_eq!(app.balance("memberB").await, Some(12_000));
}

#[tokio::test]
async fn test_failed_transfer_leaves_balances_untouched() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    app.seed(&[("memberA", 10_000), ("ex", 10_000)]).await;
    let repository = app.repository();
    let ctx = ExecutionContext::new();

    let result = app
        .manager()
        .run_transactional(&ctx, |ctx| async move {
            transfer(repository, &ctx, "memberA", "ex", 2_000).await
        })
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::OperationError(
            CommandError::ValidationError { .. }
        ))
    ));
    assert_eq!(app.balance("memberA").await, Some(10_000));
    assert_eq!(app.balance("ex").await, Some(10_000));
    assert!(!app.manager().synchronizer().is_active(&ctx));
    assert_eq!(app.stats().outstanding(), 0);
}

#[tokio::test]
async fn test_nested_calls_join_the_outer_transaction() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let manager = app.manager();
    let repository = app.repository();
    let before = app.stats();

    manager
        .run_transactional(&ExecutionContext::new(), |ctx| async move {
            repository.save(&ctx, Member::new("outer", 1)).await?;
            manager
                .run_transactional(&ctx, |ctx| async move {
                    repository.save(&ctx, Member::new("inner", 2)).await?;
                    assert_eq!(manager.synchronizer().active_count(), 1);
                    let outer = manager
                        .run_transactional(&ctx, |ctx| async move {
                            repository.find_by_id(&ctx, "outer").await
                        })
                        .await?;
                    assert_eq!(outer.money, 1);
                    Ok::<_, CommandError>(())
                })
                .await?;
            Ok::<_, CommandError>(())
        })
        .await
        .unwrap();

    let after = app.stats();
    assert_eq!(after.acquired - before.acquired, 1);
    assert_eq!(after.outstanding(), 0);
    assert_eq!(manager.synchronizer().active_count(), 0);
    assert_eq!(app.balance("outer").await, Some(1));
    assert_eq!(app.balance("inner").await, Some(2));
}

#[tokio::test]
async fn test_inner_failure_rolls_back_the_whole_unit() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let manager = app.manager();
    let repository = app.repository();

    let result = manager
        .run_transactional(&ExecutionContext::new(), |ctx| async move {
            repository.save(&ctx, Member::new("outer", 1)).await?;
            manager
                .run_transactional(&ctx, |ctx| async move {
                    repository.save(&ctx, Member::new("outer", 2)).await
                })
                .await?;
            Ok::<_, CommandError>(())
        })
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::OperationError(
            CommandError::AlreadyExists { .. }
        ))
    ));
    assert_eq!(app.balance("outer").await, None);
}

#[tokio::test]
async fn test_every_acquire_is_released() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    app.seed(&[("memberA", 100)]).await;
    let repository = app.repository();

    for attempt in 0..5 {
        let result = app
            .manager()
            .run_transactional(&ExecutionContext::new(), |ctx| async move {
                if attempt % 2 == 0 {
                    repository.find_by_id(&ctx, "memberA").await.map(|_| ())
                } else {
                    repository.delete(&ctx, "nobody").await
                }
            })
            .await;
        assert_eq!(result.is_ok(), attempt % 2 == 0);
    }

    let stats = app.stats();
    assert_eq!(stats.acquired, stats.released);
    assert_eq!(stats.discarded, 0);
    assert_eq!(app.manager().synchronizer().active_count(), 0);
}

#[tokio::test]
async fn test_panic_rolls_back_and_releases() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    app.seed(&[("memberA", 10_000)]).await;
    let repository = app.repository();
    let ctx = ExecutionContext::new();

    let outcome = AssertUnwindSafe(app.manager().run_transactional(&ctx, |ctx| async move {
        repository.update(&ctx, "memberA", 0).await?;
        explode();
        Ok::<(), CommandError>(())
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert!(!app.manager().synchronizer().is_active(&ctx));
    assert_eq!(app.stats().outstanding(), 0);
    assert_eq!(app.balance("memberA").await, Some(10_000));
}

#[tokio::test]
async fn test_rollback_failure_is_reported_with_the_original_error() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    app.seed(&[("memberA", 10_000)]).await;
    let manager = app.manager();
    let repository = app.repository();
    let ctx = ExecutionContext::new();

    let result = manager
        .run_transactional(&ctx, |ctx| async move {
            repository.update(&ctx, "memberA", 1).await?;
            // End the transaction underneath the manager so its ROLLBACK fails.
            let shared = manager
                .synchronizer()
                .get_active(&ctx)
                .ok_or(TransactionError::NoActiveTransaction(ctx))?;
            let mut transaction = shared.lock().await;
            sqlx::query("ROLLBACK")
                .execute(transaction.connection()?)
                .await
                .map_err(|e| CommandError::DatabaseError(e.to_string()))?;
            drop(transaction);
            Err::<(), _>(CommandError::ValidationError {
                details: "business failure".to_string(),
            })
        })
        .await;

    match result {
        Err(TransactionManagerError::RollbackFailed {
            rollback: TransactionError::RollbackError(_),
            original: CommandError::ValidationError { .. },
        }) => {}
        other => panic!("expected a rollback failure, got {other:?}"),
    }
    let stats = app.stats();
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(stats.discarded, 1);
    assert!(!manager.synchronizer().is_active(&ctx));
    assert_eq!(app.balance("memberA").await, Some(10_000));
}

#[tokio::test]
async fn test_commit_failure_still_releases_the_connection() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let manager = app.manager();
    let ctx = ExecutionContext::new();

    let result = manager
        .run_transactional(&ctx, |ctx| async move {
            let shared = manager
                .synchronizer()
                .get_active(&ctx)
                .ok_or(TransactionError::NoActiveTransaction(ctx))?;
            let mut transaction = shared.lock().await;
            sqlx::query("COMMIT")
                .execute(transaction.connection()?)
                .await
                .map_err(|e| CommandError::DatabaseError(e.to_string()))?;
            Ok::<(), CommandError>(())
        })
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::TransactionError(
            TransactionError::CommitError(_)
        ))
    ));
    let stats = app.stats();
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(stats.discarded, 1);
    assert!(!manager.synchronizer().is_active(&ctx));
}

#[tokio::test]
async fn test_cancelled_transaction_is_cleaned_up() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let repository = app.repository();
    let ctx = ExecutionContext::new();

    let result = tokio::time::timeout(
        Duration::from_millis(100),
        app.manager().run_transactional(&ctx, |ctx| async move {
            repository.save(&ctx, Member::new("memberC", 500)).await?;
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<(), CommandError>(())
        }),
    )
    .await;

    assert!(result.is_err());
    assert!(!app.manager().synchronizer().is_active(&ctx));
    let stats = app.stats();
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(stats.discarded, 1);
    assert_eq!(app.balance("memberC").await, None);
}

#[tokio::test]
async fn test_exhausted_pool_is_a_connection_error() {
    let app = setup(1, ExecutionMode::AutoCommit).await;
    let _held = app.manager().provider().acquire().await.unwrap();
    let ctx = ExecutionContext::new();

    let result = app
        .manager()
        .run_transactional(&ctx, |_ctx| async move { Ok::<(), CommandError>(()) })
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::TransactionError(
            TransactionError::Connection(ConnectionError::PoolExhausted { .. })
        ))
    ));
    assert!(!app.manager().synchronizer().is_active(&ctx));
}

#[tokio::test]
async fn test_failed_begin_discards_the_connection() {
    let app = setup(1, ExecutionMode::AutoCommit).await;
    let manager = app.manager();

    // Leave the only pooled connection inside an open transaction.
    let mut connection = manager.provider().acquire().await.unwrap();
    sqlx::query("BEGIN")
        .execute(connection.connection().unwrap())
        .await
        .unwrap();
    connection.release();

    let ctx = ExecutionContext::new();
    let result = manager
        .run_transactional(&ctx, |_ctx| async move { Ok::<(), CommandError>(()) })
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::TransactionError(
            TransactionError::BeginError(_)
        ))
    ));
    let stats = app.stats();
    assert_eq!(stats.acquired, 2);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.outstanding(), 0);
    assert!(!manager.synchronizer().is_active(&ctx));
    assert_eq!(manager.synchronizer().active_count(), 0);
}

#[tokio::test]
async fn test_other_contexts_do_not_see_uncommitted_writes() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let manager = app.manager();
    let repository = app.repository();

    manager
        .run_transactional(&ExecutionContext::new(), |ctx| async move {
            repository.save(&ctx, Member::new("memberX", 42)).await?;
            let elsewhere = manager
                .run_transactional(&ExecutionContext::new(), |other| async move {
                    repository.find_by_id(&other, "memberX").await
                })
                .await;
            assert!(matches!(
                elsewhere,
                Err(TransactionManagerError::OperationError(ref e)) if e.is_not_found()
            ));
            assert_eq!(manager.synchronizer().active_count(), 1);
            Ok::<_, CommandError>(())
        })
        .await
        .unwrap();

    let stats = app.stats();
    assert_eq!(stats.acquired, 2);
    assert_eq!(stats.outstanding(), 0);
    assert_eq!(app.balance("memberX").await, Some(42));
}

#[tokio::test]
async fn test_require_transaction_mode_rejects_bare_calls() {
    let app = setup(2, ExecutionMode::RequireTransaction).await;
    let repository = app.repository();
    let ctx = ExecutionContext::new();

    let bare = repository.save(&ctx, Member::new("memberA", 1)).await;
    assert!(matches!(
        bare,
        Err(CommandError::Transaction(TransactionError::NoActiveTransaction(c))) if c == ctx
    ));
    assert_eq!(app.stats().acquired, 0);

    app.manager()
        .run_transactional(&ctx, |ctx| async move {
            repository.save(&ctx, Member::new("memberA", 1)).await
        })
        .await
        .unwrap();
    assert_eq!(app.balance("memberA").await, Some(1));
}

struct SaveAll {
    repository: Arc<dyn MemberRepository>,
    members: Vec<Member>,
}

#[async_trait]
impl BoxedTransactionOperation for SaveAll {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<(), TransactionOperationError> {
        for member in &self.members {
            self.repository.save(ctx, member.clone()).await?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_boxed_operation_is_atomic() {
    let app = setup(2, ExecutionMode::AutoCommit).await;
    let manager: Arc<dyn TransactionManager> = app.state.transaction_manager.clone();

    let operation = SaveAll {
        repository: app.state.member_repository.clone(),
        members: vec![
            Member::new("memberA", 1),
            Member::new("memberB", 2),
            Member::new("memberA", 3),
        ],
    };
    let result = manager
        .execute(&ExecutionContext::new(), Box::new(operation))
        .await;

    assert!(matches!(
        result,
        Err(TransactionManagerError::OperationError(
            TransactionOperationError::CommandError(CommandError::AlreadyExists { .. })
        ))
    ));
    assert_eq!(app.balance("memberA").await, None);
    assert_eq!(app.balance("memberB").await, None);
    assert_eq!(app.stats().outstanding(), 0);
}
