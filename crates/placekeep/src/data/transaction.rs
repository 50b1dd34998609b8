//! Commit protocol spanning several entity contexts.
//!
//! Participants are committed in the order given. When they all share one
//! store the whole scope goes down as a single atomic batch. Otherwise each
//! participant commits on its own and a failure can only roll back the
//! participants that have not committed yet: cross-store atomicity would need
//! a backend with distributed commit, which neither store offers.

use std::sync::Arc;

use placekeep_core::storage::{Change, RepositoryError, Result};

use super::context::DataContext;

/// Commits the pending changes of every participant, in order.
pub(crate) async fn commit_all(participants: &[Arc<DataContext>]) -> Result<usize> {
    let batches: Vec<Vec<Change>> = participants.iter().map(|p| p.take_pending()).collect();

    let shared_store = participants
        .windows(2)
        .all(|pair| Arc::ptr_eq(pair[0].store(), pair[1].store()));

    match participants.first() {
        Some(first) if shared_store => commit_atomic(first, participants, batches).await,
        Some(_) => commit_sequential(participants, batches).await,
        None => Ok(0),
    }
}

async fn commit_atomic(
    first: &Arc<DataContext>,
    participants: &[Arc<DataContext>],
    batches: Vec<Vec<Change>>,
) -> Result<usize> {
    let combined: Vec<Change> = batches.iter().flatten().cloned().collect();
    if combined.is_empty() {
        return Ok(0);
    }

    match first.store().commit_async(combined).await {
        Ok(affected) => Ok(affected),
        Err(e) => {
            for (participant, changes) in participants.iter().zip(batches) {
                participant.restore_pending(changes);
            }
            tracing::debug!(error = %e, "Commit scope rolled back");
            Err(e)
        }
    }
}

async fn commit_sequential(
    participants: &[Arc<DataContext>],
    batches: Vec<Vec<Change>>,
) -> Result<usize> {
    let total = participants.len();
    let mut remaining = participants.iter().zip(batches);
    let mut affected = 0;
    let mut committed = 0;

    while let Some((participant, changes)) = remaining.next() {
        if !changes.is_empty() {
            match participant.store().commit_async(changes.clone()).await {
                Ok(rows) => {
                    affected += rows;
                    committed += 1;
                }
                Err(e) => {
                    participant.restore_pending(changes);
                    for (rest, rest_changes) in remaining.by_ref() {
                        rest.restore_pending(rest_changes);
                    }
                    if committed == 0 {
                        return Err(e);
                    }
                    tracing::warn!(
                        committed,
                        participants = total,
                        error = %e,
                        "Commit scope failed after earlier participants committed"
                    );
                    return Err(RepositoryError::DistributedCommit {
                        committed,
                        participants: total,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(affected)
}
