//! Named query functions over the entities.
//!
//! Every function takes any `ConnectionTrait`, so callers can run them on the
//! shared connection or inside a transaction.

pub mod accounts;
pub mod books;
pub mod carts;
pub mod comments;
pub mod orders;

use rand::seq::SliceRandom;

use crate::error::{StoreError, StoreResult};

/// Uniform sample of up to `amount` items without replacement.
pub(crate) fn sample<T: Clone>(pool: &[T], amount: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    let mut picked: Vec<T> = pool.choose_multiple(&mut rng, amount).cloned().collect();
    picked.shuffle(&mut rng);
    picked
}

/// Like [`sample`], but refuses to return fewer than `amount` items.
pub(crate) fn sample_exact<T: Clone>(pool: &[T], amount: usize) -> StoreResult<Vec<T>> {
    if pool.len() < amount {
        return Err(StoreError::InsufficientCandidates {
            requested: amount,
            available: pool.len(),
        });
    }
    Ok(sample(pool, amount))
}
