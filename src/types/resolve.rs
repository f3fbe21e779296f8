//! The resolution ("unswizzle") pass.
//!
//! Runs once, after every declaration has been registered. Placeholders never
//! hold references of their own, so a single flat round over the key snapshot
//! is enough: each placeholder slot is looked up once by key.

use tracing::debug;

use crate::types::store::TypeStore;

/// Resolve every placeholder reference held by registered types and their
/// member directives. Returns whether any reference changed.
pub fn unswizzle(store: &mut TypeStore) -> bool {
    let mut changed = false;
    let mut touched = 0usize;

    for key in store.all_keys() {
        let Some(id) = store.lookup(&key) else {
            continue;
        };

        let mut ty = store.take(id);
        if ty.resolve(store) {
            changed = true;
            touched += 1;
        }
        store.restore(id, ty);
    }

    debug!(
        types = store.len(),
        touched,
        unresolved = store.unresolved_keys().len(),
        "Resolved type references"
    );
    changed
}
