//! Reconciles call records with function regions to produce call edges.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::callgraph::trace::CallRecord;
use crate::config::CallTargetConfig;
use crate::model::function::{Function, FunctionId};
use crate::types::TypeKey;

/// Statistics about one call graph build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphStats {
    /// Call records in the trace
    pub calls: usize,
    /// Records that fell inside some function region
    pub scanned: usize,
    /// Distinct caller→callee edges added
    pub edges: usize,
    /// Local labels, register targets and multi-target calls
    pub skipped: usize,
    /// Targets that name no known function
    pub unresolved: usize,
    /// Targets that resolved to an ignored function
    pub ignored: usize,
}

impl fmt::Display for CallGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CallGraph(calls={}, scanned={}, edges={}, skipped={}, unresolved={}, ignored={})",
            self.calls, self.scanned, self.edges, self.skipped, self.unresolved, self.ignored
        )
    }
}

/// Add caller/callee edges for every call made inside a function region.
///
/// `functions` must be sorted by address with `by_key` indexing into it. The
/// call list is sorted here; a single cursor walks it, rewinding whenever a
/// region starts before the cursor's current record because regions of
/// different functions need not be increasing.
pub fn populate_calls(
    functions: &mut [Function],
    by_key: &HashMap<TypeKey, FunctionId>,
    mut calls: Vec<CallRecord>,
    targets: &CallTargetConfig,
) -> CallGraphStats {
    calls.sort_by_key(|c| c.address);

    let mut stats = CallGraphStats {
        calls: calls.len(),
        ..Default::default()
    };
    if calls.is_empty() {
        return stats;
    }

    let mut index = 0usize;
    for caller in 0..functions.len() {
        let regions = functions[caller].regions.clone();
        for region in regions {
            while index >= calls.len() || (index > 0 && calls[index].address > region.start) {
                index -= 1;
            }

            while index < calls.len() {
                let call = &calls[index];
                if call.address < region.start {
                    index += 1;
                    continue;
                }
                if call.address > region.end {
                    break;
                }
                index += 1;
                stats.scanned += 1;

                if targets.is_skipped(&call.target) {
                    stats.skipped += 1;
                    continue;
                }

                match by_key.get(&TypeKey::root(call.target.as_str())) {
                    Some(&callee) if functions[callee].ignored => stats.ignored += 1,
                    Some(&callee) => {
                        if functions[caller].callees.insert(callee) {
                            stats.edges += 1;
                        }
                        functions[callee].callers.insert(caller);
                    }
                    None => {
                        stats.unresolved += 1;
                        warn!(
                            call_target = %call.target,
                            address = call.address,
                            "Could not resolve call target"
                        );
                    }
                }
            }
        }
    }

    debug!(%stats, "Populated call graph");
    stats
}
