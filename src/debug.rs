//! Wavefront snapshots for debugging.
//!
//! Snapshots are serialized to JSON and emitted as `TRACE` events on the `wfa::debug` target,
//! such that a subscriber can route them to a separate file.

use tracing::{enabled, trace, warn, Level};

pub const DEBUG_TARGET: &str = "wfa::debug";

pub mod messages {
    use serde::Serialize;

    use crate::aligner::offsets::{Diag, OffsetType};
    use crate::wavefront::{AlignState, WavefrontSet};

    #[derive(Debug, Serialize)]
    pub struct WavefrontSnapshot {
        pub state: AlignState,
        pub lo: Diag,
        pub hi: Diag,

        /// Offsets for diagonals `lo..=hi`, `None` for unreachable diagonals
        pub offsets: Vec<Option<i64>>,
    }

    #[derive(Debug, Serialize)]
    pub enum DebugOutputMessage {
        NewAlignment { pattern_len: usize, text_len: usize },
        WavefrontSet { score: usize, wavefronts: Vec<WavefrontSnapshot> },
        Terminate { score: usize },
    }

    impl DebugOutputMessage {
        pub fn new_from_wavefront_set<O: OffsetType>(score: usize, set: &WavefrontSet<O>) -> Self {
            let wavefronts = set.iter()
                .map(|(state, wf)| WavefrontSnapshot {
                    state,
                    lo: wf.lo(),
                    hi: wf.hi(),
                    offsets: (wf.lo()..=wf.hi())
                        .map(|k| {
                            let offset = wf.get(k);
                            (!offset.is_null()).then(|| offset.as_isize() as i64)
                        })
                        .collect(),
                })
                .collect();

            Self::WavefrontSet { score, wavefronts }
        }
    }
}

/// Whether a subscriber listens for debug snapshots. Building a snapshot is expensive, so
/// callers should check this first.
#[inline]
pub fn debug_enabled() -> bool {
    enabled!(target: DEBUG_TARGET, Level::TRACE)
}

pub fn log(msg: &messages::DebugOutputMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => trace!(target: DEBUG_TARGET, "{}", json),
        Err(e) => warn!("Could not serialize debug data to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::messages::DebugOutputMessage;
    use crate::wavefront::memory::WavefrontSlab;
    use crate::wavefront::WavefrontSet;

    #[test]
    fn test_wavefront_snapshot_json() {
        let mut slab = WavefrontSlab::new();
        let set = WavefrontSet::<i32>::initial(&mut slab, false).unwrap();
        let msg = DebugOutputMessage::new_from_wavefront_set(3, &set);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["WavefrontSet"]["score"], 3);
        assert_eq!(json["WavefrontSet"]["wavefronts"][0]["state"], "Match");
        assert_eq!(json["WavefrontSet"]["wavefronts"][0]["offsets"][0], 0);
    }
}
