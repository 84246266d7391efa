use crate::types::{HitIndex, Track};
use serde::Serialize;

/// Reference to a track of one of the linker inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackKey {
    /// Position of the track set among the linker inputs.
    pub input: u32,
    /// Position of the track within its set.
    pub index: u32,
}

/// Per hit index, the tracks referencing it (sorted, unique).
#[derive(Clone, Debug, Default)]
pub struct OwnershipIndex {
    owners: Vec<Vec<TrackKey>>,
}

impl OwnershipIndex {
    pub fn build(hit_count: usize, inputs: &[Vec<Track>]) -> Self {
        let mut owners = vec![Vec::new(); hit_count];
        for (input, tracks) in inputs.iter().enumerate() {
            for (index, track) in tracks.iter().enumerate() {
                let key = TrackKey {
                    input: input as u32,
                    index: index as u32,
                };
                for &hit in &track.hits {
                    if let Some(list) = owners.get_mut(hit.get()) {
                        list.push(key);
                    }
                }
            }
        }
        for list in &mut owners {
            list.sort_unstable();
            list.dedup();
        }
        Self { owners }
    }

    pub fn owners(&self, hit: HitIndex) -> &[TrackKey] {
        self.owners
            .get(hit.get())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Owners of `hit` other than `track`.
    pub fn signature(&self, hit: HitIndex, track: TrackKey) -> Vec<TrackKey> {
        self.owners(hit)
            .iter()
            .copied()
            .filter(|&k| k != track)
            .collect()
    }

    /// Number of hits referenced by more than one track.
    pub fn shared_hits(&self) -> usize {
        self.owners.iter().filter(|o| o.len() > 1).count()
    }
}
