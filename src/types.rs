use crate::geometry::DetectorGeometry;
use log::warn;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a hit by the hit producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitId(pub u32);

/// Position of a hit inside its event's [`HitPool`]. This is the identity the
/// finder uses for every hit reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitIndex(pub u32);

impl HitIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Usage flag of a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitUsage {
    /// Available to the search.
    #[default]
    Free,
    /// Claimed by an output track.
    Claimed,
    /// Flagged by the producer; never searched.
    Background,
}

/// Hit description as delivered by the hit producer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRecord {
    pub id: u32,
    pub wire: u16,
    pub layer: u16,
    pub position: [f64; 3],
    pub drift_length: f64,
    pub drift_sigma: f64,
    #[serde(default)]
    pub background: bool,
}

/// Wire-chamber hit. The superlayer is derived from the layer when the hit
/// is created and cannot change afterwards.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    id: HitId,
    wire: u16,
    layer: u16,
    superlayer: u8,
    position: Vector3<f64>,
    drift_length: f64,
    drift_sigma: f64,
    usage: HitUsage,
}

impl Hit {
    /// Builds a hit, or `None` when the layer is unknown to `geometry`.
    pub fn new(
        geometry: &DetectorGeometry,
        id: HitId,
        wire: u16,
        layer: u16,
        position: Vector3<f64>,
        drift_length: f64,
        drift_sigma: f64,
    ) -> Option<Self> {
        let superlayer = geometry.superlayer_of(layer)?;
        Some(Self {
            id,
            wire,
            layer,
            superlayer,
            position,
            drift_length: drift_length.abs(),
            drift_sigma: drift_sigma.abs(),
            usage: HitUsage::Free,
        })
    }

    pub fn id(&self) -> HitId {
        self.id
    }

    pub fn wire(&self) -> u16 {
        self.wire
    }

    pub fn layer(&self) -> u16 {
        self.layer
    }

    pub fn superlayer(&self) -> u8 {
        self.superlayer
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    /// Wire position projected on the transverse plane.
    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.position.x, self.position.y)
    }

    /// Transverse distance of the wire from the detector axis.
    pub fn radius(&self) -> f64 {
        self.xy().norm()
    }

    pub fn drift_length(&self) -> f64 {
        self.drift_length
    }

    pub fn drift_sigma(&self) -> f64 {
        self.drift_sigma
    }

    pub fn usage(&self) -> HitUsage {
        self.usage
    }

    pub fn is_free(&self) -> bool {
        self.usage == HitUsage::Free
    }
}

/// Event-wide hit arena. Every other structure refers to hits through
/// [`HitIndex`] values into this pool.
#[derive(Clone, Debug, Default, Serialize)]
pub struct HitPool {
    hits: Vec<Hit>,
}

impl HitPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool from producer records, skipping hits on unknown layers.
    pub fn from_records(geometry: &DetectorGeometry, records: &[HitRecord]) -> Self {
        let mut pool = Self::new();
        for record in records {
            let position = Vector3::new(record.position[0], record.position[1], record.position[2]);
            match Hit::new(
                geometry,
                HitId(record.id),
                record.wire,
                record.layer,
                position,
                record.drift_length,
                record.drift_sigma,
            ) {
                Some(mut hit) => {
                    if record.background {
                        hit.usage = HitUsage::Background;
                    }
                    pool.hits.push(hit);
                }
                None => warn!(
                    "hit {} references unknown layer {}, skipped",
                    record.id, record.layer
                ),
            }
        }
        pool
    }

    pub fn push(&mut self, hit: Hit) -> HitIndex {
        let index = HitIndex(self.hits.len() as u32);
        self.hits.push(hit);
        index
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[inline]
    pub fn get(&self, index: HitIndex) -> &Hit {
        &self.hits[index.get()]
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn iter(&self) -> impl Iterator<Item = (HitIndex, &Hit)> {
        self.hits
            .iter()
            .enumerate()
            .map(|(i, h)| (HitIndex(i as u32), h))
    }

    /// Indices of hits still available to the search.
    pub fn free_indices(&self) -> Vec<HitIndex> {
        self.iter()
            .filter(|(_, h)| h.is_free())
            .map(|(i, _)| i)
            .collect()
    }

    /// Marks every hit of `track` as claimed. References outside the pool
    /// are ignored.
    pub fn claim(&mut self, track: &Track) {
        for &index in &track.hits {
            if let Some(hit) = self.hits.get_mut(index.get()) {
                hit.usage = HitUsage::Claimed;
            }
        }
    }

    /// Returns claimed hits of `track` to the free state. References outside
    /// the pool are ignored.
    pub fn release(&mut self, track: &Track) {
        for &index in &track.hits {
            match self.hits.get_mut(index.get()) {
                Some(hit) if hit.usage == HitUsage::Claimed => hit.usage = HitUsage::Free,
                Some(_) => {}
                None => warn!("track references hit {:?} outside the pool", index),
            }
        }
    }

    /// Number of distinct superlayers touched by `hits`.
    pub fn superlayer_count(&self, hits: &[HitIndex]) -> usize {
        let mut mask = [false; 256];
        let mut count = 0;
        for &index in hits {
            let sl = self.get(index).superlayer as usize;
            if !mask[sl] {
                mask[sl] = true;
                count += 1;
            }
        }
        count
    }

    /// Sorts hit references by transverse radius, ties by index.
    pub fn sort_by_radius(&self, hits: &mut [HitIndex]) {
        hits.sort_by(|a, b| {
            self.get(*a)
                .radius()
                .total_cmp(&self.get(*b).radius())
                .then(a.cmp(b))
        });
    }
}

/// Identifier of an output track within an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

/// Coarse circle parameters in the Hough plane: the direction `theta` of the
/// circle centre and the signed curvature `curvature` (1/cm). The circle
/// passes through the conformal reference point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackParameters {
    pub theta: f64,
    pub curvature: f64,
}

impl TrackParameters {
    /// Circle radius (cm); infinite for a straight line.
    pub fn radius(&self) -> f64 {
        if self.curvature == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.curvature.abs()
        }
    }

    /// Circle centre relative to the reference point, `None` for a line.
    pub fn center(&self) -> Option<Vector2<f64>> {
        if self.curvature == 0.0 {
            return None;
        }
        Some(Vector2::new(self.theta.cos(), self.theta.sin()) / self.curvature)
    }
}

/// Track candidate: radius-ordered hit references plus a coarse estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub hits: Vec<HitIndex>,
    pub params: TrackParameters,
    pub superlayer_count: usize,
}

impl Track {
    /// Builds a track from hit references, ordering them by radius.
    pub fn from_hits(
        pool: &HitPool,
        id: TrackId,
        mut hits: Vec<HitIndex>,
        params: TrackParameters,
    ) -> Self {
        pool.sort_by_radius(&mut hits);
        hits.dedup();
        let superlayer_count = pool.superlayer_count(&hits);
        Self {
            id,
            hits,
            params,
            superlayer_count,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
