//! Bounded free-lists that recycle tracks and candidate buffers across frames.
//!
//! Both pools take ownership of what is released, so a released object can no
//! longer be reached by the caller.

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::strack::STrack;

/// Recycles [`STrack`] allocations.
#[derive(Debug)]
pub struct TrackPool {
    free: Vec<STrack>,
    capacity: usize,
}

impl TrackPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take a track from the pool, reinitialised for the given detection.
    pub fn acquire(
        &mut self,
        track_id: Option<u64>,
        xywh: [f32; 4],
        score: f32,
        cls_idx: u32,
        kalman_filter: &KalmanFilter,
    ) -> STrack {
        match self.free.pop() {
            Some(mut track) => {
                track.reset(track_id, xywh, score, cls_idx, kalman_filter);
                track
            }
            None => {
                let mut track = STrack::new(xywh, score, cls_idx, kalman_filter);
                track.track_id = track_id;
                track
            }
        }
    }

    /// Return a track to the pool. Dropped when the pool is full.
    pub fn release(&mut self, track: STrack) {
        if self.free.len() < self.capacity {
            self.free.push(track);
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// Recycles the vectors used to hold per-frame candidates.
#[derive(Debug)]
pub struct ArrayPool<T> {
    free: Vec<Vec<T>>,
    capacity: usize,
}

impl<T> ArrayPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// An empty buffer able to hold at least `size` elements.
    pub fn acquire(&mut self, size: usize) -> Vec<T> {
        match self.free.pop() {
            Some(mut buf) => {
                buf.reserve(size);
                buf
            }
            None => Vec::with_capacity(size),
        }
    }

    /// Clear a buffer and keep it for reuse if there is room.
    pub fn release(&mut self, mut buf: Vec<T>) {
        if self.free.len() < self.capacity {
            buf.clear();
            self.free.push(buf);
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackState;

    #[test]
    fn test_acquire_allocates_when_empty() {
        let kf = KalmanFilter::new();
        let mut pool = TrackPool::new(2);

        let track = pool.acquire(None, [10.0, 10.0, 4.0, 4.0], 0.5, 1, &kf);
        assert!(pool.is_empty());
        assert_eq!(track.xywh, [10.0, 10.0, 4.0, 4.0]);
        assert_eq!(track.cls_idx, 1);
    }

    #[test]
    fn test_recycled_track_is_reinitialised() {
        let kf = KalmanFilter::new();
        let mut pool = TrackPool::new(2);

        let mut track = pool.acquire(None, [10.0, 10.0, 4.0, 4.0], 0.5, 1, &kf);
        track.activate(9, 4);
        track.mark_lost();
        track.mean[4] = 5.0;
        pool.release(track);
        assert_eq!(pool.len(), 1);

        let fresh = pool.acquire(None, [50.0, 60.0, 8.0, 10.0], 0.7, 2, &kf);
        let (mean, covariance) = kf.initiate([50.0, 60.0, 8.0, 10.0]);
        assert!(pool.is_empty());
        assert_eq!(fresh.track_id, None);
        assert_eq!(fresh.state, TrackState::Tracked);
        assert!(!fresh.is_activated);
        assert_eq!(fresh.frame_id, 0);
        assert_eq!(fresh.score, 0.7);
        assert_eq!(fresh.mean, mean);
        assert_eq!(fresh.covariance, covariance);
    }

    #[test]
    fn test_release_beyond_capacity_discards() {
        let kf = KalmanFilter::new();
        let mut pool = TrackPool::new(1);

        let a = pool.acquire(None, [1.0, 1.0, 1.0, 1.0], 0.5, 0, &kf);
        let b = pool.acquire(None, [2.0, 2.0, 1.0, 1.0], 0.5, 0, &kf);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_array_pool_recycles_cleared_buffers() {
        let mut pool: ArrayPool<u32> = ArrayPool::new(1);

        let mut buf = pool.acquire(4);
        buf.extend([1, 2, 3]);
        pool.release(buf);
        assert_eq!(pool.len(), 1);

        let buf = pool.acquire(8);
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 8);

        pool.release(buf);
        pool.release(Vec::new());
        assert_eq!(pool.len(), 1);
    }
}
