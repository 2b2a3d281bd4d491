/// Lifecycle state of a motion-model track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Matched on the latest frame but seen fewer than `min_hits` times
    #[default]
    Tentative,
    /// Matched on the latest frame with at least `min_hits` matches
    Confirmed,
    /// Missed at least one frame, kept alive on prediction alone
    Coasting,
    /// Missed more than `max_age` frames; removed from the collection
    Dead,
}

impl TrackState {
    /// Classify a track from its match history.
    pub fn classify(hits: u32, time_since_update: u32, min_hits: u32, max_age: u32) -> Self {
        if time_since_update > max_age {
            TrackState::Dead
        } else if time_since_update > 0 {
            TrackState::Coasting
        } else if hits >= min_hits {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_precedence() {
        assert_eq!(TrackState::classify(1, 0, 3, 30), TrackState::Tentative);
        assert_eq!(TrackState::classify(3, 0, 3, 30), TrackState::Confirmed);
        assert_eq!(TrackState::classify(10, 30, 3, 30), TrackState::Coasting);
        assert_eq!(TrackState::classify(10, 31, 3, 30), TrackState::Dead);
    }
}
