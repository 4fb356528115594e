//! Capture persistence contract and the in-memory repository.

use std::collections::HashMap;

use crate::capture::{Capture, CaptureId, NewCapture, OutputChannel};

/// Persistence contract for captures.
///
/// [`CaptureRepository`] is the default in-memory implementation; an
/// on-disk store can be substituted behind the same trait.
pub trait CaptureStore {
    /// Commit a capture, assigning its id and initial name. Returns the id.
    fn save(&mut self, capture: NewCapture) -> CaptureId;

    /// Look up a capture by id.
    fn get(&self, id: &str) -> Option<&Capture>;

    /// All captures, most recent first.
    fn get_all(&self) -> Vec<&Capture>;

    /// Captures grouped by output channel, most recent first within each
    /// group.
    fn by_channel(&self) -> HashMap<OutputChannel, Vec<&Capture>>;

    /// Delete a capture. Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> bool;

    /// Rename a capture. Returns whether the id existed.
    fn rename(&mut self, id: &str, name: &str) -> bool;
}

/// Ordered, most-recent-first in-memory capture store.
#[derive(Debug, Default)]
pub struct CaptureRepository {
    captures: Vec<Capture>,
    next_id: u64,
}

impl CaptureRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored captures.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Whether the repository holds no captures.
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Most recent capture taken on the given output channel.
    pub fn latest_for_channel(&self, channel: OutputChannel) -> Option<&Capture> {
        self.captures.iter().find(|c| c.output_channel == channel)
    }

    /// Whether both a left-channel and a right-channel capture exist,
    /// the precondition for the L+R average view.
    pub fn has_left_and_right(&self) -> bool {
        self.latest_for_channel(OutputChannel::Left).is_some()
            && self.latest_for_channel(OutputChannel::Right).is_some()
    }
}

impl CaptureStore for CaptureRepository {
    fn save(&mut self, new: NewCapture) -> CaptureId {
        self.next_id += 1;
        let id = format!("cap-{}", self.next_id);
        let name = format!("Capture {}", self.next_id);

        tracing::info!(
            id = %id,
            device = %new.device_name,
            channel = new.output_channel.as_str(),
            points = new.raw.len(),
            "capture saved"
        );

        self.captures.insert(
            0,
            Capture {
                id: id.clone(),
                name,
                timestamp: new.timestamp,
                device_name: new.device_name,
                signal_type: new.signal_type,
                duration_seconds: new.duration_seconds,
                sample_rate: new.sample_rate,
                output_channel: new.output_channel,
                raw: new.raw,
                smoothed: new.smoothed,
                smoothing_octave_fraction: new.smoothing_octave_fraction,
                channel_data: new.channel_data,
            },
        );
        id
    }

    fn get(&self, id: &str) -> Option<&Capture> {
        self.captures.iter().find(|c| c.id == id)
    }

    fn get_all(&self) -> Vec<&Capture> {
        self.captures.iter().collect()
    }

    fn by_channel(&self) -> HashMap<OutputChannel, Vec<&Capture>> {
        let mut groups: HashMap<OutputChannel, Vec<&Capture>> = HashMap::new();
        for capture in &self.captures {
            groups.entry(capture.output_channel).or_default().push(capture);
        }
        groups
    }

    fn delete(&mut self, id: &str) -> bool {
        let before = self.captures.len();
        self.captures.retain(|c| c.id != id);
        let deleted = self.captures.len() != before;
        if deleted {
            tracing::info!(id, "capture deleted");
        }
        deleted
    }

    fn rename(&mut self, id: &str, name: &str) -> bool {
        match self.captures.iter_mut().find(|c| c.id == id) {
            Some(capture) => {
                capture.name = name.to_string();
                true
            }
            None => false,
        }
    }
}

/// Build a [`NewCapture`] with the given channel and trivial curves;
/// test-support constructor shared by the crate's tests.
#[cfg(test)]
pub(crate) fn test_capture(channel: OutputChannel) -> NewCapture {
    use crate::capture::SignalType;
    use medida_core::FrequencyResponse;

    let raw = FrequencyResponse::new(
        vec![100.0, 1000.0, 10000.0],
        vec![0.0, -3.0, -6.0],
        vec![0.0, 45.0, 90.0],
    )
    .unwrap();

    NewCapture {
        timestamp: chrono::Utc::now(),
        device_name: "Test Mic".to_string(),
        signal_type: SignalType::Sweep,
        duration_seconds: 5,
        sample_rate: 48000,
        output_channel: channel,
        smoothed: raw.clone(),
        raw,
        smoothing_octave_fraction: 3,
        channel_data: None,
    }
}
