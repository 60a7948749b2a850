use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named channels sharing one frame axis. Serialized as
/// `{ "frames": [0, 1, ...], "<channel>": [...], ... }`, the shape of both raw motion
/// captures and their compressed form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionData {
    pub frames: Vec<usize>,
    #[serde(flatten)]
    pub channels: IndexMap<String, Vec<f64>>,
}

impl MotionData {
    pub fn with_frames(len: usize) -> Self {
        Self {
            frames: (0..len).collect(),
            channels: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, channel: impl Into<String>, values: Vec<f64>) {
        self.channels.insert(channel.into(), values);
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
