/// Capabilities advertised to the server during negotiation.
///
/// The engine does not interpret these; the server decides which delivery
/// strategy the device can handle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceProfile {
    pub name: String,
    pub max_streaming_bitrate: Option<u64>,
    pub max_audio_channels: Option<u8>,
    pub direct_play_containers: Vec<String>,
    pub video_codecs: Vec<String>,
    pub audio_codecs: Vec<String>,
    pub subtitle_formats: Vec<String>,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Bitrate cap for a request: the lower of the request and device caps.
    pub fn effective_bitrate(&self, requested: Option<u64>) -> Option<u64> {
        match (self.max_streaming_bitrate, requested) {
            (Some(device), Some(requested)) => Some(device.min(requested)),
            (device, requested) => device.or(requested),
        }
    }
}
