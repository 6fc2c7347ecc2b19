/*!
This module turns raw encoded media samples into FLV tag bodies ready to be published
as RTMP audio and video messages.

The muxer consumes `(payload, presentation time, decode time, keyframe flag)` records
plus out of band format descriptions (AudioSpecificConfig for AAC and the
AVCConfigurationRecord for h.264), and produces tag payloads with relative timestamps.
Timestamps are f64 seconds on the way in and millisecond deltas on the way out, so the
caller can maintain its own running RTMP timestamp per track.
*/

use bytes::Bytes;

const AUDIO_TAG_HEADER: u8 = 0xaf; // AAC, 44khz flag, 16 bit samples, stereo
const AAC_SEQUENCE_HEADER: u8 = 0x00;
const AAC_RAW: u8 = 0x01;

const VIDEO_CODEC_AVC: u8 = 7;
const VIDEO_FRAME_KEY: u8 = 1;
const VIDEO_FRAME_INTER: u8 = 2;
const AVC_SEQUENCE_HEADER: u8 = 0x00;
const AVC_NALU: u8 = 0x01;

/// A muxed FLV tag body with the timestamp delta (in milliseconds) relative to the
/// previous tag emitted for the same track
#[derive(PartialEq, Debug)]
pub struct MuxedTag {
    pub data: Bytes,
    pub timestamp_delta: u32,
}

/// Packages encoded AAC and h.264 samples into FLV tag bodies
pub struct FlvMuxer {
    audio_config: Option<Vec<u8>>,
    video_config: Option<Vec<u8>>,
    last_audio_time: Option<f64>,
    last_video_time: Option<f64>,
}

impl FlvMuxer {
    pub fn new() -> FlvMuxer {
        FlvMuxer {
            audio_config: None,
            video_config: None,
            last_audio_time: None,
            last_video_time: None,
        }
    }

    /// Sets the AudioSpecificConfig for the audio track.  Returns an AAC sequence header
    /// tag the first time a config is seen (and whenever it changes).  Re-setting an
    /// identical config produces nothing.
    pub fn set_audio_config(&mut self, config: &[u8]) -> Option<MuxedTag> {
        if self.audio_config.as_ref().map(|x| &x[..]) == Some(config) {
            return None;
        }

        self.audio_config = Some(config.to_vec());

        let mut data = Vec::with_capacity(config.len() + 2);
        data.push(AUDIO_TAG_HEADER);
        data.push(AAC_SEQUENCE_HEADER);
        data.extend_from_slice(config);

        Some(MuxedTag {
            data: Bytes::from(data),
            timestamp_delta: 0,
        })
    }

    /// Packages one raw AAC sample.  Samples whose presentation time went backwards are
    /// dropped without affecting the timestamp state.
    pub fn mux_audio(&mut self, payload: &[u8], presentation_time: f64) -> Option<MuxedTag> {
        let delta = match self.last_audio_time {
            None => 0,
            Some(previous) => {
                if presentation_time < previous {
                    return None;
                }

                ((presentation_time - previous) * 1000.0) as u32
            }
        };

        self.last_audio_time = Some(presentation_time);

        let mut data = Vec::with_capacity(payload.len() + 2);
        data.push(AUDIO_TAG_HEADER);
        data.push(AAC_RAW);
        data.extend_from_slice(payload);

        Some(MuxedTag {
            data: Bytes::from(data),
            timestamp_delta: delta,
        })
    }

    /// Sets the AVCConfigurationRecord for the video track.  Returns an AVC sequence
    /// header tag the first time a config is seen (and whenever it changes).  Re-setting
    /// an identical config produces nothing.
    pub fn set_video_config(&mut self, config: &[u8]) -> Option<MuxedTag> {
        if self.video_config.as_ref().map(|x| &x[..]) == Some(config) {
            return None;
        }

        self.video_config = Some(config.to_vec());

        let mut data = Vec::with_capacity(config.len() + 5);
        data.push(VIDEO_FRAME_KEY << 4 | VIDEO_CODEC_AVC);
        data.push(AVC_SEQUENCE_HEADER);
        data.extend_from_slice(&[0, 0, 0]); // composition time
        data.extend_from_slice(config);

        Some(MuxedTag {
            data: Bytes::from(data),
            timestamp_delta: 0,
        })
    }

    /// Packages one h.264 sample (NAL units in AVCC format).
    ///
    /// The timestamp delta is computed from decode time, since that is the order tags
    /// are emitted in when the encoder reorders frames.  When no decode time is
    /// provided it equals the presentation time.  The 3 byte composition time offset of
    /// the tag carries the presentation/decode difference.
    pub fn mux_video(
        &mut self,
        payload: &[u8],
        presentation_time: f64,
        decode_time: Option<f64>,
        is_keyframe: bool,
    ) -> MuxedTag {
        let decode_time = decode_time.unwrap_or(presentation_time);
        let delta = match self.last_video_time {
            None => 0,
            // Negative deltas cannot be represented in FLV tags, so a decode timestamp
            // that went backwards gets clamped to zero.
            Some(previous) => ((decode_time - previous).max(0.0) * 1000.0) as u32,
        };

        self.last_video_time = Some(decode_time);

        let frame_type = if is_keyframe {
            VIDEO_FRAME_KEY
        } else {
            VIDEO_FRAME_INTER
        };

        let composition_time = ((presentation_time - decode_time) * 1000.0) as u32;

        let mut data = Vec::with_capacity(payload.len() + 5);
        data.push(frame_type << 4 | VIDEO_CODEC_AVC);
        data.push(AVC_NALU);
        data.push((composition_time >> 16) as u8);
        data.push((composition_time >> 8) as u8);
        data.push(composition_time as u8);
        data.extend_from_slice(payload);

        MuxedTag {
            data: Bytes::from(data),
            timestamp_delta: delta,
        }
    }
}
