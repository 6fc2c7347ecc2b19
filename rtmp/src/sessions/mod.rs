/*!
This module contains the client session abstraction.

A session reacts to incoming RTMP messages (encoded as RTMP chunks) with packets to be
sent as a response, as well as raising events that applications can perform custom logic
on.  Sessions never perform any network I/O themselves.
*/

mod client;

pub use self::client::ClientSession;
pub use self::client::ClientSessionConfig;
pub use self::client::ClientSessionError;
pub use self::client::ClientSessionEvent;
pub use self::client::ClientSessionResult;
pub use self::client::ClientState;
pub use self::client::PublishRequestType;

use freshet_amf0::{Amf0Object, Amf0Value};

/// Contains the metadata information a stream may advertise on publishing
#[derive(PartialEq, Debug, Clone)]
pub struct StreamMetadata {
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub video_codec: Option<String>,
    pub video_frame_rate: Option<f32>,
    pub video_bitrate_kbps: Option<u32>,
    pub audio_codec: Option<String>,
    pub audio_bitrate_kbps: Option<u32>,
    pub audio_sample_rate: Option<u32>,
    pub audio_channels: Option<u32>,
    pub audio_is_stereo: Option<bool>,
    pub encoder: Option<String>,
}

impl StreamMetadata {
    pub fn new() -> StreamMetadata {
        StreamMetadata {
            video_width: None,
            video_height: None,
            video_codec: None,
            video_frame_rate: None,
            video_bitrate_kbps: None,
            audio_codec: None,
            audio_bitrate_kbps: None,
            audio_sample_rate: None,
            audio_channels: None,
            audio_is_stereo: None,
            encoder: None,
        }
    }

    /// Fills in metadata fields from the properties of an `onMetaData` amf0 object
    fn apply_metadata_values(&mut self, properties: &Amf0Object) {
        for (key, value) in properties.iter() {
            match key.as_str() {
                "width" => self.video_width = value.clone().get_number().map(|x| x as u32),
                "height" => self.video_height = value.clone().get_number().map(|x| x as u32),
                "videocodecid" => self.video_codec = get_codec_name(value),
                "videodatarate" => {
                    self.video_bitrate_kbps = value.clone().get_number().map(|x| x as u32)
                }
                "framerate" => self.video_frame_rate = value.clone().get_number().map(|x| x as f32),
                "audiocodecid" => self.audio_codec = get_codec_name(value),
                "audiodatarate" => {
                    self.audio_bitrate_kbps = value.clone().get_number().map(|x| x as u32)
                }
                "audiosamplerate" => {
                    self.audio_sample_rate = value.clone().get_number().map(|x| x as u32)
                }
                "audiochannels" => self.audio_channels = value.clone().get_number().map(|x| x as u32),
                "stereo" => self.audio_is_stereo = value.clone().get_boolean(),
                "encoder" => self.encoder = value.clone().get_string(),
                _ => (),
            }
        }
    }

    /// Turns the known metadata fields into an amf0 object suitable for an `onMetaData`
    /// data message
    fn to_amf0_object(&self) -> Amf0Object {
        let mut object = Amf0Object::new();

        if let Some(x) = self.video_width {
            object.insert("width", Amf0Value::Number(x as f64));
        }
        if let Some(x) = self.video_height {
            object.insert("height", Amf0Value::Number(x as f64));
        }
        if let Some(ref x) = self.video_codec {
            object.insert("videocodecid", Amf0Value::Utf8String(x.clone()));
        }
        if let Some(x) = self.video_bitrate_kbps {
            object.insert("videodatarate", Amf0Value::Number(x as f64));
        }
        if let Some(x) = self.video_frame_rate {
            object.insert("framerate", Amf0Value::Number(x as f64));
        }
        if let Some(ref x) = self.audio_codec {
            object.insert("audiocodecid", Amf0Value::Utf8String(x.clone()));
        }
        if let Some(x) = self.audio_bitrate_kbps {
            object.insert("audiodatarate", Amf0Value::Number(x as f64));
        }
        if let Some(x) = self.audio_sample_rate {
            object.insert("audiosamplerate", Amf0Value::Number(x as f64));
        }
        if let Some(x) = self.audio_channels {
            object.insert("audiochannels", Amf0Value::Number(x as f64));
        }
        if let Some(x) = self.audio_is_stereo {
            object.insert("stereo", Amf0Value::Boolean(x));
        }
        if let Some(ref x) = self.encoder {
            object.insert("encoder", Amf0Value::Utf8String(x.clone()));
        }

        object
    }
}

// Codec ids may come over the wire as either a string or the numeric FLV codec id
fn get_codec_name(value: &Amf0Value) -> Option<String> {
    match *value {
        Amf0Value::Utf8String(ref name) => Some(name.clone()),
        Amf0Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
