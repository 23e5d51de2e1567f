//! LibAV media adapter
//!
//! Opens both halves of a match once and serves every frame or clip request of
//! a batch from those two inputs. Each half keeps its own demuxer and video
//! decoder; a request seeks the half, flushes its decoder and decodes forward
//! to the requested position. Everything is released when the
//! [`LibavMatchMedia`] is dropped.

use std::path::{Path, PathBuf};

use ffmpeg_next::codec::threading;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::{codec, decoder, encoder, format, frame, media, picture, Dictionary, Packet, Rational};
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::{MediaError, MediaResult};
use crate::ports::*;

/// Media adapter backed by ffmpeg-next
pub struct LibavMediaAdapter {
    encoding: EncodingConfig,
}

impl LibavMediaAdapter {
    /// Create new adapter; initializes FFmpeg
    pub fn new(encoding: EncodingConfig) -> Result<Self, DomainError> {
        ffmpeg_next::init().map_err(|e| MediaError::FFmpegInitError {
            message: e.to_string(),
        })?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);

        Ok(Self { encoding })
    }
}

impl MediaPort for LibavMediaAdapter {
    fn open_match(&self, halves: &HalfPair<PathBuf>) -> Result<Box<dyn MatchMedia>, DomainError> {
        let threads = self.encoding.threads;
        let sources = halves
            .clone()
            .try_map(|path| HalfSource::open(&path, threads))?;

        debug!(
            first_fps = sources.first.info.fps,
            second_fps = sources.second.info.fps,
            "Opened match sources"
        );

        Ok(Box::new(LibavMatchMedia {
            sources,
            encoding: self.encoding.clone(),
        }))
    }
}

/// Both open halves of a match
pub struct LibavMatchMedia {
    sources: HalfPair<HalfSource>,
    encoding: EncodingConfig,
}

impl MatchMedia for LibavMatchMedia {
    fn half_info(&self, half: Half) -> HalfInfo {
        self.sources.get(half).info
    }

    fn extract_frame(&mut self, half: Half, frame_index: i64, destination: &Path) -> Result<(), DomainError> {
        let source = self.sources.get_mut(half);
        let decoded = source.decode_frame(frame_index)?;
        save_frame(&decoded, destination).map_err(|e| {
            let _ = std::fs::remove_file(destination);
            DomainError::from(e)
        })
    }

    fn extract_clip(&mut self, half: Half, range: &ClipRange, destination: &Path) -> Result<(), DomainError> {
        let source = self.sources.get_mut(half);
        match source.write_clip(range, destination, &self.encoding) {
            Ok(summary) => {
                debug!(
                    frames = summary.frames,
                    first_frame = ?summary.first_frame_seconds,
                    path = %destination.display(),
                    "Clip written"
                );
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(destination);
                Err(e.into())
            }
        }
    }
}

/// One opened half: demuxer, video decoder and stream properties
struct HalfSource {
    path: PathBuf,
    input: format::context::Input,
    decoder: decoder::Video,
    stream_index: usize,
    time_base: Rational,
    frame_rate: Rational,
    start_pts: i64,
    info: HalfInfo,
}

impl HalfSource {
    fn open(path: &Path, threads: usize) -> MediaResult<Self> {
        let display = path.display().to_string();
        let input = format::input(path).map_err(|e| MediaError::OpenError {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let stream = input
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| MediaError::NoVideoStream { path: display.clone() })?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let frame_rate = [stream.avg_frame_rate(), stream.rate()]
            .into_iter()
            .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
            .ok_or_else(|| MediaError::UnknownFrameRate { path: display.clone() })?;
        let fps = f64::from(frame_rate);

        let start_pts = stream_start(&stream);

        let duration_secs = if stream.duration() > 0 {
            stream.duration() as f64 * f64::from(time_base)
        } else if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        // Matroska does not store a frame count; estimate it like OpenCV does.
        let total_frames = if stream.frames() > 0 {
            stream.frames()
        } else {
            (duration_secs * fps).round() as i64
        };

        let mut context = codec::context::Context::from_parameters(stream.parameters())?;
        if threads > 0 {
            context.set_threading(threading::Config {
                kind: threading::Type::Frame,
                count: threads,
                ..Default::default()
            });
        }
        let decoder = context.decoder().video()?;

        Ok(Self {
            path: path.to_path_buf(),
            input,
            decoder,
            stream_index,
            time_base,
            frame_rate,
            start_pts,
            info: HalfInfo {
                fps,
                total_frames,
                duration_secs,
            },
        })
    }

    /// Seek to the keyframe at or before `seconds` and reset the decoder
    fn seek(&mut self, seconds: f64) -> MediaResult<()> {
        let offset = self.start_pts as f64 * f64::from(self.time_base);
        let target = ((offset + seconds.max(0.0)) * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        self.input.seek(target, ..target)?;
        self.decoder.flush();
        Ok(())
    }

    /// Decode exactly the frame at `frame_index`
    fn decode_frame(&mut self, frame_index: i64) -> MediaResult<frame::Video> {
        let decode_error = |message: String| MediaError::DecodeError {
            frame: frame_index,
            message,
        };

        let target = frame_index as f64 / self.info.fps;
        self.seek(target)?;

        let stream_index = self.stream_index;
        let clock = StreamClock::new(self.start_pts, self.time_base);
        // half a frame of slack for timestamp rounding
        let slack = 0.5 / self.info.fps;
        let mut decoded = frame::Video::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            self.decoder
                .send_packet(&packet)
                .map_err(|e| decode_error(e.to_string()))?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if clock.reached(&decoded, target - slack) {
                    return Ok(decoded);
                }
            }
        }

        self.decoder
            .send_eof()
            .map_err(|e| decode_error(e.to_string()))?;
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            if clock.reached(&decoded, target - slack) {
                return Ok(decoded);
            }
        }

        Err(decode_error(format!(
            "{} ended before the frame was reached",
            self.path.display()
        )))
    }

    /// Cut `range` into a new file
    fn write_clip(&mut self, range: &ClipRange, destination: &Path, encoding: &EncodingConfig) -> MediaResult<ClipSummary> {
        let audio = self
            .input
            .streams()
            .best(media::Type::Audio)
            .map(|stream| AudioSource {
                index: stream.index(),
                time_base: stream.time_base(),
                parameters: stream.parameters(),
            });

        let mut writer = ClipWriter::new(self, audio, *range, destination, encoding)?;
        self.seek(range.start)?;

        let stream_index = self.stream_index;
        for (stream, packet) in self.input.packets() {
            if stream.index() == stream_index {
                if !writer.video_done {
                    self.decoder.send_packet(&packet)?;
                    writer.receive_frames(&mut self.decoder)?;
                }
            } else if writer.is_audio_input(stream.index()) {
                writer.write_audio(packet)?;
            }

            if writer.is_complete() {
                break;
            }
        }

        // Source ended inside the range: the clip is truncated to what exists.
        if !writer.video_done {
            self.decoder.send_eof()?;
            writer.receive_frames(&mut self.decoder)?;
        }

        writer.finish()
    }
}

/// Stream start in its own time base; unknown starts count as zero
fn stream_start(stream: &format::stream::Stream) -> i64 {
    match stream.start_time() {
        ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
        start => start,
    }
}

/// What a finished clip contains
#[derive(Debug, Clone, Copy)]
struct ClipSummary {
    frames: u64,
    /// Source position of the first encoded frame, in seconds from the half start
    first_frame_seconds: Option<f64>,
}

/// Converts stream timestamps to seconds from the start of the half
#[derive(Clone, Copy)]
struct StreamClock {
    start_pts: i64,
    time_base: f64,
}

impl StreamClock {
    fn new(start_pts: i64, time_base: Rational) -> Self {
        Self {
            start_pts,
            time_base: f64::from(time_base),
        }
    }

    /// Same origin expressed in another stream's time base
    fn rebased(&self, time_base: Rational) -> Self {
        let target = f64::from(time_base);
        Self {
            start_pts: (self.start_pts as f64 * self.time_base / target).round() as i64,
            time_base: target,
        }
    }

    fn seconds(&self, timestamp: i64) -> f64 {
        (timestamp - self.start_pts) as f64 * self.time_base
    }

    fn frame_seconds(&self, frame: &frame::Video) -> Option<f64> {
        frame.timestamp().or(frame.pts()).map(|ts| self.seconds(ts))
    }

    /// Frames without any timestamp are taken as reached
    fn reached(&self, frame: &frame::Video, seconds: f64) -> bool {
        self.frame_seconds(frame).map_or(true, |at| at >= seconds)
    }
}

/// Input audio stream picked for a clip
struct AudioSource {
    index: usize,
    time_base: Rational,
    parameters: codec::Parameters,
}

/// Audio stream carried into a clip by packet copy
struct AudioCopy {
    input_index: usize,
    input_time_base: Rational,
    output_index: usize,
    output_time_base: Rational,
    clock: StreamClock,
    done: bool,
}

/// Output side of one clip: muxer, video encoder and audio passthrough
struct ClipWriter {
    output: format::context::Output,
    encoder: encoder::video::Encoder,
    scaler: Option<scaling::Context>,
    decoded: frame::Video,
    converted: frame::Video,
    range: ClipRange,
    clock: StreamClock,
    slack: f64,
    video_time_base: Rational,
    video_output_index: usize,
    video_output_time_base: Rational,
    last_video_pts: Option<i64>,
    first_frame_seconds: Option<f64>,
    frames_encoded: u64,
    video_done: bool,
    audio: Option<AudioCopy>,
}

impl ClipWriter {
    fn new(
        source: &HalfSource,
        audio: Option<AudioSource>,
        range: ClipRange,
        destination: &Path,
        encoding: &EncodingConfig,
    ) -> MediaResult<Self> {
        let mut output = format::output(destination).map_err(|e| MediaError::EncodeError {
            message: format!("cannot create {}: {}", destination.display(), e),
        })?;
        let global_header = output.format().flags().contains(format::Flags::GLOBAL_HEADER);

        let codec = encoder::find_by_name(&encoding.video_codec).ok_or_else(|| MediaError::EncoderNotFound {
            name: encoding.video_codec.clone(),
        })?;

        let width = source.decoder.width();
        let height = source.decoder.height();

        let mut video_stream = output.add_stream(codec)?;
        let video_output_index = video_stream.index();

        let mut context = codec::context::Context::new_with_codec(codec);
        if encoding.threads > 0 {
            context.set_threading(threading::Config {
                kind: threading::Type::Frame,
                count: encoding.threads,
                ..Default::default()
            });
        }
        let mut video = context.encoder().video()?;
        video.set_width(width);
        video.set_height(height);
        video.set_aspect_ratio(source.decoder.aspect_ratio());
        video.set_format(Pixel::YUV420P);
        video.set_frame_rate(Some(source.frame_rate));
        video.set_time_base(source.time_base);
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut options = Dictionary::new();
        options.set("preset", &encoding.preset);
        options.set("crf", &encoding.crf.to_string());
        let encoder = video.open_with(options).map_err(|e| MediaError::EncodeError {
            message: format!("cannot open encoder {}: {}", encoding.video_codec, e),
        })?;
        video_stream.set_parameters(&encoder);

        let scaler = if source.decoder.format() != Pixel::YUV420P {
            Some(scaling::Context::get(
                source.decoder.format(),
                width,
                height,
                Pixel::YUV420P,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?)
        } else {
            None
        };

        let audio_output = match audio {
            Some(input) => {
                let mut stream = output.add_stream(encoder::find(codec::Id::None))?;
                stream.set_parameters(input.parameters.clone());
                let output_index = stream.index();
                Some((input, output_index))
            }
            None => None,
        };

        output.write_header()?;

        let time_base_of = |output: &format::context::Output, index: usize| {
            output
                .stream(index)
                .map(|stream| stream.time_base())
                .ok_or_else(|| MediaError::EncodeError {
                    message: format!("output stream {} missing after header", index),
                })
        };
        let video_output_time_base = time_base_of(&output, video_output_index)?;
        // Audio is timed from the video start so both tracks share one timeline.
        let clock = StreamClock::new(source.start_pts, source.time_base);
        let audio = match audio_output {
            Some((input, output_index)) => Some(AudioCopy {
                input_index: input.index,
                input_time_base: input.time_base,
                output_index,
                output_time_base: time_base_of(&output, output_index)?,
                clock: clock.rebased(input.time_base),
                done: false,
            }),
            None => None,
        };

        Ok(Self {
            output,
            encoder,
            scaler,
            decoded: frame::Video::empty(),
            converted: frame::Video::empty(),
            range,
            clock,
            slack: 0.5 / source.info.fps,
            video_time_base: source.time_base,
            video_output_index,
            video_output_time_base,
            last_video_pts: None,
            first_frame_seconds: None,
            frames_encoded: 0,
            video_done: false,
            audio,
        })
    }

    fn is_audio_input(&self, index: usize) -> bool {
        self.audio.as_ref().map_or(false, |audio| audio.input_index == index)
    }

    fn is_complete(&self) -> bool {
        self.video_done && self.audio.as_ref().map_or(true, |audio| audio.done)
    }

    /// Pull every available frame from the decoder and encode those inside the range
    fn receive_frames(&mut self, decoder: &mut decoder::Video) -> MediaResult<()> {
        while decoder.receive_frame(&mut self.decoded).is_ok() {
            if self.video_done {
                continue;
            }
            let Some(seconds) = self.clock.frame_seconds(&self.decoded) else {
                continue;
            };
            if seconds + self.slack < self.range.start {
                continue;
            }
            if seconds >= self.range.end {
                self.video_done = true;
                continue;
            }
            self.encode_decoded(seconds)?;
        }
        Ok(())
    }

    fn encode_decoded(&mut self, seconds: f64) -> MediaResult<()> {
        let relative = ((seconds - self.range.start) / f64::from(self.video_time_base)).round() as i64;
        let pts = match self.last_video_pts {
            Some(last) if relative <= last => last + 1,
            _ => relative.max(0),
        };

        let frame = match self.scaler.as_mut() {
            Some(scaler) => {
                scaler.run(&self.decoded, &mut self.converted)?;
                &mut self.converted
            }
            None => &mut self.decoded,
        };
        frame.set_pts(Some(pts));
        frame.set_kind(picture::Type::None);
        self.encoder.send_frame(frame)?;

        self.last_video_pts = Some(pts);
        self.first_frame_seconds.get_or_insert(seconds);
        self.frames_encoded += 1;
        self.drain_encoder()
    }

    fn drain_encoder(&mut self) -> MediaResult<()> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.video_output_index);
            packet.rescale_ts(self.video_time_base, self.video_output_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }

    /// Copy an audio packet if it falls inside the range, rebased to the clip start
    fn write_audio(&mut self, mut packet: Packet) -> MediaResult<()> {
        let Some(audio) = self.audio.as_mut() else {
            return Ok(());
        };
        if audio.done {
            return Ok(());
        }
        let Some(timestamp) = packet.pts().or(packet.dts()) else {
            return Ok(());
        };

        let seconds = audio.clock.seconds(timestamp);
        if seconds >= self.range.end {
            audio.done = true;
            return Ok(());
        }
        if seconds < self.range.start {
            return Ok(());
        }

        let offset =
            audio.clock.start_pts + (self.range.start / f64::from(audio.input_time_base)).round() as i64;
        packet.set_pts(packet.pts().map(|pts| pts - offset));
        packet.set_dts(packet.dts().map(|dts| dts - offset));
        packet.set_position(-1);
        packet.set_stream(audio.output_index);
        packet.rescale_ts(audio.input_time_base, audio.output_time_base);
        packet.write_interleaved(&mut self.output)?;
        Ok(())
    }

    /// Flush the encoder and finalize the container
    fn finish(mut self) -> MediaResult<ClipSummary> {
        self.encoder.send_eof()?;
        self.drain_encoder()?;
        self.output.write_trailer()?;

        if self.frames_encoded == 0 {
            return Err(MediaError::EncodeError {
                message: format!(
                    "no video frames between {:.3}s and {:.3}s",
                    self.range.start, self.range.end
                ),
            });
        }
        Ok(ClipSummary {
            frames: self.frames_encoded,
            first_frame_seconds: self.first_frame_seconds,
        })
    }
}

/// Convert a decoded frame to RGB and write it; the format follows the file extension
fn save_frame(decoded: &frame::Video, destination: &Path) -> MediaResult<()> {
    let width = decoded.width();
    let height = decoded.height();

    let mut scaler = scaling::Context::get(
        decoded.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        scaling::Flags::BILINEAR,
    )?;
    let mut rgb = frame::Video::empty();
    scaler.run(decoded, &mut rgb)?;

    let stride = rgb.stride(0);
    let row_len = width as usize * 3;
    let mut buffer = Vec::with_capacity(row_len * height as usize);
    for row in rgb.data(0).chunks(stride).take(height as usize) {
        let pixels = row.get(..row_len).ok_or_else(|| MediaError::DecodeError {
            frame: -1,
            message: "converted frame row shorter than its width".to_string(),
        })?;
        buffer.extend_from_slice(pixels);
    }

    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| MediaError::DecodeError {
        frame: -1,
        message: "converted frame has an unexpected size".to_string(),
    })?;
    image.save(destination)?;
    Ok(())
}
