use std::ffi::OsString;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use crate::config::Config;
use crate::encode::sink::{FrameSink, check_frame_shape};
use crate::foundation::core::{Frame, FrameShape};
use crate::foundation::error::{CassetteError, CassetteResult};

/// Encoder selected for a codec fourcc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderChoice {
    /// ffmpeg encoder name (`-c:v`).
    pub encoder: &'static str,
    /// Output pixel format (`-pix_fmt`).
    pub pix_fmt: &'static str,
    /// Containers (extensions with the dot) this encoder can be muxed into.
    pub containers: &'static [&'static str],
}

impl EncoderChoice {
    /// Whether the output pixel format subsamples chroma, which needs even frame dimensions.
    pub fn needs_even_dimensions(&self) -> bool {
        self.pix_fmt.ends_with("420p")
    }
}

/// Map a fourcc (case-insensitive) to the ffmpeg encoder that produces it.
pub fn encoder_for_fourcc(fourcc: &str) -> Option<EncoderChoice> {
    let choice = match fourcc.to_ascii_lowercase().as_str() {
        "avc1" | "h264" | "x264" => EncoderChoice {
            encoder: "libx264",
            pix_fmt: "yuv420p",
            containers: &[".mp4", ".mov", ".mkv", ".avi"],
        },
        "hvc1" | "hev1" | "hevc" => EncoderChoice {
            encoder: "libx265",
            pix_fmt: "yuv420p",
            containers: &[".mp4", ".mov", ".mkv"],
        },
        "mp4v" | "fmp4" => EncoderChoice {
            encoder: "mpeg4",
            pix_fmt: "yuv420p",
            containers: &[".mp4", ".mov", ".mkv", ".avi"],
        },
        "vp09" | "vp90" => EncoderChoice {
            encoder: "libvpx-vp9",
            pix_fmt: "yuv420p",
            containers: &[".webm", ".mkv", ".mp4"],
        },
        "mjpg" => EncoderChoice {
            encoder: "mjpeg",
            pix_fmt: "yuvj420p",
            containers: &[".avi", ".mov", ".mkv"],
        },
        _ => return None,
    };
    Some(choice)
}

/// Output path for a stem: the configured format is appended verbatim (`out/demo_py` + `.mp4`).
pub fn video_path(stem: &Path, config: &Config) -> PathBuf {
    let mut s = OsString::from(stem.as_os_str());
    s.push(&config.output_format);
    PathBuf::from(s)
}

/// Streams RGB frames into the system `ffmpeg` binary.
///
/// `ffmpeg` is spawned on [`VideoWriter::open`] and reads raw `rgb24` frames from stdin. A
/// process killed before [`FrameSink::release`] leaves a truncated container behind.
pub struct VideoWriter {
    path: PathBuf,
    shape: FrameShape,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    frames_written: u64,
}

impl std::fmt::Debug for VideoWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoWriter")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("frames_written", &self.frames_written)
            .field("released", &self.stdin.is_none())
            .finish()
    }
}

impl VideoWriter {
    /// Create (or overwrite) `stem + config.output_format` for frames of `shape`.
    #[tracing::instrument(skip(config), fields(codec = %config.codec, fps = config.fps))]
    pub fn open(stem: &Path, config: &Config, shape: FrameShape) -> CassetteResult<Self> {
        let path = video_path(stem, config);
        let choice = encoder_for_fourcc(&config.codec).ok_or_else(|| {
            CassetteError::writer_open(format!("unsupported codec fourcc '{}'", config.codec))
        })?;
        let container = config.output_format.to_ascii_lowercase();
        if !choice.containers.contains(&container.as_str()) {
            return Err(CassetteError::writer_open(format!(
                "codec '{}' ({}) cannot be written to '{}' containers",
                config.codec, choice.encoder, config.output_format
            )));
        }
        if config.fps == 0 {
            return Err(CassetteError::writer_open("fps must be non-zero"));
        }
        if shape.width == 0 || shape.height == 0 {
            return Err(CassetteError::writer_open(
                "frame width/height must be non-zero",
            ));
        }
        if choice.needs_even_dimensions() && !shape.is_even() {
            return Err(CassetteError::writer_open(format!(
                "frame shape {shape} must have even dimensions for {}",
                choice.pix_fmt
            )));
        }

        ensure_parent_dir(&path)?;
        if !is_ffmpeg_on_path() {
            return Err(CassetteError::writer_open(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }
        check_encoder_available(&choice, &available_video_encoders()?)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", shape.width, shape.height),
            "-r",
            &config.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            choice.encoder,
            "-pix_fmt",
            choice.pix_fmt,
        ]);
        if matches!(container.as_str(), ".mp4" | ".mov") {
            cmd.args(["-movflags", "+faststart"]);
        }
        if choice.encoder == "libx264" || choice.encoder == "libx265" {
            // Tag HEVC as hvc1 / H.264 as avc1 so players that check the fourcc accept the file.
            let tag = if choice.encoder == "libx265" { "hvc1" } else { "avc1" };
            if container != ".avi" && container != ".mkv" {
                cmd.args(["-tag:v", tag]);
            }
        }
        cmd.arg(&path);

        let mut child = cmd.spawn().map_err(|e| {
            CassetteError::writer_open(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child.stdin.take().ok_or_else(|| {
            CassetteError::writer_open("failed to open ffmpeg stdin (unexpected)")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            CassetteError::writer_open("failed to open ffmpeg stderr (unexpected)")
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::info!(path = %path.display(), %shape, encoder = choice.encoder, "opened video writer");
        Ok(Self {
            path,
            shape,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl VideoWriter {
    /// Close stdin, reap ffmpeg and collect its stderr. The writer counts as released afterwards.
    fn finish(&mut self) -> CassetteResult<(ExitStatus, String)> {
        drop(self.stdin.take());

        let mut child = self
            .child
            .take()
            .ok_or_else(|| CassetteError::encode("ffmpeg process missing (unexpected)"))?;
        let status = child.wait().map_err(|e| {
            CassetteError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CassetteError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| CassetteError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();
        Ok((status, stderr))
    }
}

impl FrameSink for VideoWriter {
    fn shape(&self) -> FrameShape {
        self.shape
    }

    fn write(&mut self, frame: &Frame) -> CassetteResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CassetteError::WriterClosed);
        };
        check_frame_shape(frame, self.shape)?;

        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // ffmpeg usually closed the pipe because it failed; its stderr says why.
            let detail = match self.finish() {
                Ok((status, stderr)) => format!("ffmpeg exited with status {status}: {stderr}"),
                Err(finish_err) => finish_err.to_string(),
            };
            return Err(CassetteError::encode(format!(
                "failed to write frame to ffmpeg stdin: {e} ({detail})"
            )));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn release(&mut self) -> CassetteResult<()> {
        if self.stdin.is_none() {
            return Err(CassetteError::WriterClosed);
        }
        let (status, stderr) = self.finish()?;
        if !status.success() {
            return Err(CassetteError::encode(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        tracing::info!(
            path = %self.path.display(),
            frames = self.frames_written,
            "finalized video"
        );
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CassetteResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Names of the video encoders the local `ffmpeg` build provides.
pub fn available_video_encoders() -> CassetteResult<Vec<String>> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CassetteError::writer_open(format!("failed to list ffmpeg encoders: {e}")))?;
    if !out.status.success() {
        return Err(CassetteError::writer_open(format!(
            "ffmpeg -encoders failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(parse_video_encoders(&String::from_utf8_lossy(&out.stdout)))
}

/// Parse `ffmpeg -encoders` output: a legend, a `------` rule, then one `FLAGS name description`
/// row per encoder. Video encoders have `V` as their first flag.
pub fn parse_video_encoders(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// Fail with `WriterOpen` when `choice` needs an encoder the local ffmpeg lacks.
pub fn check_encoder_available(choice: &EncoderChoice, available: &[String]) -> CassetteResult<()> {
    if available.iter().any(|name| name == choice.encoder) {
        return Ok(());
    }
    Err(CassetteError::writer_open(format!(
        "this ffmpeg build has no '{}' encoder",
        choice.encoder
    )))
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
