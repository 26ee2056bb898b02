//! First/last frame extraction for rendered videos, via `ffprobe` and `ffmpeg`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;

use crate::foundation::core::FrameShape;
use crate::foundation::error::{CassetteError, CassetteResult};

/// Basic facts about a video stream.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

impl VideoInfo {
    pub fn shape(&self) -> FrameShape {
        FrameShape::new(self.height, self.width)
    }

    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// Paths written by [`write_snapshots`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub first: PathBuf,
    pub last: PathBuf,
}

pub fn probe_video(path: &Path) -> CassetteResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| CassetteError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CassetteError::media(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| CassetteError::media(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CassetteError::media(format!("no video stream in '{}'", path.display())))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(CassetteError::media("missing video dimensions from ffprobe")),
    };
    let (fps_num, fps_den) = parse_ff_ratio(stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| CassetteError::media("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        path: path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Decode the first and the last frame of a video.
#[tracing::instrument]
pub fn first_and_last_frames(path: &Path) -> CassetteResult<(RgbImage, RgbImage)> {
    let info = probe_video(path)?;
    let first = decode_frames(&info, &[], &["-frames:v", "1"])?;
    // Seek close to the end and keep the last complete frame decoded from there.
    let tail = decode_frames(&info, &["-sseof", "-1"], &[])?;

    let first = frame_at(&info, &first, 0)?;
    let n_tail = tail.len() / info.shape().rgb_len();
    let last = frame_at(&info, &tail, n_tail.saturating_sub(1))?;
    Ok((first, last))
}

/// Save `<stem>_first.png` and `<stem>_last.png` next to the video.
pub fn write_snapshots(path: &Path) -> CassetteResult<SnapshotPaths> {
    let (first, last) = first_and_last_frames(path)?;
    let paths = snapshot_paths(path);
    for (img, out) in [(&first, &paths.first), (&last, &paths.last)] {
        img.save(out).map_err(|e| {
            CassetteError::media(format!("failed to save snapshot '{}': {e}", out.display()))
        })?;
    }
    tracing::info!(
        first = %paths.first.display(),
        last = %paths.last.display(),
        "wrote snapshots"
    );
    Ok(paths)
}

/// Write snapshots for every `*.ext` file in `dir`, in name order.
pub fn snapshot_dir(dir: &Path, ext: &str) -> CassetteResult<Vec<SnapshotPaths>> {
    let ext = ext.trim_start_matches('.');
    let entries = std::fs::read_dir(dir).map_err(|e| CassetteError::file_read(dir, e))?;
    let mut videos = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CassetteError::file_read(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)) {
            videos.push(path);
        }
    }
    videos.sort();
    if videos.is_empty() {
        tracing::warn!(dir = %dir.display(), ext, "no videos found");
    }
    videos.iter().map(|v| write_snapshots(v)).collect()
}

/// `<dir>/<stem>_first.png` and `<dir>/<stem>_last.png` for a video path.
pub fn snapshot_paths(video: &Path) -> SnapshotPaths {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = video.parent().unwrap_or_else(|| Path::new(""));
    SnapshotPaths {
        first: dir.join(format!("{stem}_first.png")),
        last: dir.join(format!("{stem}_last.png")),
    }
}

fn decode_frames(
    info: &VideoInfo,
    input_args: &[&str],
    output_args: &[&str],
) -> CassetteResult<Vec<u8>> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error"])
        .args(input_args)
        .arg("-i")
        .arg(&info.path)
        .args(output_args)
        .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
        .output()
        .map_err(|e| CassetteError::media(format!("failed to run ffmpeg for decode: {e}")))?;
    if !out.status.success() {
        return Err(CassetteError::media(format!(
            "ffmpeg decode failed for '{}': {}",
            info.path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(out.stdout)
}

fn frame_at(info: &VideoInfo, raw: &[u8], index: usize) -> CassetteResult<RgbImage> {
    let len = info.shape().rgb_len();
    let start = index * len;
    let bytes = raw.get(start..start + len).ok_or_else(|| {
        CassetteError::media(format!(
            "decoded {} bytes from '{}', need a complete {} frame",
            raw.len(),
            info.path.display(),
            info.shape()
        ))
    })?;
    RgbImage::from_raw(info.width, info.height, bytes.to_vec())
        .ok_or_else(|| CassetteError::media("decoded frame buffer has the wrong size"))
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.split_once('/')?;
    Some((num.trim().parse().ok()?, den.trim().parse().ok()?))
}

#[cfg(test)]
#[path = "../../tests/unit/media/snapshot.rs"]
mod tests;
