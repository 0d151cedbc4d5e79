use crate::audio::mixer::AudioWindow;
use crate::encode::codec::{CodecChoice, probe_ffmpeg_encoders, select_codecs};
use crate::encode::sink::{EncodedOutput, EncoderConfig, PushGuard, StreamEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::{BACKGROUND_RGBA, FrameRGBA};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Target video bitrate passed to `-b:v`.
    pub video_bitrate: String,
    /// Fixed codec pair. `None` probes `ffmpeg` and walks the fallback chains.
    pub codecs: Option<CodecChoice>,
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            bg_rgba: BACKGROUND_RGBA,
            video_bitrate: "5M".to_owned(),
            codecs: None,
        }
    }
}

/// WebM encoder backed by the system `ffmpeg`.
///
/// Video is streamed to an `ffmpeg` child as raw RGBA while audio windows are buffered to a raw
/// `f32le` file next to it. `finish` muxes the two into the final container.
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
    guard: PushGuard,
    choice: Option<CodecChoice>,
    workdir: Option<tempfile::TempDir>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    audio_out: Option<BufWriter<File>>,

    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    /// Create an encoder. Nothing is spawned until `begin`.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self {
            opts,
            guard: PushGuard::default(),
            choice: None,
            workdir: None,
            child: None,
            stdin: None,
            stderr_drain: None,
            audio_out: None,
            scratch: Vec::new(),
        }
    }

    /// Codec pair picked in `begin`.
    pub fn codecs(&self) -> Option<CodecChoice> {
        self.choice
    }

    fn paths(&self) -> KenBurnsResult<(PathBuf, PathBuf, PathBuf)> {
        let dir = self
            .workdir
            .as_ref()
            .ok_or_else(|| KenBurnsError::encoding("ffmpeg encoder not started"))?
            .path();
        Ok((
            dir.join("video.webm"),
            dir.join("audio.f32le"),
            dir.join("out.webm"),
        ))
    }

    fn wait_video(&mut self) -> KenBurnsResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KenBurnsError::encoding("ffmpeg encoder not started"))?;

        let status = child.wait().map_err(|e| {
            KenBurnsError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KenBurnsError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| KenBurnsError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(KenBurnsError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn teardown(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        drop(self.audio_out.take());
        drop(self.workdir.take());
        self.guard.reset();
    }
}

impl StreamEncoder for FfmpegEncoder {
    fn begin(&mut self, cfg: EncoderConfig) -> KenBurnsResult<()> {
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KenBurnsError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p)",
            ));
        }
        self.teardown();
        self.guard.start(cfg)?;

        let choice = match self.opts.codecs {
            Some(c) => c,
            None => select_codecs(&probe_ffmpeg_encoders()?)?,
        };
        tracing::info!(
            video = choice.video.ffmpeg_encoder(),
            audio = choice.audio.ffmpeg_encoder(),
            mime = %choice.mime(),
            "ffmpeg encoder configured"
        );
        self.choice = Some(choice);

        let workdir = tempfile::Builder::new()
            .prefix("kenburns-")
            .tempdir()
            .map_err(|e| KenBurnsError::encoding(format!("failed to create temp dir: {e}")))?;
        self.workdir = Some(workdir);
        let (video_path, audio_path, _) = self.paths()?;

        let audio_file = File::create(&audio_path).map_err(|e| {
            KenBurnsError::encoding(format!(
                "failed to create audio buffer '{}': {e}",
                audio_path.display()
            ))
        })?;
        self.audio_out = Some(BufWriter::new(audio_file));

        let mut child = Command::new("ffmpeg")
            .args(video_args(&cfg, &choice, &self.opts.video_bitrate, &video_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                KenBurnsError::encoding(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KenBurnsError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KenBurnsError::encoding("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    fn push_frame(
        &mut self,
        idx: FrameIndex,
        frame: &FrameRGBA,
        audio: &AudioWindow,
    ) -> KenBurnsResult<()> {
        self.guard.check(idx, frame, audio)?;

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KenBurnsError::encoding("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            KenBurnsError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        let Some(audio_out) = self.audio_out.as_mut() else {
            return Err(KenBurnsError::encoding("ffmpeg encoder is already finalized"));
        };
        audio_out.write_all(&audio.to_f32le_bytes()).map_err(|e| {
            KenBurnsError::encoding(format!("failed to buffer audio window: {e}"))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> KenBurnsResult<EncodedOutput> {
        let res = self.finish_inner();
        self.teardown();
        res
    }

    fn abort(&mut self) {
        if self.child.is_some() || self.workdir.is_some() {
            tracing::debug!("ffmpeg encoder aborted");
        }
        self.teardown();
    }
}

impl FfmpegEncoder {
    fn finish_inner(&mut self) -> KenBurnsResult<EncodedOutput> {
        let cfg = *self.guard.config()?;
        let choice = self
            .choice
            .ok_or_else(|| KenBurnsError::encoding("ffmpeg encoder not started"))?;

        self.wait_video()?;
        if let Some(mut audio_out) = self.audio_out.take() {
            audio_out
                .flush()
                .map_err(|e| KenBurnsError::encoding(format!("failed to flush audio: {e}")))?;
        }

        let (video_path, audio_path, out_path) = self.paths()?;
        let out = Command::new("ffmpeg")
            .args(mux_args(&cfg, &choice, &video_path, &audio_path, &out_path))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| KenBurnsError::encoding(format!("failed to spawn ffmpeg mux: {e}")))?;
        if !out.status.success() {
            return Err(KenBurnsError::encoding(format!(
                "ffmpeg mux exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let bytes = std::fs::read(&out_path).map_err(|e| {
            KenBurnsError::encoding(format!(
                "failed to read muxed output '{}': {e}",
                out_path.display()
            ))
        })?;
        if bytes.is_empty() {
            return Err(KenBurnsError::encoding("ffmpeg produced an empty output"));
        }
        Ok(EncodedOutput {
            bytes,
            mime: choice.mime(),
        })
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn video_args(
    cfg: &EncoderConfig,
    choice: &CodecChoice,
    bitrate: &str,
    out: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &format!("{}x{}", cfg.width, cfg.height),
        "-r",
        &format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i",
        "pipe:0",
        "-an",
        "-c:v",
        choice.video.ffmpeg_encoder(),
        "-b:v",
        bitrate,
        "-pix_fmt",
        "yuv420p",
        "-deadline",
        "realtime",
        "-cpu-used",
        "8",
        "-f",
        "webm",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(out.as_os_str().to_owned());
    args
}

fn mux_args(
    cfg: &EncoderConfig,
    choice: &CodecChoice,
    video: &Path,
    audio: &Path,
    out: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-loglevel".into(), "error".into()];
    args.push("-i".into());
    args.push(video.as_os_str().to_owned());
    args.extend(
        [
            "-f",
            "f32le",
            "-ar",
            &cfg.sample_rate.to_string(),
            "-ac",
            &cfg.channels.to_string(),
            "-i",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(audio.as_os_str().to_owned());
    args.extend(
        [
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            choice.audio.ffmpeg_encoder(),
            "-f",
            "webm",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(out.as_os_str().to_owned());
    args
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> KenBurnsResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(KenBurnsError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for i in 0..3 {
            d[i] = (u16::from(s[i]) + mul_div255_u16(bg[i], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> KenBurnsResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
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
