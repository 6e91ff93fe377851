//! Conversion of encrypted `.dat` image containers into viewable images.
//!
//! Decryption itself is an injected capability ([`Decryptor`]). The
//! transcoder decides when to call it, names the output after the sniffed
//! image format and caches by output file name.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use chatlog_shared::constants::ENCRYPTED_IMAGE_EXT;
use chatlog_shared::DiagnosticSink;

use crate::error::{MediaError, Result};

/// External decryption capability for `.dat` containers.
pub trait Decryptor: Send + Sync {
    /// Decrypt `encrypted` and write the plain bytes to `output`.
    fn decrypt(&self, encrypted: &Path, output: &Path) -> Result<()>;
}

/// Used when no decryption capability is configured; always fails, so
/// images degrade to their encrypted path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDecryptor;

impl Decryptor for UnavailableDecryptor {
    fn decrypt(&self, _encrypted: &Path, _output: &Path) -> Result<()> {
        Err(MediaError::DecryptorUnavailable)
    }
}

/// Runs an external program as `<program> [args..] <encrypted> <output>`.
#[derive(Debug, Clone)]
pub struct CommandDecryptor {
    program: String,
    args: Vec<String>,
}

impl CommandDecryptor {
    /// Build from a whitespace-separated command line. Returns `None` for a
    /// blank command.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Decryptor for CommandDecryptor {
    fn decrypt(&self, encrypted: &Path, output: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(encrypted)
            .arg(output)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::Decrypt(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

/// Image formats recognised from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    const ALL: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

    /// Unrecognised or short (< 4 bytes) payloads count as JPEG.
    pub fn sniff(head: &[u8]) -> Self {
        match head {
            [0xFF, 0xD8, _, _, ..] => Self::Jpeg,
            [0x89, 0x50, 0x4E, 0x47, ..] => Self::Png,
            [0x47, 0x49, 0x46, _, ..] => Self::Gif,
            _ => Self::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

pub struct Transcoder {
    decryptor: Arc<dyn Decryptor>,
    output_dir: PathBuf,
    sink: Arc<dyn DiagnosticSink>,
}

impl Transcoder {
    pub fn new(
        decryptor: Arc<dyn Decryptor>,
        output_dir: impl Into<PathBuf>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            decryptor,
            output_dir: output_dir.into(),
            sink,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Return a viewable path for `original`.
    ///
    /// Missing files and anything that is not a `.dat` container pass
    /// through unchanged. Failures are reported and also yield `original`.
    pub fn to_viewable(&self, original: &Path, server_id: &str) -> PathBuf {
        if !original.is_file() || !is_encrypted_container(original) {
            return original.to_path_buf();
        }

        match self.transcode(original) {
            Ok(target) => target,
            Err(e) => {
                let shown = original.display().to_string();
                self.sink.warn(
                    "transcode_failed",
                    &[
                        ("path", shown.as_str()),
                        ("server_id", server_id),
                        ("error", e.to_string().as_str()),
                    ],
                );
                original.to_path_buf()
            }
        }
    }

    fn transcode(&self, original: &Path) -> Result<PathBuf> {
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(existing) = self.cached_target(&stem) {
            let shown = existing.display().to_string();
            self.sink
                .debug("transcode_cached", &[("target", shown.as_str())]);
            return Ok(existing);
        }

        fs::create_dir_all(&self.output_dir)?;

        // Decrypt next to the target so the final rename stays on one
        // filesystem and readers never see a partial image.
        let temp = tempfile::Builder::new()
            .prefix(".decrypt-")
            .tempfile_in(&self.output_dir)?;
        self.decryptor.decrypt(original, temp.path())?;

        let format = ImageFormat::sniff(&read_head(temp.path())?);
        let target = self.target_path(&stem, format);
        if target.exists() {
            return Ok(target);
        }
        temp.persist(&target)?;

        let (from, to) = (original.display().to_string(), target.display().to_string());
        self.sink
            .debug("transcoded", &[("from", from.as_str()), ("to", to.as_str())]);
        Ok(target)
    }

    fn target_path(&self, stem: &str, format: ImageFormat) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", format.extension()))
    }

    fn cached_target(&self, stem: &str) -> Option<PathBuf> {
        ImageFormat::ALL
            .iter()
            .map(|format| self.target_path(stem, *format))
            .find(|path| path.is_file())
    }
}

fn is_encrypted_container(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ENCRYPTED_IMAGE_EXT))
}

fn read_head(path: &Path) -> Result<Vec<u8>> {
    let mut head = Vec::with_capacity(4);
    File::open(path)?.take(4).read_to_end(&mut head)?;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chatlog_shared::RecordingSink;
    use tempfile::TempDir;

    use super::*;

    /// Writes a fixed payload and counts invocations.
    struct FakeDecryptor {
        payload: Vec<u8>,
        calls: AtomicUsize,
    }

    impl FakeDecryptor {
        fn new(payload: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                payload: payload.to_vec(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Decryptor for FakeDecryptor {
        fn decrypt(&self, _encrypted: &Path, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(output, &self.payload)?;
            Ok(())
        }
    }

    fn encrypted_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join("FileStorage/MsgAttach/h/Image").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"\x12\x34\x56\x78").unwrap();
        path
    }

    fn transcoder(dir: &TempDir, decryptor: Arc<dyn Decryptor>) -> (Transcoder, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let out = dir.path().join("FileStorage/Image");
        (Transcoder::new(decryptor, out, sink.clone()), sink)
    }

    #[test]
    fn sniff_signatures() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), ImageFormat::Png);
        assert_eq!(ImageFormat::sniff(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::sniff(b"RIFF"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::sniff(b"GIF"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::sniff(&[]), ImageFormat::Jpeg);
    }

    #[test]
    fn non_dat_passes_through() {
        let dir = TempDir::new().unwrap();
        let fake = FakeDecryptor::new(b"\x89PNG");
        let (transcoder, _) = transcoder(&dir, fake.clone());

        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"x").unwrap();
        assert_eq!(transcoder.to_viewable(&path, "1"), path);
        assert_eq!(fake.calls(), 0);
    }

    #[test]
    fn missing_file_passes_through() {
        let dir = TempDir::new().unwrap();
        let fake = FakeDecryptor::new(b"\x89PNG");
        let (transcoder, _) = transcoder(&dir, fake.clone());

        let missing = dir.path().join("gone.dat");
        assert_eq!(transcoder.to_viewable(&missing, "1"), missing);
        assert_eq!(fake.calls(), 0);
    }

    #[test]
    fn png_payload_gets_png_extension() {
        let dir = TempDir::new().unwrap();
        let fake = FakeDecryptor::new(b"\x89PNG\r\n\x1a\n");
        let (transcoder, _) = transcoder(&dir, fake.clone());
        let source = encrypted_file(&dir, "abc.DAT");

        let out = transcoder.to_viewable(&source, "9");
        assert_eq!(out, dir.path().join("FileStorage/Image/abc.png"));
        assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn second_call_uses_cache() {
        let dir = TempDir::new().unwrap();
        let fake = FakeDecryptor::new(b"GIF89a");
        let (transcoder, sink) = transcoder(&dir, fake.clone());
        let source = encrypted_file(&dir, "anim.dat");

        let first = transcoder.to_viewable(&source, "9");
        let second = transcoder.to_viewable(&source, "9");
        assert_eq!(first, second);
        assert_eq!(first.extension().unwrap(), "gif");
        assert_eq!(fake.calls(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn short_payload_defaults_to_jpeg() {
        let dir = TempDir::new().unwrap();
        let (transcoder, _) = transcoder(&dir, FakeDecryptor::new(b"\xFF"));
        let source = encrypted_file(&dir, "tiny.dat");

        let out = transcoder.to_viewable(&source, "9");
        assert_eq!(out.file_name().unwrap(), "tiny.jpeg");
    }

    #[test]
    fn failure_returns_original() {
        let dir = TempDir::new().unwrap();
        let (transcoder, sink) = transcoder(&dir, Arc::new(UnavailableDecryptor));
        let source = encrypted_file(&dir, "locked.dat");

        assert_eq!(transcoder.to_viewable(&source, "9"), source);
        assert_eq!(sink.count("transcode_failed"), 1);

        let leftovers: Vec<_> = fs::read_dir(transcoder.output_dir()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn command_line_parsing() {
        let cmd = CommandDecryptor::from_command_line("  dat2img --xor auto ").unwrap();
        assert_eq!(cmd.program, "dat2img");
        assert_eq!(cmd.args, vec!["--xor", "auto"]);
        assert!(CommandDecryptor::from_command_line("   ").is_none());
    }
}
