//! Path resolution for attachment hints.
//!
//! Stored hints are relative, use either separator, are sometimes prefixed
//! with the authoring account id and frequently point at a directory the
//! file no longer lives in. [`PathResolver::resolve`] runs an ordered list
//! of strategies and returns the first path that exists on disk.
//!
//! Directory walks visit entries in file-name order so that duplicate
//! matches always resolve to the same file.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use chatlog_shared::constants::{
    CACHE_DIR, DIRECTORY_VARIANTS, FILE_DIR, FILE_STORAGE_DIR, MSG_ATTACH_DIR, VOICE_DIR,
    VOICE_EXT,
};
use chatlog_shared::DiagnosticSink;

/// Outcome of a path lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Verified to exist.
    Resolved(PathBuf),
    /// Synthesized from the hint; never checked.
    Guessed(PathBuf),
    #[default]
    NotFound,
}

impl Resolution {
    pub fn verified(&self) -> Option<&Path> {
        match self {
            Self::Resolved(p) => Some(p),
            _ => None,
        }
    }

    pub fn guessed(&self) -> Option<&Path> {
        match self {
            Self::Guessed(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Fixed directory layout below a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_storage(&self) -> PathBuf {
        self.root.join(FILE_STORAGE_DIR)
    }

    /// `<root>/FileStorage/<name>`
    pub fn storage_dir(&self, name: &str) -> PathBuf {
        self.file_storage().join(name)
    }

    pub fn voice_clip(&self, server_id: &str) -> PathBuf {
        self.storage_dir(VOICE_DIR)
            .join(format!("{server_id}.{VOICE_EXT}"))
    }
}

/// Media families that can be discovered by server id alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Emoji,
    Forwarded,
    ChannelPost,
}

impl MediaKind {
    fn search_dirs(self) -> &'static [&'static str] {
        match self {
            Self::Image => &[CACHE_DIR, MSG_ATTACH_DIR],
            Self::Video | Self::Emoji | Self::Forwarded | Self::ChannelPost => &[MSG_ATTACH_DIR],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Emoji => "emoji",
            Self::Forwarded => "forwarded",
            Self::ChannelPost => "channel_post",
        }
    }
}

/// Inputs shared by every strategy.
struct Lookup<'a> {
    layout: &'a StorageLayout,
    relative: &'a Path,
    server_id: &'a str,
}

struct Strategy {
    name: &'static str,
    run: fn(&Lookup<'_>) -> Option<PathBuf>,
}

const STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "direct",
        run: direct,
    },
    Strategy {
        name: "directory_variant",
        run: directory_variant,
    },
    Strategy {
        name: "msg_attach",
        run: msg_attach_search,
    },
    Strategy {
        name: "cache",
        run: cache_search,
    },
];

pub struct PathResolver {
    layout: StorageLayout,
    account_id: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl PathResolver {
    /// `account_id` is the local account; hints starting with it have it
    /// stripped before lookup.
    pub fn new(
        layout: StorageLayout,
        account_id: impl Into<String>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            layout,
            account_id: account_id.into(),
            sink,
        }
    }

    pub fn normalize(&self, hint: &str) -> PathBuf {
        normalize_hint(hint, &self.account_id)
    }

    /// Find an existing file for `hint`, or [`Resolution::NotFound`].
    pub fn resolve(&self, hint: &str, server_id: &str) -> Resolution {
        let relative = self.normalize(hint);
        if relative.as_os_str().is_empty() {
            return Resolution::NotFound;
        }

        let lookup = Lookup {
            layout: &self.layout,
            relative: &relative,
            server_id,
        };

        for strategy in &STRATEGIES {
            if let Some(path) = (strategy.run)(&lookup) {
                let shown = path.display().to_string();
                self.sink.debug(
                    "path_resolved",
                    &[
                        ("strategy", strategy.name),
                        ("hint", hint),
                        ("path", shown.as_str()),
                    ],
                );
                return Resolution::Resolved(path);
            }
        }

        self.sink
            .warn("path_not_found", &[("hint", hint), ("server_id", server_id)]);
        Resolution::NotFound
    }

    /// Like [`resolve`](Self::resolve), but a miss becomes a guessed
    /// `<root>/<hint>` path.
    pub fn resolve_or_guess(&self, hint: &str, server_id: &str) -> Resolution {
        match self.resolve(hint, server_id) {
            Resolution::NotFound => {
                let relative = self.normalize(hint);
                if relative.as_os_str().is_empty() {
                    Resolution::NotFound
                } else {
                    Resolution::Guessed(self.layout.root().join(relative))
                }
            }
            found => found,
        }
    }

    /// Discover media for a message that carried no hint at all.
    pub fn discover(&self, kind: MediaKind, server_id: &str) -> Resolution {
        if !searchable(server_id) {
            return Resolution::NotFound;
        }

        let found = kind.search_dirs().iter().find_map(|name| {
            let dir = self.layout.storage_dir(name);
            let hit = files_containing(&dir, server_id).next();
            hit
        });

        match found {
            Some(path) => {
                let shown = path.display().to_string();
                self.sink.debug(
                    "media_discovered",
                    &[("kind", kind.label()), ("path", shown.as_str())],
                );
                Resolution::Resolved(path)
            }
            None => {
                self.sink.debug(
                    "media_not_discovered",
                    &[("kind", kind.label()), ("server_id", server_id)],
                );
                Resolution::NotFound
            }
        }
    }

    /// Discover a transferred file by server id or display name, first under
    /// `FileStorage/File`, then under `MsgAttach`.
    pub fn discover_file(&self, server_id: &str, file_name: &str) -> Resolution {
        let file_dir = self.layout.storage_dir(FILE_DIR);
        let by_id = searchable(server_id).then_some(server_id);
        let by_name = (!file_name.is_empty()).then_some(file_name);

        let in_file_dir = walk_files(&file_dir).find(|entry| {
            let relative = relative_str(&file_dir, entry.path());
            by_id.is_some_and(|id| relative.contains(id))
                || by_name.is_some_and(|name| relative.contains(name))
        });
        if let Some(entry) = in_file_dir {
            return Resolution::Resolved(entry.into_path());
        }

        match by_id {
            Some(id) => {
                let attach = self.layout.storage_dir(MSG_ATTACH_DIR);
                let hit = files_containing(&attach, id).next();
                hit.map_or(Resolution::NotFound, Resolution::Resolved)
            }
            None => Resolution::NotFound,
        }
    }

    /// `<root>/FileStorage/Voice/<server_id>.mp3`, if present.
    pub fn voice_clip(&self, server_id: &str) -> Resolution {
        if server_id.is_empty() {
            return Resolution::NotFound;
        }
        let path = self.layout.voice_clip(server_id);
        if path.is_file() {
            Resolution::Resolved(path)
        } else {
            Resolution::NotFound
        }
    }
}

/// Strip the account prefix once, split on either separator and drop
/// components that could climb out of the storage root.
pub fn normalize_hint(hint: &str, account_id: &str) -> PathBuf {
    let trimmed = if account_id.is_empty() {
        hint
    } else {
        hint.strip_prefix(account_id).unwrap_or(hint)
    };

    trimmed
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .filter(|part| {
            matches!(
                Path::new(part).components().next(),
                Some(Component::Normal(_))
            )
        })
        .collect()
}

/// Server ids of `0` or empty would match almost every file.
fn searchable(server_id: &str) -> bool {
    !server_id.is_empty() && server_id != "0"
}

fn direct(lookup: &Lookup<'_>) -> Option<PathBuf> {
    let path = lookup.layout.root().join(lookup.relative);
    path.is_file().then_some(path)
}

fn directory_variant(lookup: &Lookup<'_>) -> Option<PathBuf> {
    let file_name = lookup.relative.file_name()?;
    let parent = lookup.relative.parent()?;
    parent.file_name()?;
    let grandparent = parent.parent().unwrap_or_else(|| Path::new(""));

    DIRECTORY_VARIANTS
        .iter()
        .map(|dir| {
            lookup
                .layout
                .root()
                .join(grandparent)
                .join(dir)
                .join(file_name)
        })
        .find(|path| path.is_file())
}

fn msg_attach_search(lookup: &Lookup<'_>) -> Option<PathBuf> {
    if !searchable(lookup.server_id) {
        return None;
    }

    let base = lookup
        .relative
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let dir = lookup.layout.storage_dir(MSG_ATTACH_DIR);
    let mut first = None;
    for path in files_containing(&dir, lookup.server_id) {
        let name_matches = !base.is_empty()
            && path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().to_lowercase().contains(&base));
        if name_matches {
            return Some(path);
        }
        if first.is_none() {
            first = Some(path);
        }
    }
    first
}

fn cache_search(lookup: &Lookup<'_>) -> Option<PathBuf> {
    if !searchable(lookup.server_id) {
        return None;
    }
    let dir = lookup.layout.storage_dir(CACHE_DIR);
    let hit = files_containing(&dir, lookup.server_id).next();
    hit
}

fn walk_files(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
}

/// Files below `dir` whose path relative to `dir` contains `needle`.
fn files_containing<'a>(dir: &'a Path, needle: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    walk_files(dir)
        .filter(move |entry| relative_str(dir, entry.path()).contains(needle))
        .map(DirEntry::into_path)
}

fn relative_str(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chatlog_shared::RecordingSink;
    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"x").unwrap();
        path
    }

    fn resolver(dir: &TempDir) -> (PathResolver, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let resolver = PathResolver::new(
            StorageLayout::new(dir.path()),
            "wxid_me",
            sink.clone(),
        );
        (resolver, sink)
    }

    #[test]
    fn normalize_handles_both_separators() {
        let path = normalize_hint("wxid_me\\FileStorage/Image\\a.dat", "wxid_me");
        assert_eq!(path, Path::new("FileStorage").join("Image").join("a.dat"));
    }

    #[test]
    fn normalize_drops_parent_components() {
        let path = normalize_hint("../../etc/FileStorage/a.dat", "");
        assert_eq!(path, Path::new("etc").join("FileStorage").join("a.dat"));
    }

    #[test]
    fn direct_hit_after_prefix_strip() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "FileStorage/Image/2023-01/a.dat");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("wxid_me\\FileStorage\\Image\\2023-01\\a.dat", "42");
        assert_eq!(got, Resolution::Resolved(expected));
    }

    #[test]
    fn account_prefix_is_stripped_exactly_once() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "wxid_me/FileStorage/Image/a.dat");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("wxid_mewxid_me/FileStorage/Image/a.dat", "42");
        assert_eq!(got, Resolution::Resolved(expected));
    }

    #[test]
    fn directory_variants_tried_in_order() {
        let dir = TempDir::new().unwrap();
        let thumb = touch(dir.path(), "attach/Thumb/pic.dat");
        touch(dir.path(), "attach/Cache/pic.dat");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("attach/Image/pic.dat", "42");
        assert_eq!(got, Resolution::Resolved(thumb));
    }

    #[test]
    fn msg_attach_prefers_matching_file_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "FileStorage/MsgAttach/h1/Image/999_other.dat");
        let wanted = touch(dir.path(), "FileStorage/MsgAttach/h1/Thumb/999_pic.dat");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("gone/somewhere/pic.dat", "999");
        assert_eq!(got, Resolution::Resolved(wanted));
    }

    #[test]
    fn msg_attach_falls_back_to_first_candidate() {
        let dir = TempDir::new().unwrap();
        let first = touch(dir.path(), "FileStorage/MsgAttach/a/999_x.dat");
        touch(dir.path(), "FileStorage/MsgAttach/b/999_y.dat");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("gone/somewhere/pic.dat", "999");
        assert_eq!(got, Resolution::Resolved(first));
    }

    #[test]
    fn cache_is_searched_last() {
        let dir = TempDir::new().unwrap();
        let cached = touch(dir.path(), "FileStorage/Cache/2023-05/777.jpg");
        let (resolver, _) = resolver(&dir);

        let got = resolver.resolve("gone/somewhere/pic.dat", "777");
        assert_eq!(got, Resolution::Resolved(cached));
    }

    #[test]
    fn miss_is_not_found_then_guessed() {
        let dir = TempDir::new().unwrap();
        let (resolver, sink) = resolver(&dir);

        assert_eq!(
            resolver.resolve("FileStorage/Video/v.mp4", "5"),
            Resolution::NotFound
        );
        assert_eq!(sink.count("path_not_found"), 1);

        let guessed = resolver.resolve_or_guess("wxid_me/FileStorage/Video/v.mp4", "5");
        assert_eq!(
            guessed,
            Resolution::Guessed(dir.path().join("FileStorage").join("Video").join("v.mp4"))
        );
        assert!(!guessed.is_found());
    }

    #[test]
    fn empty_hint_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir);
        assert_eq!(resolver.resolve_or_guess("", "5"), Resolution::NotFound);
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "FileStorage/MsgAttach/h/Image/321.dat");
        let (resolver, _) = resolver(&dir);

        let first = resolver.resolve("x/y/321.dat", "321");
        let second = resolver.resolve("x/y/321.dat", "321");
        assert_eq!(first, second);
        assert!(first.is_found());
    }

    #[test]
    fn zero_server_id_is_never_searched() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "FileStorage/MsgAttach/h/0.dat");
        let (resolver, _) = resolver(&dir);

        assert_eq!(resolver.resolve("x/y/z.dat", "0"), Resolution::NotFound);
        assert_eq!(resolver.discover(MediaKind::Image, "0"), Resolution::NotFound);
    }

    #[test]
    fn image_discovery_checks_cache_first() {
        let dir = TempDir::new().unwrap();
        let cached = touch(dir.path(), "FileStorage/Cache/888.jpg");
        touch(dir.path(), "FileStorage/MsgAttach/h/888.dat");
        let (resolver, _) = resolver(&dir);

        assert_eq!(
            resolver.discover(MediaKind::Image, "888"),
            Resolution::Resolved(cached)
        );
    }

    #[test]
    fn video_discovery_ignores_cache() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "FileStorage/Cache/888.mp4");
        let (resolver, _) = resolver(&dir);

        assert_eq!(resolver.discover(MediaKind::Video, "888"), Resolution::NotFound);
    }

    #[test]
    fn file_discovery_by_name() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "FileStorage/File/2023-04/report.pdf");
        let (resolver, _) = resolver(&dir);

        assert_eq!(
            resolver.discover_file("123", "report.pdf"),
            Resolution::Resolved(file)
        );
        assert_eq!(resolver.discover_file("123", ""), Resolution::NotFound);
    }

    #[test]
    fn voice_clip_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver(&dir);
        assert_eq!(resolver.voice_clip("55"), Resolution::NotFound);

        let clip = touch(dir.path(), "FileStorage/Voice/55.mp3");
        assert_eq!(resolver.voice_clip("55"), Resolution::Resolved(clip));
    }
}
