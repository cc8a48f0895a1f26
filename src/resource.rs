use std::{
    fs,
    path::{Path, PathBuf},
};

use nanorand::{Rng, WyRand};

use crate::error::{Error, ResourceKind, Result};

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "ttc"];
pub const MASK_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lists the candidate files of a resource directory.
///
/// Returns `Ok(None)` when the directory does not exist.
pub trait ResourceProvider: Send + Sync {
    fn list(&self, dir: &Path) -> Result<Option<Vec<PathBuf>>>;
}

/// Reads the directory on every call, so resources can be added or removed
/// while the service runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsResourceProvider;

impl ResourceProvider for FsResourceProvider {
    fn list(&self, dir: &Path) -> Result<Option<Vec<PathBuf>>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                entries.push(entry.path());
            }
        }
        // read_dir order is platform dependent
        entries.sort();

        Ok(Some(entries))
    }
}

/// A fixed catalog, for hosts that embed their resources.
#[derive(Clone, Debug, Default)]
pub struct StaticResourceProvider {
    entries: Vec<(PathBuf, Vec<PathBuf>)>,
}

impl StaticResourceProvider {
    pub fn with_dir(mut self, dir: impl Into<PathBuf>, files: &[&str]) -> Self {
        let dir = dir.into();
        let files = files.iter().map(|f| dir.join(f)).collect();
        self.entries.push((dir, files));
        self
    }
}

impl ResourceProvider for StaticResourceProvider {
    fn list(&self, dir: &Path) -> Result<Option<Vec<PathBuf>>> {
        Ok(self
            .entries
            .iter()
            .find(|(d, _)| d == dir)
            .map(|(_, files)| files.clone()))
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// 从目录里随机选一个文件
pub fn select_random(
    provider: &dyn ResourceProvider,
    kind: ResourceKind,
    dir: &Path,
    allowed_extensions: &[&str],
    rng: &mut WyRand,
) -> Result<PathBuf> {
    let entries = provider.list(dir)?.ok_or_else(|| {
        log::error!("{kind} directory {} does not exist", dir.display());
        Error::ResourceDirectoryMissing {
            kind,
            dir: dir.to_path_buf(),
        }
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .into_iter()
        .filter(|path| has_extension(path, allowed_extensions))
        .collect();

    if candidates.is_empty() {
        log::error!("{kind} directory {} has no usable files", dir.display());
        return Err(Error::ResourceNotFound {
            kind,
            dir: dir.to_path_buf(),
        });
    }

    let index = rng.generate_range(0..candidates.len());
    let selected = candidates.swap_remove(index);
    log::info!("Selected random {kind}: {}", selected.display());

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        path::{Path, PathBuf},
    };

    use nanorand::WyRand;

    use super::{select_random, FsResourceProvider, StaticResourceProvider, MASK_EXTENSIONS};
    use crate::error::{Error, ResourceKind};

    #[test]
    fn filters_by_extension_case_insensitively() {
        let provider = StaticResourceProvider::default()
            .with_dir("masks", &["readme.txt", "heart.PNG", "notes.md"]);
        let mut rng = WyRand::new_seed(7);

        for _ in 0..20 {
            let path = select_random(
                &provider,
                ResourceKind::Mask,
                Path::new("masks"),
                MASK_EXTENSIONS,
                &mut rng,
            )
            .unwrap();
            assert_eq!(path, PathBuf::from("masks/heart.PNG"));
        }
    }

    #[test]
    fn unsupported_files_only_is_not_found() {
        let provider =
            StaticResourceProvider::default().with_dir("masks", &["a.gif", "b.bmp", "c"]);
        let err = select_random(
            &provider,
            ResourceKind::Mask,
            Path::new("masks"),
            MASK_EXTENSIONS,
            &mut WyRand::new_seed(1),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::ResourceNotFound {
                kind: ResourceKind::Mask,
                ..
            }
        ));
    }

    #[test]
    fn unknown_directory_is_missing() {
        let provider = StaticResourceProvider::default();
        let err = select_random(
            &provider,
            ResourceKind::Font,
            Path::new("fonts"),
            &["ttf"],
            &mut WyRand::new_seed(1),
        )
        .unwrap_err();

        assert!(matches!(err, Error::ResourceDirectoryMissing { .. }));
    }

    #[test]
    fn selection_covers_every_candidate() {
        let provider =
            StaticResourceProvider::default().with_dir("masks", &["a.png", "b.jpg", "c.jpeg"]);
        let mut rng = WyRand::new_seed(42);
        let mut seen: HashMap<PathBuf, usize> = HashMap::new();

        for _ in 0..3000 {
            let path = select_random(
                &provider,
                ResourceKind::Mask,
                Path::new("masks"),
                MASK_EXTENSIONS,
                &mut rng,
            )
            .unwrap();
            *seen.entry(path).or_insert(0) += 1;
        }

        assert_eq!(seen.len(), 3);
        // roughly uniform: each share lands near 1000
        assert!(seen.values().all(|&count| (800..1200).contains(&count)));
    }

    #[test]
    fn directory_is_listed_again_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FsResourceProvider;
        let mut rng = WyRand::new_seed(3);
        let mut pick = || {
            select_random(
                &provider,
                ResourceKind::Mask,
                dir.path(),
                MASK_EXTENSIONS,
                &mut rng,
            )
        };

        assert!(matches!(pick(), Err(Error::ResourceNotFound { .. })));

        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        assert_eq!(pick().unwrap(), dir.path().join("a.png"));

        std::fs::remove_file(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"jpg").unwrap();
        assert_eq!(pick().unwrap(), dir.path().join("b.jpg"));
    }
}
