use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// A built executable image given on the command line.
///
/// Output paths are the input path with a suffix appended, the existing
/// extension is never replaced: `a/b.elf` becomes `a/b.elf.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    path: PathBuf,
}

impl ElfImage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn binary_output(&self, suffix: &str) -> PathBuf {
        append_suffix(&self.path, suffix)
    }

    pub fn copy_output(&self, suffix: &str) -> PathBuf {
        append_suffix(&self.path, suffix)
    }
}

/// Split the whitespace separated list of images, in the given order.
///
/// Only ASCII whitespace separates paths, the bytes of each path are kept
/// as given, valid UTF-8 or not.
#[cfg(unix)]
pub fn parse_images<S: AsRef<OsStr> + ?Sized>(input: &S) -> Vec<ElfImage> {
    use std::os::unix::ffi::OsStrExt;

    input
        .as_ref()
        .as_bytes()
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .map(|token| ElfImage::new(OsStr::from_bytes(token)))
        .collect()
}

#[cfg(not(unix))]
pub fn parse_images<S: AsRef<OsStr> + ?Sized>(input: &S) -> Vec<ElfImage> {
    input
        .as_ref()
        .to_string_lossy()
        .split_ascii_whitespace()
        .map(ElfImage::new)
        .collect()
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended_not_replaced() {
        let image = ElfImage::new("a/b.elf");
        assert_eq!(image.binary_output(".bin"), PathBuf::from("a/b.elf.bin"));
        assert_eq!(image.copy_output(".elf"), PathBuf::from("a/b.elf.elf"));
    }

    #[test]
    fn path_without_extension() {
        let image = ElfImage::new("target/release/initproc");
        assert_eq!(
            image.binary_output(".bin"),
            PathBuf::from("target/release/initproc.bin")
        );
    }

    #[test]
    fn empty_input_has_no_image() {
        assert!(parse_images("").is_empty());
        assert!(parse_images(" \t\n ").is_empty());
    }

    #[test]
    fn whitespace_runs_do_not_produce_empty_paths() {
        let images = parse_images("  foo.elf \t\n bar.elf  ");
        assert_eq!(images, vec![ElfImage::new("foo.elf"), ElfImage::new("bar.elf")]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_kept_byte_for_byte() {
        use std::os::unix::ffi::OsStrExt;

        let input = OsStr::from_bytes(b"initproc\xff.elf  shell");
        let images = parse_images(input);

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].path().as_os_str().as_bytes(), b"initproc\xff.elf");
        assert_eq!(images[1].path(), Path::new("shell"));
        assert_eq!(
            images[0].copy_output(".elf").as_os_str().as_bytes(),
            b"initproc\xff.elf.elf"
        );
    }
}
