use log::debug;
use sha2::{Digest,Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The outcome of comparing two files byte for byte
///
/// `Indeterminate` covers every way the comparison can fail (missing file,
/// permissions, read errors); callers must not treat it as either answer.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum FileIdentity {
    Equal,
    Different,
    Indeterminate
}

/// Compare the contents of two files
///
/// Sizes are compared first; files of equal size are compared by SHA-256
/// digest.
pub fn compare_files(a : &Path, b : &Path) -> FileIdentity {
    match try_compare(a, b) {
        Ok(true) => { FileIdentity::Equal }
        Ok(false) => { FileIdentity::Different }
        Err(e) => {
            debug!("Unable to compare {:?} with {:?}: {}", a, b, e);
            FileIdentity::Indeterminate
        }
    }
}

fn try_compare(a : &Path, b : &Path) -> std::io::Result<bool> {
    let meta_a = std::fs::metadata(a)?;
    let meta_b = std::fs::metadata(b)?;
    if !meta_a.is_file() || !meta_b.is_file() {
        return Err(std::io::Error::new(std::io::ErrorKind::Other, "not a regular file"));
    }
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    let digest_a = file_digest(a)?;
    let digest_b = file_digest(b)?;
    debug!("Digests {} {:?} / {} {:?}", hex::encode(&digest_a), a, hex::encode(&digest_b), b);
    Ok(digest_a == digest_b)
}

fn file_digest(path : &Path) -> std::io::Result<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}
