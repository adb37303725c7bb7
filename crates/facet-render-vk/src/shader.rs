//! Shader bytecode loading. The blobs are opaque precompiled SPIR-V read
//! from disk at startup; `cargo xtask shaders` produces them.

use std::io::Cursor;
use std::path::Path;

use ash::util::read_spv;

use crate::error::ShaderLoadError;

/// Read a SPIR-V blob and convert it to code words, validating length and
/// magic number. No device interaction happens here; a missing file fails
/// before any pipeline or swapchain resource exists.
pub(crate) fn load_spirv(path: &Path) -> Result<Vec<u32>, ShaderLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ShaderLoadError::Read {
        path: path.to_owned(),
        source,
    })?;

    read_spv(&mut Cursor::new(bytes)).map_err(|source| ShaderLoadError::InvalidSpirv {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("facet-shader-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_reports_the_path() {
        let path = Path::new("shaders/does-not-exist.spv");
        let err = load_spirv(path).unwrap_err();
        match err {
            ShaderLoadError::Read { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn odd_length_bytecode_is_rejected() {
        let path = scratch_file("odd.spv", &[0x03, 0x02, 0x23]);
        let err = load_spirv(&path).unwrap_err();
        assert!(matches!(err, ShaderLoadError::InvalidSpirv { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bad_magic_is_rejected() {
        let path = scratch_file("magic.spv", &0xdead_beefu32.to_le_bytes());
        let err = load_spirv(&path).unwrap_err();
        assert!(matches!(err, ShaderLoadError::InvalidSpirv { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn valid_bytecode_becomes_code_words() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&SPIRV_MAGIC.to_le_bytes());
        blob.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        let path = scratch_file("ok.spv", &blob);

        let words = load_spirv(&path).unwrap();
        assert_eq!(words, vec![SPIRV_MAGIC, 0x0001_0000]);
        std::fs::remove_file(path).ok();
    }
}
