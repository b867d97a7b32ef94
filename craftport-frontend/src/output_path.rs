use std::path::{Path, PathBuf};

use crate::errors::FrontendError;

/// 默认输出路径：`<输入文件名主干><后缀>.xml`，落在当前工作目录。
pub fn default_output_path(input: &Path, suffix: &str) -> Result<PathBuf, FrontendError> {
    let stem = input
        .file_stem()
        .ok_or_else(|| FrontendError::MissingFileStem(input.to_path_buf()))?;
    let mut name = stem.to_os_string();
    name.push(suffix);
    name.push(".xml");
    Ok(PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_uses_stem_and_suffix() {
        let path = default_output_path(Path::new("crafts/Glider.xml"), "_SR").expect("path");
        assert_eq!(path, PathBuf::from("Glider_SR.xml"));

        let path = default_output_path(Path::new("plane"), "_out").expect("path");
        assert_eq!(path, PathBuf::from("plane_out.xml"));
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(matches!(
            default_output_path(Path::new(".."), "_SR"),
            Err(FrontendError::MissingFileStem(_))
        ));
    }
}
