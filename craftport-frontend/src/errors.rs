use std::path::PathBuf;

use craftport_engine::errors::ConvertError;
use craftport_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("转换失败: {0}")]
    Convert(#[from] ConvertError),
    #[error("无法从输入路径 {0:?} 推导输出文件名")]
    MissingFileStem(PathBuf),
}
