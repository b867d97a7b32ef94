use std::path::Path;

use craftport_config::{AppConfig, ConfigError};
use craftport_core::craft::Craft;
use craftport_io::{CraftXmlFacade, DocumentLoader};
use tracing::{info, warn};

use crate::errors::FrontendError;

pub fn load_source(path: &Path) -> Result<Craft, FrontendError> {
    let craft = CraftXmlFacade::new().load(path)?;
    info!(
        path = %path.display(),
        parts = craft.assembly.parts.len(),
        connections = craft.assembly.connections.len(),
        bodies = craft.assembly.bodies.len(),
        "读取源文档成功"
    );
    Ok(craft)
}

/// 读取配置；显式路径优先，失败时回退到内建默认值。
pub fn load_app_config(override_path: Option<&Path>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. }
                    | ConfigError::Parse { path, .. }
                    | ConfigError::Invalid { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}
