//! 설정 파일 관리.
//!
//! 플랫폼별 설정 디렉토리에 JSON 파일로 설정을 저장/로드한다.

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 플랫폼 디렉토리 식별자
const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "linkwatch";
const APP_NAME: &str = "linkwatch";

/// 설정 관리자
///
/// 설정 파일의 로드/저장을 담당한다. 설정은 시작 시 한 번 읽힌다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정
    config: AppConfig,
    /// 설정 파일 경로
    config_path: PathBuf,
}

impl ConfigManager {
    /// 플랫폼 기본 경로로 설정 관리자 생성
    ///
    /// 설정 파일이 없으면 기본 설정을 생성하고 저장한다.
    pub fn new() -> Result<Self, CoreError> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        Self::with_path(config_path)
    }

    /// 지정된 경로로 설정 관리자 생성
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        // 설정 디렉토리 생성
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        // 설정 파일 로드 또는 기본값 생성
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default_config();
            Self::save_to_file(&config_path, &default_config)?;
            info!("기본 설정 파일 생성: {}", config_path.display());
            default_config
        };

        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.clone()
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 플랫폼별 설정 디렉토리 경로
    ///
    /// # 플랫폼별 경로:
    /// - macOS: `~/Library/Application Support/dev.linkwatch.linkwatch/`
    /// - Windows: `%APPDATA%\linkwatch\linkwatch\config\`
    /// - Linux: `$XDG_CONFIG_HOME/linkwatch/` 또는 `~/.config/linkwatch/`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    /// 파일에서 설정 로드
    fn load_from_file(path: &Path) -> Result<AppConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 파일에 설정 저장
    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(config)?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        // 새 관리자 생성 (기본 설정 파일 생성됨)
        let manager = ConfigManager::with_path(config_path.clone()).unwrap();
        assert!(config_path.exists());
        assert_eq!(manager.get(), AppConfig::default_config());
    }

    #[test]
    fn edited_file_is_reloaded() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");
        ConfigManager::with_path(config_path.clone()).unwrap();

        // 사용자가 파일을 직접 수정
        let mut edited = AppConfig::default_config();
        edited.throughput.interval_secs = 60;
        edited.latency.host = "1.1.1.1".to_string();
        fs::write(&config_path, serde_json::to_string_pretty(&edited).unwrap()).unwrap();

        let reloaded = ConfigManager::with_path(config_path).unwrap().get();
        assert_eq!(reloaded.throughput.interval_secs, 60);
        assert_eq!(reloaded.latency.host, "1.1.1.1");
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut invalid = AppConfig::default_config();
        invalid.latency.count = 0;
        fs::write(&config_path, serde_json::to_string(&invalid).unwrap()).unwrap();

        assert!(ConfigManager::with_path(config_path).is_err());
    }

    #[test]
    fn broken_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = ConfigManager::with_path(config_path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn config_dir_is_per_application() {
        // 홈 디렉토리가 없는 환경에서는 건너뜀
        if let Ok(dir) = ConfigManager::config_dir() {
            assert!(dir.to_string_lossy().contains("linkwatch"));
        }
    }
}
