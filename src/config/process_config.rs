use crate::domain::model::Process;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_unique_keys,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub process: Process,
}

impl ProcessConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RETHINKDB_HOST})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let process = &self.process;

        validate_non_empty_string("process.name", &process.name)?;
        validate_unique_keys(
            "process.connections.key",
            process.connections.iter().map(|c| c.key.as_str()),
        )?;
        validate_unique_keys(
            "process.entities.key",
            process.entities.iter().map(|e| e.key.as_str()),
        )?;
        // 連線與實體共用同一個登錄表鍵空間（schema reader 兩邊都會註冊）
        validate_unique_keys(
            "process.keys",
            process
                .connections
                .iter()
                .map(|c| c.key.as_str())
                .chain(process.entities.iter().map(|e| e.key.as_str())),
        )?;

        for connection in &process.connections {
            let field = format!("process.connections.{}", connection.key);
            validate_non_empty_string(&format!("{}.key", field), &connection.key)?;
            validate_non_empty_string(&format!("{}.name", field), &connection.name)?;
            validate_non_empty_string(&format!("{}.provider", field), &connection.provider)?;
            validate_range(&format!("{}.port", field), connection.port, 1, u16::MAX)?;
            validate_positive_number(
                &format!("{}.request_timeout", field),
                connection.request_timeout,
                1,
            )?;

            for server in &connection.servers {
                validate_non_empty_string(&format!("{}.servers.name", field), &server.name)?;
                validate_range(&format!("{}.servers.port", field), server.port, 1, u16::MAX)?;
            }
        }

        for entity in &process.entities {
            let field = format!("process.entities.{}", entity.key);
            validate_non_empty_string(&format!("{}.key", field), &entity.key)?;
            validate_positive_number(
                &format!("{}.insert_size", field),
                entity.insert_size as u64,
                1,
            )?;

            if process.connection_of(entity).is_none() {
                return Err(EtlError::ConfigValidationError {
                    field: format!("{}.connection", field),
                    message: format!("Connection '{}' is not defined", entity.connection),
                });
            }
        }

        Ok(())
    }

    pub fn into_process(self) -> Process {
        self.process
    }
}

impl Validate for ProcessConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
