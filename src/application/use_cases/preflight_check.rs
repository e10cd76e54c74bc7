use std::path::PathBuf;

use crate::common::result::ProvisionResult;
use crate::domain::value_objects::cli_tool::CliTool;
use crate::infrastructure::process::ToolLocator;

/// 見つかったツールとその場所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub tool: CliTool,
    pub path: PathBuf,
}

/// 事前チェック
///
/// ログインやリソース操作の前に必須ツールがPATH上にあるか確認する。
/// 最初に見つからなかったツールでエラーを返す。
pub struct PreflightCheckUseCase {
    locator: ToolLocator,
    tools: Vec<CliTool>,
}

impl PreflightCheckUseCase {
    /// 必須ツール（az, gh）をチェックする
    pub fn new(locator: ToolLocator) -> Self {
        Self {
            locator,
            tools: CliTool::REQUIRED.to_vec(),
        }
    }

    pub fn execute(&self) -> ProvisionResult<Vec<ToolStatus>> {
        self.tools
            .iter()
            .map(|tool| {
                let path = self.locator.locate(*tool)?;
                tracing::debug!(tool = %tool, path = %path.display(), "found required tool");
                Ok(ToolStatus { tool: *tool, path })
            })
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::common::error::ProvisionError;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn install(dir: &TempDir, names: &[&str]) {
        for name in names {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn test_all_tools_present() {
        let dir = TempDir::new().unwrap();
        install(&dir, &["az", "gh"]);

        let statuses = PreflightCheckUseCase::new(ToolLocator::with_search_path(dir.path()))
            .execute()
            .unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].tool, CliTool::Az);
        assert_eq!(statuses[1].path, dir.path().join("gh"));
    }

    #[test]
    fn test_missing_gh() {
        let dir = TempDir::new().unwrap();
        install(&dir, &["az"]);

        let error = PreflightCheckUseCase::new(ToolLocator::with_search_path(dir.path()))
            .execute()
            .unwrap_err();

        assert!(matches!(error, ProvisionError::MissingDependency { ref tool, .. } if tool == "gh"));
    }

    #[test]
    fn test_missing_az_reported_first() {
        let dir = TempDir::new().unwrap();

        let error = PreflightCheckUseCase::new(ToolLocator::with_search_path(dir.path()))
            .execute()
            .unwrap_err();

        assert!(matches!(error, ProvisionError::MissingDependency { ref tool, .. } if tool == "az"));
    }
}
