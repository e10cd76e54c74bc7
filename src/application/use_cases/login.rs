use std::sync::Arc;

use crate::application::services::ProgressReporter;
use crate::common::result::ProvisionResult;
use crate::infrastructure::{AzureCli, GitHubCli};

/// ログインの設定
#[derive(Debug, Clone, Default)]
pub struct LoginConfig {
    /// ログイン後に選択するサブスクリプション
    pub subscription: Option<String>,
}

/// AzureとGitHubへの対話的ログイン
pub struct LoginUseCase {
    az: AzureCli,
    gh: GitHubCli,
    config: LoginConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl LoginUseCase {
    pub fn new(
        az: AzureCli,
        gh: GitHubCli,
        config: LoginConfig,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            az,
            gh,
            config,
            progress,
        }
    }

    pub async fn execute(&self) -> ProvisionResult<()> {
        self.progress.step("Logging in to Azure");
        self.az.login().await?;

        if let Some(subscription) = &self.config.subscription {
            self.progress
                .detail(&format!("Selecting subscription {subscription}"));
            self.az.set_subscription(subscription).await?;
        }

        self.progress.step("Logging in to GitHub");
        self.gh.login().await?;
        Ok(())
    }
}
