use crate::common::error::ProvisionError;

/// azprov全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use azprov::common::result::ProvisionResult;
/// use azprov::common::error::ProvisionError;
///
/// fn example_function() -> ProvisionResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> ProvisionResult<()> {
///     Err(ProvisionError::config_error("Something went wrong"))
/// }
/// ```
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// Option値をConfigErrorに変換する
    ///
    /// # Examples
    ///
    /// ```
    /// use azprov::common::result::{ProvisionResult, OptionExt};
    ///
    /// let none_value: Option<String> = None;
    /// let result: ProvisionResult<String> = none_value.ok_or_config_error("password is required");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_config_error(self, message: impl Into<String>) -> ProvisionResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_config_error(self, message: impl Into<String>) -> ProvisionResult<T> {
        self.ok_or_else(|| ProvisionError::config_error(message))
    }
}
