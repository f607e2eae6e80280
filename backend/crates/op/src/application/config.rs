//! Tax-object application configuration

use platform::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct OpConfig {
    /// Retry policy for tax-object store calls
    pub store_retry: RetryPolicy,
    /// `/peta/nop-list` limit when none is given
    pub parcel_list_default: i64,
    pub parcel_list_max: i64,
}

impl Default for OpConfig {
    fn default() -> Self {
        Self {
            store_retry: RetryPolicy::default(),
            parcel_list_default: 100,
            parcel_list_max: 1000,
        }
    }
}

impl OpConfig {
    /// Clamp a requested parcel list size
    pub fn parcel_list_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.parcel_list_default)
            .clamp(1, self.parcel_list_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parcel_list_limit() {
        let config = OpConfig::default();
        assert_eq!(config.parcel_list_limit(None), 100);
        assert_eq!(config.parcel_list_limit(Some(5000)), 1000);
        assert_eq!(config.parcel_list_limit(Some(0)), 1);
    }
}
