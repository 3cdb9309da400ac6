use crate::config::types::{AuditConfig, Config, SchedulerConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_audit_config(&config.audit)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates audit timeouts
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    if config.probe_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "probe_timeout_ms must be >= 100ms, got {}ms",
            config.probe_timeout_ms
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.tick_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "tick_interval_secs must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_scans < 1 || config.max_concurrent_scans > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_scans must be between 1 and 100, got {}",
            config.max_concurrent_scans
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = Config::default();
        config.audit.fetch_timeout_ms = 50;
        assert!(validate(&config).is_err());

        config.audit.fetch_timeout_ms = 100;
        config.audit.probe_timeout_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_scheduler_bounds() {
        let mut config = Config::default();
        config.scheduler.max_concurrent_scans = 101;
        assert!(validate(&config).is_err());

        config.scheduler.max_concurrent_scans = 1;
        config.scheduler.tick_interval_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }
}
