use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot
    /// be expanded, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            companies = config.companies.len(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm()?;
        self.validate_companies()?;

        if self.history.max_context_tokens == 0 {
            anyhow::bail!("history.max_context_tokens must be greater than zero");
        }
        if self.agent.max_tool_rounds == 0 {
            anyhow::bail!("agent.max_tool_rounds must be greater than zero");
        }
        if self.agent.default_model.trim().is_empty() {
            anyhow::bail!("agent.default_model must not be empty");
        }

        Ok(())
    }

    fn validate_llm(&self) -> anyhow::Result<()> {
        for pattern in self.llm.models.keys() {
            if pattern.trim().is_empty() {
                anyhow::bail!("llm.models contains an empty pattern");
            }
        }

        for (provider, endpoint) in &self.llm.providers {
            if endpoint.timeout == Some(0) {
                anyhow::bail!("llm.providers.{provider}.timeout must be greater than zero");
            }
        }

        Ok(())
    }

    fn validate_companies(&self) -> anyhow::Result<()> {
        for (name, company) in &self.companies {
            let hosts = company.http_tools.allowed_hosts.iter().flatten();
            for host in hosts {
                if host.trim().is_empty() {
                    anyhow::bail!("companies.{name}.http_tools.allowed_hosts must contain non-empty strings");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use switchyard_core::ProviderKind;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_expands_and_parses() {
        let file = write_config(
            r#"
            [llm.providers.openai]
            base_url = "{{ env.SY_OPENAI_URL }}"
            timeout = 30

            [llm.models]
            "o4" = "openai"

            [companies.acme]
            api_key = "ACME_KEY"
            preamble = "Acme sells anvils."

            [agent]
            max_tool_rounds = 3
            "#,
        );

        temp_env::with_var("SY_OPENAI_URL", Some("http://127.0.0.1:9/v1"), || {
            let config = Config::load(file.path()).unwrap();
            let endpoint = config.llm.endpoint(ProviderKind::OpenAi).unwrap();
            assert_eq!(endpoint.base_url.as_ref().unwrap().as_str(), "http://127.0.0.1:9/v1");
            assert_eq!(config.llm.models.get("o4"), Some(&ProviderKind::OpenAi));
            assert_eq!(config.agent.max_tool_rounds, 3);
            assert_eq!(config.history.max_context_tokens, 100_000);
            assert_eq!(config.company("acme").unwrap().preamble.as_deref(), Some("Acme sells anvils."));
        });
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Config::load(Path::new("/nonexistent/switchyard.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn zero_tool_rounds_fail_validation() {
        let file = write_config("[agent]\nmax_tool_rounds = 0\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_tool_rounds"));
    }

    #[test]
    fn blank_allowed_host_fails_validation() {
        let file = write_config("[companies.acme.http_tools]\nallowed_hosts = [\" \"]\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("allowed_hosts"));
    }

    #[test]
    fn unknown_provider_key_fails_parsing() {
        let file = write_config("[llm.providers.mistral]\ntimeout = 5\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
