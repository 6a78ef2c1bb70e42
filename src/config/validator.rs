use crate::config::{Config, SCHEMA_VERSION};
use crate::corpus::SourceClass;
use crate::embedding::FastEmbedProvider;
use crate::error::{ConcordError, Result, ValidationError};
use std::collections::HashSet;

/// Reranker names accepted in `reranker.model`
pub const RERANKER_MODELS: [&str; 3] = ["bge-reranker-base", "jina-reranker-v1-turbo-en", "term-overlap"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_reranker(config, &mut errors);
        Self::validate_reasoning(config, &mut errors);
        Self::validate_authority(config, &mut errors);
        Self::validate_paths(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConcordError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let model = &config.embedding.model;
        if !FastEmbedProvider::is_supported(model) {
            errors.push(ValidationError::new(
                "embedding.model",
                format!(
                    "Model must be one of {:?}, got '{}'",
                    FastEmbedProvider::supported_models(),
                    model
                ),
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if retrieval.rerank_top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.rerank_top_k",
                "rerank_top_k must be greater than 0",
            ));
        }

        for (name, weight) in &retrieval.source_weights {
            let path = format!("retrieval.source_weights.{}", name);
            if name.parse::<SourceClass>().is_err() {
                errors.push(ValidationError::new(
                    path.clone(),
                    format!("Unknown source class '{}'", name),
                ));
            }
            if !Self::is_valid_weight(*weight) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be a finite, non-negative number, got {}", weight),
                ));
            }
        }

        if !Self::is_valid_weight(retrieval.default_weight) {
            errors.push(ValidationError::new(
                "retrieval.default_weight",
                format!(
                    "Weight must be a finite, non-negative number, got {}",
                    retrieval.default_weight
                ),
            ));
        }
    }

    fn validate_reranker(config: &Config, errors: &mut Vec<ValidationError>) {
        let model = &config.reranker.model;
        if !RERANKER_MODELS.contains(&model.as_str()) {
            errors.push(ValidationError::new(
                "reranker.model",
                format!("Model must be one of {:?}, got '{}'", RERANKER_MODELS, model),
            ));
        }
    }

    fn validate_reasoning(config: &Config, errors: &mut Vec<ValidationError>) {
        let reasoning = &config.reasoning;

        if !reasoning.base_url.starts_with("http://") && !reasoning.base_url.starts_with("https://") {
            errors.push(ValidationError::new(
                "reasoning.base_url",
                format!("Base URL must start with http:// or https://, got '{}'", reasoning.base_url),
            ));
        }

        if reasoning.model.trim().is_empty() {
            errors.push(ValidationError::new(
                "reasoning.model",
                "Model name cannot be empty",
            ));
        }

        let temp = reasoning.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "reasoning.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        if reasoning.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "reasoning.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_authority(config: &Config, errors: &mut Vec<ValidationError>) {
        let order = &config.authority.order;
        if order.is_empty() {
            errors.push(ValidationError::new(
                "authority.order",
                "Authority order must list at least one source class",
            ));
            return;
        }

        let mut seen = HashSet::new();
        for name in order {
            match name.parse::<SourceClass>() {
                Ok(class) => {
                    if !seen.insert(class) {
                        errors.push(ValidationError::new(
                            "authority.order",
                            format!("Source class '{}' listed more than once", name),
                        ));
                    }
                }
                Err(_) => errors.push(ValidationError::new(
                    "authority.order",
                    format!("Unknown source class '{}'", name),
                )),
            }
        }
    }

    fn validate_paths(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked at query time; the data dir may not exist yet
        if config.corpus.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "corpus.data_dir",
                "Data directory cannot be empty",
            ));
        }

        if config.report.log_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "report.log_path",
                "Log path cannot be empty",
            ));
        }

        if config.report.preview_chars == 0 {
            errors.push(ValidationError::new(
                "report.preview_chars",
                "Preview length must be greater than 0",
            ));
        }
    }

    fn is_valid_weight(weight: f32) -> bool {
        weight.is_finite() && weight >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_for(config: &Config) -> Vec<ValidationError> {
        match ConfigValidator::validate(config) {
            Err(ConcordError::ConfigValidation { errors }) => errors,
            Ok(()) => Vec::new(),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_default_config_valid() {
        assert!(ConfigValidator::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_schema_version() {
        let mut config = Config::default();
        config.meta.schema_version = "2.0.0".to_string();
        let errors = errors_for(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "_meta.schema_version");
    }

    #[test]
    fn test_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        config.retrieval.rerank_top_k = 0;
        let errors = errors_for(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_weight_class() {
        let mut config = Config::default();
        config.retrieval.source_weights.insert("wiki".to_string(), 1.1);
        config.retrieval.source_weights.insert("forum".to_string(), -0.5);

        let paths: Vec<String> = errors_for(&config).into_iter().map(|e| e.path).collect();
        assert!(paths.contains(&"retrieval.source_weights.wiki".to_string()));
        assert!(paths.contains(&"retrieval.source_weights.forum".to_string()));
    }

    #[test]
    fn test_authority_order() {
        let mut config = Config::default();
        config.authority.order = vec!["docs".to_string(), "docs".to_string(), "wiki".to_string()];
        assert_eq!(errors_for(&config).len(), 2);

        config.authority.order.clear();
        assert_eq!(errors_for(&config).len(), 1);
    }

    #[test]
    fn test_reasoning_settings() {
        let mut config = Config::default();
        config.reasoning.base_url = "localhost:1234".to_string();
        config.reasoning.temperature = 3.0;
        config.reasoning.timeout_secs = 0;
        assert_eq!(errors_for(&config).len(), 3);
    }

    #[test]
    fn test_embedding_model_names() {
        let mut config = Config::default();
        config.embedding.model = "BGE-Small-EN-v1.5".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
        assert!(FastEmbedProvider::is_supported(&config.embedding.model));

        config.embedding.model = "bge-large-en".to_string();
        let errors = errors_for(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "embedding.model");
    }

    #[test]
    fn test_reranker_models() {
        let mut config = Config::default();
        config.reranker.model = "term-overlap".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.reranker.model = "colbert".to_string();
        assert_eq!(errors_for(&config)[0].path, "reranker.model");
    }
}
