use crate::models::{GeneratedContent, GenerationTask};

/// Result of checking content against its task contract
#[derive(Debug, Clone)]
pub struct ContractReport {
    /// Whether the content satisfies the contract
    pub is_valid: bool,
    /// Human-readable violations, for logs
    pub violations: Vec<String>,
}

impl ContractReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            violations: vec![],
        }
    }

    pub fn invalid(violations: Vec<String>) -> Self {
        Self {
            is_valid: false,
            violations,
        }
    }
}

/// Check normalized content against the task contract.
///
/// Verifies the content shape, that text did not normalize down to
/// nothing, the list bounds, and that no list item normalized down to
/// an empty string. Estimates are structurally complete by
/// construction, so only their shape is checked.
pub fn check_contract(content: &GeneratedContent, task: GenerationTask) -> ContractReport {
    let spec = task.spec();
    let mut violations = Vec::new();

    if content.shape() != spec.shape {
        violations.push(format!(
            "content shape {} does not match expected {}",
            content.shape(),
            spec.shape
        ));
        return ContractReport::invalid(violations);
    }

    match content {
        GeneratedContent::Text(text) => {
            if text.trim().is_empty() {
                violations.push("text is empty".to_string());
            }
        }
        GeneratedContent::List(items) => {
            if let Some(bounds) = spec.bounds {
                if items.len() < bounds.min {
                    violations.push(format!(
                        "list has {} items, expected at least {}",
                        items.len(),
                        bounds.min
                    ));
                }
                if items.len() > bounds.max {
                    violations.push(format!(
                        "list has {} items, expected at most {}",
                        items.len(),
                        bounds.max
                    ));
                }
            }
            for (index, item) in items.iter().enumerate() {
                if item.trim().is_empty() {
                    violations.push(format!("item {index} is empty"));
                }
            }
        }
        GeneratedContent::Estimate(_) => {}
    }

    if violations.is_empty() {
        ContractReport::valid()
    } else {
        ContractReport::invalid(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimateResult, MarketEstimate};

    fn list_of(n: usize) -> GeneratedContent {
        GeneratedContent::List((0..n).map(|i| format!("Requisito {i}")).collect())
    }

    #[test]
    fn test_text_content_for_text_task() {
        let content = GeneratedContent::Text("Cotización lista.".to_string());
        assert!(check_contract(&content, GenerationTask::QuoteShort).is_valid);
    }

    #[test]
    fn test_empty_text_is_invalid() {
        let content = GeneratedContent::Text("   ".to_string());
        let report = check_contract(&content, GenerationTask::PaymentText);
        assert!(!report.is_valid);
        assert_eq!(report.violations, vec!["text is empty"]);
    }

    #[test]
    fn test_shape_mismatch_is_invalid() {
        let content = GeneratedContent::Text("no es una lista".to_string());
        let report = check_contract(&content, GenerationTask::RequirementsList);
        assert!(!report.is_valid);
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn test_list_bounds_enforced() {
        assert!(check_contract(&list_of(8), GenerationTask::RequirementsList).is_valid);
        assert!(check_contract(&list_of(10), GenerationTask::RequirementsList).is_valid);
        assert!(!check_contract(&list_of(7), GenerationTask::RequirementsList).is_valid);
        assert!(!check_contract(&list_of(11), GenerationTask::RequirementsList).is_valid);
    }

    #[test]
    fn test_empty_items_are_violations() {
        let mut items: Vec<String> = (0..8).map(|i| format!("Requisito {i}")).collect();
        items[3] = "   ".to_string();
        let report = check_contract(
            &GeneratedContent::List(items),
            GenerationTask::RequirementsList,
        );
        assert!(!report.is_valid);
        assert!(report.violations[0].contains("item 3"));
    }

    #[test]
    fn test_estimate_shape_passes() {
        let content = GeneratedContent::Estimate(EstimateResult {
            refined_query: "honorarios divorcio CDMX".to_string(),
            estimate: MarketEstimate::default(),
        });
        assert!(check_contract(&content, GenerationTask::MarketEstimate).is_valid);
    }
}
