use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the market-estimate flow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateStage {
    /// No work started yet
    Init,
    /// Refining the raw query with the chat model
    Refining,
    /// Gathering market data with the search model
    Retrieving,
    /// Structuring the findings into JSON with the chat model
    Structuring,
    /// All stages finished
    Done,
    /// A stage failed and the flow was aborted
    Failed,
}

impl fmt::Display for EstimateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimateStage::Init => "init",
            EstimateStage::Refining => "refining",
            EstimateStage::Retrieving => "retrieving",
            EstimateStage::Structuring => "structuring",
            EstimateStage::Done => "done",
            EstimateStage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Professional fee range in the researched market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeRange {
    pub minimo: String,
    pub maximo: String,
    pub promedio: String,
    pub moneda: String,
}

/// One government fee or duty found in the research
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernmentCost {
    pub concepto: String,
    pub costo: String,
    pub fuente: String,
}

/// One billing arrangement found in the research
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeType {
    pub tipo: String,
    pub descripcion: String,
}

/// Structured market estimate produced by the final stage.
///
/// Every field defaults when the model omits it, so a parsed estimate
/// always carries the full set of keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketEstimate {
    pub rangos_honorarios: FeeRange,
    pub costos_gubernamentales: Vec<GovernmentCost>,
    pub tipos_cobro: Vec<ChargeType>,
    pub factores: Vec<String>,
    pub fuentes_oficiales: Vec<String>,
    pub analisis_detallado: String,
}

impl MarketEstimate {
    /// Placeholder estimate carrying unstructured findings as the analysis.
    ///
    /// Used when the structuring stage returns something that is not a
    /// JSON object, so the caller still receives the researched prose.
    pub fn with_analysis(analysis: impl Into<String>) -> Self {
        Self {
            rangos_honorarios: FeeRange {
                minimo: "No disponible".to_string(),
                maximo: "No disponible".to_string(),
                promedio: "No disponible".to_string(),
                moneda: "MXN".to_string(),
            },
            analisis_detallado: analysis.into(),
            ..Default::default()
        }
    }
}

/// Final content of a completed market-estimate run
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateResult {
    /// Refined query produced by the first stage
    pub refined_query: String,
    /// Structured estimate produced by the final stage
    pub estimate: MarketEstimate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_estimate() {
        let json = r#"{
            "rangosHonorarios": {"minimo": "$8,000", "maximo": "$25,000", "promedio": "$15,000", "moneda": "MXN"},
            "costosGubernamentales": [
                {"concepto": "Derechos de registro", "costo": "$1,250", "fuente": "Gaceta Oficial CDMX"}
            ],
            "tiposCobro": [{"tipo": "Monto fijo", "descripcion": "Pago único por el trámite completo"}],
            "factores": ["Complejidad del caso"],
            "fuentesOficiales": ["gob.mx"],
            "analisisDetallado": "Los honorarios varían según la jurisdicción."
        }"#;

        let estimate: MarketEstimate = serde_json::from_str(json).unwrap();

        assert_eq!(estimate.rangos_honorarios.promedio, "$15,000");
        assert_eq!(estimate.costos_gubernamentales.len(), 1);
        assert_eq!(estimate.costos_gubernamentales[0].concepto, "Derechos de registro");
        assert_eq!(estimate.tipos_cobro[0].tipo, "Monto fijo");
        assert_eq!(estimate.fuentes_oficiales, vec!["gob.mx"]);
    }

    #[test]
    fn test_missing_keys_default() {
        let estimate: MarketEstimate = serde_json::from_str("{}").unwrap();
        assert!(estimate.costos_gubernamentales.is_empty());
        assert!(estimate.analisis_detallado.is_empty());
        assert_eq!(estimate.rangos_honorarios, FeeRange::default());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = serde_json::to_string(&MarketEstimate::default()).unwrap();
        assert!(json.contains("\"rangosHonorarios\""));
        assert!(json.contains("\"costosGubernamentales\""));
        assert!(json.contains("\"tiposCobro\""));
        assert!(json.contains("\"fuentesOficiales\""));
        assert!(json.contains("\"analisisDetallado\""));
    }

    #[test]
    fn test_with_analysis_fills_placeholders() {
        let estimate = MarketEstimate::with_analysis("hallazgos sin estructurar");
        assert_eq!(estimate.analisis_detallado, "hallazgos sin estructurar");
        assert_eq!(estimate.rangos_honorarios.moneda, "MXN");
        assert_eq!(estimate.rangos_honorarios.minimo, "No disponible");
        assert!(estimate.factores.is_empty());
    }

    #[test]
    fn test_stage_display_order() {
        let names: Vec<String> = [
            EstimateStage::Init,
            EstimateStage::Refining,
            EstimateStage::Retrieving,
            EstimateStage::Structuring,
            EstimateStage::Done,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(names, ["init", "refining", "retrieving", "structuring", "done"]);
    }
}
