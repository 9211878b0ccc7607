use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generation tasks the pipeline knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    /// Payment instructions block for a quotation
    PaymentText,
    /// Client documentation requirements for a quotation
    RequirementsList,
    /// Short single-block quotation body
    QuoteShort,
    /// Long structured quotation body
    QuoteDetailed,
    /// Requirement suggestions for the quotation form
    QuoteRequirementsSuggestions,
    /// Client need suggestions for the quotation form
    NeedsSuggestions,
    /// Delivery time suggestions for the quotation form
    TimeSuggestions,
    /// Three-stage market price estimate
    MarketEstimate,
}

/// Expected shape of a task's final content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A single free-text block
    Text,
    /// A list of short items
    List,
    /// A structured market estimate
    Estimate,
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputShape::Text => write!(f, "text"),
            OutputShape::List => write!(f, "list"),
            OutputShape::Estimate => write!(f, "estimate"),
        }
    }
}

/// Inclusive size bounds for list-shaped output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListBounds {
    pub min: usize,
    pub max: usize,
}

/// Static description of how one task is prompted, parsed, and bounded
#[derive(Debug)]
pub struct TaskSpec {
    /// Shape of the final content
    pub shape: OutputShape,
    /// Size bounds, for list-shaped tasks
    pub bounds: Option<ListBounds>,
    /// Whether the model is asked for a JSON object response
    pub json_mode: bool,
    /// Top-level JSON field holding the list, when JSON mode is used
    pub json_field: Option<&'static str>,
    /// Deterministic filler items used to pad a short list
    pub fallback_items: &'static [&'static str],
    /// Static text substituted when a text task yields nothing usable
    pub fallback_text: &'static str,
}

/// Filler requirements appended when the model returns too few
const REQUIREMENTS_FALLBACK: &[&str] = &[
    "Identificación oficial vigente",
    "Comprobante de domicilio",
    "Poder de representación",
    "Documentación del asunto",
    "Contratos relacionados",
    "Correspondencia previa relevante",
    "Estados de cuenta recientes",
    "Constancia de situación fiscal",
    "Antecedentes del caso",
    "Datos de la contraparte",
];

/// Filler requirement suggestions for the quotation form
const REQUIREMENT_SUGGESTIONS_FALLBACK: &[&str] = &[
    "Acta constitutiva de la empresa",
    "Identificación del representante legal",
    "Comprobante de domicilio reciente",
    "Descripción detallada del servicio",
    "Documentos relacionados con el asunto",
    "Información de la contraparte",
];

/// Filler client need suggestions
const NEEDS_FALLBACK: &[&str] = &[
    "Asesoría legal preventiva",
    "Revisión de contratos",
    "Representación ante autoridades",
    "Cumplimiento normativo",
    "Negociación con contrapartes",
    "Gestión de trámites legales",
];

/// Filler delivery time suggestions
const TIMES_FALLBACK: &[&str] = &[
    "1 semana hábil",
    "2 semanas hábiles",
    "1 mes",
    "6 semanas",
    "2 meses",
    "3 meses",
];

/// Static payment text substituted when generation yields nothing usable
const PAYMENT_FALLBACK_TEXT: &str = "El pago podrá realizarse mediante transferencia bancaria o directamente en las oficinas del despacho. Los datos de pago se proporcionarán junto con la confirmación de esta cotización.";

/// Static quotation body substituted when generation yields nothing usable
const QUOTE_FALLBACK_TEXT: &str = "Estimado cliente:\n\nAgradecemos su interés en nuestros servicios legales. Con base en la información proporcionada hemos preparado una propuesta de honorarios, que con gusto detallaremos en una llamada o reunión.\n\nQuedamos atentos a sus comentarios.";

const PAYMENT_TEXT_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::Text,
    bounds: None,
    json_mode: false,
    json_field: None,
    fallback_items: &[],
    fallback_text: PAYMENT_FALLBACK_TEXT,
};

const REQUIREMENTS_LIST_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::List,
    bounds: Some(ListBounds { min: 8, max: 10 }),
    json_mode: true,
    json_field: Some("requirements"),
    fallback_items: REQUIREMENTS_FALLBACK,
    fallback_text: "",
};

const QUOTE_SHORT_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::Text,
    bounds: None,
    json_mode: false,
    json_field: None,
    fallback_items: &[],
    fallback_text: QUOTE_FALLBACK_TEXT,
};

const QUOTE_DETAILED_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::Text,
    bounds: None,
    json_mode: false,
    json_field: None,
    fallback_items: &[],
    fallback_text: QUOTE_FALLBACK_TEXT,
};

const QUOTE_REQUIREMENT_SUGGESTIONS_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::List,
    bounds: Some(ListBounds { min: 3, max: 6 }),
    json_mode: false,
    json_field: None,
    fallback_items: REQUIREMENT_SUGGESTIONS_FALLBACK,
    fallback_text: "",
};

const NEEDS_SUGGESTIONS_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::List,
    bounds: Some(ListBounds { min: 3, max: 6 }),
    json_mode: false,
    json_field: None,
    fallback_items: NEEDS_FALLBACK,
    fallback_text: "",
};

const TIME_SUGGESTIONS_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::List,
    bounds: Some(ListBounds { min: 3, max: 6 }),
    json_mode: false,
    json_field: None,
    fallback_items: TIMES_FALLBACK,
    fallback_text: "",
};

const MARKET_ESTIMATE_SPEC: TaskSpec = TaskSpec {
    shape: OutputShape::Estimate,
    bounds: None,
    json_mode: true,
    json_field: None,
    fallback_items: &[],
    fallback_text: "",
};

impl GenerationTask {
    /// All tasks, in a stable order
    pub const ALL: [GenerationTask; 8] = [
        GenerationTask::PaymentText,
        GenerationTask::RequirementsList,
        GenerationTask::QuoteShort,
        GenerationTask::QuoteDetailed,
        GenerationTask::QuoteRequirementsSuggestions,
        GenerationTask::NeedsSuggestions,
        GenerationTask::TimeSuggestions,
        GenerationTask::MarketEstimate,
    ];

    /// Look up the static spec for this task
    pub fn spec(self) -> &'static TaskSpec {
        match self {
            GenerationTask::PaymentText => &PAYMENT_TEXT_SPEC,
            GenerationTask::RequirementsList => &REQUIREMENTS_LIST_SPEC,
            GenerationTask::QuoteShort => &QUOTE_SHORT_SPEC,
            GenerationTask::QuoteDetailed => &QUOTE_DETAILED_SPEC,
            GenerationTask::QuoteRequirementsSuggestions => &QUOTE_REQUIREMENT_SUGGESTIONS_SPEC,
            GenerationTask::NeedsSuggestions => &NEEDS_SUGGESTIONS_SPEC,
            GenerationTask::TimeSuggestions => &TIME_SUGGESTIONS_SPEC,
            GenerationTask::MarketEstimate => &MARKET_ESTIMATE_SPEC,
        }
    }

    /// Name used on the wire, in logs, and on the command line
    pub fn name(self) -> &'static str {
        match self {
            GenerationTask::PaymentText => "payment_text",
            GenerationTask::RequirementsList => "requirements_list",
            GenerationTask::QuoteShort => "quote_short",
            GenerationTask::QuoteDetailed => "quote_detailed",
            GenerationTask::QuoteRequirementsSuggestions => "quote_requirements_suggestions",
            GenerationTask::NeedsSuggestions => "needs_suggestions",
            GenerationTask::TimeSuggestions => "time_suggestions",
            GenerationTask::MarketEstimate => "market_estimate",
        }
    }

    /// Whether this task runs the three-stage estimate flow
    pub fn is_multi_stage(self) -> bool {
        matches!(self, GenerationTask::MarketEstimate)
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GenerationTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenerationTask::ALL
            .into_iter()
            .find(|task| task.name() == s)
            .ok_or_else(|| format!("unknown task '{s}'"))
    }
}
