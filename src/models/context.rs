use serde::{Deserialize, Serialize};

/// Flat record of caller-supplied fields for prompt composition.
///
/// Every task reads its own subset; absent fields simply omit their
/// prompt section. Wire names are camelCase to match the HTTP API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationContext {
    /// Payment method details for payment text generation
    pub method_info: Option<String>,
    /// How the payment text will be inserted into the quotation
    pub insertion_type: Option<String>,
    /// Existing quotation or section text
    pub current_text: Option<String>,
    /// Whether generated payment text replaces the existing section
    pub replace_existing: bool,
    /// Client name
    pub cliente_nombre: Option<String>,
    /// Sender shown in the quotation
    pub remitente: Option<String>,
    /// Service description
    pub descripcion: Option<String>,
    /// Estimated delivery time
    pub tiempo: Option<String>,
    /// Quoted price
    pub precio: Option<String>,
    /// Payment terms
    pub forma_pago: Option<String>,
    /// Law firm details
    pub despacho_info: Option<String>,
    /// Responsible lawyer details
    pub user_info: Option<String>,
    /// Quotation kind for the detailed body
    pub tipo_cotizacion: Option<String>,
    /// Section structure requested for the detailed body
    pub estructura: Option<String>,
    /// Service description for form suggestions
    pub descripcion_servicio: Option<String>,
    /// Client needs for form suggestions
    pub necesidades_cliente: Option<String>,
    /// Jurisdiction for suggestions and market estimates
    pub jurisdiccion: Option<String>,
    /// Raw market estimate query
    pub query: Option<String>,
    /// Refined query produced by the first estimate stage
    pub refined_query: Option<String>,
    /// Research findings produced by the second estimate stage
    pub search_findings: Option<String>,
}
