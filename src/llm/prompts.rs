use crate::models::{GenerationContext, GenerationTask};

/// A composed system/user prompt pair for one remote call
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// System prompt for quotation bodies
pub const QUOTE_SYSTEM_PROMPT: &str = r#"Eres un abogado senior que redacta cotizaciones de servicios legales para despachos en México. Debes seguir estas reglas:

1. Escribe en español formal de México, con tono profesional y cercano.
2. Usa texto plano: sin Markdown, sin asteriscos, sin numeración decorativa.
3. Usa comillas rectas (") y guiones simples (-), nunca comillas tipográficas.
4. Usa únicamente la información proporcionada; no inventes montos, fechas ni datos de contacto.
5. No incluyas encabezados de carta (fecha, dirección) salvo que se soliciten."#;

/// System prompt for the payment instructions block
pub const PAYMENT_SYSTEM_PROMPT: &str = r#"Eres un asistente legal que redacta la sección de pago de cotizaciones de servicios jurídicos en México. Debes seguir estas reglas:

1. Escribe en español formal, claro y breve.
2. Usa texto plano, sin Markdown ni viñetas decorativas.
3. Incluye únicamente los datos de pago proporcionados; no inventes cuentas, montos ni plazos.
4. Máximo 120 palabras."#;

/// System prompt for the documentation requirements list (JSON mode)
pub const REQUIREMENTS_SYSTEM_PROMPT: &str = r#"Eres un asistente legal que determina la documentación que un cliente debe entregar para iniciar un servicio jurídico en México. Debes seguir estas reglas:

1. Responde ÚNICAMENTE con un objeto JSON válido con la forma {"requirements": ["...", "..."]}.
2. Incluye entre 8 y 10 requisitos.
3. Máximo 4 palabras por requisito.
4. Lista requisitos concretos de documentación o información, sin explicaciones."#;

/// System prompt for short form-field suggestion lists
pub const SUGGESTIONS_SYSTEM_PROMPT: &str = r#"Eres un asistente legal que propone opciones breves para los campos de un formulario de cotización. Debes seguir estas reglas:

1. Responde solo con una lista: una opción por línea.
2. Sin numeración, sin viñetas y sin texto adicional antes o después.
3. Máximo 6 opciones, cada una de máximo 6 palabras.
4. Opciones concretas y habituales en la práctica legal mexicana."#;

/// System prompt for the query refinement stage of a market estimate
pub const REFINE_SYSTEM_PROMPT: &str = r#"Eres un analista de mercado de servicios legales en México. Conviertes consultas vagas en consultas de búsqueda precisas. Debes seguir estas reglas:

1. Devuelve únicamente la consulta refinada, sin explicaciones ni comillas.
2. Incluye el tipo de servicio, la jurisdicción cuando se conozca, y los términos "honorarios", "tarifas" y "costos gubernamentales".
3. Máximo 40 palabras."#;

/// System prompt for the research stage of a market estimate
pub const RETRIEVAL_SYSTEM_PROMPT: &str = r#"Eres un investigador de precios del mercado legal mexicano. Respondes con datos actuales y citas las fuentes oficiales que consultaste. Si un dato no está disponible, dilo explícitamente en lugar de estimarlo."#;

/// System prompt for the structuring stage of a market estimate (JSON mode)
pub const STRUCTURING_SYSTEM_PROMPT: &str = r#"Eres un asistente que convierte investigación de mercado legal en datos estructurados. Debes seguir estas reglas:

1. Responde ÚNICAMENTE con un objeto JSON válido con exactamente estas claves:
{
  "rangosHonorarios": {"minimo": "...", "maximo": "...", "promedio": "...", "moneda": "MXN"},
  "costosGubernamentales": [{"concepto": "...", "costo": "...", "fuente": "..."}],
  "tiposCobro": [{"tipo": "...", "descripcion": "..."}],
  "factores": ["..."],
  "fuentesOficiales": ["..."],
  "analisisDetallado": "..."
}
2. Usa solo datos presentes en la investigación proporcionada.
3. Si un dato no aparece, usa "No disponible" o una lista vacía; nunca omitas claves."#;

/// Compose the ordered prompt pairs for a task.
///
/// Single-stage tasks compose exactly one pair. The market estimate
/// composes three, one per stage; the later stages read the refined
/// query and research findings threaded through the context.
pub fn compose(task: GenerationTask, ctx: &GenerationContext) -> Vec<PromptPair> {
    match task {
        GenerationTask::PaymentText => vec![payment_prompt(ctx)],
        GenerationTask::RequirementsList => vec![requirements_prompt(ctx)],
        GenerationTask::QuoteShort => vec![quote_short_prompt(ctx)],
        GenerationTask::QuoteDetailed => vec![quote_detailed_prompt(ctx)],
        GenerationTask::QuoteRequirementsSuggestions => vec![requirement_options_prompt(ctx)],
        GenerationTask::NeedsSuggestions => vec![need_options_prompt(ctx)],
        GenerationTask::TimeSuggestions => vec![time_options_prompt(ctx)],
        GenerationTask::MarketEstimate => vec![
            refine_prompt(ctx),
            retrieval_prompt(ctx),
            structuring_prompt(ctx),
        ],
    }
}

/// Build the payment instructions prompt
pub fn payment_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Redacta el texto de la sección de pago para una cotización de servicios legales.\n\n");

    if let Some(info) = &ctx.method_info {
        user.push_str(&format!("## Método de pago\n{info}\n\n"));
    }

    if let Some(current) = &ctx.current_text {
        if ctx.replace_existing {
            user.push_str(&format!(
                "## Texto actual (será reemplazado por completo)\n{current}\n\n"
            ));
        } else {
            user.push_str(&format!(
                "## Texto actual (consérvalo y agrega la nueva información)\n{current}\n\n"
            ));
        }
    }

    if let Some(kind) = &ctx.insertion_type {
        user.push_str(&format!("Tipo de inserción solicitada: {kind}.\n\n"));
    }

    user.push_str("## Instrucciones\n");
    user.push_str("Entrega únicamente el texto final de la sección de pago.\n");

    PromptPair {
        system: PAYMENT_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the documentation requirements prompt
pub fn requirements_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Genera la lista de requisitos de documentación que el cliente debe entregar para la siguiente cotización legal.\n\n");

    if let Some(text) = &ctx.current_text {
        user.push_str(&format!("## Cotización\n{text}\n\n"));
    }

    user.push_str("Devuelve el objeto JSON con los requisitos.\n");

    PromptPair {
        system: REQUIREMENTS_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the short quotation body prompt
pub fn quote_short_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Redacta una cotización breve de servicios legales en un solo bloque de texto.\n\n");

    user.push_str("## Datos\n");
    push_field(&mut user, "Cliente", &ctx.cliente_nombre);
    push_field(&mut user, "Remitente", &ctx.remitente);
    push_field(&mut user, "Servicio", &ctx.descripcion);
    push_field(&mut user, "Tiempo estimado", &ctx.tiempo);
    push_field(&mut user, "Precio", &ctx.precio);
    push_field(&mut user, "Forma de pago", &ctx.forma_pago);
    push_field(&mut user, "Despacho", &ctx.despacho_info);
    push_field(&mut user, "Responsable", &ctx.user_info);

    user.push_str("\n## Instrucciones\n");
    user.push_str("Estructura el texto así: saludo al cliente, descripción del servicio, tiempo de entrega, honorarios con forma de pago, y cierre cordial.\n");
    user.push_str("Máximo 180 palabras.\n");

    PromptPair {
        system: QUOTE_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the detailed quotation body prompt
pub fn quote_detailed_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Redacta una cotización formal y completa de servicios legales.\n\n");

    user.push_str("## Datos\n");
    push_field(&mut user, "Cliente", &ctx.cliente_nombre);
    push_field(&mut user, "Remitente", &ctx.remitente);
    push_field(&mut user, "Servicio", &ctx.descripcion);
    push_field(&mut user, "Tiempo estimado", &ctx.tiempo);
    push_field(&mut user, "Precio", &ctx.precio);
    push_field(&mut user, "Forma de pago", &ctx.forma_pago);
    push_field(&mut user, "Despacho", &ctx.despacho_info);
    push_field(&mut user, "Responsable", &ctx.user_info);
    push_field(&mut user, "Tipo de cotización", &ctx.tipo_cotizacion);

    if let Some(estructura) = &ctx.estructura {
        user.push_str(&format!(
            "\n## Estructura solicitada\nOrganiza el documento siguiendo exactamente estas secciones:\n{estructura}\n"
        ));
    }

    user.push_str("\n## Instrucciones\n");
    user.push_str("Desarrolla cada sección con párrafos completos; separa las secciones con su título en una línea propia.\n");
    user.push_str("Máximo 450 palabras.\n");

    PromptPair {
        system: QUOTE_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the requirement suggestions prompt
pub fn requirement_options_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Propón requisitos de documentación que un despacho pediría a este cliente.\n\n");
    push_suggestion_context(&mut user, ctx);
    user.push_str("Lista los requisitos, uno por línea.\n");

    PromptPair {
        system: SUGGESTIONS_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the client need suggestions prompt
pub fn need_options_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Propón necesidades típicas que un cliente podría querer cubrir con este servicio legal.\n\n");
    push_suggestion_context(&mut user, ctx);
    user.push_str("Lista las necesidades, una por línea.\n");

    PromptPair {
        system: SUGGESTIONS_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the delivery time suggestions prompt
pub fn time_options_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Propón tiempos de entrega realistas para este servicio legal.\n\n");
    push_suggestion_context(&mut user, ctx);
    user.push_str("Lista los tiempos de entrega, uno por línea, del más corto al más largo.\n");

    PromptPair {
        system: SUGGESTIONS_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the query refinement prompt (estimate stage 1)
pub fn refine_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Refina la siguiente consulta para buscar precios de mercado de un servicio legal:\n\n");

    if let Some(query) = &ctx.query {
        user.push_str(&format!("## Consulta\n{query}\n\n"));
    }
    if let Some(jurisdiccion) = &ctx.jurisdiccion {
        user.push_str(&format!("Jurisdicción: {jurisdiccion}\n\n"));
    }

    user.push_str("Devuelve la consulta refinada.\n");

    PromptPair {
        system: REFINE_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the market research prompt (estimate stage 2)
pub fn retrieval_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Investiga precios de mercado actuales en México para la siguiente consulta:\n\n");

    // the refined query from stage 1 drives the search; the raw query is
    // the safety net for direct callers and blank refinements
    let refined = ctx.refined_query.as_deref().filter(|s| !s.trim().is_empty());
    if let Some(refined) = refined {
        user.push_str(&format!("## Consulta\n{refined}\n\n"));
    } else if let Some(query) = &ctx.query {
        user.push_str(&format!("## Consulta\n{query}\n\n"));
    }

    user.push_str("## Qué reportar\n");
    user.push_str("- Rangos de honorarios profesionales: mínimo, máximo y promedio.\n");
    user.push_str("- Costos y derechos gubernamentales aplicables, con su tarifa oficial.\n");
    user.push_str("- Formas de cobro habituales (monto fijo, por hora, iguala, porcentaje).\n");
    user.push_str("- Factores que hacen variar el precio.\n");
    user.push_str("- Fuentes oficiales consultadas.\n");

    PromptPair {
        system: RETRIEVAL_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Build the structuring prompt (estimate stage 3)
pub fn structuring_prompt(ctx: &GenerationContext) -> PromptPair {
    let mut user = String::new();
    user.push_str("Convierte la siguiente investigación de mercado en el objeto JSON indicado.\n\n");

    if let Some(findings) = &ctx.search_findings {
        user.push_str(&format!("## Investigación\n{findings}\n\n"));
    }
    if let Some(refined) = &ctx.refined_query {
        user.push_str(&format!("Consulta investigada: {refined}\n\n"));
    }

    user.push_str("Devuelve el objeto JSON.\n");

    PromptPair {
        system: STRUCTURING_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Append a labeled data line when the field is present and non-empty
fn push_field(out: &mut String, label: &str, value: &Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            out.push_str(&format!("- {label}: {value}\n"));
        }
    }
}

/// Append the shared context section for suggestion prompts
fn push_suggestion_context(out: &mut String, ctx: &GenerationContext) {
    out.push_str("## Contexto\n");
    push_field(out, "Servicio", &ctx.descripcion_servicio);
    push_field(out, "Necesidades del cliente", &ctx.necesidades_cliente);
    push_field(out, "Jurisdicción", &ctx.jurisdiccion);
    out.push('\n');
}
