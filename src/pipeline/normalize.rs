use crate::models::{
    EstimateResult, GeneratedContent, GenerationTask, ListBounds, MarketEstimate,
};

/// Ordered punctuation replacement rules.
///
/// Generated text must only carry straight quotes and simple hyphens, so
/// every typographic variant maps onto its plain form. Text and list
/// output go through this same table.
const REPLACEMENT_RULES: &[(&[char], char)] = &[
    (&['«', '»', '\u{201C}', '\u{201D}', '\u{201F}', '\u{2033}', '\u{2036}'], '"'),
    (&['\u{2013}', '\u{2014}'], '-'),
    (&['\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}', '\u{2032}', '\u{2035}'], '\''),
];

/// Characters stripped from both ends after replacement
fn is_edge_noise(c: char) -> bool {
    c == '"' || c == '\'' || c == '-' || c.is_whitespace()
}

/// Canonicalize punctuation in one string.
///
/// Applies the replacement rules, then strips leading and trailing runs
/// of quotes, hyphens, and whitespace. Idempotent: normalizing already
/// normalized text changes nothing.
pub fn normalize_text(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| {
            for (variants, plain) in REPLACEMENT_RULES {
                if variants.contains(&c) {
                    return *plain;
                }
            }
            c
        })
        .collect();

    replaced.trim_matches(is_edge_noise).to_string()
}

/// Canonicalize every item of a list
pub fn normalize_list(items: Vec<String>) -> Vec<String> {
    items.iter().map(|item| normalize_text(item)).collect()
}

/// Enforce list bounds: truncate above the maximum, then pad with filler
/// items until the minimum is reached.
///
/// Model items always come first, in their original order. Filler is
/// appended in its fixed order and never pushes the list past the
/// minimum.
pub fn enforce_bounds(
    mut items: Vec<String>,
    bounds: ListBounds,
    filler: &'static [&'static str],
) -> Vec<String> {
    if items.len() > bounds.max {
        items.truncate(bounds.max);
    }

    let mut next = filler.iter();
    while items.len() < bounds.min {
        match next.next() {
            Some(entry) => items.push((*entry).to_string()),
            None => break,
        }
    }

    items
}

/// Canonicalize every string field of a market estimate
pub fn normalize_estimate(estimate: MarketEstimate) -> MarketEstimate {
    let mut estimate = estimate;

    estimate.rangos_honorarios.minimo = normalize_text(&estimate.rangos_honorarios.minimo);
    estimate.rangos_honorarios.maximo = normalize_text(&estimate.rangos_honorarios.maximo);
    estimate.rangos_honorarios.promedio = normalize_text(&estimate.rangos_honorarios.promedio);
    estimate.rangos_honorarios.moneda = normalize_text(&estimate.rangos_honorarios.moneda);

    for cost in &mut estimate.costos_gubernamentales {
        cost.concepto = normalize_text(&cost.concepto);
        cost.costo = normalize_text(&cost.costo);
        cost.fuente = normalize_text(&cost.fuente);
    }
    for charge in &mut estimate.tipos_cobro {
        charge.tipo = normalize_text(&charge.tipo);
        charge.descripcion = normalize_text(&charge.descripcion);
    }

    estimate.factores = normalize_list(estimate.factores);
    estimate.fuentes_oficiales = normalize_list(estimate.fuentes_oficiales);
    estimate.analisis_detallado = normalize_text(&estimate.analisis_detallado);

    estimate
}

/// Normalize parsed content for its task: canonicalize all text, then
/// apply the task's list bounds.
pub fn normalize_content(content: GeneratedContent, task: GenerationTask) -> GeneratedContent {
    let spec = task.spec();
    match content {
        GeneratedContent::Text(text) => GeneratedContent::Text(normalize_text(&text)),
        GeneratedContent::List(items) => {
            let mut items = normalize_list(items);
            if let Some(bounds) = spec.bounds {
                items = enforce_bounds(items, bounds, spec.fallback_items);
            }
            GeneratedContent::List(items)
        }
        GeneratedContent::Estimate(result) => GeneratedContent::Estimate(EstimateResult {
            refined_query: normalize_text(&result.refined_query),
            estimate: normalize_estimate(result.estimate),
        }),
    }
}
