//! Prompt assembly for the suggestion request. Italian throughout: the
//! product serves Italian professionals and the output descriptions go on
//! the quote verbatim.

use preventivo_core::reconciler::SuggestionRequest;

pub fn build_suggestion_prompt(request: &SuggestionRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Sei un assistente che stima le voci di un preventivo per un professionista italiano.\n",
    );
    prompt.push_str("Lavoro richiesto: ");
    prompt.push_str(request.job_description.trim());
    prompt.push('\n');

    if let Some(category) = &request.category_id {
        prompt.push_str("Categoria professionale: ");
        prompt.push_str(category);
        prompt.push('\n');
    }
    prompt.push_str("Fascia di prezzo: ");
    prompt.push_str(request.tier.as_str());
    prompt.push('\n');

    if let Some(context) = &request.context_prompt {
        prompt.push('\n');
        prompt.push_str(context.trim());
        prompt.push('\n');
    }

    prompt.push_str(concat!(
        "\nRispondi SOLO con un oggetto JSON, senza testo aggiuntivo, con questo schema:\n",
        "{\n",
        "  \"suggestions\": [\n",
        "    {\n",
        "      \"description\": \"voce in italiano\",\n",
        "      \"quantity\": 1,\n",
        "      \"suggested_unit_cost\": 100.0,\n",
        "      \"suggested_margin_percent\": 30.0,\n",
        "      \"confidence\": \"high|medium|low\",\n",
        "      \"explanation\": \"motivazione breve della stima\",\n",
        "      \"needs_input\": false\n",
        "    }\n",
        "  ],\n",
        "  \"payment_terms\": \"30 giorni\",\n",
        "  \"validity_days\": 30,\n",
        "  \"notes\": null\n",
        "}\n",
        "Ogni voce deve avere una explanation non vuota.\n",
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use preventivo_core::domain::quote::Tier;
    use preventivo_core::reconciler::SuggestionRequest;

    use super::build_suggestion_prompt;

    #[test]
    fn prompt_carries_job_category_and_tier() {
        let prompt = build_suggestion_prompt(&SuggestionRequest {
            job_description: "Rifacimento bagno 8mq".to_string(),
            category_id: Some("idraulico".to_string()),
            tier: Tier::Premium,
            context_prompt: None,
        });

        assert!(prompt.contains("Rifacimento bagno 8mq"));
        assert!(prompt.contains("Categoria professionale: idraulico"));
        assert!(prompt.contains("Fascia di prezzo: premium"));
        assert!(prompt.contains("\"suggestions\""));
    }

    #[test]
    fn learning_context_is_embedded_verbatim() {
        let prompt = build_suggestion_prompt(&SuggestionRequest {
            job_description: "Consulenza".to_string(),
            category_id: None,
            tier: Tier::Standard,
            context_prompt: Some("Margine medio applicato: 30%.".to_string()),
        });

        assert!(prompt.contains("Margine medio applicato: 30%."));
    }
}
