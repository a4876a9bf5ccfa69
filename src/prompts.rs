//! Prompt construction for persona simulation.
//!
//! Pure text builders. The rest of the crate treats their output as opaque
//! strings handed to a backend: a system prompt that puts the model in
//! character, and an evaluation prompt that presents the offer and pins
//! down the response schema.

use crate::model::{Offer, Persona};

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Full in-character system prompt for `persona`.
pub fn system_prompt(persona: &Persona) -> String {
    let traits = persona
        .personality_traits
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut sections = vec![
        format!("You are {}, {}.\n", persona.name, persona.description),
        format!(
            "# WHO YOU ARE\n\n\
             Age: {}\n\
             Income: {}\n\
             Occupation: {}\n\
             Where you live: {}\n\n\
             Personality: {}\n",
            persona.age_bracket,
            persona.income_bracket,
            persona.occupation,
            persona.location,
            traits,
        ),
        format!("## Your values\n{}\n", bullet_list(&persona.values)),
        format!(
            "## Your pains and problems\n{}\n",
            bullet_list(&persona.pain_points)
        ),
        format!("## Your goals\n{}\n", bullet_list(&persona.goals)),
        format!(
            "## What triggers you\n\n\
             Positive triggers (spark interest and trust):\n{}\n\n\
             Negative triggers (put you off, breed distrust):\n{}\n",
            join_or_none(&persona.triggers.positive),
            join_or_none(&persona.triggers.negative),
        ),
        format!(
            "## How you make decisions\n\n\
             When choosing a service you pay attention to:\n{}\n",
            bullet_list(&persona.decision_factors),
        ),
    ];

    if !persona.background_story.trim().is_empty() {
        sections.push(format!("## Your story\n\n{}\n", persona.background_story));
    }

    sections.push(format!(
        "# YOUR TASK\n\n\
         You are about to see an advertising offer.\n\
         React to it honestly, as {} would, with your own emotions, doubts and desires.\n\n\
         Behave naturally:\n\
         - Speak in the first person (\"I\", \"me\", \"I want\")\n\
         - Be honest about your emotions\n\
         - Draw on the experience and situation from your story\n\
         - Bring up your values and pains where they are relevant\n\
         - Do not play the ideal customer; keep your doubts\n\n\
         Important: you must NOT praise the ad automatically. If something puts you off, \
         raises doubts or fails your criteria, say so directly.",
        persona.name,
    ));

    sections.join("\n")
}

/// Condensed version of [`system_prompt`] for token-constrained calls.
pub fn short_system_prompt(persona: &Persona) -> String {
    let values = persona
        .values
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let top_pain = persona.pain_points.first().cloned().unwrap_or_default();

    let positive = persona.triggers.positive.join(", ");
    let positive = if positive.chars().count() > 100 {
        let head: String = positive.chars().take(100).collect();
        format!("{head}...")
    } else {
        positive
    };

    format!(
        "You are {} ({}), {} years old, {}.\n\n\
         Your values: {}\n\
         Your pains: {}\n\
         Triggers (+): {}\n\n\
         React to the ad honestly, as {}, with your own emotions and doubts.",
        persona.name,
        persona.description,
        persona.age_bracket,
        persona.occupation,
        values,
        top_pain,
        positive,
        persona.name,
    )
}

/// Evaluation prompt: shows the offer and pins the exact JSON shape the
/// parser expects, with alignment keys taken from the persona's own values.
pub fn evaluation_prompt(offer: &Offer, persona: &Persona) -> String {
    let pains = persona
        .pain_points
        .iter()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let values = persona
        .values
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let alignment_keys = persona
        .values
        .iter()
        .map(|v| format!("    \"{v}\": 0.0-1.0,"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You have just seen this advertisement:\n\n\
         ---\n\
         {offer_text}\n\
         ---\n\n\
         Respond to it as {name}, honestly and candidly.\n\n\
         Think step by step:\n\n\
         1. **First emotional reaction**\n\
            - What do you feel when you see this? (excitement, skepticism, irritation, curiosity?)\n\
            - How strong is that feeling? (weak, medium, strong)\n\
            - Why did you react that way?\n\n\
         2. **Offer analysis**\n\
            - What hooks you? What puts you off?\n\
            - Does it solve your pains: {pains}?\n\
            - Does it fit your values: {values}?\n\
            - What doubts and objections do you have?\n\n\
         3. **Decision**\n\
            - Would you sign up? (strong yes / maybe yes / neutral / probably not / strong no)\n\
            - How confident are you in that decision?\n\
            - What could convince you to say \"yes\"?\n\n\
         Return your answer as JSON:\n\n\
         {{\n\
           \"primary_emotion\": \"excited|interested|neutral|skeptical|annoyed|offended|curious|hopeful\",\n\
           \"emotion_intensity\": 0.0-1.0,\n\
           \"emotional_reasoning\": \"Why this emotion? 2-3 sentences, first person\",\n\n\
           \"first_impression\": \"First impression, 1-2 sentences\",\n\
           \"detailed_reasoning\": \"Detailed read of the offer, 3-5 sentences. What works, what does not, why\",\n\
           \"perceived_value\": 0.0-10.0,\n\n\
           \"decision\": \"strong_yes|maybe_yes|neutral|probably_not|strong_no\",\n\
           \"confidence_score\": 0.0-1.0,\n\n\
           \"alignment_with_values\": {{\n\
         {alignment_keys}\n\
           }},\n\
           \"pain_points_addressed\": [\"pains this offer actually solves\"],\n\
           \"objections\": [\"your doubts and objections\"],\n\n\
           \"what_would_convince\": \"What would it take to convince you? Optional, may be null\"\n\
         }}\n\n\
         Important:\n\
         - Speak in the first person (\"I\", \"me\", \"I want\")\n\
         - Be honest; if something bothers you, say why\n\
         - Draw on your situation and the experience from your story\n\
         - The JSON must be valid (no trailing commas)",
        offer_text = offer.to_display_text(),
        name = persona.name,
    )
}

/// Single-message prompt for backends without a separate system channel.
///
/// Concatenates the system and evaluation prompts and adds an explicit
/// only-JSON directive, since the output goes straight to the parser.
pub fn combined_prompt(persona: &Persona, offer: &Offer) -> String {
    format!(
        "{system}\n\n\
         ---\n\n\
         {evaluation}\n\n\
         IMPORTANT: Return ONLY valid JSON with no extra text. Use this format:\n\
         ```json\n\
         {{\n\
           \"primary_emotion\": \"...\",\n\
           \"emotion_intensity\": 0.0-1.0,\n\
           ...\n\
         }}\n\
         ```",
        system = system_prompt(persona),
        evaluation = evaluation_prompt(offer, persona),
    )
}
