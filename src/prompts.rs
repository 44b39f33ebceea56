//! Prompt templates for the chat-model collaborators.
//!
//! The retrieval core never sees these: it consumes plain text and vectors.
//! They live here so the assistant layer and its tests share one source of
//! truth for the three model calls Aisle makes — query intent rewriting,
//! follow-up question generation, and review summarization.

/// Rewrites an indirect natural-language request into a search-engine query.
/// The model must answer with a JSON object carrying a `search_query` key.
pub const USER_INTENT: &str = r#"You're an e-commerce search assistant. Rewrite the user's natural-language or indirect request into a clear, intent-based search query suitable for a product search engine.

Instructions:
- Focus only on the item the user wants to purchase.
- Use context clues (matching with existing items, purpose, occasion, preferences) to refine the query.
- Do not include references to what the user already owns.
- Avoid conversational language; keep the query short, specific, and optimized for search.
- Include relevant attributes like color, type, size, use-case, or audience if clearly implied.

Examples:

User: "I need a formal top for my beige pants"
{ "search_query": "women's formal tops in navy, maroon, or black" }

User: "Looking for something to wear to a beach wedding"
{ "search_query": "women's beach wedding dresses" }

User: "Something to help with back pain while sitting at my desk all day."
{ "search_query": "lumbar support cushions" }

Now do the same for:
User Query: {user_query}

If the user query is already direct enough for a search engine, return it as-is.

Return your answer as a JSON object with the key "search_query"."#;

/// Asks a few conversational follow-up questions grounded in real reviews.
pub const FOLLOWUP_QUESTIONS: &str = r#"You're a helpful e-commerce assistant acting like a friendly in-store shopkeeper. Based on the user's product query and a set of real customer reviews, ask a few natural, conversational follow-up questions that help the user clarify their preferences or concerns.

Instructions:
- Use the reviews to inform your questions — highlight trends, issues, or standout positives from customer feedback.
- Ask only relevant and specific questions, no generic ones.
- Keep the tone friendly and human, like chatting in a store.
- Keep it short so the customer doesn't lose interest.

User Query: {user_query}
Product Reviews: {reviews}"#;

/// Produces a 2–3 line summary of a product's reviews.
pub const REVIEW_SUMMARY: &str = r#"You're an e-commerce assistant. Given a set of product reviews, generate a concise 2-3 line summary that highlights the most important insights about the product. Focus especially on what users loved and what they strongly disliked or found problematic. Mention recurring feedback, whether positive or negative, and skip vague or neutral points unless they are consistently raised.

- Use plain, customer-friendly language.
- Start with a high-level opinion if there's a strong consensus.

Product Reviews:
{reviews}"#;

/// Fill the intent-rewrite prompt with the raw user query.
pub fn intent_prompt(user_query: &str) -> String {
    USER_INTENT.replace("{user_query}", user_query)
}

/// Fill the follow-up prompt with the query and serialized reviews.
pub fn followup_prompt(user_query: &str, reviews: &str) -> String {
    FOLLOWUP_QUESTIONS
        .replace("{user_query}", user_query)
        .replace("{reviews}", reviews)
}

/// Fill the summary prompt with one product's serialized reviews.
pub fn summary_prompt(reviews: &str) -> String {
    REVIEW_SUMMARY.replace("{reviews}", reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_prompt_substitutes_query() {
        let prompt = intent_prompt("tops to match grey formal pants");
        assert!(prompt.contains("User Query: tops to match grey formal pants"));
        assert!(!prompt.contains("{user_query}"));
    }

    #[test]
    fn followup_prompt_substitutes_both_fields() {
        let prompt = followup_prompt("linen shirts", "[{\"product_name\":\"A\"}]");
        assert!(prompt.contains("User Query: linen shirts"));
        assert!(prompt.contains("Product Reviews: [{\"product_name\":\"A\"}]"));
    }

    #[test]
    fn summary_prompt_substitutes_reviews() {
        let prompt = summary_prompt("review payload");
        assert!(prompt.ends_with("review payload"));
        assert!(!prompt.contains("{reviews}"));
    }
}
