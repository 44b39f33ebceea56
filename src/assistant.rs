//! # Assistant module
//!
//! Drives one conversation against the retrieval core and the chat-model
//! collaborators.
//!
//! A turn flows like this: on a **fresh** conversation the raw user text is
//! rewritten into a search query (chat model, JSON mode), embedded, and run
//! through [`RecommendationEngine::search`], capturing the candidate buffer;
//! on a **follow-up** the new text is appended to the original search context,
//! embedded, and used to [`RecommendationEngine::rerank`] within the captured
//! buffer. Either way the turn finishes by generating follow-up questions and
//! review summaries for the displayed products, consulting the
//! [`SummaryCache`] before every summary call.
//!
//! The assistant owns the session state; the engine and cache it drives are
//! constructed once per process and hold no per-conversation data of their
//! own.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use futures::future::join_all;
use serde_json::json;
use std::error::Error;
use tracing::{debug, warn};

use crate::config::AisleConfig;
use crate::embeddings::EmbeddingClient;
use crate::engine::{Recommendation, RecommendationEngine, SessionState};
use crate::prompts;
use crate::summary_cache::SummaryCache;

/// Everything one turn hands back to the caller for display.
#[derive(Debug)]
pub struct TurnReply {
    /// Display slice for this turn, best first.
    pub recommendations: Vec<Recommendation>,
    /// Conversational follow-up questions from the chat model.
    pub followups: String,
    /// One summary slot per recommendation, in the same order.
    pub summaries: Vec<ProductSummary>,
}

/// A product's review summary, or `None` when generation failed this turn.
#[derive(Debug)]
pub struct ProductSummary {
    pub product_name: String,
    pub summary: Option<String>,
}

/// Creates a new OpenAI-compatible chat client from configuration.
///
/// # Errors
/// Returns an error if the client cannot be initialized.
pub fn create_client(config: &AisleConfig) -> Result<Client<OpenAIConfig>, Box<dyn Error>> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    debug!("Chat client created for {}", config.api_base);
    Ok(Client::with_config(openai_config))
}

/// One conversation session over the shared retrieval core.
pub struct Assistant {
    client: Client<OpenAIConfig>,
    embedder: EmbeddingClient,
    engine: RecommendationEngine,
    cache: SummaryCache,
    config: AisleConfig,
    state: SessionState,
    /// The first turn's rewritten query; follow-up embeddings are computed
    /// over this context plus the new constraint text.
    search_context: Option<String>,
}

impl Assistant {
    /// Load the startup artifacts and construct a fresh session.
    ///
    /// # Errors
    /// Malformed snapshot artifacts abort construction; see
    /// [`RecommendationEngine::load`].
    pub fn new(config: AisleConfig) -> Result<Self, Box<dyn Error>> {
        let engine = RecommendationEngine::load(config.snapshot_path.as_ref())?;
        let cache = SummaryCache::open(&config.cache_path);
        let client = create_client(&config)?;
        let embedder = EmbeddingClient::new(
            &config.api_key,
            &config.api_base,
            &config.embedding_model,
            config.embedding_dimension,
        )?;

        Ok(Self {
            client,
            embedder,
            engine,
            cache,
            config,
            state: SessionState::Fresh,
            search_context: None,
        })
    }

    /// `true` once a candidate buffer has been captured.
    pub fn is_followup(&self) -> bool {
        self.state.buffer().is_some()
    }

    /// The engine this session searches against.
    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Forget the captured buffer and search context.
    pub fn reset(&mut self) {
        self.state.reset();
        self.search_context = None;
    }

    /// Run one conversational turn.
    ///
    /// # Errors
    /// Chat/embedding collaborator failures and retrieval errors are fatal to
    /// the turn (the caller may retry); summary generation failures are not —
    /// affected products simply come back without a summary.
    pub async fn take_turn(&mut self, user_text: &str) -> Result<TurnReply, Box<dyn Error>> {
        let recommendations = if self.is_followup() {
            let context = match &self.search_context {
                Some(original) => format!("{original}\n{user_text}"),
                None => user_text.to_string(),
            };
            let embedding = self.embedder.embed(&context).await?;
            let SessionState::Buffered(buffer) = &self.state else {
                return Err("conversation lost its buffer mid-turn".into());
            };
            self.engine
                .rerank(&embedding, buffer, self.config.display_k)?
        } else {
            let search_query = self.rewrite_intent(user_text).await?;
            debug!("rewrote query to: {search_query}");
            let embedding = self.embedder.embed(&search_query).await?;

            let (shown, buffer) =
                self.engine
                    .search(&embedding, self.config.display_k, self.config.buffer_k)?;
            self.state.capture(buffer);
            self.search_context = Some(search_query);
            shown
        };

        let followups = self
            .generate_followups(user_text, &recommendations)
            .await?;
        let summaries = self.summaries_for(&recommendations).await;

        Ok(TurnReply {
            recommendations,
            followups,
            summaries,
        })
    }

    /// Rewrite raw user text into a search query via the chat model.
    async fn rewrite_intent(&self, user_query: &str) -> Result<String, Box<dyn Error>> {
        let raw = self
            .chat(&prompts::intent_prompt(user_query), true)
            .await?;
        parse_search_query(&raw)
    }

    /// Generate follow-up questions grounded in the displayed reviews.
    async fn generate_followups(
        &self,
        user_query: &str,
        recommendations: &[Recommendation],
    ) -> Result<String, Box<dyn Error>> {
        let reviews = reviews_payload(recommendations);
        self.chat(&prompts::followup_prompt(user_query, &reviews), false)
            .await
    }

    /// Summaries for the displayed products, cache-first.
    ///
    /// Cache misses are generated concurrently (no ordering promised across
    /// the batch) and written back through the cache. A failed generation
    /// drops that product's summary, not the batch.
    async fn summaries_for(&mut self, recommendations: &[Recommendation]) -> Vec<ProductSummary> {
        let mut summaries: Vec<Option<String>> = Vec::with_capacity(recommendations.len());
        let mut missing: Vec<usize> = Vec::new();
        for (i, rec) in recommendations.iter().enumerate() {
            let cached = self.cache.get(&rec.product_name);
            if cached.is_none() {
                missing.push(i);
            }
            summaries.push(cached);
        }

        let prompts: Vec<String> = missing
            .iter()
            .map(|&i| {
                prompts::summary_prompt(&reviews_payload(std::slice::from_ref(
                    &recommendations[i],
                )))
            })
            .collect();
        let generated = join_all(prompts.iter().map(|prompt| self.chat(prompt, false))).await;

        for (&i, result) in missing.iter().zip(generated) {
            let name = &recommendations[i].product_name;
            match result {
                Ok(summary) => {
                    self.cache.put(name, &summary);
                    summaries[i] = Some(summary);
                }
                Err(e) => warn!("summary generation failed for {name}: {e}"),
            }
        }

        recommendations
            .iter()
            .zip(summaries)
            .map(|(rec, summary)| ProductSummary {
                product_name: rec.product_name.clone(),
                summary,
            })
            .collect()
    }

    /// One chat completion round trip.
    async fn chat(&self, prompt: &str, json_mode: bool) -> Result<String, Box<dyn Error>> {
        let message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
            name: None,
        });

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.config.model.clone()).messages(vec![message]);
        if json_mode {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| "chat response carried no content".into())
    }
}

/// Extract `search_query` from the intent model's JSON reply.
fn parse_search_query(raw: &str) -> Result<String, Box<dyn Error>> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())?;
    value
        .get("search_query")
        .and_then(|q| q.as_str())
        .map(str::to_string)
        .ok_or_else(|| format!("intent reply missing search_query: {raw}").into())
}

/// Serialize recommendations' reviews for prompt interpolation.
fn reviews_payload(recommendations: &[Recommendation]) -> String {
    let reviews: Vec<serde_json::Value> = recommendations
        .iter()
        .map(|rec| {
            json!({
                "product_name": rec.product_name,
                "review_titles": rec.review_titles,
                "review_contents": rec.review_texts,
            })
        })
        .collect();
    serde_json::to_string(&reviews).unwrap_or_else(|_| "[]".to_string())
}
