//! Builds the service clients a command needs from configuration.

use docintel_core::{config::AppConfig, AppError, AppResult};
use docintel_knowledge::progress::{ProgressEvent, ProgressReporter};
use docintel_knowledge::{
    create_link_factory, create_provider, open_backend, AnswerComposer, CitationResolver,
    EmbeddingProvider, QueryPipeline, Retriever, SourceNaming,
};
use docintel_llm::create_client;
use docintel_prompt::{load_prompt_or_default, GROUNDED_ANSWER_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

pub fn request_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.request_timeout_secs)
}

pub fn embedding_provider(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let api_key = config.resolve_secret(&config.embedding.api_key_env);
    create_provider(
        &config.embedding,
        api_key.as_deref(),
        request_timeout(config),
    )
}

pub async fn retriever(config: &AppConfig) -> AppResult<Retriever> {
    let embedder = embedding_provider(config)?;
    let backend = open_backend(config).await?;
    Ok(Retriever::new(embedder, backend.index))
}

/// Wire retriever, composer and citation resolver into one pipeline.
pub async fn query_pipeline(config: &AppConfig, verify_links: bool) -> AppResult<QueryPipeline> {
    let retriever = retriever(config).await?;

    let completion = &config.completion;
    let api_key = config.resolve_secret(&completion.api_key_env);
    let client = create_client(
        &completion.provider,
        completion.endpoint.as_deref(),
        api_key.as_deref(),
        completion.model.as_deref(),
        request_timeout(config),
    )
    .map_err(AppError::Config)?;

    let storage = &config.storage;
    let prompt = load_prompt_or_default(&config.workspace, GROUNDED_ANSWER_PROMPT_ID)?;
    let composer = AnswerComposer::new(client, prompt)?
        .with_sampling(completion.temperature, completion.max_tokens)
        .with_model(completion.model.clone())
        .with_naming(SourceNaming::from(storage));

    let citations = CitationResolver::new(
        create_link_factory(config, verify_links)?,
        SourceNaming::from(storage),
        storage.document_container.clone(),
        storage.link_ttl_minutes,
    );

    Ok(QueryPipeline::new(
        retriever,
        composer,
        citations,
        config.retrieval,
    ))
}

/// Progress lines go to stderr so stdout stays clean for piping.
pub fn stderr_progress(quiet: bool) -> ProgressReporter {
    if quiet {
        return ProgressReporter::noop();
    }
    ProgressReporter::new(Arc::new(|event: ProgressEvent| {
        eprintln!("{}", event.format_simple());
    }))
}
