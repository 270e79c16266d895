//! Runs one CLI command against a freshly connected backend.

use kg_backend::{Backend, BackendKind, ClassSearch, Explore, PropertySearch, build_backend};
use tokio::io::AsyncReadExt;

use crate::{
    cli::Command,
    config::{Config, QueryConfig},
    error::AppError,
    limits::apply_default_limit,
    render::{self, Output},
};

/// Connects, dispatches `command`, then closes the backend on every path.
pub(crate) async fn execute(config: &Config, command: &Command) -> Result<Output, AppError> {
    let backend = build_backend(&config.backend);
    tracing::debug!(
        backend = %backend.name(),
        timeout_secs = config.query.timeout_secs,
        "Executing command"
    );

    backend.connect().await?;
    let result = async {
        select_configured_repository(backend.as_ref(), config).await?;
        dispatch(backend.as_ref(), &config.query, command).await
    }
    .await;

    if let Err(error) = backend.close().await {
        tracing::warn!(backend = %backend.name(), error = %error, "Failed to close backend");
    }

    result
}

/// The remote engine resolves its configured repository on connect; the
/// in-process engine checks it here so an unknown id is never ignored.
async fn select_configured_repository(
    backend: &dyn Backend,
    config: &Config,
) -> Result<(), AppError> {
    if config.backend.kind != BackendKind::Local {
        return Ok(());
    }
    if let Some(repository_id) = &config.backend.remote.default_repository {
        backend.select_repository(repository_id).await?;
    }
    Ok(())
}

async fn dispatch(
    backend: &dyn Backend,
    query_config: &QueryConfig,
    command: &Command,
) -> Result<Output, AppError> {
    let output = match command {
        Command::Repositories => render::repositories(&backend.list_repositories().await?)?,
        Command::SelectRepository { repository_id } => {
            backend.select_repository(repository_id).await?;
            render::repository_selected(repository_id)?
        }
        Command::CurrentRepository => {
            let current = backend.current_repository().await?;
            render::current_repository(current.as_deref())?
        }
        Command::Select {
            query,
            limit,
            repository,
        } => {
            let text = apply_default_limit(&read_query(query).await?, *limit, query_config);
            render::select(&backend.sparql_select(&text, repository.as_deref()).await?)?
        }
        Command::Construct { query, repository } => {
            let text = read_query(query).await?;
            render::construct(
                backend
                    .sparql_construct(&text, repository.as_deref())
                    .await?,
            )
        }
        Command::Ask { query, repository } => {
            let text = read_query(query).await?;
            render::ask(backend.sparql_ask(&text, repository.as_deref()).await?)?
        }
        Command::Namespaces { repository } => {
            render::namespaces(&backend.namespaces(repository.as_deref()).await?)?
        }
        Command::Stats { repository } => {
            render::statistics(&backend.statistics(repository.as_deref()).await?)?
        }
        Command::Describe { iri, repository } => render::describe(
            iri,
            backend
                .describe_resource(iri, repository.as_deref())
                .await?,
        ),
        Command::Classes {
            pattern,
            limit,
            repository,
        } => {
            let search = ClassSearch {
                pattern: pattern.clone(),
                limit: query_config.effective_limit(*limit),
            };
            let result = backend
                .search_classes(&search, repository.as_deref())
                .await?;
            render::classes(pattern.as_deref(), &result)?
        }
        Command::Properties {
            pattern,
            domain,
            range,
            limit,
            repository,
        } => {
            let search = PropertySearch {
                pattern: pattern.clone(),
                domain: domain.clone(),
                range: range.clone(),
                limit: query_config.effective_limit(*limit),
            };
            let result = backend
                .search_properties(&search, repository.as_deref())
                .await?;
            render::properties(
                pattern.as_deref(),
                domain.as_deref(),
                range.as_deref(),
                &result,
            )?
        }
        Command::Instances {
            class,
            limit,
            repository,
        } => {
            let result = backend
                .find_instances(
                    class,
                    query_config.effective_limit(*limit),
                    repository.as_deref(),
                )
                .await?;
            render::instances(class, &result)?
        }
        Command::Summary { repository } => {
            render::summary(&backend.schema_summary(repository.as_deref()).await?)?
        }
    };

    Ok(output)
}

/// `-` reads the query text from stdin.
async fn read_query(argument: &str) -> Result<String, AppError> {
    if argument != "-" {
        return Ok(argument.to_string());
    }

    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}
