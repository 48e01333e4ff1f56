//! Subcommands and their execution.

use std::time::Duration;

use clap::{Args as ClapArgs, Subcommand, ValueEnum};
use menudb_core::storage::schema::TABLES;
use menudb_core::{EntityMapper, MenuRepositories, Repository};
use menudb_proto::{FilterSpec, Pagination, QueryOptions};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::info;

/// Errors surfaced by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Repository(#[from] menudb_core::Error),

    #[error("invalid filter: {0}")]
    Filter(#[from] menudb_proto::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entity types reachable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Product,
    Recipe,
    Meal,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema if missing
    Init,
    /// List entities matching a filter
    Query(QueryArgs),
    /// Count entities matching a filter
    Count(FilterArgs),
    /// Show the SQL a query would run
    Explain(QueryArgs),
    /// Fetch one live entity
    Get(EntityId),
    /// Soft-delete an entity, or remove it with --hard
    Delete {
        #[command(flatten)]
        target: EntityId,
        /// Physically remove the row and its tag links
        #[arg(long)]
        hard: bool,
    },
    /// Clear an entity's discarded flag
    Restore(EntityId),
}

#[derive(ClapArgs, Debug)]
pub struct FilterArgs {
    /// Entity type
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Filter specification as a JSON object
    #[arg(long, default_value = "{}")]
    pub filter: String,

    /// Include soft-deleted rows
    #[arg(long)]
    pub include_discarded: bool,
}

impl FilterArgs {
    fn spec(&self) -> Result<FilterSpec, CliError> {
        let json: JsonValue = serde_json::from_str(&self.filter)?;
        Ok(FilterSpec::from_json(&json)?)
    }
}

#[derive(ClapArgs, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub base: FilterArgs,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<u32>,

    /// Rows to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl std::ops::Deref for QueryArgs {
    type Target = FilterArgs;

    fn deref(&self) -> &FilterArgs {
        &self.base
    }
}

impl QueryArgs {
    fn options(&self, deadline: Duration) -> QueryOptions {
        let mut options = QueryOptions::new()
            .with_pagination(Pagination {
                limit: self.limit,
                offset: self.offset,
            })
            .with_deadline(deadline);
        options.include_discarded = self.include_discarded;
        options
    }
}

#[derive(ClapArgs, Debug)]
pub struct EntityId {
    /// Entity type
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Entity identifier
    pub id: String,
}

/// Bind `$repo` to the repository of `$entity` and evaluate `$body`.
macro_rules! with_repository {
    ($repos:expr, $entity:expr, $repo:ident => $body:expr) => {
        match $entity {
            EntityKind::Product => {
                let $repo = &$repos.products;
                $body
            }
            EntityKind::Recipe => {
                let $repo = &$repos.recipes;
                $body
            }
            EntityKind::Meal => {
                let $repo = &$repos.meals;
                $body
            }
        }
    };
}

/// Execute `command`, returning its JSON output.
pub async fn execute(
    repos: &MenuRepositories,
    command: Command,
    deadline: Duration,
) -> Result<JsonValue, CliError> {
    match command {
        Command::Init => {
            let db = repos.products.database();
            info!(location = db.location(), "Database initialised");
            Ok(json!({ "database": db.location(), "tables": TABLES }))
        }
        Command::Query(args) => {
            let (spec, options) = (args.spec()?, args.options(deadline));
            with_repository!(repos, args.entity, repo => query(repo, &spec, &options).await)
        }
        Command::Count(args) => {
            let spec = args.spec()?;
            let count = with_repository!(repos, args.entity, repo => {
                repo.count(&spec, args.include_discarded).await?
            });
            Ok(json!({ "count": count }))
        }
        Command::Explain(args) => {
            let (spec, options) = (args.spec()?, args.options(deadline));
            let rendered = with_repository!(repos, args.entity, repo => repo.explain(&spec, &options)?);
            Ok(serde_json::to_value(rendered)?)
        }
        Command::Get(target) => {
            with_repository!(repos, target.entity, repo => get(repo, &target.id).await)
        }
        Command::Delete { target, hard } => {
            with_repository!(repos, target.entity, repo => {
                if hard {
                    repo.hard_delete(&target.id).await?
                } else {
                    repo.soft_delete(&target.id).await?
                }
            });
            Ok(json!({ "deleted": target.id, "hard": hard }))
        }
        Command::Restore(target) => {
            with_repository!(repos, target.entity, repo => repo.restore(&target.id).await?);
            Ok(json!({ "restored": target.id }))
        }
    }
}

async fn query<M>(
    repo: &Repository<M>,
    spec: &FilterSpec,
    options: &QueryOptions,
) -> Result<JsonValue, CliError>
where
    M: EntityMapper,
    M::Entity: Serialize,
{
    let entities = repo.query(spec, options).await?;
    Ok(serde_json::to_value(entities)?)
}

async fn get<M>(repo: &Repository<M>, id: &str) -> Result<JsonValue, CliError>
where
    M: EntityMapper,
    M::Entity: Serialize,
{
    let entity = repo.get_by_id(id).await?;
    Ok(serde_json::to_value(entity)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use menudb_core::RepositoryConfig;

    fn repos() -> MenuRepositories {
        MenuRepositories::open(RepositoryConfig::in_memory()).unwrap()
    }

    fn query_args(entity: EntityKind, filter: &str) -> QueryArgs {
        QueryArgs {
            base: FilterArgs {
                entity,
                filter: filter.to_string(),
                include_discarded: false,
            },
            limit: None,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn test_query_and_delete_flow() {
        let repos = repos();
        repos
            .products
            .add(&menudb_core::Product::new("p1", "Oats"))
            .await
            .unwrap();
        let deadline = Duration::from_secs(5);

        let out = execute(
            &repos,
            Command::Query(query_args(EntityKind::Product, r#"{"name": "Oats"}"#)),
            deadline,
        )
        .await
        .unwrap();
        assert_eq!(out[0]["id"], "p1");

        execute(
            &repos,
            Command::Delete {
                target: EntityId {
                    entity: EntityKind::Product,
                    id: "p1".into(),
                },
                hard: false,
            },
            deadline,
        )
        .await
        .unwrap();

        let out = execute(
            &repos,
            Command::Count(FilterArgs {
                entity: EntityKind::Product,
                filter: "{}".into(),
                include_discarded: true,
            }),
            deadline,
        )
        .await
        .unwrap();
        assert_eq!(out["count"], 1);
    }

    #[tokio::test]
    async fn test_explain_and_bad_filter() {
        let repos = repos();
        let deadline = Duration::from_secs(5);
        let out = execute(
            &repos,
            Command::Explain(query_args(EntityKind::Meal, r#"{"calories_gte": 300}"#)),
            deadline,
        )
        .await
        .unwrap();
        assert!(out["sql"].as_str().unwrap().starts_with("SELECT"));

        let err = execute(
            &repos,
            Command::Query(query_args(EntityKind::Meal, "[1, 2]")),
            deadline,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Filter(_)), "{err:?}");

        let err = execute(
            &repos,
            Command::Get(EntityId {
                entity: EntityKind::Recipe,
                id: "missing".into(),
            }),
            deadline,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Repository(menudb_core::Error::NotFound { .. })
        ));
    }
}
