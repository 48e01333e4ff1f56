//! Repository façade.
//!
//! The only surface application services use. Queries go through the query
//! builder and take exactly one storage round-trip; writes for one entity run
//! in one transaction.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use menudb_proto::{FilterSpec, Pagination, QueryOptions, Value};
use rusqlite::{params, Transaction};
use tracing::debug;

use crate::catalog::{menu_registry, EntityMapping, TagRelation, TAGS_TABLE};
use crate::config::RepositoryConfig;
use crate::domain::Tag;
use crate::error::Error;
use crate::mapper::{check_coverage, EntityMapper, MealMapper, ProductMapper, RecipeMapper, WritePayload};
use crate::query::{quote_ident, QueryEngine, RenderedQuery};
use crate::storage::{classify, to_sql_value, Database};

/// Generic CRUD and query surface for one entity type.
pub struct Repository<M: EntityMapper> {
    db: Database,
    engine: Arc<QueryEngine>,
    config: RepositoryConfig,
    _mapper: PhantomData<fn() -> M>,
}

impl<M: EntityMapper> Clone for Repository<M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            _mapper: PhantomData,
        }
    }
}

impl<M: EntityMapper> std::fmt::Debug for Repository<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &M::ENTITY)
            .field("db", &self.db)
            .finish()
    }
}

impl<M: EntityMapper> Repository<M> {
    /// Create a repository, verifying that `M` covers the registered columns.
    pub fn new(db: Database, engine: Arc<QueryEngine>, config: RepositoryConfig) -> Result<Self, Error> {
        check_coverage::<M>(&engine.columns)?;
        Ok(Self {
            db,
            engine,
            config,
            _mapper: PhantomData,
        })
    }

    /// Underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn mapping(&self) -> Result<&EntityMapping, Error> {
        self.engine.columns.entity(M::ENTITY)
    }

    fn deadline(&self, options: &QueryOptions) -> Duration {
        options.deadline.unwrap_or(self.config.query_timeout)
    }

    fn not_found(id: &str) -> Error {
        Error::NotFound {
            entity: M::ENTITY.to_string(),
            id: id.to_string(),
        }
    }

    /// Fetch a live entity by identifier.
    pub async fn get_by_id(&self, id: &str) -> Result<M::Entity, Error> {
        let id_column = self.mapping()?.id_column.clone();
        let spec = FilterSpec::new().filter(id_column, id);
        let options = QueryOptions::new().with_pagination(Pagination::limit(1));
        self.query(&spec, &options)
            .await?
            .pop()
            .ok_or_else(|| Self::not_found(id))
    }

    /// Entities matching `spec`, in one round-trip.
    pub async fn query(&self, spec: &FilterSpec, options: &QueryOptions) -> Result<Vec<M::Entity>, Error> {
        let plan = self.engine.builder().build(M::ENTITY, spec, options)?;
        let rows = self.db.fetch(plan.to_sql(), self.deadline(options)).await?;
        let entities = rows
            .iter()
            .map(M::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entity = M::ENTITY, rows = entities.len(), "Query completed");
        Ok(entities)
    }

    /// Number of entities matching `spec`, ignoring paging.
    pub async fn count(&self, spec: &FilterSpec, include_discarded: bool) -> Result<u64, Error> {
        let mut options = QueryOptions::new();
        options.include_discarded = include_discarded;
        let plan = self.engine.builder().build(M::ENTITY, spec, &options)?;
        let rows = self.db.fetch(plan.to_count_sql(), self.deadline(&options)).await?;
        match rows.first().and_then(|row| row.get("count")) {
            Some(Value::Int64(n)) => Ok(*n as u64),
            other => Err(Error::Mapping(format!("unexpected count result {other:?}"))),
        }
    }

    /// SQL and parameters `query` would run, without touching storage.
    pub fn explain(&self, spec: &FilterSpec, options: &QueryOptions) -> Result<RenderedQuery, Error> {
        Ok(self.engine.builder().build(M::ENTITY, spec, options)?.to_sql())
    }

    /// Insert a new entity and link its tags.
    pub async fn add(&self, entity: &M::Entity) -> Result<(), Error> {
        let payload = M::to_storage_row(entity);
        let mapping = self.mapping()?;
        check_tags(mapping, &payload.tags)?;
        let table = mapping.table.clone();
        let relation = mapping.tags.clone();
        let (id, tags) = (payload.id.clone(), payload.tags.len());

        self.db
            .run(self.config.query_timeout, move |conn| {
                let tx = conn.transaction().map_err(classify)?;
                insert_row(&tx, &table, &payload)?;
                if let Some(relation) = &relation {
                    link_tags(&tx, relation, &payload.id, &payload.tags)?;
                }
                tx.commit().map_err(classify)
            })
            .await?;
        debug!(entity = M::ENTITY, id = %id, tags, "Added entity");
        Ok(())
    }

    /// Replace every stored attribute and the tag set of an existing entity.
    ///
    /// Links to tags no longer present are soft-deleted.
    pub async fn update(&self, entity: &M::Entity) -> Result<(), Error> {
        let payload = M::to_storage_row(entity);
        let mapping = self.mapping()?;
        check_tags(mapping, &payload.tags)?;
        let table = mapping.table.clone();
        let id_column = mapping.id_column.clone();
        let relation = mapping.tags.clone();
        let id = payload.id.clone();

        let updated = self
            .db
            .run(self.config.query_timeout, move |conn| {
                let tx = conn.transaction().map_err(classify)?;
                let columns: Vec<(String, Value)> = payload
                    .columns
                    .iter()
                    .filter(|(name, _)| *name != id_column)
                    .cloned()
                    .collect();
                if update_row(&tx, &table, &id_column, &payload.id, &columns, None)? == 0 {
                    return Ok(false);
                }
                if let Some(relation) = &relation {
                    unlink_tags(&tx, relation, &payload.id)?;
                    link_tags(&tx, relation, &payload.id, &payload.tags)?;
                }
                tx.commit().map_err(classify)?;
                Ok(true)
            })
            .await?;
        if !updated {
            return Err(Self::not_found(&id));
        }
        debug!(entity = M::ENTITY, id = %id, "Updated entity");
        Ok(())
    }

    /// Update selected root attributes of a live entity.
    ///
    /// Values are checked against the attribute's type. The identifier and
    /// the soft-delete flag cannot be patched.
    pub async fn update_fields(&self, id: &str, patch: &[(String, Value)]) -> Result<(), Error> {
        let mapping = self.mapping()?;
        let mut columns = Vec::with_capacity(patch.len());
        for (name, value) in patch {
            let column = mapping.get_column(name).ok_or_else(|| Error::UnknownFilterKey {
                entity: M::ENTITY.to_string(),
                key: name.clone(),
            })?;
            if !column.is_root() {
                return Err(Error::invalid_value(name, "attribute of a related table is read-only"));
            }
            if column.column == mapping.id_column || mapping.is_discard_column(column) {
                return Err(Error::invalid_value(
                    name,
                    "use the dedicated operations to change identity or soft-delete state",
                ));
            }
            let value = match value {
                Value::Null if column.nullable => Value::Null,
                Value::Null => return Err(Error::invalid_value(name, "attribute is not nullable")),
                other => column.semantic_type.coerce(other).ok_or_else(|| {
                    Error::invalid_value(
                        name,
                        format!("expected {} value, got {}", column.semantic_type, other.kind()),
                    )
                })?,
            };
            columns.push((column.column.clone(), value));
        }
        if columns.is_empty() {
            return self.get_by_id(id).await.map(|_| ());
        }

        let table = mapping.table.clone();
        let id_column = mapping.id_column.clone();
        let discard_column = mapping.discard_column.clone();
        let target = id.to_string();
        let changed = self
            .db
            .run(self.config.query_timeout, move |conn| {
                let tx = conn.transaction().map_err(classify)?;
                let live_only = Some(discard_column.as_str());
                let changed = update_row(&tx, &table, &id_column, &target, &columns, live_only)?;
                tx.commit().map_err(classify)?;
                Ok(changed)
            })
            .await?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        debug!(entity = M::ENTITY, id, fields = patch.len(), "Patched entity");
        Ok(())
    }

    /// Mark an entity discarded. Idempotent for already discarded entities.
    pub async fn soft_delete(&self, id: &str) -> Result<(), Error> {
        self.set_discarded(id, true).await
    }

    /// Clear an entity's discarded flag. Idempotent for live entities.
    pub async fn restore(&self, id: &str) -> Result<(), Error> {
        self.set_discarded(id, false).await
    }

    async fn set_discarded(&self, id: &str, discarded: bool) -> Result<(), Error> {
        let mapping = self.mapping()?;
        let table = mapping.table.clone();
        let id_column = mapping.id_column.clone();
        let columns = vec![(mapping.discard_column.clone(), Value::Bool(discarded))];
        let target = id.to_string();
        let changed = self
            .db
            .run(self.config.query_timeout, move |conn| {
                let tx = conn.transaction().map_err(classify)?;
                let changed = update_row(&tx, &table, &id_column, &target, &columns, None)?;
                tx.commit().map_err(classify)?;
                Ok(changed)
            })
            .await?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        debug!(entity = M::ENTITY, id, discarded, "Changed soft-delete state");
        Ok(())
    }

    /// Physically remove an entity and its tag links.
    pub async fn hard_delete(&self, id: &str) -> Result<(), Error> {
        let mapping = self.mapping()?;
        let table = mapping.table.clone();
        let id_column = mapping.id_column.clone();
        let relation = mapping.tags.clone();
        let target = id.to_string();
        let deleted = self
            .db
            .run(self.config.query_timeout, move |conn| {
                let tx = conn.transaction().map_err(classify)?;
                if let Some(relation) = &relation {
                    tx.execute(
                        &format!(
                            "DELETE FROM {} WHERE {} = ?1",
                            quote_ident(&relation.association_table),
                            quote_ident(&relation.entity_column)
                        ),
                        params![target],
                    )
                    .map_err(classify)?;
                }
                let deleted = tx
                    .execute(
                        &format!(
                            "DELETE FROM {} WHERE {} = ?1",
                            quote_ident(&table),
                            quote_ident(&id_column)
                        ),
                        params![target],
                    )
                    .map_err(classify)?;
                tx.commit().map_err(classify)?;
                Ok(deleted)
            })
            .await?;
        if deleted == 0 {
            return Err(Self::not_found(id));
        }
        debug!(entity = M::ENTITY, id, "Hard-deleted entity");
        Ok(())
    }
}

/// Tags must belong to the entity's tag type.
fn check_tags(mapping: &EntityMapping, tags: &[Tag]) -> Result<(), Error> {
    match &mapping.tags {
        None if tags.is_empty() => Ok(()),
        None => Err(Error::Mapping(format!("{} does not carry tags", mapping.name))),
        Some(relation) => match tags.iter().find(|t| t.tag_type != relation.tag_type) {
            Some(tag) => Err(Error::Mapping(format!(
                "{} tags must have type '{}', got '{}'",
                mapping.name, relation.tag_type, tag.tag_type
            ))),
            None => Ok(()),
        },
    }
}

fn insert_row(tx: &Transaction<'_>, table: &str, payload: &WritePayload) -> Result<(), Error> {
    let names: Vec<String> = payload.columns.iter().map(|(name, _)| quote_ident(name)).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", ")
    );
    let values: Vec<_> = payload.columns.iter().map(|(_, v)| to_sql_value(v)).collect();
    tx.execute(&sql, rusqlite::params_from_iter(values.iter()))
        .map_err(classify)?;
    Ok(())
}

/// `UPDATE` by identifier, optionally restricted to rows whose
/// `live_only` flag column is false. Returns the number of matched rows.
fn update_row(
    tx: &Transaction<'_>,
    table: &str,
    id_column: &str,
    id: &str,
    columns: &[(String, Value)],
    live_only: Option<&str>,
) -> Result<usize, Error> {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{} = ?{}", quote_ident(name), i + 1))
        .collect();
    let mut sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(id_column),
        columns.len() + 1
    );
    if let Some(flag) = live_only {
        sql.push_str(&format!(" AND {} = 0", quote_ident(flag)));
    }
    let mut values: Vec<_> = columns.iter().map(|(_, v)| to_sql_value(v)).collect();
    values.push(rusqlite::types::Value::Text(id.to_string()));
    tx.execute(&sql, rusqlite::params_from_iter(values.iter()))
        .map_err(classify)
}

/// Soft-delete every link of an entity.
fn unlink_tags(tx: &Transaction<'_>, relation: &TagRelation, entity_id: &str) -> Result<(), Error> {
    tx.execute(
        &format!(
            "UPDATE {} SET discarded = 1 WHERE {} = ?1",
            quote_ident(&relation.association_table),
            quote_ident(&relation.entity_column)
        ),
        params![entity_id],
    )
    .map_err(classify)?;
    Ok(())
}

/// Upsert each tag row and a live link to it.
fn link_tags(
    tx: &Transaction<'_>,
    relation: &TagRelation,
    entity_id: &str,
    tags: &[Tag],
) -> Result<(), Error> {
    let tags_table = quote_ident(TAGS_TABLE);
    let upsert_tag = format!(
        "INSERT INTO {tags_table} (key, value, author_id, type) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (key, value, author_id, type) DO UPDATE SET discarded = 0"
    );
    let select_tag = format!(
        "SELECT id FROM {tags_table} WHERE key = ?1 AND value = ?2 AND author_id = ?3 AND type = ?4"
    );
    let entity_column = quote_ident(&relation.entity_column);
    let tag_column = quote_ident(&relation.tag_column);
    let upsert_link = format!(
        "INSERT INTO {} ({entity_column}, {tag_column}, discarded) VALUES (?1, ?2, 0) \
         ON CONFLICT ({entity_column}, {tag_column}) DO UPDATE SET discarded = 0",
        quote_ident(&relation.association_table)
    );

    for tag in tags {
        let key = params![tag.key, tag.value, tag.author_id, tag.tag_type];
        tx.prepare_cached(&upsert_tag)
            .and_then(|mut stmt| stmt.execute(key))
            .map_err(classify)?;
        let tag_id: i64 = tx
            .prepare_cached(&select_tag)
            .and_then(|mut stmt| stmt.query_row(key, |row| row.get(0)))
            .map_err(classify)?;
        tx.prepare_cached(&upsert_link)
            .and_then(|mut stmt| stmt.execute(params![entity_id, tag_id]))
            .map_err(classify)?;
    }
    Ok(())
}

/// Repositories for every menu planning entity, sharing one database and engine.
#[derive(Debug, Clone)]
pub struct MenuRepositories {
    pub products: Repository<ProductMapper>,
    pub recipes: Repository<RecipeMapper>,
    pub meals: Repository<MealMapper>,
}

impl MenuRepositories {
    /// Open the database, migrate the schema and build the repositories.
    pub fn open(config: RepositoryConfig) -> Result<Self, Error> {
        let db = Database::open(&config)?;
        db.migrate()?;
        let engine = Arc::new(QueryEngine::new(menu_registry()?, config.page_limits));
        Ok(Self {
            products: Repository::new(db.clone(), Arc::clone(&engine), config.clone())?,
            recipes: Repository::new(db.clone(), Arc::clone(&engine), config.clone())?,
            meals: Repository::new(db, engine, config)?,
        })
    }
}
