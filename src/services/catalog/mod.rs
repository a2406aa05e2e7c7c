//! Generic list/detail service shared by every table exposed under `/technet`.
//!
//! Each table plugs in through [`Resource`] (read side) and, when the generic
//! write path applies, [`WritableResource`].

pub mod resources;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::{Condition, Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::dto::{FieldErrors, FieldReader};
use crate::errors::ServiceError;

/// Query-string filters understood by list endpoints. Each resource picks
/// the ones that apply to it.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub search: Option<String>,
    pub id_tecnico: Option<i32>,
    pub id_operador: Option<i32>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

impl ListFilters {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
    }
}

/// Escapes LIKE wildcards so `raw` matches literally with a backslash escape.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// GLOB pattern matching `term` anywhere, ignoring case.
///
/// SQLite's `lower()` and `LIKE` only fold ASCII, so every cased letter
/// becomes a `[xX]` class instead.
fn caseless_glob(term: &str) -> String {
    let mut pattern = String::from("*");
    for c in term.chars() {
        let mut lower = c.to_lowercase();
        let mut upper = c.to_uppercase();
        match (lower.next(), lower.next(), upper.next(), upper.next()) {
            (Some(l), None, Some(u), None) if l != u => {
                pattern.push('[');
                pattern.push(l);
                pattern.push(u);
                pattern.push(']');
            }
            _ if matches!(c, '*' | '?' | '[') => {
                pattern.push('[');
                pattern.push(c);
                pattern.push(']');
            }
            _ => pattern.push(c),
        }
    }
    pattern.push('*');
    pattern
}

/// Case-insensitive substring match of `term` against any of `columns`.
fn search_condition<C: ColumnTrait>(backend: DbBackend, columns: Vec<C>, term: &str) -> Condition {
    match backend {
        DbBackend::Sqlite => {
            let pattern = caseless_glob(term);
            columns.into_iter().fold(Condition::any(), |any, column| {
                any.add(Expr::cust_with_exprs(
                    "$1 GLOB $2",
                    [Expr::col(column).into(), Expr::val(pattern.clone()).into()],
                ))
            })
        }
        _ => {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            columns.into_iter().fold(Condition::any(), |any, column| {
                any.add(
                    Expr::expr(Func::lower(Expr::col(column)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
            })
        }
    }
}

/// One page of a list query
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub items: Vec<M>,
    /// Rows matching the filters across all pages
    pub count: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl<M> Page<M> {
    pub fn next_page(&self) -> Option<u64> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }

    pub fn previous_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }
}

/// Read-side description of a table.
pub trait Resource: Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Model, Column = Self::Column>;
    type Model: FromQueryResult
        + ModelTrait<Entity = Self::Entity>
        + Serialize
        + Clone
        + Send
        + Sync
        + 'static;
    type Column: ColumnTrait;

    /// Name used in log lines and not-found messages
    const LABEL: &'static str;

    fn primary_key() -> Self::Column;

    /// Columns matched case-insensitively by `?search=`
    fn search_columns() -> Vec<Self::Column> {
        Vec::new()
    }

    fn filter(select: Select<Self::Entity>, _filters: &ListFilters) -> Select<Self::Entity> {
        select
    }

    fn order(select: Select<Self::Entity>) -> Select<Self::Entity> {
        select.order_by_asc(Self::primary_key())
    }
}

/// Tables written through the generic active-model path.
#[async_trait]
pub trait WritableResource: Resource {
    type Payload: Send + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors>;

    /// Active model with every column set; `id` is set only for updates.
    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel;

    /// Records an error for each referenced row that does not exist.
    async fn check_references(
        _db: &DatabaseConnection,
        _payload: &Self::Payload,
        _errors: &mut FieldErrors,
    ) -> Result<(), DbErr> {
        Ok(())
    }
}

/// Whether `E` has a row whose `column` equals `value`.
pub(crate) async fn row_exists<E, C, V>(db: &C, column: E::Column, value: V) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
    V: Into<sea_orm::Value> + Send,
{
    let count = E::find().filter(column.eq(value)).count(db).await?;
    Ok(count > 0)
}

pub struct CatalogService<R> {
    db: Arc<DatabaseConnection>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for CatalogService<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> CatalogService<R> {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            _resource: PhantomData,
        }
    }

    /// Filtered, searched and ordered page of rows.
    ///
    /// `page` is 1-based. Asking for a page past the last one fails with
    /// [`ServiceError::InvalidPage`], except page 1 of an empty result.
    #[instrument(skip(self, filters), fields(resource = R::LABEL))]
    pub async fn list(
        &self,
        filters: &ListFilters,
        page: u64,
        page_size: u64,
    ) -> Result<Page<R::Model>, ServiceError> {
        let mut select = R::Entity::find();

        let columns = R::search_columns();
        if let (Some(term), false) = (filters.search_term(), columns.is_empty()) {
            let backend = self.db.get_database_backend();
            select = select.filter(search_condition(backend, columns, &term));
        }

        let select = R::order(R::filter(select, filters));
        let paginator = select.paginate(self.db.as_ref(), page_size);
        let totals = paginator.num_items_and_pages().await?;

        if page == 0 || page > totals.number_of_pages.max(1) {
            return Err(ServiceError::InvalidPage);
        }

        let items = paginator.fetch_page(page - 1).await?;
        Ok(Page {
            items,
            count: totals.number_of_items,
            page,
            total_pages: totals.number_of_pages,
        })
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn get(&self, id: i32) -> Result<R::Model, ServiceError> {
        R::Entity::find()
            .filter(R::primary_key().eq(id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {}", R::LABEL, id)))
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = R::Entity::delete_many()
            .filter(R::primary_key().eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(ServiceError::from_db)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("{} {}", R::LABEL, id)));
        }

        info!(resource = R::LABEL, id, "Row deleted");
        Ok(())
    }
}

impl<R> CatalogService<R>
where
    R: WritableResource,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    async fn validate(&self, body: &Value) -> Result<R::Payload, ServiceError> {
        let payload = R::parse(body).map_err(ServiceError::FieldValidation)?;

        let mut errors = FieldErrors::new();
        R::check_references(&self.db, &payload, &mut errors).await?;
        if !errors.is_empty() {
            return Err(ServiceError::FieldValidation(errors));
        }

        Ok(payload)
    }

    #[instrument(skip(self, body), fields(resource = R::LABEL))]
    pub async fn create(&self, body: &Value) -> Result<R::Model, ServiceError> {
        let payload = self.validate(body).await?;
        let model = R::into_active_model(payload, None)
            .insert(self.db.as_ref())
            .await
            .map_err(ServiceError::from_db)?;

        info!(resource = R::LABEL, "Row created");
        Ok(model)
    }

    /// Replaces every writable column of row `id`.
    #[instrument(skip(self, body), fields(resource = R::LABEL))]
    pub async fn update(&self, id: i32, body: &Value) -> Result<R::Model, ServiceError> {
        self.get(id).await?;
        self.write(id, body).await
    }

    /// Applies the fields present in `patch` on top of the stored row.
    #[instrument(skip(self, patch), fields(resource = R::LABEL))]
    pub async fn partial_update(&self, id: i32, patch: &Value) -> Result<R::Model, ServiceError> {
        let current = self.get(id).await?;
        let merged = merge_patch(&current, patch)?;
        self.write(id, &merged).await
    }

    async fn write(&self, id: i32, body: &Value) -> Result<R::Model, ServiceError> {
        let payload = self.validate(body).await?;
        let model = R::into_active_model(payload, Some(id))
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::from_db)?;

        info!(resource = R::LABEL, id, "Row updated");
        Ok(model)
    }
}

/// Serialises `current` and overlays the keys of `patch` on it.
pub(crate) fn merge_patch<M: Serialize>(current: &M, patch: &Value) -> Result<Value, ServiceError> {
    // Rejects non-object bodies with the usual field error shape.
    FieldReader::new(patch).map_err(ServiceError::FieldValidation)?;

    let mut merged = serde_json::to_value(current)
        .map_err(|e| ServiceError::InternalError(format!("failed to serialise row: {}", e)))?;
    if let (Value::Object(base), Value::Object(changes)) = (&mut merged, patch) {
        for (key, value) in changes {
            base.insert(key.clone(), value.clone());
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(page: u64, total_pages: u64) -> Page<()> {
        Page {
            items: Vec::new(),
            count: 0,
            page,
            total_pages,
        }
    }

    #[test]
    fn next_and_previous_pages() {
        assert_eq!(page(1, 3).next_page(), Some(2));
        assert_eq!(page(1, 3).previous_page(), None);
        assert_eq!(page(3, 3).next_page(), None);
        assert_eq!(page(3, 3).previous_page(), Some(2));
        assert_eq!(page(1, 0).next_page(), None);
    }

    #[test]
    fn blank_search_is_ignored() {
        let filters = ListFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filters.search_term(), None);

        let filters = ListFilters {
            search: Some(" PéREZ ".into()),
            ..Default::default()
        };
        assert_eq!(filters.search_term().as_deref(), Some("PéREZ"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("OT-1"), "OT-1");
    }

    #[test]
    fn glob_pattern_folds_unicode_case() {
        assert_eq!(caseless_glob("Pé1"), "*[pP][éÉ]1*");
        assert_eq!(caseless_glob("a*?[b]"), "*[aA][*][?][[][bB]]*");
    }

    #[test]
    fn search_renders_per_backend() {
        use crate::entities::technician;
        use sea_orm::sea_query::{PostgresQueryBuilder, Query, SqliteQueryBuilder};

        let select = |backend| {
            Query::select()
                .column(technician::Column::Nombre)
                .from(technician::Entity)
                .cond_where(search_condition(backend, vec![technician::Column::Nombre], "50%"))
                .to_owned()
        };

        let sqlite = select(DbBackend::Sqlite).to_string(SqliteQueryBuilder);
        assert!(sqlite.contains("GLOB '*50%*'"), "{}", sqlite);

        let postgres = select(DbBackend::Postgres).to_string(PostgresQueryBuilder);
        assert!(postgres.contains("LOWER"), "{}", postgres);
        assert!(postgres.contains("ESCAPE"), "{}", postgres);
    }

    #[test]
    fn patch_overlays_only_given_keys() {
        #[derive(Serialize)]
        struct Row {
            a: i32,
            b: &'static str,
        }

        let merged = merge_patch(&Row { a: 1, b: "x" }, &json!({"b": "y"})).unwrap();
        assert_eq!(merged, json!({"a": 1, "b": "y"}));
    }

    #[test]
    fn patch_must_be_an_object() {
        let err = merge_patch(&json!({"a": 1}), &json!("texto")).unwrap_err();
        assert!(matches!(err, ServiceError::FieldValidation(_)));
    }
}
