use std::time::Instant;

use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool, Row};

use crate::database::grouping::{fold_one_to_many, JoinedRow};
use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterValue, Join, Page, PageRequest, SqlResult};

/// Count first, then fetch the page with the very same predicates.
///
/// A page past the end, or a filter nothing matches, is an empty row list
/// with the true total, not an error.
pub async fn fetch_page<T>(pool: &PgPool, filter: &Filter, page: &PageRequest) -> Result<Page<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let started = Instant::now();
    let total_count = count(pool, filter).await?;

    let sql_result = filter.to_page_sql(page);
    log_sql(&sql_result);
    let mut q = sqlx::query_as::<_, T>(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query_as(q, p);
    }
    let rows = q.fetch_all(pool).await?;

    warn_if_slow(filter, started);
    Ok(Page { rows, total_count })
}

/// Paged one-to-many fetch: parents are paged, children folded under them.
pub async fn fetch_page_grouped<R>(
    pool: &PgPool,
    filter: &Filter,
    page: &PageRequest,
    join: &Join,
) -> Result<Page<(R::Parent, Vec<R::Child>)>, DatabaseError>
where
    R: JoinedRow + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let started = Instant::now();
    let total_count = count(pool, filter).await?;

    let rows = fetch_joined::<R>(pool, &filter.to_join_sql(Some(page), join)).await?;

    warn_if_slow(filter, started);
    Ok(Page { rows: fold_one_to_many(rows), total_count })
}

/// Unpaged one-to-many fetch, used for single-parent lookups.
pub async fn fetch_grouped<R>(
    pool: &PgPool,
    filter: &Filter,
    join: &Join,
) -> Result<Vec<(R::Parent, Vec<R::Child>)>, DatabaseError>
where
    R: JoinedRow + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let rows = fetch_joined::<R>(pool, &filter.to_join_sql(None, join)).await?;
    Ok(fold_one_to_many(rows))
}

pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, DatabaseError> {
    let sql_result = filter.to_count_sql();
    log_sql(&sql_result);
    let mut q = sqlx::query(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

async fn fetch_joined<R>(pool: &PgPool, sql_result: &SqlResult) -> Result<Vec<R>, DatabaseError>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    log_sql(sql_result);
    let mut q = sqlx::query_as::<_, R>(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(pool).await?)
}

fn log_sql(sql_result: &SqlResult) {
    if crate::config::CONFIG.database.enable_query_logging {
        tracing::debug!(params = ?sql_result.params, "SQL: {}", sql_result.query);
    }
}

fn warn_if_slow(filter: &Filter, started: Instant) {
    let elapsed = started.elapsed();
    let threshold = crate::config::CONFIG.database.slow_query_threshold_ms;
    if elapsed.as_millis() > u128::from(threshold) {
        tracing::warn!(
            "Slow paged query on alias '{}': {}ms (threshold {}ms)",
            filter.alias(),
            elapsed.as_millis(),
            threshold
        );
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::BigInt(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Decimal(d) => q.bind(*d),
        FilterValue::Timestamp(t) => q.bind(*t),
        FilterValue::Date(d) => q.bind(*d),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::BigInt(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Decimal(d) => q.bind(*d),
        FilterValue::Timestamp(t) => q.bind(*t),
        FilterValue::Date(d) => q.bind(*d),
    }
}
