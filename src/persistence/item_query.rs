//! Item query engine.
//!
//! Translates an [`ItemFilter`] into one parameterized SELECT. Every user
//! value goes through `push_bind`; only fixed SQL fragments are pushed as
//! text.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::ItemRow;
use crate::domain::{ItemFilter, ListingKind, SortOrder};

/// Column list shared by listing and single-item reads. The score formula
/// mirrors [`crate::domain::item_filter::priority_score`].
const ITEM_COLUMNS: &str = "SELECT i.id, i.title, i.price, i.description, i.condition, i.category,
        i.image_url, i.is_sold_out, i.seller_id, i.is_invest_item,
        COALESCE(i.view_count, 0) AS view_count,
        COALESCE(i.like_count, 0) AS like_count,
        (SELECT COUNT(*) FROM item_reactions r
            WHERE r.item_id = i.id AND r.reaction_type = 'watch') AS watch_count,
        i.product_group,
        u.rating AS seller_rating,
        (COALESCE(u.rating, 3.0) * 20
            + COALESCE(u.follower_count, 0) * 2
            + COALESCE(u.listings_count, 0) * 1.5
            + COALESCE(i.like_count, 0) * 10
            + COALESCE(i.view_count, 0) * 0.5) AS priority_score
    FROM items i
    LEFT JOIN users u ON u.id = i.seller_id";

/// Escapes `LIKE` wildcards so a keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Builds the listing query for `filter` without executing it.
#[must_use]
pub fn build_list_query(filter: &ItemFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(ITEM_COLUMNS);
    qb.push(" WHERE i.is_sold_out = 0");

    if !filter.keywords().is_empty() {
        qb.push(" AND (");
        for (n, keyword) in filter.keywords().iter().enumerate() {
            if n > 0 {
                qb.push(" OR ");
            }
            let pattern = like_pattern(keyword);
            qb.push("LOWER(i.title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(i.id) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }

    if let Some(code) = filter.category_code() {
        qb.push(" AND i.category = ").push_bind(code.to_string());
    }
    if let Some(min) = filter.min_price() {
        qb.push(" AND i.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price() {
        qb.push(" AND i.price <= ").push_bind(max);
    }

    match filter.kind() {
        ListingKind::Any => {}
        ListingKind::InvestOnly => {
            qb.push(" AND i.is_invest_item = 1");
        }
        ListingKind::NormalOnly => {
            qb.push(" AND i.is_invest_item = 0");
        }
    }

    qb.push(match filter.sort() {
        SortOrder::PriceAsc => " ORDER BY i.price ASC, i.id ASC",
        SortOrder::PriceDesc => " ORDER BY i.price DESC, i.id ASC",
        SortOrder::Newest => " ORDER BY i.id DESC",
        SortOrder::Priority => " ORDER BY priority_score DESC, i.id ASC",
    });
    qb
}

/// Lists unsold items matching `filter`.
///
/// # Errors
///
/// Returns the driver error if the query fails.
pub async fn list_items(pool: &SqlitePool, filter: &ItemFilter) -> Result<Vec<ItemRow>, sqlx::Error> {
    let mut qb = build_list_query(filter);
    let rows = qb.build_query_as::<ItemRow>().fetch_all(pool).await?;
    tracing::debug!(
        keywords = filter.keywords().len(),
        results = rows.len(),
        "item query executed"
    );
    Ok(rows)
}

/// Loads one item regardless of its sold-out state.
///
/// # Errors
///
/// Returns the driver error if the query fails.
pub async fn get_item(pool: &SqlitePool, id: &str) -> Result<Option<ItemRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(ITEM_COLUMNS);
    qb.push(" WHERE i.id = ").push_bind(id.to_string());
    qb.build_query_as::<ItemRow>().fetch_optional(pool).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::item_filter::priority_score;
    use crate::persistence::connect_in_memory;

    async fn seeded() -> SqlitePool {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = [
            "INSERT INTO users (id, name, rating, follower_count, listings_count) VALUES
             ('s1', 'Trusted', 4.5, 10, 3), ('s2', 'Newcomer', NULL, 0, 0)",
            "INSERT INTO items (id, title, price, category, image_url, seller_id, like_count, view_count, is_invest_item, is_sold_out) VALUES
             ('100', 'Red Jacket', 1000, '110', 'x', 's1', 5, 100, 0, 0),
             ('200', 'Blue Shirt', 1000, '110', 'x', 's2', 0, 0, 0, 0),
             ('300', 'Gold Coin', 50000, '010', 'x', 's2', 0, 0, 1, 0),
             ('400', 'Red Hat', 700, '120', 'x', 's2', 0, 0, 0, 0),
             ('500', 'Red Scarf', 800, '120', 'x', 's2', 0, 0, 0, 1),
             ('600', '100%_cotton tee', 900, '120', 'x', 's2', 0, 0, 0, 0)",
            "INSERT INTO item_reactions (id, item_id, user_id, reaction_type) VALUES
             ('w1', '200', 's1', 'watch')",
        ];
        for sql in seed {
            if let Err(e) = sqlx::query(sql).execute(&pool).await {
                panic!("seed failed: {e}");
            }
        }
        pool
    }

    fn ids(rows: &[ItemRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn default_sort_ranks_by_priority_score() {
        let pool = seeded().await;
        let Ok(rows) = list_items(&pool, &ItemFilter::new()).await else {
            panic!("query failed");
        };
        let Some(first) = rows.first() else {
            panic!("no rows");
        };
        assert_eq!(first.id, "100");
        assert!((first.priority_score - 214.5).abs() < 1e-9);
        let expected = priority_score(Some(4.5), Some(10), Some(3), Some(5), Some(100));
        assert!((first.priority_score - expected).abs() < 1e-9);

        // Equal scores fall back to id ascending.
        assert_eq!(ids(&rows), ["100", "200", "300", "400", "600"]);
    }

    #[tokio::test]
    async fn sold_out_items_are_excluded() {
        let pool = seeded().await;
        let filter = ItemFilter::new().with_query("scarf");
        let Ok(rows) = list_items(&pool, &filter).await else {
            panic!("query failed");
        };
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn keywords_match_with_or_semantics() {
        let pool = seeded().await;
        let filter = ItemFilter::new().with_query("JACKET hat");
        let Ok(rows) = list_items(&pool, &filter).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["100", "400"]);
    }

    #[tokio::test]
    async fn keywords_match_ids_and_literal_wildcards() {
        let pool = seeded().await;
        let Ok(by_id) = list_items(&pool, &ItemFilter::new().with_query("30")).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&by_id), ["300"]);

        let Ok(literal) = list_items(&pool, &ItemFilter::new().with_query("%_cot")).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&literal), ["600"]);
    }

    #[tokio::test]
    async fn price_bounds_are_inclusive() {
        let pool = seeded().await;
        let filter = ItemFilter::new()
            .with_price_range(Some(700), Some(1000))
            .with_sort(SortOrder::PriceAsc);
        let Ok(rows) = list_items(&pool, &filter).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["400", "600", "100", "200"]);
    }

    #[tokio::test]
    async fn listing_kind_and_category_filters() {
        let pool = seeded().await;
        let invest = ItemFilter::new().with_kind(ListingKind::InvestOnly);
        let Ok(rows) = list_items(&pool, &invest).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["300"]);

        let normal = ItemFilter::new()
            .with_kind(ListingKind::NormalOnly)
            .with_category("110");
        let Ok(rows) = list_items(&pool, &normal).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["100", "200"]);
    }

    #[tokio::test]
    async fn newest_and_price_desc_orders() {
        let pool = seeded().await;
        let Ok(rows) = list_items(&pool, &ItemFilter::new().with_sort(SortOrder::Newest)).await
        else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["600", "400", "300", "200", "100"]);

        let Ok(rows) = list_items(&pool, &ItemFilter::new().with_sort(SortOrder::PriceDesc)).await
        else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows), ["300", "100", "200", "600", "400"]);
    }

    #[tokio::test]
    async fn get_item_reports_watch_count_and_sold_items() {
        let pool = seeded().await;
        let Ok(Some(item)) = get_item(&pool, "200").await else {
            panic!("item 200 missing");
        };
        assert_eq!(item.watch_count, 1);
        assert_eq!(item.seller_rating, None);

        let Ok(Some(sold)) = get_item(&pool, "500").await else {
            panic!("item 500 missing");
        };
        assert!(sold.is_sold_out);
        assert!(matches!(get_item(&pool, "missing").await, Ok(None)));
    }
}
