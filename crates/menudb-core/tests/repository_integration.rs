//! Integration tests for the repositories against a real SQLite database.

use std::time::Duration;

use menudb_core::proto::{
    FilterSpec, OrderSpec, Pagination, QueryOptions, TagCriterion, TagFilter, Value,
};
use menudb_core::{
    Error, Meal, MenuRepositories, Privacy, Product, Recipe, RenderedQuery, RepositoryConfig,
};

struct TestContext {
    repos: MenuRepositories,
}

impl TestContext {
    fn new() -> Self {
        Self::with_config(RepositoryConfig::in_memory().with_pool_size(2))
    }

    fn with_config(config: RepositoryConfig) -> Self {
        Self {
            repos: MenuRepositories::open(config).unwrap(),
        }
    }

    async fn exec(&self, sql: &'static str) {
        self.repos
            .products
            .database()
            .run(Duration::from_secs(5), move |conn| {
                conn.execute_batch(sql).map_err(menudb_core::storage::classify)
            })
            .await
            .unwrap();
    }
}

fn ids<T>(entities: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    let mut ids: Vec<String> = entities.iter().map(|e| id(e).to_string()).collect();
    ids.sort();
    ids
}

fn product_ids(products: &[Product]) -> Vec<String> {
    ids(products, |p| p.id.as_str())
}

fn priced(id: &str, price: f64) -> Product {
    let mut product = Product::new(id, format!("Product {id}"));
    product.price = Some(price);
    product
}

#[tokio::test]
async fn test_add_and_get_round_trip() {
    let ctx = TestContext::new();
    let mut product = Product::new("p1", "Oat Milk")
        .with_tag("diet", "vegan", "u1")
        .with_tag("origin", "local", "u2");
    product.barcode = Some("7891000".into());
    product.price = Some(3.5);
    product.calories = Some(46.0);
    product.is_food = true;
    ctx.repos.products.add(&product).await.unwrap();

    let loaded = ctx.repos.products.get_by_id("p1").await.unwrap();
    assert_eq!(loaded, product);

    let mut recipe = Recipe::new("r1", "Porridge", "u1").with_tag("course", "breakfast", "u1");
    recipe.total_time = Some(10);
    recipe.privacy = Privacy::Public;
    recipe.average_taste_rating = Some(4.25);
    ctx.repos.recipes.add(&recipe).await.unwrap();
    assert_eq!(ctx.repos.recipes.get_by_id("r1").await.unwrap(), recipe);

    let mut meal = Meal::new("m1", "Breakfast", "u1");
    meal.like = Some(false);
    ctx.repos.meals.add(&meal).await.unwrap();
    assert_eq!(ctx.repos.meals.get_by_id("m1").await.unwrap(), meal);
}

#[tokio::test]
async fn test_get_by_id_missing_and_discarded() {
    let ctx = TestContext::new();
    ctx.repos.products.add(&priced("p1", 1.0)).await.unwrap();
    ctx.repos.products.soft_delete("p1").await.unwrap();

    for id in ["p1", "nope"] {
        match ctx.repos.products.get_by_id(id).await {
            Err(Error::NotFound { entity, id: missing }) => {
                assert_eq!(entity, "Product");
                assert_eq!(missing, id);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_price_gte_respects_soft_delete() {
    let ctx = TestContext::new();
    for (id, price) in [("p1", 5.0), ("p2", 10.0), ("p3", 15.0)] {
        ctx.repos.products.add(&priced(id, price)).await.unwrap();
    }
    ctx.repos.products.soft_delete("p3").await.unwrap();

    let spec = FilterSpec::new().filter("price_gte", 10);
    let live = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&live), vec!["p2"]);

    let all = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new().including_discarded())
        .await
        .unwrap();
    assert_eq!(product_ids(&all), vec!["p2", "p3"]);
    assert!(all.iter().find(|p| p.id == "p3").unwrap().discarded);

    assert_eq!(ctx.repos.products.count(&spec, false).await.unwrap(), 1);
    assert_eq!(ctx.repos.products.count(&spec, true).await.unwrap(), 2);
}

#[tokio::test]
async fn test_explicit_discarded_filter_overrides_policy() {
    let ctx = TestContext::new();
    ctx.repos.products.add(&priced("p1", 1.0)).await.unwrap();
    ctx.repos.products.add(&priced("p2", 1.0)).await.unwrap();
    ctx.repos.products.soft_delete("p2").await.unwrap();

    let spec = FilterSpec::new().filter("discarded", true);
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p2"]);
}

#[tokio::test]
async fn test_tags_all_requires_every_criterion() {
    let ctx = TestContext::new();
    let wanted = [("diet", "vegan"), ("origin", "local"), ("season", "winter")];

    let mut full = Product::new("full", "Full");
    for (key, value) in wanted {
        full = full.with_tag(key, value, "u1");
    }
    full = full.with_tag("extra", "one", "u1").with_tag("extra", "two", "u2");
    ctx.repos.products.add(&full).await.unwrap();

    for skip in 0..wanted.len() {
        let mut partial = Product::new(format!("partial{skip}"), "Partial");
        for (i, (key, value)) in wanted.iter().enumerate() {
            if i != skip {
                partial = partial.with_tag(*key, *value, "u1");
            }
        }
        ctx.repos.products.add(&partial).await.unwrap();
    }

    let spec = FilterSpec::new().tags(TagFilter::all(
        wanted.iter().map(|(k, v)| TagCriterion::new(*k, *v)),
    ));
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["full"]);
    assert_eq!(found[0].tags.len(), 5);
    assert_eq!(ctx.repos.products.count(&spec, false).await.unwrap(), 1);

    let any = FilterSpec::new().tags(TagFilter::any(
        wanted.iter().map(|(k, v)| TagCriterion::new(*k, *v)),
    ));
    let found = ctx
        .repos
        .products
        .query(&any, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(found.len(), 4);
    assert_eq!(
        product_ids(&found),
        vec!["full", "partial0", "partial1", "partial2"]
    );
}

#[tokio::test]
async fn test_single_tag_all_and_any_agree() {
    let ctx = TestContext::new();
    ctx.repos
        .recipes
        .add(&Recipe::new("r1", "Soup", "u1").with_tag("course", "main", "u1"))
        .await
        .unwrap();
    ctx.repos
        .recipes
        .add(&Recipe::new("r2", "Cake", "u1").with_tag("course", "dessert", "u1"))
        .await
        .unwrap();
    ctx.repos
        .recipes
        .add(&Recipe::new("r3", "Toast", "u1"))
        .await
        .unwrap();

    let criterion = TagCriterion::new("course", "main");
    for filter in [
        TagFilter::all([criterion.clone()]),
        TagFilter::any([criterion.clone()]),
    ] {
        let found = ctx
            .repos
            .recipes
            .query(&FilterSpec::new().tags(filter), &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(ids(&found, |r| r.id.as_str()), vec!["r1"]);
    }

    // An untagged recipe never matches a tag filter in either mode.
    let course = TagCriterion::key("course");
    for filter in [
        TagFilter::all([course.clone()]),
        TagFilter::any([course.clone()]),
    ] {
        let found = ctx
            .repos
            .recipes
            .query(&FilterSpec::new().tags(filter), &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(ids(&found, |r| r.id.as_str()), vec!["r1", "r2"]);
    }
}

#[tokio::test]
async fn test_tag_criteria_author_and_key_only() {
    let ctx = TestContext::new();
    ctx.repos
        .meals
        .add(&Meal::new("m1", "Lunch", "u1").with_tag("mood", "happy", "u1"))
        .await
        .unwrap();
    ctx.repos
        .meals
        .add(&Meal::new("m2", "Dinner", "u2").with_tag("mood", "sad", "u2"))
        .await
        .unwrap();

    let by_key = FilterSpec::new().tags(TagFilter::all([TagCriterion::key("mood")]));
    let found = ctx.repos.meals.query(&by_key, &QueryOptions::new()).await.unwrap();
    assert_eq!(ids(&found, |m| m.id.as_str()), vec!["m1", "m2"]);

    let by_author = FilterSpec::new().tags(TagFilter::all([TagCriterion::key("mood").by("u2")]));
    let found = ctx.repos.meals.query(&by_author, &QueryOptions::new()).await.unwrap();
    assert_eq!(ids(&found, |m| m.id.as_str()), vec!["m2"]);
}

#[tokio::test]
async fn test_tags_not_exists() {
    let ctx = TestContext::new();
    ctx.repos
        .products
        .add(&Product::new("p1", "Milk").with_tag("allergen", "lactose", "u1"))
        .await
        .unwrap();
    ctx.repos
        .products
        .add(&Product::new("p2", "Water"))
        .await
        .unwrap();

    let spec = FilterSpec::new().exclude_tag(TagCriterion::new("allergen", "lactose"));
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p2"]);
}

#[tokio::test]
async fn test_update_soft_deletes_dropped_tag_links() {
    let ctx = TestContext::new();
    let product = Product::new("p1", "Bread")
        .with_tag("diet", "vegan", "u1")
        .with_tag("grain", "wheat", "u1");
    ctx.repos.products.add(&product).await.unwrap();

    let mut updated = Product::new("p1", "Rye Bread").with_tag("grain", "rye", "u1");
    updated.created_at = product.created_at;
    ctx.repos.products.update(&updated).await.unwrap();

    let loaded = ctx.repos.products.get_by_id("p1").await.unwrap();
    assert_eq!(loaded, updated);

    let vegan = TagCriterion::new("diet", "vegan");
    let live = FilterSpec::new().tags(TagFilter::all([vegan.clone()]));
    assert!(ctx
        .repos
        .products
        .query(&live, &QueryOptions::new())
        .await
        .unwrap()
        .is_empty());

    let historic = FilterSpec::new().tags(TagFilter::all([vegan]).including_discarded_links());
    let found = ctx
        .repos
        .products
        .query(&historic, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p1"]);

    // Relinking revives the link.
    ctx.repos
        .products
        .update(&updated.clone().with_tag("diet", "vegan", "u1"))
        .await
        .unwrap();
    assert_eq!(
        ctx.repos
            .products
            .query(&live, &QueryOptions::new())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_not_in_excludes_nulls() {
    let ctx = TestContext::new();
    ctx.exec(
        "INSERT INTO brands (id, name) VALUES ('b1', 'Acme'), ('b2', 'Globex');",
    )
    .await;
    for (id, brand) in [("p1", Some("b1")), ("p2", Some("b2")), ("p3", None)] {
        let mut product = Product::new(id, id);
        product.brand_id = brand.map(String::from);
        ctx.repos.products.add(&product).await.unwrap();
    }

    let spec = FilterSpec::new().filter(
        "brand_id_not_in",
        Value::List(vec![Value::String("b1".into())]),
    );
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p2"]);

    let spec = FilterSpec::new().filter("brand_ne", "Acme");
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p2"]);
}

#[tokio::test]
async fn test_ne_null_matches_nothing() {
    let ctx = TestContext::new();
    let mut with_barcode = Product::new("a", "Tea");
    with_barcode.barcode = Some("123".into());
    ctx.repos.products.add(&with_barcode).await.unwrap();
    ctx.repos.products.add(&Product::new("b", "Coffee")).await.unwrap();

    let spec = FilterSpec::from_json(&serde_json::json!({ "barcode_ne": null })).unwrap();
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert!(found.is_empty(), "{found:?}");
    assert_eq!(ctx.repos.products.count(&spec, true).await.unwrap(), 0);

    let spec = FilterSpec::new().filter("barcode_ne", "999");
    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["a"]);
}

#[tokio::test]
async fn test_joined_filters_share_one_join() {
    let ctx = TestContext::new();
    ctx.exec(
        "INSERT INTO categories (id, name, parent_id) VALUES \
           ('food', 'Food', NULL), ('dairy', 'Dairy', 'food'), ('tools', 'Tools', NULL);",
    )
    .await;
    for (id, category) in [("p1", "dairy"), ("p2", "tools"), ("p3", "dairy")] {
        let mut product = Product::new(id, id);
        product.category_id = Some(category.into());
        ctx.repos.products.add(&product).await.unwrap();
    }

    let spec = FilterSpec::new()
        .filter("category", "Dairy")
        .filter("parent_category", "Food")
        .filter("category_ne", "Tools");
    let rendered = ctx
        .repos
        .products
        .explain(&spec, &QueryOptions::new())
        .unwrap();
    assert_eq!(rendered.sql.matches("LEFT JOIN").count(), 2);

    let found = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(product_ids(&found), vec!["p1", "p3"]);
}

#[tokio::test]
async fn test_recipe_filters_through_meal_and_menu() {
    let ctx = TestContext::new();
    ctx.exec(
        "INSERT INTO menus (id, name, client_id, author_id) VALUES ('menu1', 'Week', 'c1', 'u1');",
    )
    .await;
    let mut meal = Meal::new("m1", "Lunch", "u1");
    meal.menu_id = Some("menu1".into());
    ctx.repos.meals.add(&meal).await.unwrap();

    let mut in_menu = Recipe::new("r1", "Salad", "u1");
    in_menu.meal_id = Some("m1".into());
    ctx.repos.recipes.add(&in_menu).await.unwrap();
    ctx.repos
        .recipes
        .add(&Recipe::new("r2", "Stew", "u1"))
        .await
        .unwrap();

    let spec = FilterSpec::new().filter("client_id", "c1");
    let found = ctx
        .repos
        .recipes
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(ids(&found, |r| r.id.as_str()), vec!["r1"]);
}

#[tokio::test]
async fn test_pagination_and_sorting() {
    let ctx = TestContext::with_config(
        RepositoryConfig::in_memory()
            .with_default_page_size(2)
            .with_max_page_size(3),
    );
    for (id, price) in [("a", 3.0), ("b", 1.0), ("c", 2.0), ("d", 2.0)] {
        ctx.repos.products.add(&priced(id, price)).await.unwrap();
    }

    let spec = FilterSpec::new().sort(OrderSpec::asc("price"));
    let first = ctx
        .repos
        .products
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    let order: Vec<&str> = first.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["b", "c"]);

    let next = ctx
        .repos
        .products
        .query(
            &spec,
            &QueryOptions::new().with_pagination(Pagination::new(3, 2)),
        )
        .await
        .unwrap();
    let order: Vec<&str> = next.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["d", "a"]);

    for limit in [0, 4] {
        let result = ctx
            .repos
            .products
            .query(
                &spec,
                &QueryOptions::new().with_pagination(Pagination::limit(limit)),
            )
            .await;
        assert!(
            matches!(result, Err(Error::InvalidPageSize { max: 3, .. })),
            "limit {limit}: {result:?}"
        );
    }

    // Counts ignore paging.
    assert_eq!(ctx.repos.products.count(&spec, false).await.unwrap(), 4);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_storage() {
    let ctx = TestContext::new();
    let cases = [
        FilterSpec::new().filter("colour", "red"),
        FilterSpec::new().filter("is_food_gte", true),
        FilterSpec::new().filter("price", "cheap"),
    ];
    let results: Vec<_> = {
        let mut out = Vec::new();
        for spec in &cases {
            out.push(ctx.repos.products.query(spec, &QueryOptions::new()).await);
        }
        out
    };
    assert!(matches!(results[0], Err(Error::UnknownFilterKey { .. })));
    assert!(matches!(results[1], Err(Error::UnsupportedOperator { .. })));
    assert!(matches!(results[2], Err(Error::InvalidFilterValue { .. })));
    for result in results {
        assert!(result.unwrap_err().is_invalid_request());
    }
}

#[tokio::test]
async fn test_duplicate_barcode_is_integrity_violation() {
    let ctx = TestContext::new();
    let mut first = Product::new("p1", "One");
    first.barcode = Some("123".into());
    let mut second = Product::new("p2", "Two");
    second.barcode = Some("123".into());

    ctx.repos.products.add(&first).await.unwrap();
    let err = ctx.repos.products.add(&second).await.unwrap_err();
    assert!(matches!(err, Error::IntegrityViolation(_)), "{err:?}");
    assert!(matches!(
        ctx.repos.products.get_by_id("p2").await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_update_fields() {
    let ctx = TestContext::new();
    ctx.repos.products.add(&priced("p1", 2.0)).await.unwrap();

    ctx.repos
        .products
        .update_fields(
            "p1",
            &[
                ("price".to_string(), Value::Int64(4)),
                ("barcode".to_string(), Value::Null),
                ("is_food".to_string(), Value::Bool(false)),
            ],
        )
        .await
        .unwrap();
    let loaded = ctx.repos.products.get_by_id("p1").await.unwrap();
    assert_eq!(loaded.price, Some(4.0));
    assert!(!loaded.is_food);

    let patch = |key: &str, value: Value| vec![(key.to_string(), value)];
    let repo = &ctx.repos.products;
    assert!(matches!(
        repo.update_fields("p1", &patch("colour", Value::Int64(1))).await,
        Err(Error::UnknownFilterKey { .. })
    ));
    assert!(matches!(
        repo.update_fields("p1", &patch("brand", "Acme".into())).await,
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        repo.update_fields("p1", &patch("discarded", Value::Bool(true))).await,
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        repo.update_fields("p1", &patch("name", Value::Null)).await,
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        repo.update_fields("missing", &patch("price", Value::Int64(1))).await,
        Err(Error::NotFound { .. })
    ));

    repo.soft_delete("p1").await.unwrap();
    assert!(matches!(
        repo.update_fields("p1", &patch("price", Value::Int64(1))).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_soft_delete_restore_and_hard_delete() {
    let ctx = TestContext::new();
    let repo = &ctx.repos.products;
    repo.add(&Product::new("p1", "Salt").with_tag("diet", "vegan", "u1"))
        .await
        .unwrap();

    repo.soft_delete("p1").await.unwrap();
    repo.soft_delete("p1").await.unwrap();
    assert_eq!(repo.count(&FilterSpec::new(), false).await.unwrap(), 0);

    repo.restore("p1").await.unwrap();
    repo.restore("p1").await.unwrap();
    assert_eq!(repo.get_by_id("p1").await.unwrap().tags.len(), 1);

    repo.hard_delete("p1").await.unwrap();
    assert_eq!(repo.count(&FilterSpec::new(), true).await.unwrap(), 0);
    assert!(matches!(repo.hard_delete("p1").await, Err(Error::NotFound { .. })));
    assert!(matches!(repo.soft_delete("p1").await, Err(Error::NotFound { .. })));
    assert!(matches!(repo.restore("p1").await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn test_update_missing_entity() {
    let ctx = TestContext::new();
    let err = ctx
        .repos
        .meals
        .update(&Meal::new("ghost", "Nothing", "u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_explain_binds_parameters() {
    let ctx = TestContext::new();
    let spec = FilterSpec::new()
        .filter("name_ilike", "%milk%")
        .filter("price_lte", 2.5);
    let rendered: RenderedQuery = ctx
        .repos
        .products
        .explain(&spec, &QueryOptions::new())
        .unwrap();
    assert!(rendered.sql.contains("LOWER("));
    assert!(rendered.params.contains(&Value::String("%milk%".into())));
    assert!(rendered.params.contains(&Value::Float64(2.5)));
    assert!(!rendered.sql.contains("milk"));
}

#[tokio::test]
async fn test_like_and_ilike() {
    let ctx = TestContext::new();
    ctx.repos
        .products
        .add(&Product::new("p1", "Oat Milk"))
        .await
        .unwrap();
    ctx.repos
        .products
        .add(&Product::new("p2", "milk powder"))
        .await
        .unwrap();

    let like = FilterSpec::new().filter("name_like", "%Milk%");
    let found = ctx.repos.products.query(&like, &QueryOptions::new()).await.unwrap();
    assert_eq!(product_ids(&found), vec!["p1"]);

    let ilike = FilterSpec::new().filter("name_ilike", "%MILK%");
    let found = ctx.repos.products.query(&ilike, &QueryOptions::new()).await.unwrap();
    assert_eq!(product_ids(&found), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_deadline_interrupts_and_releases_connection() {
    let ctx = TestContext::with_config(RepositoryConfig::in_memory().with_pool_size(1));
    let db = ctx.repos.products.database();

    let endless = RenderedQuery {
        sql: "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n) \
              SELECT COUNT(*) AS c FROM n"
            .into(),
        params: vec![],
    };
    let err = db
        .fetch(endless, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded(_)), "{err:?}");
    assert!(err.is_transient());

    ctx.repos.products.add(&priced("p1", 1.0)).await.unwrap();
    assert_eq!(ctx.repos.products.get_by_id("p1").await.unwrap().id, "p1");
    assert_eq!(db.idle_connections(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_and_queries() {
    let ctx = TestContext::with_config(RepositoryConfig::in_memory().with_pool_size(4));
    let mut tasks = Vec::new();
    for i in 0..40 {
        let repos = ctx.repos.clone();
        tasks.push(tokio::spawn(async move {
            let id = format!("p{i:02}");
            repos
                .products
                .add(&Product::new(id.as_str(), "Bulk").with_tag("batch", "one", "u1"))
                .await?;
            let spec = FilterSpec::new()
                .filter("name", "Bulk")
                .tags(TagFilter::all([TagCriterion::new("batch", "one")]));
            repos.products.query(&spec, &QueryOptions::new()).await?;
            repos.products.get_by_id(&id).await.map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let spec = FilterSpec::new().filter("name", "Bulk");
    assert_eq!(ctx.repos.products.count(&spec, false).await.unwrap(), 40);
}

#[tokio::test]
async fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("menu.sqlite3");

    {
        let ctx = TestContext::with_config(RepositoryConfig::new(&path));
        ctx.repos
            .products
            .add(&Product::new("p1", "Rice").with_tag("diet", "vegan", "u1"))
            .await
            .unwrap();
    }

    let ctx = TestContext::with_config(RepositoryConfig::new(&path));
    let loaded = ctx.repos.products.get_by_id("p1").await.unwrap();
    assert_eq!(loaded.name, "Rice");
    assert_eq!(loaded.tags.len(), 1);
}

#[tokio::test]
async fn test_filter_spec_from_json() {
    let ctx = TestContext::new();
    ctx.repos
        .recipes
        .add(&Recipe::new("r1", "Quick", "u1").with_tag("speed", "fast", "u1"))
        .await
        .unwrap();
    let mut slow = Recipe::new("r2", "Slow", "u1");
    slow.total_time = Some(240);
    ctx.repos.recipes.add(&slow).await.unwrap();

    let json = serde_json::json!({
        "author_id": "u1",
        "sort": "-name",
        "tags_not_exists": [["speed", "fast", "u1"]],
    });
    let spec = FilterSpec::from_json(&json).unwrap();
    let found = ctx
        .repos
        .recipes
        .query(&spec, &QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(ids(&found, |r| r.id.as_str()), vec!["r2"]);
}
