use anyhow::Result;
use coffer::{Coffer, Query, StoreError};
use common::*;

#[tokio::test]
async fn test_filter_equality() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let cars: Vec<Car> = store.objects(Query::new().filter("$brand = ?").bind("Brand14")).await?;
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].brand, "Brand14");
    Ok(())
}

#[tokio::test]
async fn test_filter_like_orders_by_id_by_default() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    // Brand1, Brand10..Brand19, Brand100
    let cars: Vec<Car> = store.objects(Query::new().filter("$brand like ?").bind("Brand1%")).await?;
    assert_eq!(cars.len(), 12);
    assert_eq!(cars.first().unwrap().brand, "Brand1");
    assert_eq!(cars.last().unwrap().brand, "Brand100");
    Ok(())
}

#[tokio::test]
async fn test_filter_with_descending_order() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let cars: Vec<Car> =
        store.objects(Query::new().filter("$brand like ?").bind("Brand1%").order_by("$brand desc")).await?;
    assert_eq!(cars.len(), 12);
    assert_eq!(cars.first().unwrap().brand, "Brand19");
    assert_eq!(cars.last().unwrap().brand, "Brand1");
    Ok(())
}

#[tokio::test]
async fn test_between_is_inclusive_on_both_ends() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let cars: Vec<Car> =
        store.objects(Query::new().filter("id between ? and ?").bind("Cars-0030").bind("Cars-0078")).await?;
    assert_eq!(cars.len(), 49);
    assert_eq!(cars.first().unwrap().brand, "Brand30");
    assert_eq!(cars.last().unwrap().brand, "Brand78");
    Ok(())
}

#[tokio::test]
async fn test_limit() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let cars: Vec<Car> = store.objects(Query::new().limit(8)).await?;
    assert_eq!(cars.len(), 8);
    assert_eq!(cars.first().unwrap().brand, "Brand1");
    assert_eq!(cars.last().unwrap().brand, "Brand8");
    Ok(())
}

#[tokio::test]
async fn test_numeric_field_comparison() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    // kmt is numeric in the stored document; comparison must be numeric,
    // not lexicographic
    let cars: Vec<Car> = store.objects(Query::new().filter("$kmt <= ?").bind(900)).await?;
    assert_eq!(cars.len(), 9);
    Ok(())
}

#[tokio::test]
async fn test_objects_between_is_half_open() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let cars: Vec<Car> = store.objects_between(Some("Cars-0030"), Some("Cars-0078"), None).await?;
    assert_eq!(cars.len(), 48);
    assert_eq!(cars.first().unwrap().brand, "Brand30");
    assert_eq!(cars.last().unwrap().brand, "Brand77");
    Ok(())
}

#[tokio::test]
async fn test_objects_between_bounds_and_limit() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let from_start: Vec<Car> = store.objects_between(Some("Cars-0017"), None, None).await?;
    assert_eq!(from_start.len(), 84);

    let to_end: Vec<Car> = store.objects_between(None, Some("Cars-0042"), None).await?;
    assert_eq!(to_end.len(), 41);
    assert_eq!(to_end.last().unwrap().brand, "Brand41");

    let limited: Vec<Car> = store.objects_between(Some("Cars-0054"), None, Some(7)).await?;
    assert_eq!(limited.len(), 7);
    assert_eq!(limited.first().unwrap().brand, "Brand54");
    assert_eq!(limited.last().unwrap().brand, "Brand60");
    Ok(())
}

#[tokio::test]
async fn test_malformed_marker_is_rejected() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let err = store.objects::<Car>(Query::new().filter("$ = ?").bind("x")).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilter(_)));
    Ok(())
}

#[tokio::test]
async fn test_limit_keyword_in_filter_is_rejected() -> Result<()> {
    let store = Coffer::open_in_memory()?;
    put_100_cars(&store).await?;

    let err = store.objects::<Car>(Query::new().filter("1=1 limit 8")).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilter(_)));
    Ok(())
}
