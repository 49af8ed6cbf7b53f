use dynamo_walker::{
    config::Config,
    error::Error,
    items, table,
    table::CreateOutcome,
    types::{
        display_item, AttributeValue, Comparator, Condition, GetItem, Item, PutItem, Query,
        ScalarType, Scan, StreamView, TableSchema, TransactItem, UpdateAction, UpdateItem,
    },
    walker::ShardWalker,
    Client, DynamodbClient,
};
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

const PK: &str = "Artist";
const SK: &str = "SongTitle";

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::new();
    if let Err(err) = run(&config).await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<(), Error> {
    let client = Client::new(&config.sdk_config().await);
    let table_name = config.table_name();

    let schema = TableSchema::new(table_name, PK, ScalarType::S)
        .sort_key(SK, ScalarType::S)
        .stream(StreamView::NewAndOldImages);
    if let CreateOutcome::Created(description) = table::create_table(&client, &schema).await? {
        info!("{} is {:?}", description.table_name, description.status);
    }
    table::wait_until_active(&client, table_name, Duration::from_secs(1), 30).await?;

    // Single put, refused when the song is already there.
    let put = PutItem::new(
        table_name,
        song("No One You Know", "Call Me Today", 2019, 2),
    )
    .condition(Condition::not_exists(PK));
    match client.put_item(put).await {
        Ok(()) => info!("Put Call Me Today"),
        Err(err) if err.is_conditional_check_failed() => info!("Call Me Today already exists"),
        Err(err) => return Err(err),
    }

    let songs = vec![
        song("No One You Know", "My Dog Spot", 2015, 1),
        song("No One You Know", "Somewhere Down The Road", 2010, 1),
        song("The Acme Band", "Still In Love", 2019, 1),
        song("The Acme Band", "Look Out, World", 2021, 1),
    ];
    items::batch_put(&client, table_name, songs).await?;
    info!("Batch put done");

    let item = client
        .get_item(GetItem::new(table_name, key("No One You Know", "Call Me Today")).consistent())
        .await?;
    match item {
        Some(item) => info!("Got {}", display_item(&item)),
        None => info!("Call Me Today not found"),
    }

    let query = Query::new(table_name, PK, "No One You Know")
        .sort_key(Condition::begins_with(SK, "S"))
        .filter(Condition::compare("Year", Comparator::Ge, 2000));
    for item in items::query_all(&client, &query).await? {
        info!("Query: {}", display_item(&item));
    }

    let recent = Scan::new(table_name).filter(Condition::between("Year", 2018, 2021));
    for item in items::scan_all(&client, &recent).await? {
        info!("Scan: {}", display_item(&item));
    }

    // The stored version is 2; only the first of these two updates goes through.
    for attempt in 1..=2 {
        let result = items::update_versioned(
            &client,
            table_name,
            key("No One You Know", "Call Me Today"),
            "Version",
            2,
            vec![UpdateAction::Set("AlbumTitle".into(), "Updated Album".into())],
        )
        .await;
        match result {
            Ok(item) => info!("Update #{attempt}: {}", display_item(&item)),
            Err(err) if err.is_conditional_check_failed() => {
                info!("Update #{attempt}: version changed, nothing written")
            }
            Err(err) => return Err(err),
        }
    }

    let transaction = vec![
        TransactItem::ConditionCheck {
            table_name: table_name.into(),
            key: key("The Acme Band", "Still In Love"),
            condition: Condition::exists(PK),
        },
        TransactItem::Update(
            UpdateItem::new(table_name, key("The Acme Band", "Look Out, World"))
                .set("Awards", 1)
                .condition(Condition::exists(PK)),
        ),
        TransactItem::Put(PutItem::new(
            table_name,
            song("The Acme Band", "Hello Again", 2023, 1),
        )),
    ];
    match items::transact_write(&client, transaction).await {
        Ok(()) => info!("Transaction committed"),
        Err(err) if err.is_conditional_check_failed() => info!("Transaction cancelled"),
        Err(err) => return Err(err),
    }

    let walker = ShardWalker::builder(client.clone())
        .max_polls(config.max_polls())
        .build();
    for stream in walker.list_all_streams(table_name).await? {
        info!("Stream {} ({:?})", stream.stream_arn, stream.stream_label);
    }
    let report = walker.walk_table(&client, table_name).await?;
    for shard in report.shards.iter() {
        info!(
            "Shard {}: {:?} after {} polls, {} records",
            shard.shard_id,
            shard.status,
            shard.polls,
            shard.records.len()
        );
    }
    for record in report.records() {
        println!("{record}");
    }

    Ok(())
}

fn key(artist: &str, title: &str) -> Item {
    Item::from([
        (PK.to_string(), AttributeValue::from(artist)),
        (SK.to_string(), AttributeValue::from(title)),
    ])
}

fn song(artist: &str, title: &str, year: i64, version: i64) -> Item {
    let mut item = key(artist, title);
    item.insert("Year".into(), AttributeValue::number(year));
    item.insert("Version".into(), AttributeValue::number(version));
    item
}
