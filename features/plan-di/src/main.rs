use std::{error::Error, sync::Arc};

use plan_di::{Arguments, Constructible, ContainerBuilder, DynError, Signature};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let builder = ContainerBuilder::new()
        .add_singleton_type::<Config>()
        .add_singleton_type::<Cache>()
        .add_transient_type::<Database>()
        .add_transient_type::<Service>();

    println!("{}", builder.generated_source()?);

    let container = builder.build()?;
    let first = container.require::<Service>()?;
    let second = container.require::<Service>()?;

    println!("{:?}", first);
    println!(
        "shared config: {}, shared cache: {}, shared database: {}",
        Arc::ptr_eq(&first.config, &second.config),
        Arc::ptr_eq(&first.cache, &second.cache),
        Arc::ptr_eq(&first.database, &second.database),
    );
    println!(
        "cache and database use the same config: {}",
        Arc::ptr_eq(&first.cache.config, &first.database.config),
    );
    Ok(())
}

#[derive(Debug)]
struct Config {
    url: String,
}
impl Constructible for Config {
    fn signature() -> Signature {
        Signature::new()
    }

    fn construct(_: &Arguments) -> Result<Self, DynError> {
        Ok(Config {
            url: "postgres://localhost/app".to_string(),
        })
    }
}

#[derive(Debug)]
struct Cache {
    config: Arc<Config>,
}
impl Constructible for Cache {
    fn signature() -> Signature {
        Signature::new().param::<Config>("config")
    }

    fn construct(args: &Arguments) -> Result<Self, DynError> {
        Ok(Cache {
            config: args.get("config")?,
        })
    }
}

#[derive(Debug)]
struct Database {
    config: Arc<Config>,
}
impl Constructible for Database {
    fn signature() -> Signature {
        Signature::new().param::<Config>("config")
    }

    fn construct(args: &Arguments) -> Result<Self, DynError> {
        let config: Arc<Config> = args.get("config")?;
        tracing::info!("Connecting to {}", config.url);
        Ok(Database { config })
    }
}

#[derive(Debug)]
struct Service {
    config: Arc<Config>,
    cache: Arc<Cache>,
    database: Arc<Database>,
}
impl Constructible for Service {
    fn signature() -> Signature {
        Signature::new()
            .param::<Config>("config")
            .param::<Cache>("cache")
            .param::<Database>("database")
    }

    fn construct(args: &Arguments) -> Result<Self, DynError> {
        Ok(Service {
            config: args.get("config")?,
            cache: args.get("cache")?,
            database: args.get("database")?,
        })
    }
}
