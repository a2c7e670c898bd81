mod api;
mod config;
mod error;
mod handlers;
mod models;
mod processing;
mod services;
mod utils;

use actix_web::{middleware::Logger, web, App, HttpServer};
use api::PgStore;
use config::Config;
use dotenv::dotenv;
use handlers::{configure, json_config, query_config, AppState};
use log::{info, warn};
use processing::sitemap_processing;
use services::{HttpObjectStorage, HttpRevalidator};
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
	dotenv().ok();

	if std::env::var_os("RUST_LOG").is_none() {
		std::env::set_var("RUST_LOG", "actix_web=info,stand_content=info");
	}
	env_logger::init();

	let config = match Config::init() {
		Ok(config) => config,
		Err(err) => {
			println!("🔥 Invalid configuration: {}", err);
			std::process::exit(1);
		}
	};

	let pool = match PgPoolOptions::new()
		.max_connections(config.database_max_connections)
		.connect(&config.database_url)
		.await
	{
		Ok(pool) => {
			println!("✅ Connection to the database is successful!");
			pool
		}
		Err(err) => {
			println!("🔥 Failed to connect to the database: {:?}", err);
			std::process::exit(1);
		}
	};

	let processing_type = config.processing_type.clone();
	println!("PROCESSING_TYPE: {}", &processing_type);

	match processing_type.as_str() {
		"server" => {
			let storage = HttpObjectStorage::new(&config.storage_url, &config.storage_service_key)?;
			let revalidator = HttpRevalidator::new(&config.site_url, &config.revalidate_secret);
			if !config.admin_auth_enabled {
				warn!("admin auth is disabled, every mutation endpoint is open");
			}
			if config.revalidate_secret.is_empty() {
				warn!("REVALIDATE_SECRET is empty, public pages will not be revalidated");
			}

			let bind = (config.host.clone(), config.port);
			let state = web::Data::new(AppState {
				store: Arc::new(PgStore::new(pool.clone())),
				storage: Arc::new(storage),
				revalidator: Arc::new(revalidator),
				config: Arc::new(config),
			});

			info!("listening on {}:{}", bind.0, bind.1);
			HttpServer::new(move || {
				App::new()
					.wrap(Logger::default())
					.app_data(state.clone())
					.app_data(json_config())
					.app_data(query_config())
					.configure(configure)
			})
			.bind(bind)?
			.run()
			.await?
		}
		"sitemap" => {
			let store = PgStore::new(pool.clone());
			let xml = sitemap_processing(&store, &config.site_url).await?;
			println!("{}", xml);
		}
		"migrate" => {
			sqlx::migrate!("./migrations").run(&pool).await?;
			println!("✅ Migrations applied");
		}
		_ => println!("error in env (no such handler)!"),
	}

	Ok(())
}
