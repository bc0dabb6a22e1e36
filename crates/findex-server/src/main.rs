mod auth;
mod error;
mod rest_api;
mod sql;

use actix_web::{middleware::Logger, web, App, HttpServer};
use deadpool_postgres::{Config, ManagerConfig, RecyclingMethod, Runtime};
use dotenv::var;
use tokio_postgres::NoTls;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("set subscriber");

    // signing keys; missing JWT_SECRET_KEY is fatal
    let keys = auth::AuthKeys::from_env();

    // build pool from .env DATABASE_URL
    let db_url = var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut cfg = Config::new();
    cfg.url = Some(db_url);
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .expect("Failed to create pool");

    // create API documentation
    #[derive(OpenApi)]
    #[openapi(paths(rest_api::catalog::stocks, rest_api::catalog::top_stocks))]
    struct ApiDoc;

    // run server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(keys.clone()))
            .service(rest_api::users::register)
            .service(rest_api::users::login)
            .service(rest_api::users::logout)
            .service(rest_api::users::oauth)
            .service(rest_api::users::me)
            .service(rest_api::users::track_companies)
            .service(rest_api::users::untrack_company)
            .service(rest_api::users::delete_account)
            .service(rest_api::users::tracked_company_data)
            .service(rest_api::users::tracked_companies)
            .service(rest_api::catalog::stocks)
            .service(rest_api::catalog::top_stocks)
            .service(rest_api::catalog::high_cash_reserves)
            .service(rest_api::catalog::debt_to_asset_ratio)
            .service(rest_api::catalog::high_cash_minimal_debt)
            .service(rest_api::catalog::monthly_avg_close)
            .service(rest_api::catalog::highest_fluctuations)
            .service(rest_api::catalog::highest_liquidity_debt_ratio)
            .service(rest_api::catalog::greatest_leverage_differences)
            .service(rest_api::catalog::similar_debt_ratios)
            .service(rest_api::catalog::similar_inventory_ratios)
            .service(rest_api::catalog::strong_liquidity)
            .service(rest_api::catalog::financial_improvement)
            .service(rest_api::search::search)
            .service(Redoc::with_url("/redoc", ApiDoc::openapi()))
    })
    .bind(("127.0.0.1", 8000))?
    .run()
    .await
}
