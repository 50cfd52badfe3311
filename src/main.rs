use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use lucky_spin_backend::{
    config::{Config, StorageBackend},
    database::{create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    repository::Stores,
    services::*,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");

    // 奖品目录 (启动后只读)
    let catalog = Arc::new(config.prize_catalog().expect("Invalid prize catalog"));
    log::info!("Loaded {} prizes", catalog.len());

    // 创建存储
    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database)
                .await
                .expect("Failed to create database connection pool");

            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");

            Stores::postgres(pool)
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; state is lost on restart and not shared");
            Stores::memory()
        }
    };

    // 初始化库存计数器 (保留已有剩余库存)
    stores
        .ledger
        .seed(&catalog)
        .await
        .expect("Failed to initialize prize stocks");

    // 创建服务
    let audit_sink = AuditSink::new(stores.logs.clone());
    let spin_service = SpinService::new(catalog.clone(), &stores, audit_sink.clone());
    let admin_service = AdminService::new(
        catalog.clone(),
        &stores,
        audit_sink,
        config.admin.secret.clone(),
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(handlers::json_config())
            .app_data(web::Data::new(spin_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api")
                    .configure(handlers::spin_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
