use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::MySqlPool;

/// 按 .env 中的 DATABASE_URL 建立一个新的连接池并确保表存在
///
/// 仅供需要真实 MySQL 的集成测试使用。
pub async fn get_real_pool() -> Result<MySqlPool> {
    dotenv().ok();
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL missing")?;
    crate::db::init_db(&url).await
}
