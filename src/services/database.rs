use crate::config::Config;
use crate::error::Result;
use serde::Serialize;
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{error, info};

/// 唯一约束：用户名、邮箱、每个有序对最多一条好友请求
const SCHEMA: &str = r#"
    DEFINE TABLE user SCHEMALESS;
    DEFINE INDEX user_username ON TABLE user COLUMNS username UNIQUE;
    DEFINE INDEX user_email ON TABLE user COLUMNS email UNIQUE;
    DEFINE TABLE friend_request SCHEMALESS;
    DEFINE INDEX friend_request_pair ON TABLE friend_request COLUMNS user_from, user_to UNIQUE;
    DEFINE INDEX friend_request_to ON TABLE friend_request COLUMNS user_to;
"#;

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub client: Surreal<Client>,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = Surreal::new::<Http>(config.database_url.as_str()).await?;
        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;
        client
            .use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await.and_then(|r| r.check()) {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 定义表和唯一索引；重复执行是安全的
    pub async fn apply_schema(&self) -> Result<()> {
        self.client.query(SCHEMA).await?.check()?;
        info!(
            "Schema applied to {}/{}",
            self.config.database_namespace, self.config.database_name
        );
        Ok(())
    }

    /// 执行带参数的查询
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        Ok(self.client.query(sql).bind(params).await?)
    }
}
