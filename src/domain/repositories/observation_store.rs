// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::observation::{Listing, Observation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 存储层错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
}

/// 观测记录存储接口
///
/// 追加写入的时间序列存储。核心在一次运行内只写不读，
/// 分析器的调用方通过`load_history`读取
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// 追加一批观测记录
    ///
    /// 同一来源同一轮的记录共享同一个时间戳
    async fn append(
        &self,
        records: &[Listing],
        source: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// 读取某时间点之后的全部观测记录，按观测时间升序
    async fn load_history(&self, since: DateTime<Utc>) -> Result<Vec<Observation>, StoreError>;
}
