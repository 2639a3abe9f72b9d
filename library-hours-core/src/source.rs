use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Error, Result,
    cache::{CacheBackend, CacheManager},
    sheet::HoursData,
};

/// 表格数据源，返回导出的JSON原始内容
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// 数据源名称，同时用作缓存键
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// 本地文件
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

#[async_trait]
impl SheetSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|err| {
            Error::Config(format!("无法打开表格文件 {}: {}", self.path.display(), err))
        })
    }
}

/// HTTP(S) 地址
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("library-hours/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn handle_error_req(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_request() {
            Error::Source {
                source_name: self.url.clone(),
                message: format!("Request failed: {}", error),
            }
        } else {
            Error::Http(error)
        }
    }
}

#[async_trait]
impl SheetSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::info!("下载开放时间表格: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.handle_error_req(e))?;

        if !response.status().is_success() {
            return Err(Error::Source {
                source_name: self.url.clone(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.handle_error_req(e))?;
        Ok(bytes.to_vec())
    }
}

/// 带缓存的数据源：命中缓存时不访问底层数据源
pub struct CachedSource<S: SheetSource, C: CacheBackend> {
    source: S,
    cache_manager: CacheManager<C>,
    ttl: Duration,
}

impl<S: SheetSource, C: CacheBackend> CachedSource<S, C> {
    pub fn new(source: S, cache_manager: CacheManager<C>, ttl: Duration) -> Self {
        Self {
            source,
            cache_manager,
            ttl,
        }
    }

    /// 丢弃缓存，下次读取时重新获取
    pub async fn invalidate(&self) -> Result<()> {
        self.cache_manager
            .remove_workbook_cache(self.source.name())
            .await
    }
}

#[async_trait]
impl<S: SheetSource, C: CacheBackend> SheetSource for CachedSource<S, C> {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let name = self.source.name();

        if let Some(bytes) = self.cache_manager.get_cached_workbook(name).await? {
            tracing::debug!("命中表格缓存: {}", name);
            return Ok(bytes);
        }

        let bytes = self.source.fetch().await?;
        self.cache_manager
            .cache_workbook(name, &bytes, self.ttl)
            .await?;
        Ok(bytes)
    }
}

/// 是否为HTTP(S)地址
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// 读取并解析数据源
pub async fn load_hours_data(source: &dyn SheetSource) -> Result<HoursData> {
    let bytes = source.fetch().await?;
    let workbook = crate::sheet::Workbook::from_slice(&bytes)?;
    let data = HoursData::from_workbook(&workbook)?;
    tracing::info!(
        "已加载 {}: {} 个学期, {} 个馆",
        source.name(),
        data.semesters.len(),
        data.exceptions.rows.len()
    );
    Ok(data)
}
