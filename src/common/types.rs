use solana_commitment_config::CommitmentConfig;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// 分析器配置
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// RPC 端点
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    /// 单次 RPC 调用超时
    pub timeout: Duration,
    /// 可重试错误的最大重试次数（不含首次调用）
    pub max_retries: u32,
    /// 线性退避基数：第 n 次重试前等待 n * retry_backoff
    pub retry_backoff: Duration,
    /// 是否批量拉取 mint 账户补全精度（默认：true）
    pub resolve_decimals: bool,
    /// 是否在每份报告完成时输出 info 日志
    pub verbose: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            resolve_decimals: true,
            verbose: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self { rpc_url: rpc_url.into(), ..Self::default() }
    }

    /// 从环境变量读取配置
    ///
    /// - `RPC_URL`（默认: http://127.0.0.1:8899）
    /// - `ANALYZER_TIMEOUT_MS`
    /// - `ANALYZER_MAX_RETRIES`
    ///
    /// 无法解析的值回退到默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(ms) = std::env::var("ANALYZER_TIMEOUT_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) =
            std::env::var("ANALYZER_MAX_RETRIES").ok().and_then(|v| v.parse::<u32>().ok())
        {
            config.max_retries = retries;
        }
        config
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// 设置超时与重试策略
    pub fn with_retry(mut self, timeout: Duration, max_retries: u32, retry_backoff: Duration) -> Self {
        self.timeout = timeout;
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_resolve_decimals(mut self, resolve_decimals: bool) -> Self {
        self.resolve_decimals = resolve_decimals;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

pub type SolanaRpcClient = solana_client::nonblocking::rpc_client::RpcClient;
