use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// 获取全局配置实例
///
/// 返回无锁的 `Arc` 快照，可在请求处理中直接调用。
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// 从 `config.toml` 与环境变量初始化全局配置
///
/// 重复调用不会生效。
///
/// # Examples
/// ```no_run
/// use unswtalk::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// 替换当前配置（测试与命令行覆盖时使用）
pub fn replace_config(config: StaticConfig) {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .store(Arc::new(config));
}
